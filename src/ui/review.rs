//! Terminal prompt for layout problems

use dialoguer::Confirm;

use crate::ui::terminal::TerminalCapabilities;
use crate::ui::theme::Icon;
use crship::domain::entities::Webapp;
use crship::domain::ports::{LayoutIssue, LayoutReviewer};

/// Asks on the terminal whether to deploy a project that looks wrong.
pub struct InteractiveReviewer {
    caps: TerminalCapabilities,
}

impl InteractiveReviewer {
    pub fn new(caps: TerminalCapabilities) -> Self {
        Self { caps }
    }
}

impl LayoutReviewer for InteractiveReviewer {
    fn review(&self, webapp: &Webapp, issues: &[LayoutIssue]) -> bool {
        let icon = Icon::Warning.colored(self.caps.supports_color, self.caps.supports_unicode);
        eprintln!();
        eprintln!(
            "{} this project does not look like a {} site:",
            icon,
            webapp.site_type.display_name()
        );
        for issue in issues {
            eprintln!("    {}", issue.file.display());
        }

        // Any prompt error (closed stdin, no terminal) counts as "no"
        Confirm::new()
            .with_prompt(format!("Deploy to {} anyway?", webapp.handle))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
