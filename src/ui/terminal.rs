//! What the attached terminal can do
//!
//! Progress and prompts go to stderr, so that is the stream inspected.

use is_terminal::IsTerminal;

/// Set by the usual CI services; prompts there would hang the job
const CI_VARS: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE", "JENKINS_URL"];

const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_CTYPE", "LANG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub supports_color: bool,
    pub supports_unicode: bool,
    interactive: bool,
}

impl TerminalCapabilities {
    /// No color, ASCII icons, never prompts
    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            supports_color: false,
            supports_unicode: false,
            interactive: false,
        }
    }

    pub fn can_prompt(&self) -> bool {
        self.interactive
    }
}

pub fn detect_capabilities() -> TerminalCapabilities {
    let attached = std::io::stderr().is_terminal() && std::io::stdin().is_terminal();
    from_env(attached, |key| std::env::var(key).ok())
}

fn from_env(attached: bool, var: impl Fn(&str) -> Option<String>) -> TerminalCapabilities {
    let dumb = var("TERM").is_some_and(|term| term.eq_ignore_ascii_case("dumb"));
    let in_ci = CI_VARS.iter().any(|key| var(key).is_some());

    // The first locale variable that is set decides, as in libc
    let utf8 = match LOCALE_VARS.iter().find_map(|key| var(key).filter(|v| !v.is_empty())) {
        Some(locale) => {
            let locale = locale.to_ascii_lowercase();
            locale.contains("utf-8") || locale.contains("utf8")
        }
        None => true,
    };

    TerminalCapabilities {
        supports_color: attached && !dumb && var("NO_COLOR").is_none(),
        supports_unicode: !dumb && utf8,
        interactive: attached && !in_ci,
    }
}
