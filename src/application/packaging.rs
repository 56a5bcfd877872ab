//! Packaging
//!
//! Checks that the local project looks like the webapp's site type and walks
//! it into a `LocalTree`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::entities::{LocalTree, Webapp};
use crate::domain::ports::{LayoutIssue, ProjectSource, ScanOptions};
use crate::domain::value_objects::Environment;
use crate::error::{DeployError, DeployResult};

/// A packaged project and anything odd about its layout
#[derive(Debug, Clone)]
pub struct Package {
    pub tree: LocalTree,
    pub issues: Vec<LayoutIssue>,
}

/// Compare the project layout against what the site type needs.
///
/// Single files are never checked.
pub fn check_layout(
    source: &dyn ProjectSource,
    root: &Path,
    webapp: &Webapp,
    env: Environment,
) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    if !source.is_dir(root) {
        return issues;
    }

    let site = webapp.site_type;
    let profile = site.capabilities().package;

    let marker = PathBuf::from(profile.marker);
    if !source.is_file(&root.join(&marker)) {
        issues.push(LayoutIssue {
            message: format!(
                "your {} project is missing a `{}` file; without it the app will not deploy correctly",
                site.display_name(),
                profile.marker
            ),
            file: marker,
        });
    }

    for required in profile.required {
        if !source.is_file(&root.join(required)) {
            issues.push(LayoutIssue {
                file: PathBuf::from(required),
                message: format!(
                    "missing `{}`; without it the app will not deploy correctly",
                    required
                ),
            });
        }
    }

    if profile.wsgi_module {
        if let Some(project) = webapp.django_project.as_deref() {
            issues.extend(check_django_project(source, root, project, env));
        }
    }

    for issue in &issues {
        debug!(file = %issue.file.display(), "{}", issue.message);
    }
    issues
}

fn check_django_project(
    source: &dyn ProjectSource,
    root: &Path,
    project: &str,
    env: Environment,
) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();

    let wsgi = Path::new(project).join("wsgi.py");
    if !source.is_file(&root.join(&wsgi)) {
        let guess = source
            .child_dirs(root)
            .into_iter()
            .find(|dir| source.is_file(&dir.join("wsgi.py")))
            .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()));
        let message = match guess {
            Some(found) => format!(
                "webapp is configured with a Django project named `{}`, but this project looks like `{}`",
                project, found
            ),
            None => format!(
                "missing WSGI file `{}`; without it the app will not deploy correctly",
                wsgi.display()
            ),
        };
        issues.push(LayoutIssue {
            file: wsgi,
            message,
        });
    }

    let settings_name = match env {
        Environment::Prod => "prod.py",
        Environment::Staging => "staging.py",
    };
    let settings = Path::new(project).join("settings").join(settings_name);
    if !source.is_file(&root.join(&settings)) {
        issues.push(LayoutIssue {
            message: format!(
                "missing settings file `{}`; the {} environment loads it at startup",
                settings.display(),
                env
            ),
            file: settings,
        });
    }

    issues
}

/// Walk the project. `webapp` selects layout checks and site excludes.
pub fn package(
    source: &dyn ProjectSource,
    root: &Path,
    webapp: &Webapp,
    env: Environment,
    options: &ScanOptions,
    check: bool,
) -> DeployResult<Package> {
    if !source.exists(root) {
        return Err(DeployError::ProjectNotFound {
            path: root.to_path_buf(),
        });
    }

    let issues = if check {
        check_layout(source, root, webapp, env)
    } else {
        Vec::new()
    };

    let mut options = options.clone();
    options.exclude.extend(
        webapp
            .site_type
            .capabilities()
            .package
            .extra_excludes
            .iter()
            .map(|p| p.to_string()),
    );

    let tree = source.scan(root, &options)?;
    debug!(
        root = %root.display(),
        files = tree.len(),
        bytes = tree.total_bytes(),
        "project packaged"
    );
    Ok(Package { tree, issues })
}
