//! Site type value object
//!
//! Each hosted app has a site type. The type decides two things at the start
//! of a deploy: how the local project is checked and packaged, and how the
//! uploaded files are activated on the platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of hosted web application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    #[serde(rename = "coderedcms")]
    CodeRedCms,
    Django,
    Wagtail,
    #[serde(rename = "wordpress")]
    WordPress,
    #[serde(rename = "nodejs")]
    NodeJs,
    Html,
}

/// How a site type's local project is recognised and packaged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageProfile {
    /// File whose presence identifies the project root
    pub marker: &'static str,
    /// Other files that should exist next to the marker
    pub required: &'static [&'static str],
    /// Extra exclude patterns on top of the always-excluded directories
    pub extra_excludes: &'static [&'static str],
    /// Whether `<project>/wsgi.py` is expected (Django-based apps)
    pub wsgi_module: bool,
}

/// What happens after the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Files are served as soon as they land
    None,
    /// Queue the platform deploy (`init`) task
    DeployTask,
}

/// Capability set selected once per deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub package: PackageProfile,
    pub activate: Activation,
}

const DJANGO_PROFILE: PackageProfile = PackageProfile {
    marker: "manage.py",
    required: &["requirements.txt"],
    extra_excludes: &["*.pyc"],
    wsgi_module: true,
};

impl SiteType {
    pub const ALL: [SiteType; 6] = [
        SiteType::CodeRedCms,
        SiteType::Django,
        SiteType::Wagtail,
        SiteType::WordPress,
        SiteType::NodeJs,
        SiteType::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::CodeRedCms => "coderedcms",
            SiteType::Django => "django",
            SiteType::Wagtail => "wagtail",
            SiteType::WordPress => "wordpress",
            SiteType::NodeJs => "nodejs",
            SiteType::Html => "html",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            SiteType::CodeRedCms => "CodeRed CMS",
            SiteType::Django => "Django",
            SiteType::Wagtail => "Wagtail",
            SiteType::WordPress => "WordPress",
            SiteType::NodeJs => "Node.js",
            SiteType::Html => "HTML",
        }
    }

    /// Django, Wagtail and CodeRed CMS share the Python project layout
    pub fn is_django_based(&self) -> bool {
        matches!(
            self,
            SiteType::CodeRedCms | SiteType::Django | SiteType::Wagtail
        )
    }

    pub fn capabilities(&self) -> Capabilities {
        let package = match self {
            SiteType::CodeRedCms | SiteType::Django | SiteType::Wagtail => DJANGO_PROFILE,
            SiteType::WordPress => PackageProfile {
                marker: "wp-config.php",
                required: &[],
                extra_excludes: &[],
                wsgi_module: false,
            },
            SiteType::NodeJs => PackageProfile {
                marker: "package.json",
                required: &[],
                extra_excludes: &[],
                wsgi_module: false,
            },
            SiteType::Html => PackageProfile {
                marker: "index.html",
                required: &[],
                extra_excludes: &[],
                wsgi_module: false,
            },
        };
        let activate = match self {
            SiteType::Html => Activation::None,
            _ => Activation::DeployTask,
        };
        Capabilities { package, activate }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SiteType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown site type '{}'", s))
    }
}
