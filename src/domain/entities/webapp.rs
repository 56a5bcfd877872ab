//! Hosted webapp entity, as described by the control plane

use crate::domain::value_objects::{Environment, SiteType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webapp {
    /// Short name; also the SFTP username
    pub handle: String,
    pub id: u64,
    pub name: String,
    pub site_type: SiteType,
    /// Django project module directory (holds `wsgi.py`)
    pub django_project: Option<String>,
    pub primary_url: Option<String>,
    pub sftp_prod_domain: String,
    pub sftp_staging_domain: Option<String>,
}

impl Webapp {
    /// SFTP host for the environment. Staging falls back to the prod domain.
    pub fn sftp_host(&self, env: Environment) -> &str {
        match env {
            Environment::Prod => &self.sftp_prod_domain,
            Environment::Staging => self
                .sftp_staging_domain
                .as_deref()
                .unwrap_or(&self.sftp_prod_domain),
        }
    }

    /// URL to show after a deploy
    pub fn url(&self, env: Environment) -> Option<String> {
        match env {
            Environment::Prod => self.primary_url.clone(),
            Environment::Staging => self
                .sftp_staging_domain
                .as_ref()
                .map(|d| format!("https://{}", d)),
        }
    }
}
