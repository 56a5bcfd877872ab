//! Deployment environment value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target environment of a hosted app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Prod,
    Staging,
}

impl Environment {
    /// Value sent as `env` to the task API
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Prod),
            "staging" | "stage" => Ok(Environment::Staging),
            other => Err(format!(
                "unknown environment '{}' (expected 'prod' or 'staging')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_prod() {
        assert_eq!(Environment::default(), Environment::Prod);
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("STAGING".parse::<Environment>().unwrap(), Environment::Staging);
        assert!("dev".parse::<Environment>().is_err());
    }
}
