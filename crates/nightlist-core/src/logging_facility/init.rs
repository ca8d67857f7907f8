//! Process-wide subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::errors::{ExError, ExErrorKind, Result};

const OP_INIT_LOGGING: &str = "init_logging";

/// Output profile of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Human-readable lines, debug level for the list crates
    Development,
    /// One JSON object per event, info level
    Production,
}

impl Profile {
    /// Filter directives used when `RUST_LOG` is unset
    pub fn default_filter(self) -> &'static str {
        match self {
            Profile::Development => "nightlist_core=debug,nightlist_engine=debug",
            Profile::Production => "nightlist_core=info,nightlist_engine=info",
        }
    }
}

/// Install the global subscriber for `profile`
///
/// `RUST_LOG` replaces the profile's default filter. Tests install
/// [`init_test_capture`](super::init_test_capture) instead.
///
/// # Errors
///
/// `Configuration` when `RUST_LOG` does not parse or a global subscriber is
/// already installed.
///
/// # Example
///
/// ```
/// use nightlist_core::logging_facility::{init, Profile};
///
/// # fn main() -> nightlist_core::Result<()> {
/// init(Profile::Development)?;
/// assert!(init(Profile::Production).is_err());
/// # Ok(())
/// # }
/// ```
pub fn init(profile: Profile) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives)
            .map_err(|e| init_error(format!("invalid {}: {}", EnvFilter::DEFAULT_ENV, e)))?,
        Err(_) => EnvFilter::new(profile.default_filter()),
    };

    let installed = match profile {
        Profile::Development => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        Profile::Production => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };
    installed.map_err(|e| init_error(e.to_string()))
}

fn init_error(message: String) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op(OP_INIT_LOGGING)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_name_both_crates() {
        for profile in [Profile::Development, Profile::Production] {
            let filter = profile.default_filter();
            assert!(filter.contains("nightlist_core="));
            assert!(filter.contains("nightlist_engine="));
            assert!(EnvFilter::try_new(filter).is_ok());
        }
    }
}
