//! Logging setup: `tracing-subscriber` fmt layer at the configured level.

use std::str::FromStr;

use tracing::Level;

use crate::config::ConfigError;

/// Install the global subscriber. Calling it again is a no-op.
pub fn init_logging(level: &str) -> Result<(), ConfigError> {
    let level = Level::from_str(level)
        .map_err(|_| ConfigError::Validation(format!("unknown log_level {:?}", level)))?;

    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(%level, "logging.initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        assert!(init_logging("warn").is_ok());
        assert!(init_logging("warn").is_ok());
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(init_logging("chatty").is_err());
    }
}
