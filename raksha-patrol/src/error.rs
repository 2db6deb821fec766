//! Error types for RakshaPatrol

use thiserror::Error;

/// RakshaPatrol error type
#[derive(Error, Debug)]
pub enum PatrolError {
    /// Sensor read failed or returned unusable data
    #[error("Sensor fault: {0}")]
    Sensor(String),

    /// Motor command failed to execute
    #[error("Actuator fault: {0}")]
    Actuator(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PatrolError {
    /// True for faults raised by the external collaborators.
    pub fn is_device_fault(&self) -> bool {
        matches!(self, PatrolError::Sensor(_) | PatrolError::Actuator(_))
    }
}

impl From<toml::de::Error> for PatrolError {
    fn from(e: toml::de::Error) -> Self {
        PatrolError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PatrolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_faults() {
        assert!(PatrolError::Sensor("timeout".into()).is_device_fault());
        assert!(PatrolError::Actuator("stalled".into()).is_device_fault());
        assert!(!PatrolError::Config("bad".into()).is_device_fault());
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: PatrolError = toml::from_str::<toml::Value>("[timing")
            .unwrap_err()
            .into();
        assert!(matches!(err, PatrolError::Config(_)));
    }
}
