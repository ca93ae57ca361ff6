use thiserror::Error;

use crate::models::ParameterTable;

/// Errors that can occur while classifying a census or projecting a stand.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown region: '{0}'")]
    UnknownRegion(String),

    #[error("Missing {table} parameters for species '{species}'")]
    MissingParameters {
        species: String,
        table: ParameterTable,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ModelError::from(io_err);
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = ModelError::ParseError("invalid format".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid format");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ModelError::ValidationError("spacing must be positive".to_string());
        assert_eq!(err.to_string(), "Validation error: spacing must be positive");
    }

    #[test]
    fn test_unknown_region_display() {
        let err = ModelError::UnknownRegion("qingyang".to_string());
        assert_eq!(err.to_string(), "Unknown region: 'qingyang'");
    }

    #[test]
    fn test_missing_parameters_display() {
        let err = ModelError::MissingParameters {
            species: "Pinus tabuliformis".to_string(),
            table: ParameterTable::Mortality,
        };
        assert_eq!(
            err.to_string(),
            "Missing mortality parameters for species 'Pinus tabuliformis'"
        );
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = ModelError::InsufficientData("empty census".to_string());
        assert_eq!(err.to_string(), "Insufficient data: empty census");
    }

    #[test]
    fn test_json_error_from_conversion() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("not valid json{{{");
        let json_err = result.unwrap_err();
        let err: ModelError = json_err.into();
        assert!(matches!(err, ModelError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_toml_error_from_conversion() {
        let result: Result<toml::Value, _> = toml::from_str("= broken");
        let err: ModelError = result.unwrap_err().into();
        assert!(matches!(err, ModelError::Toml(_)));
    }

    #[test]
    fn test_error_is_debug() {
        let err = ModelError::ParseError("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("ParseError"));
    }
}
