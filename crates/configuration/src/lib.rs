use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AnalysisSettings, Config, Delimiter, LoggingSettings, Paths, ReportSettings,
};

/// Prefix for environment overrides, e.g. `SALESSTAT__ANALYSIS__MOVING_AVERAGE_WINDOW=14`.
pub const ENV_PREFIX: &str = "SALESSTAT";

/// Loads the application configuration.
///
/// Sources are layered: struct defaults, then the TOML file (`path`, or an
/// optional `salesstat.toml` in the working directory), then `SALESSTAT__*`
/// environment variables. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file_source = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name("salesstat").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("analysis.correlation_fields")
                .with_list_parse_key("analysis.summary_fields")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects settings the analysis engine cannot honour.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let analysis = &config.analysis;

    if analysis.correlation_fields.is_empty() {
        return Err(ConfigError::ValidationError(
            "analysis.correlation_fields must name at least one field".to_string(),
        ));
    }
    if analysis.summary_fields.is_empty() {
        return Err(ConfigError::ValidationError(
            "analysis.summary_fields must name at least one field".to_string(),
        ));
    }

    let non_numeric: Vec<String> = analysis
        .correlation_fields
        .iter()
        .chain(analysis.summary_fields.iter())
        .filter(|f| !f.is_numeric())
        .map(|f| f.to_string())
        .collect();
    if !non_numeric.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "non-numeric fields cannot be correlated or summarised: {}",
            non_numeric.join(", ")
        )));
    }

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "logging.level must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Field;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.analysis.moving_average_window, 7);
        assert_eq!(config.report.delimiter, Delimiter::Comma);
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[analysis]\nmoving_average_window = 14\ncorrelation_fields = [\"sales_amount\", \"unit_price\"]\n\n[report]\ndelimiter = \"tab\""
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.analysis.moving_average_window, 14);
        assert_eq!(
            config.analysis.correlation_fields,
            vec![Field::SalesAmount, Field::UnitPrice]
        );
        assert_eq!(config.report.delimiter, Delimiter::Tab);
        // Untouched sections keep their defaults.
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn rejects_categorical_correlation_fields() {
        let mut config = Config::default();
        config.analysis.correlation_fields = vec![Field::SalesAmount, Field::Region];

        match validate(&config) {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("region")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
