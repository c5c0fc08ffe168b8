use crate::diagnostics::ConfigWarning;
use crate::{LoggingConfig, NovaConfig};

impl NovaConfig {
    /// Semantic checks that deserialization cannot express. Problems are
    /// warnings: the affected setting falls back to its default behavior.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        validate_completion(self, &mut out);
        validate_logging(self, &mut out);
        out
    }
}

fn validate_completion(config: &NovaConfig, out: &mut Vec<ConfigWarning>) {
    if config.completion.max_results == Some(0) {
        out.push(ConfigWarning::InvalidValue {
            toml_path: "completion.max_results".to_string(),
            message: "must be >= 1; the limit is ignored".to_string(),
        });
    }
}

fn validate_logging(config: &NovaConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
