//! `nova.toml` configuration and process-wide `tracing` setup.
//!
//! ```toml
//! [completion]
//! case_sensitive = false
//! camel_case = true
//! subword_match = true
//! max_results = 200
//!
//! [search]
//! mode = "pattern"
//! erasure = false
//!
//! [logging]
//! level = "nova.completion=debug,info"
//! json = true
//! file = "/tmp/nova.log"
//! ```
//!
//! Settings are resolved into the per-query option structs
//! ([`MatchOptions`], [`MatchRule`]) by the caller; nothing here is global
//! except the tracing subscriber.

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once, OnceLock};

use nova_fuzzy::MatchOptions;
use nova_index::{MatchMode, MatchRule};
use parking_lot::ReentrantMutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

mod diagnostics;
mod schema;
mod validation;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use schema::json_schema;

/// Environment variable naming an explicit config file.
pub const NOVA_CONFIG_ENV_VAR: &str = "NOVA_CONFIG_PATH";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NovaConfig {
    /// Code completion matching and result limits.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Defaults for element search.
    #[serde(default)]
    pub search: SearchConfig,

    /// Global logging settings for Nova crates.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompletionConfig {
    /// Reject proposals that only match the typed prefix when ignoring case.
    #[serde(default)]
    pub case_sensitive: bool,

    /// `NPE` proposes `NullPointerException`.
    #[serde(default)]
    pub camel_case: bool,

    /// Propose names containing the prefix anywhere.
    #[serde(default)]
    pub substring_match: bool,

    /// `addlistener` proposes `addXListener`.
    #[serde(default)]
    pub subword_match: bool,

    /// Keep at most this many proposals, best first.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub max_results: Option<usize>,
}

impl CompletionConfig {
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            camel_case: self.camel_case,
            substring: self.substring_match,
            subword: self.subword_match,
        }
    }

    /// `max_results`, with zero treated as unset.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results.filter(|&max| max > 0)
    }
}

/// Name comparison used by search patterns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Exact,
    Prefix,
    /// `*` and `?` wildcards.
    Pattern,
    CamelCase,
}

impl From<SearchMode> for MatchMode {
    fn from(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Exact => MatchMode::Exact,
            SearchMode::Prefix => MatchMode::Prefix,
            SearchMode::Pattern => MatchMode::Pattern,
            SearchMode::CamelCase => MatchMode::CamelCase,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: SearchMode,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Report matches whose type arguments only agree after erasure.
    #[serde(default = "default_true")]
    pub erasure: bool,

    /// Report matches whose type arguments agree through wildcards.
    #[serde(default = "default_true")]
    pub equivalent: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            case_sensitive: true,
            erasure: true,
            equivalent: true,
        }
    }
}

impl SearchConfig {
    pub fn match_rule(&self) -> MatchRule {
        MatchRule {
            mode: self.mode.into(),
            case_sensitive: self.case_sensitive,
            erasure: self.erasure,
            equivalent: self.equivalent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Logging level for all Nova crates, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Append logs to the given file path.
    ///
    /// If the file cannot be opened, file logging is disabled while other sinks
    /// remain active.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective `EnvFilter`: `level`, with `RUST_LOG` merged in when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message, not the source snippet.
        ConfigError::Toml(err.message().to_string())
    }
}

impl NovaConfig {
    /// Parse a config from TOML; unknown keys are ignored.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_from_str(&read_config(path.as_ref())?)
    }

    /// Parse a config from TOML, collecting unknown keys and validation
    /// warnings.
    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<NovaConfig>(text)?;
        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.validate(),
        };
        Ok((config, diagnostics))
    }

    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        Self::load_from_str_with_diagnostics(&read_config(path.as_ref())?)
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the lock that serializes reads of
/// [`NOVA_CONFIG_ENV_VAR`]. Tests that set the variable take it too.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Locate the config for `workspace_root`:
///
/// 1) `NOVA_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `nova.toml` in `workspace_root`
/// 3) `.nova.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(NOVA_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    ["nova.toml", ".nova.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration for a workspace root, logging its diagnostics.
///
/// Without a config file this is [`NovaConfig::default`] and `None`.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(NovaConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((NovaConfig::default(), None));
    };
    let (config, diagnostics) = NovaConfig::load_from_path_with_diagnostics(&path)?;
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "nova.config", path = %path.display(), key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "nova.config", path = %path.display(), %warning, "invalid config value");
    }
    Ok((config, Some(path)))
}

struct MutexFileMakeWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl<'a> MakeWriter<'a> for MutexFileMakeWriter {
    type Writer = MutexFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        MutexFileWriter {
            guard: self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}

struct MutexFileWriter<'a> {
    guard: std::sync::MutexGuard<'a, std::fs::File>,
}

impl Write for MutexFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

static TRACING_INIT: Once = Once::new();

/// Initializes structured `tracing` logging.
///
/// Safe to call multiple times; only the first call installs a global
/// subscriber. Returns whether this call installed it.
pub fn init_tracing(logging: &LoggingConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let filter = logging.env_filter();

        let file = logging
            .file
            .as_ref()
            .and_then(|path| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .ok()
            })
            .map(|file| Arc::new(Mutex::new(file)));
        let file_open_failed = logging.file.is_some() && file.is_none();

        let mut make_writer = BoxMakeWriter::new(io::sink);
        if logging.stderr {
            // `cargo test` output capture only works for the stdlib's `print!/eprint!`
            // macros; `TestWriter` keeps debug-build tests quiet.
            if cfg!(debug_assertions) {
                make_writer = BoxMakeWriter::new(
                    make_writer.and(tracing_subscriber::fmt::writer::TestWriter::with_stderr),
                );
            } else {
                make_writer = BoxMakeWriter::new(make_writer.and(io::stderr));
            }
        }
        if let Some(file) = file {
            make_writer = BoxMakeWriter::new(make_writer.and(MutexFileMakeWriter { file }));
        }

        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(make_writer)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            installed = true;
            if file_open_failed {
                if let Some(path) = &logging.file {
                    tracing::warn!(
                        target: "nova.config",
                        path = %path.display(),
                        "failed to open log file; file logging disabled"
                    );
                }
            }
        }
    });
    installed
}

#[cfg(test)]
mod toml_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_is_default() {
        let config = NovaConfig::load_from_str("").expect("empty config parses");
        assert_eq!(config, NovaConfig::default());
        assert_eq!(config.completion.match_options(), MatchOptions::default());
        assert_eq!(config.search.match_rule(), MatchRule::default());
        assert!(config.logging.stderr);
    }

    #[test]
    fn completion_section_maps_to_match_options() {
        let text = r#"
[completion]
case_sensitive = true
camel_case = true
subword_match = true
max_results = 0
"#;
        let config = NovaConfig::load_from_str(text).expect("config parses");
        assert_eq!(
            config.completion.match_options(),
            MatchOptions {
                case_sensitive: true,
                camel_case: true,
                substring: false,
                subword: true,
            }
        );
        assert_eq!(config.completion.max_results(), None);
    }

    #[test]
    fn search_section_maps_to_match_rule() {
        let text = r#"
[search]
mode = "camel_case"
case_sensitive = false
equivalent = false
"#;
        let config = NovaConfig::load_from_str(text).expect("config parses");
        assert_eq!(
            config.search.match_rule(),
            MatchRule {
                mode: MatchMode::CamelCase,
                case_sensitive: false,
                erasure: true,
                equivalent: false,
            }
        );
    }

    #[test]
    fn toml_errors_carry_the_message() {
        let err = NovaConfig::load_from_str("[completion]\ncamel_case = \"yes\"\n")
            .expect_err("string for bool");
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(err.to_string().starts_with("failed to parse toml config"));
    }

    #[test]
    fn log_levels_are_normalized() {
        assert_eq!(LoggingConfig::normalize_level_directives(" Warning "), "warn");
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
        assert_eq!(
            LoggingConfig::normalize_level_directives("nova.search=trace"),
            "nova.search=trace"
        );
    }
}
