use std::ffi::OsString;

use nova_config::{
    discover_config_path, load_for_workspace, with_config_env_lock, NovaConfig,
    NOVA_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_nova_toml_in_workspace_root() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(NOVA_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nova.toml");
        std::fs::write(&config_path, "[completion]\nsubword_match = true\n").unwrap();

        let discovered = discover_config_path(dir.path()).expect("nova.toml is discovered");
        assert_eq!(discovered, config_path.canonicalize().unwrap_or(config_path));

        let (config, path) = load_for_workspace(dir.path()).expect("config loads");
        assert!(config.completion.subword_match);
        assert!(path.is_some());
    });
}

#[test]
fn env_var_overrides_discovery() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("nova.toml"), "[completion]\ncamel_case = true\n").unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[search]\ncase_sensitive = false\n").unwrap();
        let _env = EnvVarGuard::set(NOVA_CONFIG_ENV_VAR, std::path::Path::new("custom.toml"));

        let (config, path) = load_for_workspace(dir.path()).expect("config loads");
        assert!(!config.search.case_sensitive);
        assert!(!config.completion.camel_case);
        assert_eq!(path, Some(custom.canonicalize().unwrap_or(custom)));
    });
}

#[test]
fn no_config_means_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(NOVA_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        let (config, path) = load_for_workspace(dir.path()).expect("defaults");
        assert_eq!(config, NovaConfig::default());
        assert_eq!(path, None);
    });
}
