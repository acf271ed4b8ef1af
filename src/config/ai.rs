// src/config/ai.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_AI_MODEL: &str = "AI_MODEL";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_daily_limit() -> u32 {
    200
}
fn default_api_key() -> String {
    "ENV".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "openai" is wired up (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Real (uncached) collaborator calls allowed per UTC day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Response cache + daily counter location; no file cache when absent.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read AI config {}", path.display()))?;
        let mut cfg: AiConfig = serde_json::from_str(&data)
            .with_context(|| format!("parse AI config {}", path.display()))?;

        cfg.provider = cfg.provider.trim().to_lowercase();

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var(ENV_OPENAI_API_KEY)
                    .map_err(|_| anyhow::anyhow!("Missing {ENV_OPENAI_API_KEY} env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        Ok(cfg)
    }

    /// Build a config from the environment alone. `None` when no key is set.
    pub fn from_env() -> Option<Self> {
        let key = env::var(ENV_OPENAI_API_KEY).ok()?;
        if key.trim().is_empty() {
            return None;
        }
        Some(Self {
            enabled: true,
            provider: default_provider(),
            model: env::var(ENV_AI_MODEL).unwrap_or_else(|_| default_model()),
            daily_limit: default_daily_limit(),
            api_key: key,
            cache_dir: None,
        })
    }

    /// Config file if present (path from `AI_CONFIG_PATH`), else the environment.
    /// Any failure means "no collaborator", never an error.
    pub fn discover() -> Option<Self> {
        let path = env::var(ENV_AI_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_AI_CONFIG_PATH));

        if path.exists() {
            return match Self::load_from_file(&path) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    warn!(error = ?e, path = %path.display(), "AI config unusable; pattern-only analysis");
                    None
                }
            };
        }

        let cfg = Self::from_env();
        if cfg.is_none() {
            info!("no AI collaborator configured; pattern-only analysis");
        }
        cfg
    }

    /// Enabled, supported provider and a non-empty key.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.provider == "openai" && !self.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    /// Clears the variables config discovery reads.
    fn clear_env() {
        env::remove_var(ENV_AI_CONFIG_PATH);
        env::remove_var(ENV_OPENAI_API_KEY);
        env::remove_var(ENV_AI_MODEL);
    }

    fn missing_path() -> PathBuf {
        env::temp_dir().join("scam-risk-analyzer-no-such-config.json")
    }

    fn write_cfg(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn literal_key_and_defaults() {
        let f = write_cfg(r#"{ "provider": " OpenAI ", "api_key": "sk-test" }"#);
        let cfg = AiConfig::load_from_file(f.path()).unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.daily_limit, 200);
        assert_eq!(cfg.api_key, "sk-test");
        assert!(cfg.cache_dir.is_none());
        assert!(cfg.is_usable());
    }

    #[test]
    fn disabled_config_is_not_usable() {
        let f = write_cfg(r#"{ "enabled": false, "api_key": "sk-test" }"#);
        let cfg = AiConfig::load_from_file(f.path()).unwrap();
        assert!(!cfg.is_usable());
    }

    #[test]
    fn unsupported_provider_with_env_key_fails() {
        let f = write_cfg(r#"{ "provider": "claude", "api_key": "ENV" }"#);
        assert!(AiConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn malformed_json_fails_with_context() {
        let f = write_cfg("{ not json");
        let err = AiConfig::load_from_file(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parse AI config"));
    }

    #[test]
    #[serial]
    fn env_key_is_resolved_from_environment() {
        clear_env();
        env::set_var(ENV_OPENAI_API_KEY, "sk-from-env");
        let f = write_cfg(r#"{ "api_key": "ENV", "daily_limit": 5 }"#);
        let cfg = AiConfig::load_from_file(f.path()).unwrap();
        clear_env();

        assert_eq!(cfg.api_key, "sk-from-env");
        assert_eq!(cfg.daily_limit, 5);
        assert!(cfg.is_usable());
    }

    #[test]
    #[serial]
    fn env_key_without_variable_fails() {
        clear_env();
        let f = write_cfg(r#"{ "api_key": "env" }"#);
        let err = AiConfig::load_from_file(f.path()).unwrap_err();
        assert!(err.to_string().contains(ENV_OPENAI_API_KEY));
    }

    #[test]
    #[serial]
    fn from_env_needs_a_non_blank_key() {
        clear_env();
        assert!(AiConfig::from_env().is_none());

        env::set_var(ENV_OPENAI_API_KEY, "   ");
        assert!(AiConfig::from_env().is_none());

        env::set_var(ENV_OPENAI_API_KEY, "sk-env");
        env::set_var(ENV_AI_MODEL, "gpt-4o");
        let cfg = AiConfig::from_env().unwrap();
        clear_env();

        assert_eq!(cfg.api_key, "sk-env");
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.daily_limit, 200);
        assert!(cfg.cache_dir.is_none());
    }

    #[test]
    #[serial]
    fn discover_prefers_the_configured_file() {
        clear_env();
        env::set_var(ENV_OPENAI_API_KEY, "sk-env");
        let f = write_cfg(r#"{ "api_key": "sk-file", "model": "file-model" }"#);
        env::set_var(ENV_AI_CONFIG_PATH, f.path());
        let cfg = AiConfig::discover();
        clear_env();

        let cfg = cfg.unwrap();
        assert_eq!(cfg.api_key, "sk-file");
        assert_eq!(cfg.model, "file-model");
    }

    #[test]
    #[serial]
    fn discover_falls_back_to_environment_without_file() {
        clear_env();
        env::set_var(ENV_AI_CONFIG_PATH, missing_path());
        env::set_var(ENV_OPENAI_API_KEY, "sk-env");
        let cfg = AiConfig::discover();
        clear_env();

        assert_eq!(cfg.unwrap().api_key, "sk-env");
    }

    #[test]
    #[serial]
    fn discover_without_file_or_key_is_none() {
        clear_env();
        env::set_var(ENV_AI_CONFIG_PATH, missing_path());
        let cfg = AiConfig::discover();
        clear_env();

        assert!(cfg.is_none());
    }

    #[test]
    #[serial]
    fn discover_turns_unusable_file_into_none() {
        clear_env();
        // the environment key must not rescue a broken file
        env::set_var(ENV_OPENAI_API_KEY, "sk-env");
        let f = write_cfg("{ broken");
        env::set_var(ENV_AI_CONFIG_PATH, f.path());
        let cfg = AiConfig::discover();
        clear_env();

        assert!(cfg.is_none());
    }
}
