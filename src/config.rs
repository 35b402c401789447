use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::error::StoreError;
use crate::store::Store;
use crate::store::json::JsonStore;
use crate::store::supabase::SupabaseStore;

pub const DEFAULT_DATA_PATH: &str = "data/db.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Json,
    Supabase,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Json { path: PathBuf },
    Supabase { url: String, key: String },
}

impl Config {
    pub fn load() -> Self {
        let mut config = read_config().unwrap_or_default();
        config.apply_env(|name| env::var(name).ok());
        config
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = var("SUPABASE_URL") {
            self.supabase_url = Some(url);
        }
        if let Some(key) = var("SUPABASE_SERVICE_ROLE_KEY").or_else(|| var("SUPABASE_ANON_KEY")) {
            self.supabase_key = Some(key);
        }
        if let Some(path) = var("TIMESHEET_DATA") {
            self.data_path = Some(PathBuf::from(path));
        }
    }

    pub fn backend(&self) -> Backend {
        let hosted = match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Some(Backend::Supabase {
                url: url.clone(),
                key: key.clone(),
            }),
            _ => None,
        };
        let json = || Backend::Json {
            path: self
                .data_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        };

        match self.backend {
            Some(BackendKind::Json) => json(),
            Some(BackendKind::Supabase) | None => hosted.unwrap_or_else(json),
        }
    }
}

pub fn open_store(config: &Config) -> Result<Box<dyn Store>, StoreError> {
    match config.backend() {
        Backend::Json { path } => {
            info!(path = %path.display(), "using JSON file storage");
            Ok(Box::new(JsonStore::new(path)))
        }
        Backend::Supabase { url, key } => {
            info!(%url, "using hosted database storage");
            Ok(Box::new(SupabaseStore::new(&url, key)?))
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".timesheet.json");
    Some(path)
}

fn read_config() -> Option<Config> {
    let path = config_path()?;
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_json_file() {
        let config = Config::default();
        assert_eq!(
            config.backend(),
            Backend::Json {
                path: PathBuf::from(DEFAULT_DATA_PATH)
            }
        );
    }

    #[test]
    fn hosted_backend_needs_url_and_key() {
        let mut config = Config::default();
        config.apply_env(env_of(&[("SUPABASE_URL", "https://db.example")]));
        assert!(matches!(config.backend(), Backend::Json { .. }));

        config.apply_env(env_of(&[("SUPABASE_ANON_KEY", "anon")]));
        assert_eq!(
            config.backend(),
            Backend::Supabase {
                url: "https://db.example".to_string(),
                key: "anon".to_string()
            }
        );
    }

    #[test]
    fn service_role_key_wins_over_anon_key() {
        let mut config = Config::default();
        config.apply_env(env_of(&[
            ("SUPABASE_URL", "https://db.example"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
        ]));
        assert_eq!(config.supabase_key.as_deref(), Some("service"));
    }

    #[test]
    fn explicit_json_backend_overrides_hosted_settings() {
        let mut config: Config = serde_json::from_str(
            r#"{ "backend": "json", "data_path": "/tmp/ts.json", "supabase_url": "u", "supabase_key": "k" }"#,
        )
        .unwrap();
        assert_eq!(
            config.backend(),
            Backend::Json {
                path: PathBuf::from("/tmp/ts.json")
            }
        );
        config.apply_env(env_of(&[("TIMESHEET_DATA", "other.json"), ("SUPABASE_URL", " ")]));
        assert_eq!(config.data_path, Some(PathBuf::from("other.json")));
        assert_eq!(config.supabase_url.as_deref(), Some("u"));
    }
}
