use crate::federation::FederationConfig;
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 3000;

/// Service configuration, read once from the environment at startup.
/// Missing provider keys are not fatal here; the affected provider fails
/// per-request with a user-facing message instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub port: u16,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub federation: FederationConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        let base_dir = PathBuf::from(home).join(".arbai");

        let data_dir = env::var("ARBAI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.clone());
        let log_dir = env::var("ARBAI_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| base_dir.join("logs"));

        let port = env::var("ARBAI_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let federation = FederationConfig {
            drift_cap: env::var("ARBAI_DRIFT_CAP").ok().and_then(|v| v.parse().ok()),
            wisdom_share_cap: env::var("ARBAI_WISDOM_SHARE_CAP").ok().and_then(|v| v.parse().ok()),
        };

        Config {
            groq_api_key: non_empty(env::var("GROQ_API_KEY").ok()),
            gemini_api_key: non_empty(env::var("GEMINI_API_KEY").ok()),
            xai_api_key: non_empty(env::var("XAI_API_KEY").ok()),
            port,
            data_dir,
            log_dir,
            federation,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("arbai.db")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_filters_blank_keys() {
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("key".to_string())), Some("key".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
