use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tiendanube_core::config::detect_config_path;
use tiendanube_core::{AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

/// Where a setting may come from, highest precedence first.
struct Setting {
    key_path: &'static str,
    env_keys: &'static [&'static str],
}

const STORE_ID: Setting = Setting { key_path: "store.id", env_keys: &["TIENDANUBE_STORE_ID"] };
const ACCESS_TOKEN: Setting =
    Setting { key_path: "store.access_token", env_keys: &["TIENDANUBE_ACCESS_TOKEN"] };
const BASE_URL: Setting =
    Setting { key_path: "api.base_url", env_keys: &["TIENDANUBE_API_BASE_URL"] };
const USER_AGENT: Setting =
    Setting { key_path: "api.user_agent", env_keys: &["TIENDANUBE_API_USER_AGENT"] };
const TIMEOUT: Setting =
    Setting { key_path: "api.timeout_secs", env_keys: &["TIENDANUBE_API_TIMEOUT_SECS"] };
const MAX_RETRIES: Setting =
    Setting { key_path: "api.max_retries", env_keys: &["TIENDANUBE_API_MAX_RETRIES"] };
const RETRY_DELAY: Setting = Setting {
    key_path: "api.retry_base_delay_ms",
    env_keys: &["TIENDANUBE_API_RETRY_BASE_DELAY_MS"],
};
const LOG_LEVEL: Setting = Setting {
    key_path: "logging.level",
    env_keys: &["TIENDANUBE_LOGGING_LEVEL", "TIENDANUBE_LOG_LEVEL"],
};
const LOG_FORMAT: Setting = Setting {
    key_path: "logging.format",
    env_keys: &["TIENDANUBE_LOGGING_FORMAT", "TIENDANUBE_LOG_FORMAT"],
};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    CommandResult::output(render(&config, detect_config_path()))
}

/// Renders `config` with each value's source: env > file > default.
pub fn render(config: &AppConfig, config_file: Option<PathBuf>) -> String {
    let sources = Sources::new(config_file);

    let store_id = config.store.id.as_deref().unwrap_or("<unset>");
    let token = redact_token(config.store.access_token.as_ref());
    let rows: [(&Setting, String); 9] = [
        (&STORE_ID, store_id.to_string()),
        (&ACCESS_TOKEN, token),
        (&BASE_URL, config.api.base_url.clone()),
        (&USER_AGENT, config.api.user_agent.clone()),
        (&TIMEOUT, config.api.timeout_secs.to_string()),
        (&MAX_RETRIES, config.api.max_retries.to_string()),
        (&RETRY_DELAY, config.api.retry_base_delay_ms.to_string()),
        (&LOG_LEVEL, config.logging.level.clone()),
        (&LOG_FORMAT, format!("{:?}", config.logging.format).to_lowercase()),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(rows.iter().map(|(setting, value)| {
        format!("- {} = {value} (source: {})", setting.key_path, sources.of(setting))
    }));
    lines.join("\n")
}

struct Sources {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl Sources {
    fn new(path: Option<PathBuf>) -> Self {
        let doc = path.as_deref().and_then(load_doc);
        Self { path, doc }
    }

    fn of(&self, setting: &Setting) -> String {
        let from_env = setting.env_keys.iter().find(|key| {
            env::var(key).is_ok_and(|value| !value.trim().is_empty())
        });
        if let Some(key) = from_env {
            return format!("env ({key})");
        }

        if self.doc.as_ref().is_some_and(|doc| contains_path(doc, setting.key_path)) {
            let file = self
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file})");
        }

        "default".to_string()
    }
}

fn load_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    key_path.split('.').try_fold(root, |current, key| current.get(key)).is_some()
}

/// Keeps the last four characters of long tokens.
fn redact_token(token: Option<&SecretString>) -> String {
    let Some(token) = token else {
        return "<unset>".to_string();
    };
    let trimmed = token.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() < 12 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{contains_path, redact_token};

    #[test]
    fn tokens_are_never_printed_in_full() {
        let long: SecretString = "0123456789abcdef0123".to_string().into();
        let short: SecretString = "abc".to_string().into();
        let blank: SecretString = "  ".to_string().into();

        assert_eq!(redact_token(Some(&long)), "***0123");
        assert_eq!(redact_token(Some(&short)), "<redacted>");
        assert_eq!(redact_token(Some(&blank)), "<empty>");
        assert_eq!(redact_token(None), "<unset>");
    }

    #[test]
    fn dotted_paths_walk_nested_tables() {
        let doc: toml::Value = "[api]\nbase_url = \"http://localhost\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "api.base_url"));
        assert!(!contains_path(&doc, "api.user_agent"));
        assert!(!contains_path(&doc, "store.id"));
    }
}
