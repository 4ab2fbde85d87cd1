use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.tiendanube.com/v1";
pub const DEFAULT_USER_AGENT: &str = "tiendanube-mcp (https://github.com/tiendanube-mcp)";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub id: Option<String>,
    pub access_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_id: Option<String>,
    pub access_token: Option<String>,
    pub base_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    /// When set, a missing store id or access token fails validation.
    pub require_credentials: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig { id: None, access_token: None },
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                timeout_secs: 10,
                max_retries: 2,
                retry_base_delay_ms: 250,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl StoreConfig {
    pub fn has_credentials(&self) -> bool {
        let has_id = self.id.as_deref().is_some_and(|id| !id.trim().is_empty());
        let has_token = self
            .access_token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().trim().is_empty());
        has_id && has_token
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("tiendanube.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;
        if options.require_credentials {
            config.validate_credentials()?;
        }

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(id) = store.id {
                self.store.id = Some(id);
            }
            if let Some(token) = store.access_token {
                self.store.access_token = Some(secret_value(token));
            }
        }

        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(user_agent) = api.user_agent {
                self.api.user_agent = user_agent;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = api.max_retries {
                self.api.max_retries = max_retries;
            }
            if let Some(retry_base_delay_ms) = api.retry_base_delay_ms {
                self.api.retry_base_delay_ms = retry_base_delay_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TIENDANUBE_STORE_ID") {
            self.store.id = Some(value);
        }
        if let Some(value) = read_env("TIENDANUBE_ACCESS_TOKEN") {
            self.store.access_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("TIENDANUBE_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("TIENDANUBE_API_USER_AGENT") {
            self.api.user_agent = value;
        }
        if let Some(value) = read_env("TIENDANUBE_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("TIENDANUBE_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TIENDANUBE_API_MAX_RETRIES") {
            self.api.max_retries = parse_u32("TIENDANUBE_API_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("TIENDANUBE_API_RETRY_BASE_DELAY_MS") {
            self.api.retry_base_delay_ms =
                parse_u64("TIENDANUBE_API_RETRY_BASE_DELAY_MS", &value)?;
        }

        let log_level =
            read_env("TIENDANUBE_LOGGING_LEVEL").or_else(|| read_env("TIENDANUBE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TIENDANUBE_LOGGING_FORMAT").or_else(|| read_env("TIENDANUBE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(store_id) = overrides.store_id {
            self.store.id = Some(store_id);
        }
        if let Some(access_token) = overrides.access_token {
            self.store.access_token = Some(secret_value(access_token));
        }
        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_api(&self.api)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        let missing_id = self.store.id.as_deref().map(|id| id.trim().is_empty()).unwrap_or(true);
        if missing_id {
            return Err(ConfigError::Validation(
                "store.id is required. Set TIENDANUBE_STORE_ID to the numeric id shown in your Tienda Nube admin (Mi cuenta > Datos de la tienda)".to_string(),
            ));
        }

        let missing_token = self
            .store
            .access_token
            .as_ref()
            .map(|token| token.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_token {
            return Err(ConfigError::Validation(
                "store.access_token is required. Set TIENDANUBE_ACCESS_TOKEN to the token issued when the app was installed".to_string(),
            ));
        }

        Ok(())
    }

    /// Store-scoped API root, e.g. `https://api.tiendanube.com/v1/123456`.
    pub fn store_base_url(&self) -> Option<String> {
        let id = self.store.id.as_deref()?.trim();
        if id.is_empty() {
            return None;
        }
        Some(format!("{}/{id}", self.api.base_url.trim_end_matches('/')))
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tiendanube.toml"), PathBuf::from("config/tiendanube.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Returns the config file `AppConfig::load` would read with default options.
pub fn detect_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    if let Some(id) = store.id.as_deref() {
        let id = id.trim();
        if !id.is_empty() && !id.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "store.id must be numeric, got `{id}` (hint: use the store id, not the store domain)"
            )));
        }
    }

    if let Some(token) = store.access_token.as_ref() {
        let token = token.expose_secret();
        if token.trim().len() != token.len() {
            return Err(ConfigError::Validation(
                "store.access_token must not contain leading or trailing whitespace".to_string(),
            ));
        }
        if token.to_ascii_lowercase().starts_with("bearer ") {
            return Err(ConfigError::Validation(
                "store.access_token must be the raw token without the `bearer` prefix".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "api.base_url must start with http:// or https://".to_string(),
        ));
    }

    if api.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api.user_agent is required; Tienda Nube rejects requests without a User-Agent identifying the app".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if api.max_retries > 10 {
        return Err(ConfigError::Validation(
            "api.max_retries must be in range 0..=10".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    api: Option<ApiPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    id: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ALL_VARS: &[&str] = &[
        "TIENDANUBE_STORE_ID",
        "TIENDANUBE_ACCESS_TOKEN",
        "TIENDANUBE_API_BASE_URL",
        "TIENDANUBE_API_TIMEOUT_SECS",
        "TIENDANUBE_API_MAX_RETRIES",
        "TIENDANUBE_LOG_LEVEL",
        "TIENDANUBE_LOG_FORMAT",
        "TIENDANUBE_LOGGING_LEVEL",
        "TIENDANUBE_LOGGING_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn missing_file_options() -> LoadOptions {
        LoadOptions {
            config_path: Some("definitely-not-here/tiendanube.toml".into()),
            ..LoadOptions::default()
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);
        env::set_var("TEST_TN_TOKEN", "token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tiendanube.toml");
            fs::write(
                &path,
                r#"
[store]
id = "123456"
access_token = "${TEST_TN_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.store.id.as_deref() == Some("123456"), "store id should load from file")?;
            ensure(
                config
                    .store
                    .access_token
                    .as_ref()
                    .is_some_and(|token| token.expose_secret() == "token-from-env"),
                "access token should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_TN_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);
        env::remove_var("TEST_TN_UNSET");

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("tiendanube.toml");
        fs::write(&path, "[store]\naccess_token = \"${TEST_TN_UNSET}\"\n")
            .map_err(|err| err.to_string())?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::MissingEnvInterpolation { var }) => {
                ensure(var == "TEST_TN_UNSET", "error should name the missing variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected interpolation failure".to_string()),
        }
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TIENDANUBE_LOG_LEVEL", "warn");
        env::set_var("TIENDANUBE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(missing_file_options())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TIENDANUBE_STORE_ID", "222");
        env::set_var("TIENDANUBE_API_TIMEOUT_SECS", "20");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("tiendanube.toml");
            fs::write(
                &path,
                r#"
[store]
id = "111"
access_token = "file-token"

[api]
timeout_secs = 15
max_retries = 4

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.store.id.as_deref() == Some("222"), "env store id should win over file")?;
            ensure(config.api.timeout_secs == 20, "env timeout should win over file")?;
            ensure(config.api.max_retries == 4, "file max_retries should win over default")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.store_base_url().as_deref() == Some("https://api.tiendanube.com/v1/222"),
                "store base url should join base url and store id",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);
        env::set_var("TIENDANUBE_API_MAX_RETRIES", "many");

        let result = match AppConfig::load(missing_file_options()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "TIENDANUBE_API_MAX_RETRIES", "error should name the bad key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override error".to_string()),
        };

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);
        env::set_var("TIENDANUBE_STORE_ID", "mystore.mitiendanube.com");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(missing_file_options()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("store.id")
            );
            ensure(has_message, "validation failure should mention store.id")
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn credentials_are_only_required_on_request() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let lenient = AppConfig::load(missing_file_options())
            .map_err(|err| format!("lenient load failed: {err}"))?;
        ensure(!lenient.store.has_credentials(), "defaults carry no credentials")?;

        let strict = AppConfig::load(LoadOptions {
            require_credentials: true,
            ..missing_file_options()
        });
        ensure(
            matches!(strict, Err(ConfigError::Validation(ref message)) if message.contains("store.id")),
            "strict load should fail on missing store id",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TIENDANUBE_STORE_ID", "123");
        env::set_var("TIENDANUBE_ACCESS_TOKEN", "super-secret-token-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(missing_file_options())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-token-value"),
                "debug output should not contain the access token",
            )?;
            ensure(config.store.has_credentials(), "env credentials should be picked up")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }
}
