//! Configuration loading

use crate::{Config, ConfigFormat};
use courier_core::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable holding the proxy username
pub const ENV_USERNAME: &str = "AUTH_USERNAME";
/// Environment variable holding the proxy password
pub const ENV_PASSWORD: &str = "AUTH_PASSWORD";
/// Environment variable overriding the listen address
pub const ENV_LISTEN: &str = "COURIER_LISTEN";
/// Environment variable overriding the upstream deadline (humantime, e.g. `5s`)
pub const ENV_REQUEST_TIMEOUT: &str = "COURIER_REQUEST_TIMEOUT";

/// Load configuration from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;

    load_from_str(&content, format)
}

/// Expand environment variables in configuration string
/// Supports syntax: ${VAR} and ${VAR:-default}
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut result = String::new();
    let mut last_match = 0;

    for cap in re.captures_iter(content) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let var_name = var_name.as_str();
        let default_value = cap.get(3).map(|m| m.as_str());

        let value = match (env::var(var_name), default_value) {
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.to_string(),
            (Err(_), None) => {
                return Err(Error::Config(format!(
                    "Environment variable '{var_name}' not set and no default provided"
                )));
            }
        };

        result.push_str(&content[last_match..full_match.start()]);
        result.push_str(&value);
        last_match = full_match.end();
    }

    result.push_str(&content[last_match..]);

    Ok(result)
}

/// Load configuration from a string
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<Config> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Apply overrides from a variable lookup
///
/// Set variables win over file values. Empty values count as set, so an
/// empty password is accepted when explicitly configured.
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(username) = lookup(ENV_USERNAME) {
        config.auth.username = Some(username);
    }

    if let Some(password) = lookup(ENV_PASSWORD) {
        config.auth.password = Some(password);
    }

    if let Some(listen) = lookup(ENV_LISTEN) {
        config.gateway.listen = listen
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {ENV_LISTEN} '{listen}': {e}")))?;
    }

    if let Some(timeout) = lookup(ENV_REQUEST_TIMEOUT) {
        config.gateway.request_timeout = humantime::parse_duration(&timeout).map_err(|e| {
            Error::Config(format!("Invalid {ENV_REQUEST_TIMEOUT} '{timeout}': {e}"))
        })?;
    }

    Ok(config)
}

/// Load configuration: defaults, then the optional file, then the process
/// environment. The result is validated.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    let config = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default(),
    };

    let config = apply_env_overrides(config, |name| env::var(name).ok())?;

    crate::validator::validate_config(&config)?;

    tracing::debug!(
        listen = %config.gateway.listen,
        request_timeout_ms = config.gateway.request_timeout.as_millis() as u64,
        max_response_bytes = config.proxy.max_response_bytes,
        "Configuration resolved"
    );

    Ok(config)
}
