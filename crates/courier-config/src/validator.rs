//! Configuration validation

use crate::loader::{ENV_PASSWORD, ENV_USERNAME};
use crate::Config;
use courier_core::{Error, Result};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_gateway(config)?;

    validate_proxy(config)?;

    validate_auth(config)?;

    Ok(())
}

fn validate_gateway(config: &Config) -> Result<()> {
    if config.gateway.request_timeout.is_zero() {
        return Err(Error::Config("request_timeout must be > 0".to_string()));
    }

    if config.gateway.request_timeout.as_secs() > 300 {
        tracing::warn!("request_timeout is very high (>5 minutes)");
    }

    if config.gateway.max_body_size == 0 {
        return Err(Error::Config("max_body_size must be > 0".to_string()));
    }

    Ok(())
}

fn validate_proxy(config: &Config) -> Result<()> {
    if config.proxy.max_response_bytes == 0 {
        return Err(Error::Config("max_response_bytes must be > 0".to_string()));
    }

    if config.proxy.default_content_type.trim().is_empty() {
        return Err(Error::Config(
            "default_content_type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_auth(config: &Config) -> Result<()> {
    if config.auth.username.is_none() {
        return Err(Error::Config(format!(
            "proxy username is not configured (set {ENV_USERNAME} or auth.username)"
        )));
    }

    if config.auth.password.is_none() {
        return Err(Error::Config(format!(
            "proxy password is not configured (set {ENV_PASSWORD} or auth.password)"
        )));
    }

    if config.auth.realm.contains('"') {
        return Err(Error::Config("auth.realm cannot contain '\"'".to_string()));
    }

    Ok(())
}
