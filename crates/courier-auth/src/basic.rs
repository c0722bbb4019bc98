//! HTTP Basic authentication

use base64::{engine::general_purpose, Engine as _};
use courier_config::AuthConfig;
use courier_core::{Error, Result};
use http::header::{HeaderMap, AUTHORIZATION};
use std::fmt;

/// A username/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Decode a `Basic <base64(user:pass)>` header value
    ///
    /// The scheme is case-insensitive and the password may itself contain `:`.
    pub fn from_header_value(value: &str) -> Result<Self> {
        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| Error::Authentication("malformed authorization header".to_string()))?;

        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(Error::Authentication(format!(
                "unsupported authorization scheme '{scheme}'"
            )));
        }

        let decoded = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Authentication(format!("invalid base64 payload: {e}")))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| Error::Authentication("credentials are not valid UTF-8".to_string()))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| Error::Authentication("credentials lack ':' separator".to_string()))?;

        Ok(Self::new(username, password))
    }

    /// Encode as a `Basic` header value
    pub fn to_header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Verifies inbound requests against the configured credential pair
#[derive(Debug, Clone)]
pub struct BasicAuth {
    expected: Credentials,
    realm: String,
}

impl BasicAuth {
    /// Create a verifier for the given credentials
    pub fn new(expected: Credentials, realm: impl Into<String>) -> Self {
        Self {
            expected,
            realm: realm.into(),
        }
    }

    /// Build the verifier from validated configuration
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => Ok(Self::new(
                Credentials::new(username.clone(), password.clone()),
                config.realm.clone(),
            )),
            _ => Err(Error::Config(
                "proxy username and password must both be configured".to_string(),
            )),
        }
    }

    /// Realm advertised in the challenge
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Check the supplied pair
    ///
    /// Plain string equality; a constant-time comparison would harden this
    /// against timing probes.
    pub fn verify(&self, supplied: &Credentials) -> bool {
        supplied.username == self.expected.username && supplied.password == self.expected.password
    }

    /// Authenticate a request by its headers
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<()> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| Error::Authentication("missing authorization header".to_string()))?
            .to_str()
            .map_err(|_| Error::Authentication("authorization header is not ASCII".to_string()))?;

        let supplied = Credentials::from_header_value(value)?;

        if self.verify(&supplied) {
            Ok(())
        } else {
            tracing::debug!(username = %supplied.username, "Credential mismatch");
            Err(Error::Authentication(format!(
                "invalid credentials for user '{}'",
                supplied.username
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn auth() -> BasicAuth {
        BasicAuth::new(Credentials::new("relay", "s3:cret"), "Secure Area")
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_accepts_matching_credentials() {
        let value = Credentials::new("relay", "s3:cret").to_header_value();
        assert!(auth().authenticate(&headers_with(&value)).is_ok());
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        // relay:s3:cret
        let headers = headers_with("basic cmVsYXk6czM6Y3JldA==");
        assert!(auth().authenticate(&headers).is_ok());
    }

    #[test]
    fn test_rejects_wrong_password() {
        let value = Credentials::new("relay", "nope").to_header_value();
        let err = auth().authenticate(&headers_with(&value)).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!err.to_string().contains("nope"));
    }

    #[test]
    fn test_rejects_missing_header() {
        assert!(auth().authenticate(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(auth().authenticate(&headers_with("Bearer abc.def")).is_err());
    }

    #[test]
    fn test_rejects_garbage_payload() {
        assert!(auth().authenticate(&headers_with("Basic !!!")).is_err());
        // "relay" without a colon
        assert!(auth().authenticate(&headers_with("Basic cmVsYXk=")).is_err());
    }

    #[test]
    fn test_password_split_at_first_colon() {
        let creds = Credentials::from_header_value("Basic cmVsYXk6czM6Y3JldA==").unwrap();
        assert_eq!(creds.username, "relay");
        assert_eq!(creds.password(), "s3:cret");
    }

    #[test]
    fn test_from_config_requires_both_values() {
        let mut config = AuthConfig {
            username: Some("relay".to_string()),
            ..AuthConfig::default()
        };
        assert!(BasicAuth::from_config(&config).is_err());

        config.password = Some(String::new());
        let auth = BasicAuth::from_config(&config).unwrap();
        assert_eq!(auth.realm(), "Secure Area");
        assert!(auth.verify(&Credentials::new("relay", "")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("relay", "s3:cret"));
        assert!(!debug.contains("s3:cret"));
    }
}
