//! Client credentials and service endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_URL: &str = "https://api.flickr.com/services";
pub const DEFAULT_UPLOAD_URL: &str = "https://up.flickr.com/services/upload/";

const SERVICE_URL_VAR: &str = "FLICKR_SERVICE_URL";
const UPLOAD_URL_VAR: &str = "FLICKR_UPLOAD_URL";

/// Where requests go. `service` is the root under which `/rest/` and
/// `/auth/` live; `upload` is the full upload URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub service: String,
    pub upload: String,
}

impl Endpoints {
    pub fn new(service: &str, upload: &str) -> Self {
        Self {
            service: service.trim_end_matches('/').to_string(),
            upload: upload.to_string(),
        }
    }

    /// Defaults, overridden by `FLICKR_SERVICE_URL` / `FLICKR_UPLOAD_URL`.
    pub fn from_env() -> Self {
        let service = std::env::var(SERVICE_URL_VAR).unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        let upload = std::env::var(UPLOAD_URL_VAR).unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string());
        Self::new(&service, &upload)
    }

    pub(crate) fn rest_url(&self) -> String {
        format!("{}/rest/", self.service)
    }

    pub(crate) fn auth_url(&self) -> String {
        format!("{}/auth/", self.service)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_URL, DEFAULT_UPLOAD_URL)
    }
}

/// API key, shared secret and (after the auth handshake) the auth token.
#[derive(Clone)]
pub struct Credentials {
    pub(crate) api_key: String,
    pub(crate) secret: String,
    pub(crate) auth_token: Option<String>,
}

impl Credentials {
    pub fn new(api_key: &str, secret: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            secret: secret.to_string(),
            auth_token: None,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The auth token, if one has been set. An empty token counts as unset.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.is_empty())
    }
}

// The secret never reaches logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let endpoints = Endpoints::new("http://localhost:3000/services/", "http://localhost:3000/upload/");
        assert_eq!(endpoints.rest_url(), "http://localhost:3000/services/rest/");
        assert_eq!(endpoints.auth_url(), "http://localhost:3000/services/auth/");
        assert_eq!(endpoints.upload, "http://localhost:3000/upload/");
    }

    #[test]
    fn default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.rest_url(), "https://api.flickr.com/services/rest/");
        assert_eq!(endpoints.upload, DEFAULT_UPLOAD_URL);
    }

    #[test]
    fn debug_redacts_secret() {
        let mut creds = Credentials::new("key", "very-secret");
        creds.auth_token = Some("tok-123".to_string());
        let shown = format!("{creds:?}");
        assert!(shown.contains("key"));
        assert!(!shown.contains("very-secret"));
        assert!(!shown.contains("tok-123"));
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let mut creds = Credentials::new("key", "secret");
        assert_eq!(creds.auth_token(), None);
        creds.auth_token = Some(String::new());
        assert_eq!(creds.auth_token(), None);
    }
}
