use std::env;
use std::time::Duration;

/// Client configuration for the support backend, loaded from the
/// environment (.env supported). Every field has a usable default so the
/// app starts against a local backend with no setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            api_base_url: env::var("ASTRODESK_API_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5000/".to_string()),
            api_token: env::var("ASTRODESK_API_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout_secs: env::var("ASTRODESK_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            max_upload_bytes: env::var("ASTRODESK_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL with a guaranteed trailing slash so joins behave.
    pub fn base_url(&self) -> url::Url {
        let raw = if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        };
        url::Url::parse(&raw).unwrap_or_else(|_| {
            log::warn!("invalid ASTRODESK_API_BASE_URL {:?}, falling back to localhost", raw);
            url::Url::parse("http://127.0.0.1:5000/").expect("static url")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let cfg = Config {
            api_base_url: "http://example.com/api".into(),
            api_token: None,
            request_timeout_secs: 30,
            max_upload_bytes: 1024,
        };
        assert_eq!(cfg.base_url().as_str(), "http://example.com/api/");
    }

    #[test]
    fn bad_base_url_falls_back() {
        let cfg = Config {
            api_base_url: "not a url".into(),
            api_token: None,
            request_timeout_secs: 30,
            max_upload_bytes: 1024,
        };
        assert_eq!(cfg.base_url().host_str(), Some("127.0.0.1"));
    }
}
