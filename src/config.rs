use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

pub const DEFAULT_TOKEN_BASE_URL: &str = "https://api.instagram.com";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.instagram.com";
pub const DEFAULT_API_VERSION: &str = "v23.0";
pub const DEFAULT_CAROUSEL_CAPTION: &str = "Instagram Carousel";

/// Status checks are never spaced closer than this, whatever `PollOptions` says.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_TIMEOUT_SECS: u64 = 24 * 60 * 60;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 10 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(String),
    #[error("Invalid {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// OAuth application credentials. Only used by the token exchange.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Upper bound for a single container to reach `FINISHED`.
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub token_base_url: Url,
    pub graph_base_url: Url,
    pub api_version: String,
    pub default_headers: HeaderMap,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub poll: PollOptions,
    pub carousel_caption: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token_base_url: Url::parse(DEFAULT_TOKEN_BASE_URL).expect("default token url is valid"),
            graph_base_url: Url::parse(DEFAULT_GRAPH_BASE_URL).expect("default graph url is valid"),
            api_version: DEFAULT_API_VERSION.to_string(),
            default_headers: default_headers(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            poll: PollOptions::default(),
            carousel_caption: DEFAULT_CAROUSEL_CAPTION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn token_url(&self) -> String {
        format!("{}/oauth/access_token", trim_base(&self.token_base_url))
    }

    /// `{graph}/{version}/{path}`
    pub fn graph_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            trim_base(&self.graph_base_url),
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    pub fn from_env() -> Result<(Credentials, ClientConfig), ConfigError> {
        build_config(|key| std::env::var(key).ok())
    }
}

fn trim_base(url: &Url) -> &str {
    url.as_str().trim_end_matches('/')
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

pub fn build_config<F>(lookup: F) -> Result<(Credentials, ClientConfig), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Building ClientConfig...");

    let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

    let credentials = Credentials {
        client_id: required("INSTAGRAM_CLIENT_ID")?,
        client_secret: required("INSTAGRAM_CLIENT_SECRET")?,
        redirect_uri: required("INSTAGRAM_REDIRECT_URI")?,
    };

    let mut config = ClientConfig::default();

    if let Some(version) = lookup("INSTAGRAM_API_VERSION") {
        config.api_version = version;
    }
    if let Some(base) = lookup("INSTAGRAM_GRAPH_BASE_URL") {
        config.graph_base_url = parse_url("INSTAGRAM_GRAPH_BASE_URL", &base)?;
    }
    if let Some(base) = lookup("INSTAGRAM_TOKEN_BASE_URL") {
        config.token_base_url = parse_url("INSTAGRAM_TOKEN_BASE_URL", &base)?;
    }
    if let Some(secs) = lookup("INSTAGRAM_POLL_INTERVAL_SECS") {
        config.poll.interval = parse_secs("INSTAGRAM_POLL_INTERVAL_SECS", &secs, 1, MAX_POLL_TIMEOUT_SECS)?;
    }
    if let Some(secs) = lookup("INSTAGRAM_POLL_TIMEOUT_SECS") {
        config.poll.timeout = parse_secs("INSTAGRAM_POLL_TIMEOUT_SECS", &secs, 0, MAX_POLL_TIMEOUT_SECS)?;
    }
    if let Some(secs) = lookup("INSTAGRAM_REQUEST_TIMEOUT_SECS") {
        config.request_timeout =
            parse_secs("INSTAGRAM_REQUEST_TIMEOUT_SECS", &secs, 1, MAX_REQUEST_TIMEOUT_SECS)?;
    }

    info!("ClientConfig built (api version {})", config.api_version);

    Ok((credentials, config))
}

fn parse_secs(key: &str, value: &str, min: u64, max: u64) -> Result<Duration, ConfigError> {
    let secs = value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    if !(min..=max).contains(&secs) {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("must be between {} and {} seconds", min, max),
        });
    }

    Ok(Duration::from_secs(secs))
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("unsupported scheme {}", scheme),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("INSTAGRAM_CLIENT_ID", "client"),
        ("INSTAGRAM_CLIENT_SECRET", "secret"),
        ("INSTAGRAM_REDIRECT_URI", "https://example.com/callback"),
    ];

    #[test]
    fn test_build_config_defaults() {
        let (credentials, config) = build_config(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(credentials.client_id, "client");
        assert_eq!(credentials.redirect_uri, "https://example.com/callback");
        assert_eq!(config.api_version, "v23.0");
        assert_eq!(config.poll.interval, Duration::from_secs(30));
        assert_eq!(config.carousel_caption, "Instagram Carousel");
        assert_eq!(config.token_url(), "https://api.instagram.com/oauth/access_token");
        assert_eq!(config.graph_url("me"), "https://graph.instagram.com/v23.0/me");
    }

    #[test]
    fn test_build_config_missing_key() {
        let result = build_config(lookup_from(&REQUIRED[..2]));

        assert!(matches!(result, Err(ConfigError::Missing(key)) if key == "INSTAGRAM_REDIRECT_URI"));
    }

    #[test]
    fn test_build_config_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INSTAGRAM_API_VERSION", "v22.0"));
        pairs.push(("INSTAGRAM_GRAPH_BASE_URL", "http://localhost:8080/"));
        pairs.push(("INSTAGRAM_POLL_INTERVAL_SECS", "5"));
        pairs.push(("INSTAGRAM_POLL_TIMEOUT_SECS", "60"));

        let (_, config) = build_config(lookup_from(&pairs)).unwrap();

        assert_eq!(config.graph_url("/123/media"), "http://localhost:8080/v22.0/123/media");
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.poll.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_config_rejects_bad_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INSTAGRAM_POLL_INTERVAL_SECS", "0"));
        assert!(matches!(
            build_config(lookup_from(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INSTAGRAM_POLL_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            build_config(lookup_from(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INSTAGRAM_GRAPH_BASE_URL", "ftp://graph.instagram.com"));
        assert!(matches!(
            build_config(lookup_from(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_build_config_bounds_durations() {
        let invalid = |key: &str, value: &str| {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, value));
            matches!(build_config(lookup_from(&pairs)), Err(ConfigError::Invalid { key: k, .. }) if k == key)
        };

        assert!(invalid("INSTAGRAM_POLL_TIMEOUT_SECS", &u64::MAX.to_string()));
        assert!(invalid("INSTAGRAM_POLL_TIMEOUT_SECS", "86401"));
        assert!(invalid("INSTAGRAM_REQUEST_TIMEOUT_SECS", "0"));
        assert!(invalid("INSTAGRAM_REQUEST_TIMEOUT_SECS", "601"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INSTAGRAM_POLL_TIMEOUT_SECS", "86400"));
        pairs.push(("INSTAGRAM_REQUEST_TIMEOUT_SECS", "10"));
        let (_, config) = build_config(lookup_from(&pairs)).unwrap();
        assert_eq!(config.poll.timeout, Duration::from_secs(86400));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("id", "hunter2", "https://example.com");

        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
