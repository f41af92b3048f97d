use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    error::{InstagramError, InstagramResult},
    http::ApiPayload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    Reels,
    Stories,
    Carousel,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::Reels => "REELS",
            MediaType::Stories => "STORIES",
            MediaType::Carousel => "CAROUSEL",
        }
    }

    /// Body field carrying the source URL for single items.
    pub(crate) fn url_field(&self) -> Option<&'static str> {
        match self {
            MediaType::Image => Some("image_url"),
            MediaType::Video | MediaType::Reels | MediaType::Stories => Some("video_url"),
            MediaType::Carousel => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = InstagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IMAGE" => Ok(MediaType::Image),
            "VIDEO" => Ok(MediaType::Video),
            "REELS" => Ok(MediaType::Reels),
            "STORIES" => Ok(MediaType::Stories),
            "CAROUSEL" => Ok(MediaType::Carousel),
            other => Err(InstagramError::InvalidMedia(format!("unknown media type {}", other))),
        }
    }
}

/// Opaque user access token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pulls `access_token` out of a token exchange payload.
    pub fn from_payload(payload: &ApiPayload) -> InstagramResult<Self> {
        payload
            .get("access_token")
            .and_then(Value::as_str)
            .map(Self::new)
            .ok_or_else(|| InstagramError::UnexpectedResponse("missing `access_token` in response".to_string()))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselItem {
    pub url: String,
    pub media_type: MediaType,
}

impl CarouselItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: MediaType::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_type: MediaType::Video,
        }
    }
}

/// What to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSpec {
    Single {
        url: String,
        media_type: MediaType,
        caption: Option<String>,
    },
    Carousel {
        items: Vec<CarouselItem>,
        caption: Option<String>,
    },
}

impl MediaSpec {
    pub fn single(url: impl Into<String>, media_type: MediaType) -> Self {
        MediaSpec::Single {
            url: url.into(),
            media_type,
            caption: None,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::single(url, MediaType::Image)
    }

    /// All-image carousel.
    pub fn carousel<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MediaSpec::Carousel {
            items: urls.into_iter().map(CarouselItem::image).collect(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            MediaSpec::Single { caption, .. } | MediaSpec::Carousel { caption, .. } => *caption = Some(text.into()),
        }
        self
    }

    /// Rejects specs the API would refuse, before any container is created.
    pub fn validate(&self) -> InstagramResult<()> {
        match self {
            MediaSpec::Single { url, media_type, .. } => {
                if *media_type == MediaType::Carousel {
                    return Err(InstagramError::InvalidMedia(
                        "a single item cannot be a CAROUSEL, use MediaSpec::Carousel".to_string(),
                    ));
                }
                validate_media_url(url)
            }
            MediaSpec::Carousel { items, .. } => {
                if items.is_empty() {
                    return Err(InstagramError::InvalidMedia("carousel has no items".to_string()));
                }
                for item in items {
                    if !matches!(item.media_type, MediaType::Image | MediaType::Video) {
                        return Err(InstagramError::InvalidMedia(format!(
                            "carousel items must be IMAGE or VIDEO, got {}",
                            item.media_type
                        )));
                    }
                    validate_media_url(&item.url)?;
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn validate_media_url(url: &str) -> InstagramResult<()> {
    let parsed = Url::parse(url).map_err(|_| InstagramError::InvalidMedia(format!("invalid media URL: {}", url)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        _ => Err(InstagramError::InvalidMedia(format!("media URL must be http(s): {}", url))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerSource {
    Url(String),
    /// Child container ids, in display order.
    Children(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    Resumable,
}

impl UploadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadType::Resumable => "resumable",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    pub is_carousel_item: bool,
    pub caption: Option<String>,
    pub upload_type: Option<UploadType>,
}

impl ContainerOptions {
    pub fn carousel_item() -> Self {
        Self {
            is_carousel_item: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Finished,
    InProgress,
    Error,
    Expired,
    Published,
    Other(String),
}

impl ContainerStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "FINISHED" => ContainerStatus::Finished,
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "ERROR" => ContainerStatus::Error,
            "EXPIRED" => ContainerStatus::Expired,
            "PUBLISHED" => ContainerStatus::Published,
            other => ContainerStatus::Other(other.to_string()),
        }
    }

    /// Reads `status_code`, falling back to `status`. A payload with neither
    /// counts as still processing.
    pub fn from_payload(payload: &ApiPayload) -> Self {
        payload
            .get("status_code")
            .or_else(|| payload.get("status"))
            .and_then(Value::as_str)
            .map(Self::from_code)
            .unwrap_or_else(|| ContainerStatus::Other(String::new()))
    }

    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, ContainerStatus::Error | ContainerStatus::Expired)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContainerStatus::Finished => "FINISHED",
            ContainerStatus::InProgress => "IN_PROGRESS",
            ContainerStatus::Error => "ERROR",
            ContainerStatus::Expired => "EXPIRED",
            ContainerStatus::Published => "PUBLISHED",
            ContainerStatus::Other(code) => code.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    /// Id of the live media object.
    pub media_id: String,
    pub payload: ApiPayload,
}
