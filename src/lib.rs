//! Client for the Instagram API with Instagram Login.
//!
//! Covers the OAuth code exchange, basic profile lookup and content
//! publishing. Publishing creates media containers, waits for Instagram to
//! process them and then issues a single `media_publish` call.

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod http;
pub mod instagram;



pub use config::{build_config, ClientConfig, ConfigError, Credentials, PollOptions};
pub use error::{InstagramError, InstagramResult, TransportError};
pub use http::{ApiPayload, HttpClient, HttpRequest, HttpResponse, HttpService, RequestBody};
pub use instagram::{
    AccessToken, CarouselItem, ContainerManager, ContainerOptions, ContainerSource, ContainerStatus, InstagramClient,
    MediaSpec, MediaType, PublishResult, Publisher, UploadType,
};
pub use tokio_util::sync::CancellationToken;
