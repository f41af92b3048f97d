mod container;
pub mod model;
mod publish;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use container::ContainerManager;
pub use model::*;
pub use publish::Publisher;

use crate::{
    config::{ClientConfig, Credentials},
    error::InstagramResult,
    http::{decode_response, ApiPayload, HttpClient, HttpRequest, HttpService},
};

/// Stateless client for the Instagram API with Instagram Login.
///
/// The access token is passed to every call; nothing is cached between calls.
#[derive(Clone)]
pub struct InstagramClient {
    credentials: Credentials,
    config: Arc<ClientConfig>,
    http: Arc<dyn HttpClient>,
    publisher: Publisher,
}

impl InstagramClient {
    pub fn new(credentials: Credentials, config: ClientConfig) -> InstagramResult<Self> {
        let config = Arc::new(config);
        let http = HttpService::new(Arc::clone(&config))?;
        Ok(Self::with_http_client(credentials, config, Arc::new(http)))
    }

    pub fn with_http_client(credentials: Credentials, config: Arc<ClientConfig>, http: Arc<dyn HttpClient>) -> Self {
        let publisher = Publisher::new(Arc::clone(&http), Arc::clone(&config));
        Self {
            credentials,
            config,
            http,
            publisher,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn containers(&self) -> &ContainerManager {
        self.publisher.containers()
    }

    /// Exchanges an OAuth authorization code for a short-lived user token.
    pub async fn exchange_code_for_token(&self, code: &str) -> InstagramResult<ApiPayload> {
        info!("Exchanging authorization code for access token");

        let fields = vec![
            ("client_id".to_string(), self.credentials.client_id.clone()),
            ("client_secret".to_string(), self.credentials.client_secret.clone()),
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("redirect_uri".to_string(), self.credentials.redirect_uri.clone()),
            ("code".to_string(), code.to_string()),
        ];

        let request = HttpRequest::post(self.config.token_url()).form(fields);
        decode_response(self.http.execute(request).await)
    }

    /// `fields` is the comma separated Graph API field list, e.g. `user_id,username`.
    pub async fn get_user_info(&self, access_token: &AccessToken, fields: &str) -> InstagramResult<ApiPayload> {
        debug!("Fetching user info fields {}", fields);

        let request = HttpRequest::get(self.config.graph_url("me"))
            .query("access_token", access_token.as_str())
            .query("fields", fields);

        decode_response(self.http.execute(request).await)
    }

    pub async fn publish_media(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        spec: &MediaSpec,
    ) -> InstagramResult<PublishResult> {
        self.publish_media_with_cancel(account_id, access_token, spec, &CancellationToken::new())
            .await
    }

    pub async fn publish_media_with_cancel(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        spec: &MediaSpec,
        cancel: &CancellationToken,
    ) -> InstagramResult<PublishResult> {
        self.publisher.publish(account_id, access_token, spec, cancel).await
    }
}
