use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ClientConfig,
    error::InstagramResult,
    http::{decode_response, extract_id, HttpClient, HttpRequest},
};

use super::{
    container::ContainerManager,
    model::{AccessToken, ContainerOptions, ContainerSource, MediaSpec, MediaType, PublishResult},
};

/// Turns a [`MediaSpec`] into a live post: containers first, then exactly one
/// `media_publish` call. Containers left behind by a failure are abandoned.
#[derive(Clone)]
pub struct Publisher {
    containers: ContainerManager,
    http: Arc<dyn HttpClient>,
    config: Arc<ClientConfig>,
}

impl Publisher {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<ClientConfig>) -> Self {
        Self {
            containers: ContainerManager::new(Arc::clone(&http), Arc::clone(&config)),
            http,
            config,
        }
    }

    pub fn containers(&self) -> &ContainerManager {
        &self.containers
    }

    pub async fn publish(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        spec: &MediaSpec,
        cancel: &CancellationToken,
    ) -> InstagramResult<PublishResult> {
        spec.validate()?;

        let creation_id = match spec {
            MediaSpec::Single {
                url,
                media_type,
                caption,
            } => {
                let options = ContainerOptions {
                    caption: caption.clone(),
                    ..Default::default()
                };
                self.containers
                    .create_and_wait(
                        account_id,
                        access_token,
                        *media_type,
                        ContainerSource::Url(url.clone()),
                        &options,
                        cancel,
                    )
                    .await?
            }
            MediaSpec::Carousel { items, caption } => {
                info!("Publishing carousel of {} items for account {}", items.len(), account_id);

                let child_options = ContainerOptions::carousel_item();
                let mut children = Vec::with_capacity(items.len());

                for item in items {
                    let child_id = self
                        .containers
                        .create_and_wait(
                            account_id,
                            access_token,
                            item.media_type,
                            ContainerSource::Url(item.url.clone()),
                            &child_options,
                            cancel,
                        )
                        .await?;
                    children.push(child_id);
                }

                let options = ContainerOptions {
                    caption: caption.clone(),
                    ..Default::default()
                };
                self.containers
                    .create_and_wait(
                        account_id,
                        access_token,
                        MediaType::Carousel,
                        ContainerSource::Children(children),
                        &options,
                        cancel,
                    )
                    .await?
            }
        };

        self.publish_container(account_id, access_token, &creation_id).await
    }

    /// Publishes a container that has already reached `FINISHED`.
    pub async fn publish_container(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        creation_id: &str,
    ) -> InstagramResult<PublishResult> {
        info!("Publishing container {} for account {}", creation_id, account_id);

        let request = HttpRequest::post(self.config.graph_url(&format!("{}/media_publish", account_id))).json(json!({
            "access_token": access_token.as_str(),
            "creation_id": creation_id,
        }));

        let payload = decode_response(self.http.execute(request).await)?;
        let media_id = extract_id(&payload, "id")?;

        info!("Published media {}", media_id);
        Ok(PublishResult { media_id, payload })
    }
}
