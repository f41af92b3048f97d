use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{ClientConfig, MIN_POLL_INTERVAL},
    error::{InstagramError, InstagramResult},
    http::{decode_response, extract_id, HttpClient, HttpRequest},
};

use super::model::{AccessToken, ContainerOptions, ContainerSource, ContainerStatus, MediaType};

/// Creates media containers and waits for Instagram to finish processing them.
#[derive(Clone)]
pub struct ContainerManager {
    http: Arc<dyn HttpClient>,
    config: Arc<ClientConfig>,
}

impl ContainerManager {
    pub fn new(http: Arc<dyn HttpClient>, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    /// Creates one container and blocks until it reports `FINISHED`.
    ///
    /// Fails with [`InstagramError::Timeout`] once `config.poll.timeout` has
    /// elapsed, and with [`InstagramError::Cancelled`] as soon as `cancel`
    /// fires. Terminal statuses (`ERROR`, `EXPIRED`) fail immediately.
    pub async fn create_and_wait(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        media_type: MediaType,
        source: ContainerSource,
        options: &ContainerOptions,
        cancel: &CancellationToken,
    ) -> InstagramResult<String> {
        let container_id = self
            .create(account_id, access_token, media_type, source, options)
            .await?;

        self.wait_until_finished(&container_id, access_token, cancel).await?;

        Ok(container_id)
    }

    pub async fn create(
        &self,
        account_id: &str,
        access_token: &AccessToken,
        media_type: MediaType,
        source: ContainerSource,
        options: &ContainerOptions,
    ) -> InstagramResult<String> {
        let body = self.build_body(access_token, media_type, source, options)?;

        info!(
            "Creating {} container for account {} (carousel item: {})",
            media_type, account_id, options.is_carousel_item
        );

        let request = HttpRequest::post(self.config.graph_url(&format!("{}/media", account_id))).json(body);
        let payload = decode_response(self.http.execute(request).await)?;
        let container_id = extract_id(&payload, "id")?;

        info!("Created container {}", container_id);
        Ok(container_id)
    }

    fn build_body(
        &self,
        access_token: &AccessToken,
        media_type: MediaType,
        source: ContainerSource,
        options: &ContainerOptions,
    ) -> InstagramResult<Value> {
        let mut body = Map::new();
        body.insert("access_token".into(), json!(access_token.as_str()));
        body.insert("media_type".into(), json!(media_type.as_str()));

        match (media_type.url_field(), source) {
            (Some(field), ContainerSource::Url(url)) => {
                body.insert(field.into(), json!(url));
                if let Some(caption) = &options.caption {
                    body.insert("caption".into(), json!(caption));
                }
            }
            (None, ContainerSource::Children(children)) => {
                if children.is_empty() {
                    return Err(InstagramError::InvalidMedia("carousel has no children".to_string()));
                }
                let caption = options
                    .caption
                    .clone()
                    .unwrap_or_else(|| self.config.carousel_caption.clone());
                body.insert("caption".into(), json!(caption));
                body.insert("children".into(), json!(children));
            }
            (Some(_), ContainerSource::Children(_)) => {
                return Err(InstagramError::InvalidMedia(format!(
                    "{} containers take a media URL, not children",
                    media_type
                )))
            }
            (None, ContainerSource::Url(_)) => {
                return Err(InstagramError::InvalidMedia(
                    "CAROUSEL containers take child container ids".to_string(),
                ))
            }
        }

        if options.is_carousel_item {
            body.insert("is_carousel_item".into(), json!(true));
        }
        if let Some(upload_type) = options.upload_type {
            body.insert("upload_type".into(), json!(upload_type.as_str()));
        }

        Ok(Value::Object(body))
    }

    /// One status query, no waiting.
    pub async fn container_status(
        &self,
        container_id: &str,
        access_token: &AccessToken,
    ) -> InstagramResult<ContainerStatus> {
        let request = HttpRequest::get(self.config.graph_url(container_id))
            .query("fields", "status_code")
            .query("access_token", access_token.as_str());

        let payload = decode_response(self.http.execute(request).await)?;

        Ok(ContainerStatus::from_payload(&payload))
    }

    pub async fn wait_until_finished(
        &self,
        container_id: &str,
        access_token: &AccessToken,
        cancel: &CancellationToken,
    ) -> InstagramResult<()> {
        let poll = self.config.poll;
        let interval = poll.interval.max(MIN_POLL_INTERVAL);
        let started = Instant::now();
        // `None` when the timeout is too large to represent: wait without a deadline.
        let deadline = started.checked_add(poll.timeout);
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(InstagramError::Cancelled {
                    container_id: container_id.to_string(),
                });
            }

            attempts += 1;
            let status = self.container_status(container_id, access_token).await?;
            debug!("Container {} status {} (attempt {})", container_id, status.as_str(), attempts);

            if status == ContainerStatus::Finished {
                info!("Container {} finished after {} status checks", container_id, attempts);
                return Ok(());
            }

            if status.is_terminal_failure() {
                error!("Container {} failed with status {}", container_id, status.as_str());
                return Err(InstagramError::ContainerFailed {
                    container_id: container_id.to_string(),
                    status: status.as_str().to_string(),
                });
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    warn!("Gave up on container {} after {:?}", container_id, now - started);
                    return Err(InstagramError::Timeout {
                        container_id: container_id.to_string(),
                        waited: now - started,
                    });
                }
                Some(deadline) => interval.min(deadline - now),
                None => interval,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stopped waiting for container {}: cancelled", container_id);
                    return Err(InstagramError::Cancelled {
                        container_id: container_id.to_string(),
                    });
                }
                _ = sleep(pause) => {}
            }
        }
    }
}
