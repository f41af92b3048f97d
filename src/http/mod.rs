mod decode;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderValue},
    Client, Method, StatusCode,
};
use serde_json::Value;

pub use decode::*;

use crate::{config::ClientConfig, error::TransportError};

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(body) => Some(body),
            _ => None,
        }
    }

    pub fn form_fields(&self) -> Option<&[(String, String)]> {
        match &self.body {
            RequestBody::Form(fields) => Some(fields),
            _ => None,
        }
    }

    /// Value of a query parameter or top-level JSON body field.
    pub fn param(&self, key: &str) -> Option<String> {
        if let Some((_, value)) = self.query.iter().find(|(k, _)| k == key) {
            return Some(value.clone());
        }
        match &self.body {
            RequestBody::Json(body) => body.get(key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            RequestBody::Form(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
            RequestBody::Empty => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone)]
pub struct HttpService {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpService {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, TransportError> {
        info!("Initializing HttpService...");

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        info!("HttpService initialized");
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HttpClient for HttpService {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("Making {} request to {}", request.method, request.url);

        // reqwest only fills Content-Type when it is absent, so form bodies
        // must replace the configured JSON default before it is applied.
        let mut headers = self.config.default_headers.clone();
        if let RequestBody::Form(_) = request.body {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }

        let mut builder = self.client.request(request.method, &request.url).headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", request.url, e);
            TransportError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        debug!("Response status: {}", status);

        Ok(HttpResponse { status, body })
    }
}
