//! HTTP transport to the CRUD backend (reqwest)
//!
//! Every verb is a JSON request to `{base_url}/api/<model>/<verb>`; non-2xx
//! answers become [`AdminError::Backend`] carrying the backend's message.

use crate::config::BackendConfig;
use crate::core::entity::EntityModel;
use crate::core::error::AdminError;
use crate::core::operation::{CrudOp, HttpMethod};
use crate::core::service::CrudService;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Result<Self, AdminError> {
        Self::from_config(&BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, AdminError> {
        // A trailing slash makes relative joins keep the base path
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| AdminError::Config(format!("invalid base URL '{}': {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AdminError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, AdminError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AdminError::Config(format!("invalid request path '{path}': {e}")))
    }

    async fn send(&self, method: HttpMethod, path: &str, body: Option<Value>) -> Result<Value, AdminError> {
        let url = self.url(path)?;
        let method = match method {
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
        };
        tracing::debug!(method = %method, url = %url, "backend request");

        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdminError::transport(path, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AdminError::transport(path, e))?;

        let payload = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(_) if !status.is_success() => Some(Value::String(text)),
                Err(e) => return Err(AdminError::decode(path, e)),
            }
        };

        if !status.is_success() {
            let error = AdminError::backend(path, status.as_u16(), payload);
            tracing::warn!(path, status = status.as_u16(), error = %error, "backend rejected request");
            return Err(error);
        }
        Ok(payload.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl CrudService for HttpService {
    async fn call(&self, model: &EntityModel, op: CrudOp, body: Option<Value>) -> Result<Value, AdminError> {
        let path = model.operation_path(op.path());
        self.send(op.method(), &path, body).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, AdminError> {
        self.send(HttpMethod::Post, path, Some(body)).await
    }
}
