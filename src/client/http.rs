//! HTTP implementation of [`PrinterApi`] over reqwest.

use super::{ClientError, CommandAck, PrinterApi, SessionStore};
use crate::config::{BackendConfig, EndpointsConfig, PRINTER_ID_PLACEHOLDER};
use crate::registry::{NewPrinter, Printer, PrinterId};
use crate::telemetry::TelemetrySnapshot;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Longest error body kept in `ClientError::Http` messages.
const MAX_ERROR_BODY: usize = 256;

/// Talks to the printer REST backend.
pub struct HttpPrinterApi {
    /// Base URL without trailing slash
    base_url: String,
    /// Endpoint path templates
    endpoints: EndpointsConfig,
    /// Shared HTTP client for connection pooling
    client: Client,
    /// Per-request timeout, reported in timeout errors
    timeout_seconds: u64,
    /// Source of the bearer token, read on every request
    session: Option<Arc<dyn SessionStore>>,
}

impl HttpPrinterApi {
    /// Create a client with its own connection pool.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client around an existing reqwest client (for testing).
    pub fn with_client(config: &BackendConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            client,
            timeout_seconds: config.timeout_seconds,
            session: None,
        }
    }

    /// Attach the store the bearer token is loaded from.
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    fn url(&self, template: &str, id: Option<&PrinterId>) -> Result<String, ClientError> {
        let path = match id {
            Some(id) if !id.is_path_safe() => {
                return Err(ClientError::InvalidPrinterId(id.to_string()));
            }
            Some(id) => template.replace(PRINTER_ID_PLACEHOLDER, id.as_str()),
            None => template.to_string(),
        };
        Ok(format!("{}{}", self.base_url, path))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(store) = &self.session else {
            return request;
        };
        match store.load_token() {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session token, sending request without it");
                request
            }
        }
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self
            .authorize(request)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            text => text.chars().take(MAX_ERROR_BODY).collect(),
        };
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn body_text(&self, response: Response) -> Result<String, ClientError> {
        response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout_seconds))
    }

    async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, ClientError> {
        let body = self.body_text(response).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PrinterApi for HttpPrinterApi {
    async fn list_printers(&self) -> Result<Vec<Printer>, ClientError> {
        let url = self.url(&self.endpoints.printers, None)?;
        let response = self.send(self.client.get(&url)).await?;
        let printers: Option<Vec<Printer>> = self.json(response).await?;
        Ok(printers.unwrap_or_default())
    }

    async fn fetch_state(&self, id: &PrinterId) -> Result<Option<TelemetrySnapshot>, ClientError> {
        let url = self.url(&self.endpoints.state, Some(id))?;
        let response = self.send(self.client.get(&url)).await?;
        let body = self.body_text(response).await?;

        match body.trim() {
            "" | "null" => Ok(None),
            text => serde_json::from_str(text)
                .map(Some)
                .map_err(|e| ClientError::InvalidResponse(e.to_string())),
        }
    }

    async fn fetch_history(
        &self,
        id: &PrinterId,
        limit: u32,
    ) -> Result<Vec<TelemetrySnapshot>, ClientError> {
        let url = self.url(&self.endpoints.history, Some(id))?;
        let request = self.client.get(&url).query(&[("limit", limit)]);
        let response = self.send(request).await?;
        let history: Option<Vec<TelemetrySnapshot>> = self.json(response).await?;
        Ok(history.unwrap_or_default())
    }

    async fn send_command(&self, id: &PrinterId, command: &str) -> Result<CommandAck, ClientError> {
        let url = self.url(&self.endpoints.command, Some(id))?;
        let request = self.client.post(&url).json(&json!({ "command": command }));
        let response = self.send(request).await?;
        let body = self.body_text(response).await?;

        // Some backends answer with plain text instead of JSON
        match body.trim() {
            "" => Ok(CommandAck::default()),
            text => Ok(serde_json::from_str(text).unwrap_or_else(|_| CommandAck {
                success: Some(true),
                message: Some(text.to_string()),
            })),
        }
    }

    async fn create_printer(&self, printer: &NewPrinter) -> Result<Printer, ClientError> {
        let url = self.url(&self.endpoints.printers, None)?;
        let response = self.send(self.client.post(&url).json(printer)).await?;
        self.json(response).await
    }
}
