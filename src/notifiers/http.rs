use super::payload::Payload;
use super::NOTIFY_TIMEOUT;
use crate::core::error::{LoggerError, Result};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;

/// Webhook delivery over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    webhook_url: String,
    auth_token: Option<String>,
    method: Method,
    client: Client,
}

impl HttpNotifier {
    /// `method` defaults to `POST` when empty
    pub fn new(
        webhook_url: impl Into<String>,
        auth_token: Option<String>,
        method: &str,
    ) -> Result<Self> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(LoggerError::config("http notifier", "webhook_url is required"));
        }
        let method = if method.trim().is_empty() {
            Method::POST
        } else {
            Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
                LoggerError::config("http notifier", format!("invalid http_method '{}'", method))
            })?
        };
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| LoggerError::config("http notifier", e.to_string()))?;

        Ok(Self {
            webhook_url,
            auth_token: auth_token.filter(|t| !t.is_empty()),
            method,
            client,
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub(crate) fn send(&self, notifier: &str, payload: &Payload) -> Result<()> {
        let body = payload.to_json()?;
        let mut request = self
            .client
            .request(self.method.clone(), &self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .map_err(|e| LoggerError::transport(notifier, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoggerError::bad_status(notifier, status.as_u16()));
        }
        Ok(())
    }
}
