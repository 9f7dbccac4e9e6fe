//! SMS delivery through an HTTP provider

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::SmsConfig,
    error::{AppError, AppResult},
};

/// Provider answer for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub success: bool,
    pub message_id: Option<String>,
    /// Provider supplied failure description
    pub error: Option<String>,
}

/// Sends a text message to a phone number.
///
/// Transport failures are returned as `Err`; a provider that answers but
/// refuses the message yields `Ok` with `success == false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// False when no provider is configured; callers skip sending
    fn is_enabled(&self) -> bool;

    async fn send(&self, phone: &str, message: &str) -> AppResult<SendReceipt>;
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    from: &'a str,
    to: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ProviderResponse {
    #[serde(alias = "message_id", alias = "sid")]
    id: Option<String>,
    error: Option<String>,
}

/// JSON-over-HTTP SMS gateway
#[derive(Clone)]
pub struct HttpSmsNotifier {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsNotifier {
    pub fn new(config: SmsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build SMS client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for HttpSmsNotifier {
    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn send(&self, phone: &str, message: &str) -> AppResult<SendReceipt> {
        let mut request = self.client.post(&self.config.provider_url).json(&OutgoingMessage {
            from: &self.config.sender,
            to: phone,
            text: message,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Notifier(format!("SMS provider unreachable: {}", e)))?;
        let status = response.status();
        let body: Option<ProviderResponse> = response.json().await.ok();

        tracing::debug!("SMS provider answered {} for {}", status, phone);

        Ok(match body {
            Some(body) => SendReceipt {
                success: status.is_success() && body.error.is_none(),
                message_id: body.id,
                error: body.error.or_else(|| {
                    (!status.is_success()).then(|| format!("Provider returned {}", status))
                }),
            },
            None => SendReceipt {
                success: status.is_success(),
                message_id: None,
                error: (!status.is_success()).then(|| format!("Provider returned {}", status)),
            },
        })
    }
}

/// Used when SMS is switched off in configuration
#[derive(Clone, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _phone: &str, _message: &str) -> AppResult<SendReceipt> {
        Err(AppError::Notifier("SMS delivery is disabled".to_string()))
    }
}
