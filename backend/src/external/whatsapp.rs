//! WhatsApp Cloud API client for delivering verification codes

use axum::async_trait;
use serde_json::json;

use crate::config::WhatsAppConfig;
use crate::error::{AppError, AppResult};

/// Outbound channel for verification codes.
///
/// The production implementation talks to the WhatsApp Cloud API; tests
/// substitute a recording double.
#[async_trait]
pub trait VerificationSender: Send + Sync {
    async fn send_code(&self, phone: &str, code: &str) -> AppResult<()>;
}

/// Client for Meta's WhatsApp Cloud API
pub struct WhatsAppClient {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl VerificationSender for WhatsAppClient {
    async fn send_code(&self, phone: &str, code: &str) -> AppResult<()> {
        let url = format!(
            "{}/{}/messages",
            self.config.api_url, self.config.phone_number_id
        );

        // Cloud API expects the number without the leading '+'
        let to: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {
                "body": format!(
                    "Tu código de verificación de Mercado Express es: {code}. \
                     Vence en 5 minutos."
                )
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("WhatsApp request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %detail, "WhatsApp Cloud API rejected message");
            return Err(AppError::ServiceUnavailable(format!(
                "WhatsApp Cloud API returned {status}"
            )));
        }

        tracing::debug!(phone = %phone, "verification code delivered");
        Ok(())
    }
}
