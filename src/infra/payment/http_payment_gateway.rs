use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub struct HttpPaymentGateway {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }

    async fn post(&self, path: &str, payload: &impl Serialize) -> Result<reqwest::Response, AppError> {
        let res = self.client.post(format!("{}/{}", self.api_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;
        Ok(res)
    }
}

#[derive(Serialize)]
struct AuthorizeRequest<'a> {
    client_id: &'a str,
    amount_cents: i64,
}

#[derive(Deserialize)]
struct AuthorizeResponse {
    auth_id: String,
}

#[derive(Serialize)]
struct CaptureRequest<'a> {
    auth_id: &'a str,
}

#[derive(Serialize)]
struct RefundRequest<'a> {
    auth_id: &'a str,
    amount_cents: i64,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn authorize(&self, client_id: &str, amount_cents: i64) -> Result<String, AppError> {
        let res = self.post("authorize", &AuthorizeRequest { client_id, amount_cents }).await?;

        if res.status() == reqwest::StatusCode::PAYMENT_REQUIRED {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::PaymentDeclined(text));
        }
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Payment authorize failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let body: AuthorizeResponse = res.json().await
            .map_err(|e| AppError::InternalWithMsg(format!("Malformed authorize response: {}", e)))?;
        Ok(body.auth_id)
    }

    async fn capture(&self, auth_id: &str) -> Result<(), AppError> {
        let res = self.post("capture", &CaptureRequest { auth_id }).await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Payment capture failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }
        Ok(())
    }

    async fn refund(&self, auth_id: &str, amount_cents: i64) -> Result<(), AppError> {
        let res = self.post("refund", &RefundRequest { auth_id, amount_cents }).await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Payment refund failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }
        Ok(())
    }
}
