use crate::domain::ports::NotificationDispatcher;
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{error, info};

/// Fire-and-forget dispatcher: the HTTP send runs on a spawned task and the
/// caller returns immediately. Delivery is at-least-once downstream, so
/// duplicate dispatches for the same (event, recipient, payload) are dropped
/// by content hash.
pub struct HttpNotificationDispatcher {
    client: Client,
    api_url: String,
    api_key: String,
    sent_hashes: Mutex<HashSet<String>>,
}

impl HttpNotificationDispatcher {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            sent_hashes: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn notify(&self, event_type: &str, recipient: &str, payload: serde_json::Value) {
        let mut hasher = Sha256::new();
        hasher.update(event_type.as_bytes());
        hasher.update(recipient.as_bytes());
        hasher.update(payload.to_string().as_bytes());
        let hash = hex::encode(hasher.finalize());

        {
            let mut sent = self.sent_hashes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if !sent.insert(hash) {
                info!("Notification skipped (duplicate): {} to {}", event_type, recipient);
                return;
            }
        }

        let body = serde_json::json!({
            "event_type": event_type,
            "recipient": recipient,
            "payload": payload,
        });
        let client = self.client.clone();
        let url = self.api_url.clone();
        let key = self.api_key.clone();
        let event = event_type.to_string();

        tokio::spawn(async move {
            let result = client.post(&url)
                .header("Authorization", format!("Bearer {}", key))
                .json(&body)
                .send()
                .await;
            match result {
                Ok(res) if res.status().is_success() => {}
                Ok(res) => error!("Notification '{}' rejected: status {}", event, res.status()),
                Err(e) => error!("Notification '{}' dispatch error: {}", event, e),
            }
        });
    }
}
