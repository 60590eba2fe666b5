// Rust guideline compliant 2026-10-12

//! ClickSend adapter for the `SmsDispatcher` port.
//!
//! One `POST /sms/send` per message with HTTP basic auth. The per-message
//! status string is passed back as-is; it is not validated here.

use domain::{DispatchError, SmsDispatcher, SmsReceipt};
use serde::{Deserialize, Serialize};

use crate::config::ClickSendSettings;

/// Sender name shown on handsets.
const SENDER: &str = "Alertas";
/// Free-form tag ClickSend stores with each message.
const SOURCE_TAG: &str = "flood_alert";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    messages: [OutboundMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    source: &'a str,
    body: &'a str,
    to: &'a str,
    from: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(default)]
    messages: Vec<MessageStatus>,
}

#[derive(Debug, Deserialize)]
struct MessageStatus {
    status: Option<String>,
}

fn request_body<'a>(destination: &'a str, body: &'a str) -> SendRequest<'a> {
    SendRequest {
        messages: [OutboundMessage { source: SOURCE_TAG, body, to: destination, from: SENDER }],
    }
}

/// Extract the first message status; an unreadable body yields `None`.
fn parse_receipt(body: &str) -> SmsReceipt {
    let status = serde_json::from_str::<SendResponse>(body)
        .ok()
        .and_then(|r| r.data)
        .and_then(|d| d.messages.into_iter().next())
        .and_then(|m| m.status);
    SmsReceipt { status }
}

/// `SmsDispatcher` adapter for the ClickSend REST API.
#[derive(Debug, Clone)]
pub struct ClickSendSms {
    client: reqwest::Client,
    url: String,
    username: String,
    api_key: String,
}

impl ClickSendSms {
    /// Create a dispatcher sharing `client` with other adapters.
    #[must_use]
    pub fn new(client: reqwest::Client, settings: &ClickSendSettings) -> Self {
        Self {
            client,
            url: format!("{}/sms/send", settings.base_url.trim_end_matches('/')),
            username: settings.username.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

impl SmsDispatcher for ClickSendSms {
    /// # Errors
    ///
    /// `Unreachable` on transport failures and 5xx answers, `Rejected` on 4xx.
    async fn send(&self, destination: &str, body: &str) -> Result<SmsReceipt, DispatchError> {
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.api_key))
            .json(&request_body(destination, body))
            .send()
            .await
            .map_err(|e| DispatchError::Unreachable { reason: e.to_string() })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Unreachable { reason: e.to_string() })?;

        if status.is_client_error() {
            return Err(DispatchError::Rejected { reason: format!("{status}: {text}") });
        }
        if !status.is_success() {
            return Err(DispatchError::Unreachable { reason: format!("{status}: {text}") });
        }

        let receipt = parse_receipt(&text);
        tracing::debug!(
            status = receipt.status.as_deref().unwrap_or("unknown"),
            "clicksend.sms.accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_receipt, request_body};

    #[test]
    fn request_body_shape() {
        let json = serde_json::to_value(request_body("+5511987654321", "hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [{
                    "source": "flood_alert",
                    "body": "hello",
                    "to": "+5511987654321",
                    "from": "Alertas"
                }]
            })
        );
    }

    #[test]
    fn receipt_reads_first_message_status() {
        let body = r#"{
            "http_code": 200, "response_code": "SUCCESS",
            "data": {"total_count": 1, "messages": [{"to": "+5511987654321", "status": "SUCCESS"}]}
        }"#;
        assert_eq!(parse_receipt(body).status.as_deref(), Some("SUCCESS"));
    }

    #[test]
    fn receipt_tolerates_unexpected_bodies() {
        assert_eq!(parse_receipt("not json").status, None);
        assert_eq!(parse_receipt(r#"{"data": {"messages": []}}"#).status, None);
    }
}
