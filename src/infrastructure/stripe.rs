use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Payment provider is not configured")]
    NotConfigured,
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Checkout session {0} has no redirect URL")]
    MissingRedirect(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Subscription-mode checkout for a single price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Echoed back unchanged on the completion webhook.
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;
}

pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>, base_url: String) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                GatewayError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }
}

/// Stripe's bracketed form encoding for a checkout session.
fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "subscription".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{}]", key), value.clone()));
    }

    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let secret_key = self.secret_key.as_deref().ok_or(GatewayError::NotConfigured)?;

        let resp = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(secret_key)
            .form(&checkout_form(request))
            .send()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Api { status, body });
        }

        resp.json::<CheckoutSession>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            price_id: "price_123".to_string(),
            success_url: "https://app.example.com/success".to_string(),
            cancel_url: "https://app.example.com/pricing".to_string(),
            metadata: BTreeMap::from([
                ("priceId".to_string(), "price_123".to_string()),
                ("uid".to_string(), "u1".to_string()),
            ]),
        }
    }

    #[test]
    fn checkout_form_encodes_subscription_line_item_and_metadata() {
        let form = checkout_form(&request());
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("line_items[0][price]"), Some("price_123"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(get("success_url"), Some("https://app.example.com/success"));
        assert_eq!(get("cancel_url"), Some("https://app.example.com/pricing"));
        assert_eq!(get("metadata[uid]"), Some("u1"));
        assert_eq!(get("metadata[priceId]"), Some("price_123"));
    }

    #[tokio::test]
    async fn missing_secret_key_reports_not_configured() {
        let client = StripeClient::new(None, "https://api.stripe.com/v1".to_string()).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.create_checkout_session(&request()).await,
            Err(GatewayError::NotConfigured)
        ));
    }

    #[test]
    fn checkout_session_response_tolerates_null_url() {
        let session: CheckoutSession =
            serde_json::from_str(r#"{"id":"cs_test_1","url":null,"object":"checkout.session"}"#)
                .unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert!(session.url.is_none());
    }
}
