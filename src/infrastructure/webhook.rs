//! Stripe webhook signature verification and event parsing.
//!
//! `Stripe-Signature` header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`.
//! The signed payload is `"{t}.{raw body}"`, keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header name the provider signs deliveries with.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Malformed signature header")]
    MalformedHeader,
    #[error("No signature matches the payload")]
    SignatureMismatch,
    #[error("Timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_COMPLETED
    }

    /// Id of the object the event is about (the checkout session id for
    /// completed checkouts).
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    pub fn metadata(&self) -> &serde_json::Value {
        self.data
            .object
            .get("metadata")
            .unwrap_or(&serde_json::Value::Null)
    }
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    pub fn new(secret: String, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verify the signature against `now` (unix seconds) and parse the event.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify(payload, signature_header, now)?;
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let mut kv = part.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(v)) => timestamp = Some(v),
                (Some("v1"), Some(v)) => signatures.push(v),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        let issued_at: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }

        let expected = self.sign(timestamp, payload);
        let matched = signatures
            .iter()
            .any(|sig| bool::from(expected.as_bytes().ct_eq(sig.as_bytes())));
        if !matched {
            return Err(WebhookError::SignatureMismatch);
        }

        if self.tolerance_secs > 0
            && now.abs_diff(issued_at) > self.tolerance_secs.unsigned_abs()
        {
            return Err(WebhookError::TimestampOutOfTolerance);
        }

        Ok(())
    }

    /// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
    pub fn sign(&self, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can use any key length");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// A complete header value for `payload` signed at `timestamp`.
    pub fn signature_header(&self, timestamp: i64, payload: &[u8]) -> String {
        let ts = timestamp.to_string();
        format!("t={},v1={}", ts, self.sign(&ts, payload))
    }
}
