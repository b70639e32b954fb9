use crate::application::{GenerationError, PaymentError};
use crate::infrastructure::RepositoryError;
use axum::http::StatusCode;

pub(super) fn map_generation_error(err: &GenerationError) -> (StatusCode, serde_json::Value) {
    match err {
        GenerationError::InvalidInput(msg) => {
            (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
        }
        GenerationError::AccountNotFound(_) => {
            (StatusCode::NOT_FOUND, serde_json::json!({ "error": "User not found" }))
        }
        GenerationError::InsufficientCredits => (
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error": "Not enough credits" }),
        ),
        GenerationError::GenerationFailed(_) => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({ "error": "Failed to generate blog, please retry" }),
        ),
        GenerationError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Text generation not configured" }),
        ),
        GenerationError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Something went wrong" }),
        ),
    }
}

pub(super) fn map_checkout_error(err: &PaymentError) -> (StatusCode, serde_json::Value) {
    match err {
        PaymentError::InvalidInput(msg) => {
            (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
        }
        PaymentError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Stripe not configured" }),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to create checkout session" }),
        ),
    }
}

/// Non-2xx only when the provider should retry (store failure) or the
/// delivery is not trusted.
pub(super) fn map_webhook_error(err: &PaymentError) -> (StatusCode, serde_json::Value) {
    match err {
        PaymentError::Unauthorized(msg) => {
            (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
        }
        PaymentError::InvalidPayload(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "Invalid webhook payload" }),
        ),
        PaymentError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Webhook not configured" }),
        ),
        PaymentError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to process payment" }),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Webhook processing failed" }),
        ),
    }
}

pub(super) fn map_account_read_error(err: &RepositoryError) -> (StatusCode, serde_json::Value) {
    match err {
        RepositoryError::NotFound(_) => {
            (StatusCode::NOT_FOUND, serde_json::json!({ "error": "Account not found" }))
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to get account" }),
        ),
    }
}

pub(super) fn map_account_create_error(err: &RepositoryError) -> (StatusCode, serde_json::Value) {
    match err {
        RepositoryError::Conflict(_) => (
            StatusCode::CONFLICT,
            serde_json::json!({ "error": "Account already exists" }),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Failed to create account" }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::GatewayError;

    #[test]
    fn generation_errors_follow_taxonomy() {
        let cases = [
            (GenerationError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (GenerationError::AccountNotFound("u".into()), StatusCode::NOT_FOUND),
            (GenerationError::InsufficientCredits, StatusCode::FORBIDDEN),
            (GenerationError::GenerationFailed("empty".into()), StatusCode::BAD_GATEWAY),
            (GenerationError::Configuration("k".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                GenerationError::Repository(RepositoryError::InvalidData("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(map_generation_error(&err).0, expected, "{err}");
        }
    }

    #[test]
    fn webhook_rejections_are_400_and_store_failures_500() {
        assert_eq!(
            map_webhook_error(&PaymentError::Unauthorized("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            map_webhook_error(&PaymentError::InvalidPayload("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            map_webhook_error(&PaymentError::Repository(RepositoryError::NotFound("u".into()))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn checkout_gateway_errors_do_not_leak_details() {
        let (status, body) = map_checkout_error(&PaymentError::Gateway(GatewayError::Api {
            status: 402,
            body: "sk_live_secret".into(),
        }));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("sk_live_secret"));
    }

    #[test]
    fn account_errors_map_not_found_and_conflict() {
        assert_eq!(
            map_account_read_error(&RepositoryError::NotFound("u".into())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            map_account_create_error(&RepositoryError::Conflict("u".into())).0,
            StatusCode::CONFLICT
        );
    }
}
