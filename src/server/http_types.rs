use crate::domain::{Account, GenerationRecord};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub(super) struct HealthResponse {
    pub(super) status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct ErrorResponse {
    pub(super) error: String,
}

/// Fields are optional so that a missing field is reported as 400 by the
/// handler rather than rejected by the extractor.
#[derive(Deserialize, Validate, ToSchema)]
pub(super) struct GenerateRequest {
    #[validate(length(max = 200))]
    #[schema(example = "AI in healthcare")]
    pub(super) keyword: Option<String>,
    #[validate(length(max = 40))]
    #[schema(example = "casual")]
    pub(super) tone: Option<String>,
    #[validate(length(max = 128))]
    #[schema(example = "u1")]
    pub(super) uid: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct GenerateResponse {
    pub(super) blog: String,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckoutRequest {
    #[validate(length(max = 255))]
    #[schema(example = "price_1Starter")]
    pub(super) price_id: Option<String>,
    #[validate(length(max = 128))]
    #[schema(example = "u1")]
    pub(super) uid: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct CheckoutResponse {
    pub(super) url: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct WebhookAck {
    pub(super) received: bool,
}

#[derive(Deserialize, Validate, ToSchema)]
pub(super) struct CreateAccountRequest {
    #[validate(length(min = 1, max = 128))]
    #[schema(example = "u1")]
    pub(super) uid: String,
    #[validate(email)]
    #[schema(example = "writer@example.com")]
    pub(super) email: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct AccountResponse {
    pub(super) id: String,
    pub(super) email: String,
    #[schema(example = "free")]
    pub(super) plan: String,
    pub(super) credits: i64,
    pub(super) created_at: chrono::DateTime<chrono::Utc>,
    pub(super) updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            plan: account.plan.to_string(),
            credits: account.credits,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct GenerationResponse {
    pub(super) id: Uuid,
    pub(super) keyword: String,
    pub(super) tone: String,
    pub(super) content: String,
    pub(super) created_at: chrono::DateTime<chrono::Utc>,
}

impl From<GenerationRecord> for GenerationResponse {
    fn from(record: GenerationRecord) -> Self {
        Self {
            id: record.id,
            keyword: record.topic,
            tone: record.tone.to_string(),
            content: record.content,
            created_at: record.created_at,
        }
    }
}

#[derive(Deserialize, Debug, IntoParams, ToSchema)]
pub(super) struct PaginationParams {
    #[serde(default = "default_limit")]
    #[param(default = 20, maximum = 100)]
    pub(super) limit: i64,
    #[serde(default)]
    #[param(default = 0)]
    pub(super) offset: i64,
}

pub(super) fn default_limit() -> i64 {
    20
}
