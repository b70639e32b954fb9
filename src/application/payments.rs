use crate::domain::{CheckoutIntent, CreditGrant, GrantOutcome, Plan, PriceTable};
use crate::infrastructure::{
    AccountRepository, CheckoutSessionRequest, GatewayError, PaymentGateway, RepositoryError,
    WebhookError, WebhookVerifier,
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnhandledEventType,
    MissingMetadata,
    UnknownPrice,
}

/// Result of an accepted (signature-valid) notification. Every variant is
/// acknowledged to the provider with a 2xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Granted {
        account_id: String,
        plan: Plan,
        credits: i64,
    },
    Duplicate {
        session_id: String,
    },
    Ignored(IgnoreReason),
}

/// Where the provider sends the user after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirects {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRedirects {
    pub fn from_app_url(app_url: &str) -> Self {
        let base = app_url.trim_end_matches('/');
        Self {
            success_url: format!("{}/success", base),
            cancel_url: format!("{}/pricing", base),
        }
    }
}

pub struct PaymentService<A, P>
where
    A: AccountRepository + ?Sized,
    P: PaymentGateway + ?Sized,
{
    account_repo: Arc<A>,
    gateway: Arc<P>,
    verifier: Option<WebhookVerifier>,
    prices: PriceTable,
    redirects: CheckoutRedirects,
}

impl<A, P> PaymentService<A, P>
where
    A: AccountRepository + ?Sized,
    P: PaymentGateway + ?Sized,
{
    pub fn new(
        account_repo: Arc<A>,
        gateway: Arc<P>,
        verifier: Option<WebhookVerifier>,
        prices: PriceTable,
        redirects: CheckoutRedirects,
    ) -> Self {
        Self {
            account_repo,
            gateway,
            verifier,
            prices,
            redirects,
        }
    }

    /// Open a subscription checkout and return the provider's redirect URL.
    pub async fn start_checkout(
        &self,
        account_id: &str,
        price_id: &str,
    ) -> Result<String, PaymentError> {
        let account_id = account_id.trim();
        let price_id = price_id.trim();
        if account_id.is_empty() || price_id.is_empty() {
            return Err(PaymentError::InvalidInput(
                "Missing priceId or uid".to_string(),
            ));
        }

        let intent = CheckoutIntent::new(account_id.to_string(), price_id.to_string());
        let request = CheckoutSessionRequest {
            price_id: intent.price_id.clone(),
            success_url: self.redirects.success_url.clone(),
            cancel_url: self.redirects.cancel_url.clone(),
            metadata: intent.to_metadata(),
        };

        info!(account_id = %account_id, price_id = %price_id, "Creating checkout session");

        let session = match self.gateway.create_checkout_session(&request).await {
            Ok(s) => s,
            Err(GatewayError::NotConfigured) => {
                error!("Payment provider credential is not configured");
                return Err(PaymentError::Configuration(
                    "payment provider is not configured".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        match session.url {
            Some(url) if !url.is_empty() => {
                info!(session_id = %session.id, "Checkout session created");
                Ok(url)
            }
            _ => Err(GatewayError::MissingRedirect(session.id).into()),
        }
    }

    pub async fn handle_notification(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<NotificationOutcome, PaymentError> {
        self.handle_notification_at(raw_body, signature_header, Utc::now().timestamp())
            .await
    }

    /// Same as `handle_notification` with an explicit clock (unix seconds).
    pub async fn handle_notification_at(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<NotificationOutcome, PaymentError> {
        let signature = signature_header
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PaymentError::Unauthorized("Missing stripe-signature header".to_string()))?;

        let verifier = self.verifier.as_ref().ok_or_else(|| {
            error!("Webhook secret is not configured");
            PaymentError::Configuration("webhook secret is not configured".to_string())
        })?;

        let event = verifier
            .construct_event(raw_body, signature, now)
            .map_err(|e| match e {
                WebhookError::InvalidPayload(msg) => PaymentError::InvalidPayload(msg),
                other => {
                    warn!(error = %other, "Webhook signature verification failed");
                    PaymentError::Unauthorized("Invalid webhook signature".to_string())
                }
            })?;

        if !event.is_checkout_completed() {
            info!(event_id = %event.id, event_type = %event.event_type, "Ignoring webhook event");
            return Ok(NotificationOutcome::Ignored(IgnoreReason::UnhandledEventType));
        }

        let Some(intent) = CheckoutIntent::from_metadata(event.metadata()) else {
            warn!(event_id = %event.id, "Webhook received without uid or priceId");
            return Ok(NotificationOutcome::Ignored(IgnoreReason::MissingMetadata));
        };

        let Some(tier) = self.prices.lookup(&intent.price_id) else {
            warn!(
                event_id = %event.id,
                account_id = %intent.account_id,
                price_id = %intent.price_id,
                "Webhook for unknown price, granting nothing"
            );
            return Ok(NotificationOutcome::Ignored(IgnoreReason::UnknownPrice));
        };

        let grant = CreditGrant {
            session_id: event.object_id().unwrap_or(&event.id).to_string(),
            account_id: intent.account_id,
            price_id: intent.price_id,
            plan: tier.plan,
            credits: tier.credits,
        };

        info!(
            account_id = %grant.account_id,
            session_id = %grant.session_id,
            credits = grant.credits,
            "Processing payment"
        );

        match self.account_repo.apply_credit_grant(&grant).await {
            Ok(GrantOutcome::Applied) => {
                info!(
                    account_id = %grant.account_id,
                    plan = %grant.plan,
                    credits = grant.credits,
                    "Credit grant applied"
                );
                Ok(NotificationOutcome::Granted {
                    account_id: grant.account_id,
                    plan: grant.plan,
                    credits: grant.credits,
                })
            }
            Ok(GrantOutcome::Duplicate) => {
                info!(session_id = %grant.session_id, "Checkout session already processed");
                Ok(NotificationOutcome::Duplicate {
                    session_id: grant.session_id,
                })
            }
            Err(e) => {
                error!(account_id = %grant.account_id, error = %e, "Failed to apply credit grant");
                Err(e.into())
            }
        }
    }
}
