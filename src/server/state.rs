use crate::application::{CheckoutRedirects, GenerationService, PaymentService};
use crate::domain::PriceTable;
use crate::infrastructure::{
    AccountRepository, AppConfig, OpenAiClient, PaymentGateway, PostgresAccountRepository,
    StripeClient, TextGenerator, WebhookVerifier,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

pub type GenerationServiceType = GenerationService<dyn AccountRepository, dyn TextGenerator>;

pub type PaymentServiceType = PaymentService<dyn AccountRepository, dyn PaymentGateway>;

#[derive(Clone)]
pub struct AppState {
    pub account_repo: Arc<dyn AccountRepository>,
    pub generation: Arc<GenerationServiceType>,
    pub payments: Arc<PaymentServiceType>,
    /// Browser origin allowed by CORS.
    pub app_url: String,
}

impl AppState {
    /// Wire services from already-built collaborators.
    pub fn new(
        account_repo: Arc<dyn AccountRepository>,
        generator: Arc<dyn TextGenerator>,
        gateway: Arc<dyn PaymentGateway>,
        verifier: Option<WebhookVerifier>,
        prices: PriceTable,
        app_url: String,
    ) -> Self {
        let generation = Arc::new(GenerationService::new(account_repo.clone(), generator));
        let payments = Arc::new(PaymentService::new(
            account_repo.clone(),
            gateway,
            verifier,
            prices,
            CheckoutRedirects::from_app_url(&app_url),
        ));

        Self {
            account_repo,
            generation,
            payments,
            app_url,
        }
    }
}

/// Build full state from config + an existing pool.
///
/// Intended for embedding into a larger service that already manages a `PgPool`.
pub async fn build_state_with_pool(
    config: AppConfig,
    pool: PgPool,
    run_migrations: bool,
) -> anyhow::Result<AppState> {
    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
    }

    let prices = config.price_table();
    if config.stripe_price_starter.is_none() || config.stripe_price_pro.is_none() {
        warn!("Stripe price ids are not fully configured; unmatched checkouts grant no credits");
    }

    let verifier = config
        .stripe_webhook_secret
        .filter(|s| !s.trim().is_empty())
        .map(|secret| WebhookVerifier::new(secret, config.webhook_tolerance_secs));
    if verifier.is_none() {
        warn!("Stripe webhook secret is not configured; webhooks will be rejected");
    }

    let generator = Arc::new(
        OpenAiClient::new(
            config.openai_api_key,
            config.openai_model,
            config.openai_base_url,
        )
        .context("init OpenAI client")?,
    );
    info!(model = %generator.model(), "Text generator configured");

    let gateway = Arc::new(
        StripeClient::new(config.stripe_secret_key, config.stripe_api_base)
            .context("init Stripe client")?,
    );
    if !gateway.is_configured() {
        warn!("Stripe secret key is not configured; checkout is unavailable");
    }

    let account_repo = Arc::new(PostgresAccountRepository::new(pool));

    Ok(AppState::new(
        account_repo,
        generator,
        gateway,
        verifier,
        prices,
        config.app_url,
    ))
}

/// Build state for the standalone server.
///
/// Creates the `PgPool`, runs migrations, and wires repositories/services.
pub async fn build_state_from_env(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("connect database")?;
    build_state_with_pool(config, pool, true).await
}
