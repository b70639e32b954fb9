use crate::domain::PriceTable;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Public base URL of the web app; checkout redirects are built from it.
    pub app_url: String,

    // Text generation
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,

    // Payments
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub stripe_price_starter: Option<String>,
    pub stripe_price_pro: Option<String>,
    pub starter_credits: i64,
    pub pro_credits: i64,
    pub webhook_tolerance_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("BLOGFORGE").try_parsing(true))
            .set_default("server_host", "0.0.0.0")?
            .set_default("server_port", 8080)?
            .set_default("app_url", "http://localhost:3000")?
            .set_default("openai_model", "gpt-4o-mini")?
            .set_default("openai_base_url", "https://api.openai.com/v1")?
            .set_default("stripe_api_base", "https://api.stripe.com/v1")?
            .set_default("starter_credits", 50)?
            .set_default("pro_credits", 200)?
            .set_default("webhook_tolerance_secs", 300)?
            .build()?;

        config.try_deserialize()
    }

    pub fn price_table(&self) -> PriceTable {
        PriceTable::from_prices(
            self.stripe_price_starter.as_deref(),
            self.starter_credits,
            self.stripe_price_pro.as_deref(),
            self.pro_credits,
        )
    }
}
