use crate::domain::{ChatPrompt, GenerationRecord, Tone};
use crate::infrastructure::{AccountRepository, GeneratorError, RepositoryError, TextGenerator};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Not enough credits")]
    InsufficientCredits,
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Spends one credit per successful generation.
///
/// The credit is reserved with a conditional decrement before the model is
/// called and handed back if the call fails or yields no text, so concurrent
/// requests cannot overdraw the balance and a failed call costs nothing.
pub struct GenerationService<A, G>
where
    A: AccountRepository + ?Sized,
    G: TextGenerator + ?Sized,
{
    account_repo: Arc<A>,
    generator: Arc<G>,
}

impl<A, G> GenerationService<A, G>
where
    A: AccountRepository + ?Sized,
    G: TextGenerator + ?Sized,
{
    pub fn new(account_repo: Arc<A>, generator: Arc<G>) -> Self {
        Self {
            account_repo,
            generator,
        }
    }

    pub async fn generate(
        &self,
        account_id: &str,
        topic: &str,
        tone: Tone,
    ) -> Result<String, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::InvalidInput("topic must not be empty".to_string()));
        }

        let account = match self.account_repo.get_by_id(account_id).await {
            Ok(a) => a,
            Err(RepositoryError::NotFound(_)) => {
                return Err(GenerationError::AccountNotFound(account_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if !account.has_credits() {
            return Err(GenerationError::InsufficientCredits);
        }

        if !self.account_repo.reserve_credit(account_id).await? {
            // Another request spent the last credit in between.
            return Err(GenerationError::InsufficientCredits);
        }

        let prompt = ChatPrompt::blog_post(topic, &tone);
        let text = match self.generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!(account_id = %account_id, "Generator returned empty text");
                self.refund(account_id).await?;
                return Err(GenerationError::GenerationFailed(
                    "empty generation result".to_string(),
                ));
            }
            Err(GeneratorError::NotConfigured) => {
                error!("Text generation credential is not configured");
                self.refund(account_id).await?;
                return Err(GenerationError::Configuration(
                    "text generation is not configured".to_string(),
                ));
            }
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Generator call failed");
                self.refund(account_id).await?;
                return Err(GenerationError::GenerationFailed(e.to_string()));
            }
        };

        let record = GenerationRecord::new(
            account_id.to_string(),
            topic.to_string(),
            tone,
            text.clone(),
        );
        if let Err(e) = self.account_repo.append_generation(&record).await {
            // History is best-effort; the credit stays spent.
            warn!(
                account_id = %account_id,
                generation_id = %record.id,
                error = %e,
                "Failed to append generation record"
            );
        }

        info!(
            account_id = %account_id,
            generation_id = %record.id,
            tone = %record.tone,
            "Generated blog post"
        );

        Ok(text)
    }

    async fn refund(&self, account_id: &str) -> Result<(), GenerationError> {
        self.account_repo
            .increment_credits(account_id, 1)
            .await
            .map_err(|e| {
                error!(account_id = %account_id, error = %e, "Failed to refund reserved credit");
                GenerationError::Repository(e)
            })
    }
}
