use crate::domain::{Account, CreditGrant, GenerationRecord, GrantOutcome, Plan, Tone};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use thiserror::Error;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Account store. The credit balance is only ever changed through
/// `reserve_credit`, `increment_credits` and `apply_credit_grant`, all of
/// which are relative updates evaluated by the store.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    #[must_use]
    async fn create(&self, account: &Account) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError>;
    /// Atomically take one credit if the balance is positive.
    /// Returns `false` (and changes nothing) when the balance is zero.
    #[must_use]
    async fn reserve_credit(&self, id: &str) -> Result<bool, RepositoryError>;
    /// Relative add to the balance. Used to hand back a reserved credit.
    #[must_use]
    async fn increment_credits(&self, id: &str, delta: i64) -> Result<(), RepositoryError>;
    /// Add the grant's credits and raise the plan, once per checkout session.
    #[must_use]
    async fn apply_credit_grant(&self, grant: &CreditGrant) -> Result<GrantOutcome, RepositoryError>;
    #[must_use]
    async fn append_generation(&self, record: &GenerationRecord) -> Result<(), RepositoryError>;
    /// Newest first.
    #[must_use]
    async fn list_generations(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GenerationRecord>, RepositoryError>;
    #[must_use]
    async fn ping(&self) -> Result<(), RepositoryError>;
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, plan, credits, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(account.plan.to_string())
        .bind(account.credits)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                RepositoryError::Conflict(format!("Account {}", account.id))
            }
            _ => RepositoryError::DatabaseError(e),
        })?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, plan, credits, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Account {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn reserve_credit(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET credits = credits - 1, updated_at = $1
            WHERE id = $2 AND credits > 0
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_credits(&self, id: &str, delta: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET credits = credits + $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Account {}", id)));
        }

        Ok(())
    }

    async fn apply_credit_grant(&self, grant: &CreditGrant) -> Result<GrantOutcome, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let recorded = sqlx::query(
            r#"
            INSERT INTO processed_checkout_sessions (session_id, account_id, price_id, credits, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(&grant.session_id)
        .bind(&grant.account_id)
        .bind(&grant.price_id)
        .bind(grant.credits)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if recorded.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(GrantOutcome::Duplicate);
        }

        // Plan ranks: free < starter < pro. Never lowered.
        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET credits = credits + $1,
                plan = CASE
                    WHEN plan = 'pro' OR $2::text = 'pro' THEN 'pro'
                    WHEN plan = 'starter' OR $2::text = 'starter' THEN 'starter'
                    ELSE 'free'
                END,
                updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(grant.credits)
        .bind(grant.plan.to_string())
        .bind(now)
        .bind(&grant.account_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls back the session record too.
            return Err(RepositoryError::NotFound(format!(
                "Account {}",
                grant.account_id
            )));
        }

        tx.commit().await?;
        Ok(GrantOutcome::Applied)
    }

    async fn append_generation(&self, record: &GenerationRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO generations (id, account_id, topic, tone, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(&record.account_id)
        .bind(&record.topic)
        .bind(record.tone.as_str())
        .bind(&record.content)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_generations(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GenerationRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, topic, tone, content, created_at
            FROM generations
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_generation).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, RepositoryError> {
    let plan_str: String = row.try_get("plan")?;
    let plan = Plan::from_str(&plan_str)
        .map_err(|_| RepositoryError::InvalidData(format!("Unknown plan: {}", plan_str)))?;

    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        plan,
        credits: row.try_get("credits")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_generation(row: &sqlx::postgres::PgRow) -> Result<GenerationRecord, RepositoryError> {
    let tone: String = row.try_get("tone")?;

    Ok(GenerationRecord {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        topic: row.try_get("topic")?,
        tone: Tone::from(tone),
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}
