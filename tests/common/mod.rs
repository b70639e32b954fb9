//! Shared fakes for the integration and HTTP tests.
#![allow(dead_code)]

use async_trait::async_trait;
use blogforge::{
    domain::{Account, ChatPrompt, CreditGrant, GenerationRecord, GrantOutcome, PriceTable},
    infrastructure::{
        AccountRepository, CheckoutSession, CheckoutSessionRequest, GatewayError, GeneratorError,
        PaymentGateway, RepositoryError, TextGenerator, WebhookVerifier,
    },
};
use mockall::mock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const STARTER_PRICE: &str = "price_starter";
pub const PRO_PRICE: &str = "price_pro";
pub const NOW: i64 = 1_700_000_000;

// ============================================================================
// In-memory account store
// ============================================================================

/// In-memory mock implementation of AccountRepository
#[derive(Clone, Default)]
pub struct MockAccountRepository {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    processed_sessions: Arc<Mutex<HashSet<String>>>,
    generations: Arc<Mutex<Vec<GenerationRecord>>>,
    fail_appends: Arc<AtomicBool>,
    fail_refunds: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl MockAccountRepository {
    pub fn with_account(id: &str, credits: i64) -> Self {
        let repo = Self::default();
        repo.insert_account(id, credits);
        repo
    }

    pub fn insert_account(&self, id: &str, credits: i64) {
        let mut account = Account::new(id.to_string(), format!("{id}@example.com"));
        account.credits = credits;
        self.accounts
            .lock()
            .unwrap()
            .insert(id.to_string(), account);
    }

    pub fn account(&self, id: &str) -> Account {
        self.accounts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .expect("account exists")
    }

    pub fn credits(&self, id: &str) -> i64 {
        self.account(id).credits
    }

    pub fn history(&self, id: &str) -> Vec<GenerationRecord> {
        self.generations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.account_id == id)
            .cloned()
            .collect()
    }

    pub fn fail_history_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }

    pub fn fail_refunds(&self) {
        self.fail_refunds.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.id) {
            return Err(RepositoryError::Conflict(format!("Account {}", account.id)));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Account, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::InvalidData("store unavailable".to_string()));
        }
        self.accounts
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", id)))
    }

    async fn reserve_credit(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(id) {
            Some(account) if account.credits > 0 => {
                account.credits -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_credits(&self, id: &str, delta: i64) -> Result<(), RepositoryError> {
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(RepositoryError::InvalidData("store unavailable".to_string()));
        }
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", id)))?;
        account.credits += delta;
        Ok(())
    }

    async fn apply_credit_grant(&self, grant: &CreditGrant) -> Result<GrantOutcome, RepositoryError> {
        let mut sessions = self.processed_sessions.lock().unwrap();
        let mut accounts = self.accounts.lock().unwrap();

        if sessions.contains(&grant.session_id) {
            return Ok(GrantOutcome::Duplicate);
        }
        let account = accounts
            .get_mut(&grant.account_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {}", grant.account_id)))?;

        account.credits += grant.credits;
        account.plan = account.plan.upgraded_to(grant.plan);
        sessions.insert(grant.session_id.clone());
        Ok(GrantOutcome::Applied)
    }

    async fn append_generation(&self, record: &GenerationRecord) -> Result<(), RepositoryError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::InvalidData("store unavailable".to_string()));
        }
        self.generations.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_generations(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GenerationRecord>, RepositoryError> {
        let mut records = self.history(account_id);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// ============================================================================
// Text generator
// ============================================================================

mock! {
    pub Generator {}

    #[async_trait]
    impl TextGenerator for Generator {
        async fn generate(&self, prompt: &ChatPrompt) -> Result<String, GeneratorError>;
    }
}

pub fn generator_returning(text: &'static str) -> MockGenerator {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .returning(move |_| Ok(text.to_string()));
    generator
}

pub fn generator_never_called() -> MockGenerator {
    let mut generator = MockGenerator::new();
    generator.expect_generate().times(0);
    generator
}

// ============================================================================
// Payment gateway
// ============================================================================

/// Records every checkout request and answers with a fixed session.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    url: Option<String>,
    unconfigured: bool,
}

impl FakeGateway {
    pub fn returning(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn without_redirect() -> Self {
        Self::default()
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    pub fn recorded(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.unconfigured {
            return Err(GatewayError::NotConfigured);
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: self.url.clone(),
        })
    }
}

// ============================================================================
// Webhook helpers
// ============================================================================

pub fn price_table() -> PriceTable {
    PriceTable::from_prices(Some(STARTER_PRICE), 50, Some(PRO_PRICE), 200)
}

pub fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(WEBHOOK_SECRET.to_string(), 300)
}

pub fn checkout_completed(session_id: &str, uid: &str, price_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": session_id,
            "object": "checkout.session",
            "metadata": { "uid": uid, "priceId": price_id }
        }}
    })
    .to_string()
    .into_bytes()
}

pub fn sign(payload: &[u8], timestamp: i64) -> String {
    verifier().signature_header(timestamp, payload)
}
