use serde::Serialize;
use uuid::Uuid;

use crate::aggregation::TransactionTotals;
use crate::errors::{AppError, ResultExt};
use crate::forms::{GoalSnapshot, TransactionForm};
use crate::logging::LogSettings;
use crate::models::{SavingGoal, Transaction};
use crate::supabase_client::{Filter, Order, SupabaseClient};

const TABLE: &str = "transactions";

impl From<&SavingGoal> for GoalSnapshot {
    fn from(goal: &SavingGoal) -> Self {
        Self {
            goal_id: goal.id,
            user_id: goal.user_id,
            current_amount: goal.current_amount,
            target_amount: goal.target_amount,
        }
    }
}

/// A goal's history with per-type sums.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionHistory {
    pub transactions: Vec<Transaction>,
    pub totals: TransactionTotals,
}

pub struct TransactionService {
    client: SupabaseClient,
    log: LogSettings,
}

impl TransactionService {
    pub fn new(client: SupabaseClient, log: LogSettings) -> Self {
        Self { client, log }
    }

    /// Records one entry against `goal`.
    ///
    /// Every check runs before any remote call; a withdrawal larger than the
    /// balance in `goal` never reaches the backend. On success the form goes
    /// back to an empty deposit.
    pub async fn record(
        &self,
        goal: &GoalSnapshot,
        form: &mut TransactionForm,
    ) -> Result<Transaction, AppError> {
        let entry = form.validate(goal)?;

        tracing::info!("Creating {} transaction", entry.kind);
        let created: Vec<Transaction> = self.client.insert(TABLE, &entry).await.map_err(|e| {
            self.log.error("Error creating transaction", &e);
            AppError::from(e)
        })?;

        let transaction = created.into_iter().next().ok_or_else(|| {
            AppError::InternalError("Backend did not return the created transaction".to_string())
        })?;

        tracing::info!("Transaction created");
        form.reset();
        Ok(transaction)
    }

    /// Entries of `goal_id`, newest first, with totals.
    pub async fn history(&self, goal_id: Uuid) -> Result<TransactionHistory, AppError> {
        let transactions: Vec<Transaction> = self
            .client
            .select(
                TABLE,
                "*",
                &[Filter::eq("goal_id", goal_id)],
                Some(Order::desc("created_at")),
            )
            .await
            .context("Error loading transactions")?;

        let totals = TransactionTotals::from_transactions(&transactions);
        Ok(TransactionHistory {
            transactions,
            totals,
        })
    }
}
