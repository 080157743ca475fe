//! Stateless folds over already-fetched rows, and display formatting.

use serde::Serialize;

use crate::models::{SavingGoal, Transaction, TransactionType};

/// Progress towards a target, capped at 100.
pub fn progress_percentage(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (current / target * 100.0).min(100.0)
}

/// Sum of every goal's balance.
pub fn total_saved(goals: &[SavingGoal]) -> f64 {
    goals.iter().map(|g| g.current_amount).sum()
}

pub fn active_goals(goals: &[SavingGoal]) -> usize {
    goals
        .iter()
        .filter(|g| g.status == crate::models::GoalStatus::Activa)
        .count()
}

/// Balance after an entry of `amount`. External expenses leave it unchanged.
pub fn projected_balance(current: f64, kind: TransactionType, amount: f64) -> f64 {
    match kind {
        TransactionType::Ingreso => current + amount,
        TransactionType::Retiro => current - amount,
        TransactionType::GastoExterno => current,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypeTotal {
    pub amount: f64,
    pub count: usize,
}

/// Sums of a goal's history, grouped by transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TransactionTotals {
    pub ingreso: TypeTotal,
    pub retiro: TypeTotal,
    pub gasto_externo: TypeTotal,
}

impl TransactionTotals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Self::default(), |mut totals, t| {
            let bucket = totals.bucket_mut(t.kind);
            bucket.amount += t.amount;
            bucket.count += 1;
            totals
        })
    }

    pub fn get(&self, kind: TransactionType) -> TypeTotal {
        match kind {
            TransactionType::Ingreso => self.ingreso,
            TransactionType::Retiro => self.retiro,
            TransactionType::GastoExterno => self.gasto_externo,
        }
    }

    fn bucket_mut(&mut self, kind: TransactionType) -> &mut TypeTotal {
        match kind {
            TransactionType::Ingreso => &mut self.ingreso,
            TransactionType::Retiro => &mut self.retiro,
            TransactionType::GastoExterno => &mut self.gasto_externo,
        }
    }
}

/// Format as dollars with thousands separators: `$1,234.56`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, fraction)
}
