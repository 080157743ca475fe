use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============ Backend Rows ============

/// A user's profile row.
///
/// Created by the backend when an identity is provisioned; edited from the
/// profile screen; never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    /// Between 1 and 120 when present.
    pub age: Option<i64>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    /// Opaque hash owned by the backend. Read but never written back out.
    #[serde(default, skip_serializing)]
    pub transaction_pin: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// How a goal is meant to be funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingMethod {
    /// Any amount, any time.
    #[default]
    Libre,
    Semanal,
    Mensual,
    Anual,
}

impl SavingMethod {
    /// Every method except `Libre` needs a fixed contribution amount.
    pub fn requires_fixed_amount(self) -> bool {
        !matches!(self, SavingMethod::Libre)
    }

    pub fn label(self) -> &'static str {
        match self {
            SavingMethod::Libre => "Libre",
            SavingMethod::Semanal => "Semanal",
            SavingMethod::Mensual => "Mensual",
            SavingMethod::Anual => "Anual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Activa,
    Completada,
    Pausada,
}

/// A savings target with a running balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub target_amount: f64,
    /// Derived by the backend from the transaction history. Never written here.
    pub current_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub method: SavingMethod,
    pub fixed_amount: Option<f64>,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Deposit into the goal.
    #[default]
    Ingreso,
    /// Withdrawal from the goal.
    Retiro,
    /// Expense recorded against the goal without touching its balance.
    GastoExterno,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Ingreso => "ingreso",
            TransactionType::Retiro => "retiro",
            TransactionType::GastoExterno => "gasto_externo",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============ Write Payloads ============

/// Insert payload for `saving_goals`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSavingGoal {
    pub user_id: Uuid,
    pub title: String,
    pub target_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub method: SavingMethod,
    pub fixed_amount: Option<f64>,
    pub image_url: Option<String>,
    pub status: GoalStatus,
}

/// Insert payload for `transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub note: Option<String>,
}

/// Update payload for `profiles`. `None` fields are sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub age: i64,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

// ============ Read Projections ============

/// Profile columns shown on the user picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCard {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
}

/// A user on the picker together with everything they have saved.
#[derive(Debug, Clone, Serialize)]
pub struct UserCard {
    #[serde(flatten)]
    pub profile: ProfileCard,
    pub total_saved: f64,
}

/// Only the balance column of a goal.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GoalBalance {
    #[serde(default)]
    pub current_amount: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_type_wire_names() {
        assert_eq!(
            serde_json::to_value(TransactionType::GastoExterno).unwrap(),
            json!("gasto_externo")
        );
        let parsed: TransactionType = serde_json::from_value(json!("retiro")).unwrap();
        assert_eq!(parsed, TransactionType::Retiro);
    }

    #[test]
    fn profile_pin_is_never_serialized() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "6f1c2a7e-9a57-4c38-8a5e-1d6b3c0f9e21",
            "full_name": "Ana",
            "age": 30,
            "avatar_url": null,
            "description": null,
            "transaction_pin": "$2a$06$hash",
            "updated_at": "2025-01-10T12:00:00Z"
        }))
        .unwrap();

        assert!(profile.transaction_pin.is_some());
        let out = serde_json::to_value(&profile).unwrap();
        assert!(out.get("transaction_pin").is_none());
    }

    #[test]
    fn goal_row_parses_backend_shape() {
        let goal: SavingGoal = serde_json::from_value(json!({
            "id": "0b9d1f0e-5b7a-4d7e-9f55-6b4a2e1c3d10",
            "user_id": "6f1c2a7e-9a57-4c38-8a5e-1d6b3c0f9e21",
            "title": "Laptop",
            "image_url": null,
            "target_amount": 1500,
            "current_amount": 250.5,
            "deadline": "2025-12-31",
            "method": "mensual",
            "fixed_amount": 100,
            "status": "activa",
            "created_at": "2025-01-10T12:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(goal.method, SavingMethod::Mensual);
        assert_eq!(goal.current_amount, 250.5);
        assert!(goal.method.requires_fixed_amount());
    }
}
