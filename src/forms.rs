//! Raw form inputs, their per-field error maps, and the validation step that
//! turns a form into a sanitized payload.
//!
//! Forms hold exactly what the user typed (strings). `validate` runs every
//! rule, collects all field errors at once, and only then sanitizes.

use chrono::NaiveDate;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Debug;
use uuid::Uuid;

use crate::models::{
    GoalStatus, NewSavingGoal, NewTransaction, ProfileUpdate, SavingMethod, TransactionType,
};
use crate::{aggregation, sanitize, validation};

/// Maximum length of a transaction note or profile description.
pub const MAX_NOTE_LEN: usize = 500;

/// A field of one specific form.
pub trait FormField: Copy + Ord + Debug {
    /// Stable key used in JSON error bodies.
    fn key(self) -> &'static str;
}

/// Field-level validation errors for one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F: FormField> {
    errors: BTreeMap<F, String>,
}

impl<F: FormField> Default for FieldErrors<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<F: FormField> FieldErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. A later error for the same field replaces the earlier one.
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// Record the outcome of a validation rule.
    pub fn check(&mut self, field: F, outcome: Option<String>) {
        if let Some(message) = outcome {
            self.insert(field, message);
        }
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.errors.keys().copied()
    }

    /// `Ok(value)` when no field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    pub fn to_keyed(&self) -> BTreeMap<&'static str, String> {
        self.errors
            .iter()
            .map(|(field, message)| (field.key(), message.clone()))
            .collect()
    }
}

impl<F: FormField> Serialize for FieldErrors<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, message) in &self.errors {
            map.serialize_entry(field.key(), message)?;
        }
        map.end()
    }
}

macro_rules! form_fields {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $key:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl FormField for $name {
            fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }
    };
}

form_fields!(
    /// Fields of the new-user form.
    CreateUserField {
        Email => "email",
        Password => "password",
        FullName => "full_name",
        Age => "age",
        Description => "description",
        TransactionPin => "transaction_pin",
        ConfirmPin => "confirm_pin",
    }
);

form_fields!(
    GoalField {
        Title => "title",
        TargetAmount => "target_amount",
        Deadline => "deadline",
        FixedAmount => "fixed_amount",
        ImageUrl => "image_url",
    }
);

form_fields!(
    TransactionField {
        Amount => "amount",
        Note => "note",
    }
);

form_fields!(
    ProfileField {
        FullName => "full_name",
        Age => "age",
        Description => "description",
        AvatarUrl => "avatar_url",
    }
);

form_fields!(
    PinField {
        Pin => "pin",
    }
);

// ============ New user ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUserForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub age: String,
    pub description: String,
    pub transaction_pin: String,
    pub confirm_pin: String,
}

/// A new-user form that passed validation, with text fields sanitized.
///
/// Password and PIN are forwarded untouched.
#[derive(Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub age: i64,
    pub description: Option<String>,
    pub transaction_pin: String,
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("age", &self.age)
            .finish_non_exhaustive()
    }
}

impl CreateUserForm {
    pub fn validate(&self) -> Result<NewUser, FieldErrors<CreateUserField>> {
        let mut errors = FieldErrors::new();
        let age = validation::parse_whole(&self.age);

        errors.check(CreateUserField::Email, validation::email(&self.email));
        errors.check(CreateUserField::Password, validation::password(&self.password));
        errors.check(
            CreateUserField::FullName,
            validation::text_length(&self.full_name, 2, 100, "Name"),
        );
        errors.check(CreateUserField::Age, validation::age_input(&self.age));
        errors.check(
            CreateUserField::TransactionPin,
            validation::pin(&self.transaction_pin),
        );
        if self.transaction_pin != self.confirm_pin {
            errors.insert(CreateUserField::ConfirmPin, "PINs do not match");
        }
        if !self.description.is_empty() {
            errors.check(
                CreateUserField::Description,
                validation::text_length(&self.description, 0, MAX_NOTE_LEN, "Description"),
            );
        }

        errors.into_result(|| NewUser {
            email: sanitize::email(&self.email),
            password: self.password.clone(),
            full_name: sanitize::text(&self.full_name),
            age: age.unwrap_or_default(),
            description: non_empty(&self.description).map(sanitize::text),
            transaction_pin: self.transaction_pin.clone(),
        })
    }

    /// Back to the empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============ Saving goal ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateGoalForm {
    pub title: String,
    pub target_amount: String,
    pub deadline: String,
    pub method: SavingMethod,
    pub fixed_amount: String,
    pub image_url: String,
}

impl CreateGoalForm {
    pub fn validate(&self, user_id: Uuid) -> Result<NewSavingGoal, FieldErrors<GoalField>> {
        let mut errors = FieldErrors::new();
        let target_amount = validation::parse_amount(&self.target_amount);
        let fixed_amount = validation::parse_amount(&self.fixed_amount);

        errors.check(
            GoalField::Title,
            validation::text_length(&self.title, 3, 100, "Title"),
        );
        errors.check(
            GoalField::TargetAmount,
            validation::amount_input(&self.target_amount),
        );

        if self.method.requires_fixed_amount() {
            if self.fixed_amount.trim().is_empty() {
                errors.insert(
                    GoalField::FixedAmount,
                    "Fixed amount is required for this saving method",
                );
            } else {
                errors.check(
                    GoalField::FixedAmount,
                    validation::amount_input(&self.fixed_amount),
                );
            }
        }

        errors.check(GoalField::ImageUrl, validation::url(&self.image_url));
        errors.check(GoalField::Deadline, validation::date(self.deadline.trim()));

        errors.into_result(|| NewSavingGoal {
            user_id,
            title: sanitize::text(&self.title),
            target_amount: target_amount.unwrap_or_default(),
            deadline: NaiveDate::parse_from_str(self.deadline.trim(), "%Y-%m-%d").ok(),
            method: self.method,
            fixed_amount: fixed_amount.filter(|_| self.method.requires_fixed_amount()),
            image_url: non_empty(&self.image_url).and_then(sanitize::url),
            status: GoalStatus::Activa,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============ Transaction ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: String,
    pub note: String,
}

/// What the form knows about the goal it records against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSnapshot {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub current_amount: f64,
    pub target_amount: f64,
}

impl TransactionForm {
    pub fn validate(
        &self,
        goal: &GoalSnapshot,
    ) -> Result<NewTransaction, FieldErrors<TransactionField>> {
        let mut errors = FieldErrors::new();
        let amount = validation::parse_amount(&self.amount);

        errors.check(
            TransactionField::Amount,
            validation::amount_input(&self.amount),
        );

        // The true balance lives in the backend; this guard only sees the
        // balance the caller last fetched.
        if self.kind == TransactionType::Retiro {
            if let Some(requested) = amount {
                if requested > goal.current_amount {
                    errors.insert(
                        TransactionField::Amount,
                        format!(
                            "Cannot withdraw more than {}",
                            aggregation::format_currency(goal.current_amount)
                        ),
                    );
                }
            }
        }

        if !self.note.is_empty() {
            errors.check(
                TransactionField::Note,
                validation::text_length(&self.note, 0, MAX_NOTE_LEN, "Note"),
            );
        }

        errors.into_result(|| NewTransaction {
            goal_id: goal.goal_id,
            user_id: goal.user_id,
            amount: amount.unwrap_or_default(),
            kind: self.kind,
            note: non_empty(&self.note).map(sanitize::text),
        })
    }

    /// Balance the goal would show after this entry, for display only.
    pub fn projected_balance(&self, goal: &GoalSnapshot) -> f64 {
        let amount = validation::parse_amount(&self.amount)
            .filter(|a| a.is_finite())
            .unwrap_or(0.0);
        aggregation::projected_balance(goal.current_amount, self.kind, amount)
    }

    /// Clears the inputs and goes back to a deposit.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============ Profile edit ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub full_name: String,
    pub age: String,
    pub description: String,
    pub avatar_url: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors<ProfileField>> {
        let mut errors = FieldErrors::new();
        let age = validation::parse_whole(&self.age);

        errors.check(
            ProfileField::FullName,
            validation::text_length(&self.full_name, 2, 100, "Name"),
        );
        errors.check(ProfileField::Age, validation::age_input(&self.age));
        if !self.description.is_empty() {
            errors.check(
                ProfileField::Description,
                validation::text_length(&self.description, 0, MAX_NOTE_LEN, "Description"),
            );
        }
        errors.check(ProfileField::AvatarUrl, validation::url(&self.avatar_url));

        errors.into_result(|| ProfileUpdate {
            full_name: sanitize::text(&self.full_name),
            age: age.unwrap_or_default(),
            description: non_empty(&self.description).map(sanitize::text),
            avatar_url: non_empty(&self.avatar_url).and_then(sanitize::url),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============ PIN entry ============

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PinForm {
    pub pin: String,
}

impl Debug for PinForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PinForm { .. }")
    }
}

impl PinForm {
    pub fn validate(&self) -> Result<&str, FieldErrors<PinField>> {
        let mut errors = FieldErrors::new();
        errors.check(PinField::Pin, validation::pin_format(&self.pin));
        errors.into_result(|| self.pin.as_str())
    }

    pub fn reset(&mut self) {
        self.pin.clear();
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_user() -> CreateUserForm {
        CreateUserForm {
            email: "Ana@Example.com".to_string(),
            password: "Abc12345!".to_string(),
            full_name: "Ana <b>Pérez</b>".to_string(),
            age: "30".to_string(),
            description: String::new(),
            transaction_pin: "0731".to_string(),
            confirm_pin: "0731".to_string(),
        }
    }

    #[test]
    fn create_user_collects_every_error() {
        let form = CreateUserForm {
            email: "nope".to_string(),
            password: "short".to_string(),
            full_name: String::new(),
            age: "0".to_string(),
            description: String::new(),
            transaction_pin: "1234".to_string(),
            confirm_pin: "9999".to_string(),
        };

        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();

        assert_eq!(
            fields,
            vec![
                CreateUserField::Email,
                CreateUserField::Password,
                CreateUserField::FullName,
                CreateUserField::Age,
                CreateUserField::TransactionPin,
                CreateUserField::ConfirmPin,
            ]
        );
    }

    #[test]
    fn create_user_sanitizes_text_fields() {
        let user = valid_user().validate().unwrap();

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.full_name, "Ana Pérez");
        assert_eq!(user.age, 30);
        assert_eq!(user.description, None);
        assert_eq!(user.password, "Abc12345!");
    }

    #[test]
    fn reset_restores_empty_form() {
        let mut form = valid_user();
        form.reset();
        assert_eq!(form, CreateUserForm::default());
    }

    #[test]
    fn goal_with_periodic_method_needs_fixed_amount() {
        let form = CreateGoalForm {
            title: "Bicicleta".to_string(),
            target_amount: "500".to_string(),
            method: SavingMethod::Semanal,
            ..Default::default()
        };

        let errors = form.validate(Uuid::nil()).unwrap_err();
        assert_eq!(
            errors.get(GoalField::FixedAmount),
            Some("Fixed amount is required for this saving method")
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn free_goal_drops_fixed_amount() {
        let form = CreateGoalForm {
            title: "Bicicleta".to_string(),
            target_amount: "500".to_string(),
            fixed_amount: "20".to_string(),
            deadline: "2026-06-30".to_string(),
            image_url: "https://img.example.com/bici.png".to_string(),
            ..Default::default()
        };

        let goal = form.validate(Uuid::nil()).unwrap();
        assert_eq!(goal.fixed_amount, None);
        assert_eq!(goal.status, GoalStatus::Activa);
        assert_eq!(goal.deadline, NaiveDate::from_ymd_opt(2026, 6, 30));
        assert_eq!(
            goal.image_url.as_deref(),
            Some("https://img.example.com/bici.png")
        );
    }

    #[test]
    fn encoded_markup_in_title_stays_inert() {
        let form = CreateGoalForm {
            title: "&lt;script&gt;alert(1)&lt;/script&gt;".to_string(),
            target_amount: "10".to_string(),
            ..Default::default()
        };

        let goal = form.validate(Uuid::nil()).unwrap();
        assert!(!goal.title.contains('<'));
    }

    #[test]
    fn malformed_numbers_are_not_reported_missing() {
        let user = CreateUserForm {
            age: "30.5".to_string(),
            ..valid_user()
        };
        let errors = user.validate().unwrap_err();
        assert_eq!(
            errors.get(CreateUserField::Age),
            Some("Age must be a whole number")
        );

        let goal = GoalSnapshot {
            goal_id: Uuid::nil(),
            user_id: Uuid::nil(),
            current_amount: 100.0,
            target_amount: 500.0,
        };
        let tx = TransactionForm {
            kind: TransactionType::Ingreso,
            amount: "12,50".to_string(),
            note: String::new(),
        };
        let errors = tx.validate(&goal).unwrap_err();
        assert_eq!(
            errors.get(TransactionField::Amount),
            Some("Amount must be a number")
        );
    }

    #[test]
    fn withdrawal_over_balance_is_rejected() {
        let goal = GoalSnapshot {
            goal_id: Uuid::nil(),
            user_id: Uuid::nil(),
            current_amount: 100.0,
            target_amount: 500.0,
        };
        let form = TransactionForm {
            kind: TransactionType::Retiro,
            amount: "150".to_string(),
            note: String::new(),
        };

        let errors = form.validate(&goal).unwrap_err();
        assert_eq!(
            errors.get(TransactionField::Amount),
            Some("Cannot withdraw more than $100.00")
        );
    }

    #[test]
    fn projection_follows_type() {
        let goal = GoalSnapshot {
            goal_id: Uuid::nil(),
            user_id: Uuid::nil(),
            current_amount: 100.0,
            target_amount: 500.0,
        };
        let mut form = TransactionForm {
            kind: TransactionType::Ingreso,
            amount: "25".to_string(),
            note: String::new(),
        };
        assert_eq!(form.projected_balance(&goal), 125.0);

        form.kind = TransactionType::Retiro;
        assert_eq!(form.projected_balance(&goal), 75.0);

        form.kind = TransactionType::GastoExterno;
        assert_eq!(form.projected_balance(&goal), 100.0);

        form.amount = "abc".to_string();
        form.kind = TransactionType::Ingreso;
        assert_eq!(form.projected_balance(&goal), 100.0);
    }

    #[test]
    fn field_errors_serialize_by_key() {
        let mut errors = FieldErrors::new();
        errors.insert(TransactionField::Note, "Note cannot exceed 500 characters");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "note": "Note cannot exceed 500 characters" })
        );
    }

    #[test]
    fn pin_form_checks_format_only() {
        let weak = PinForm {
            pin: "1234".to_string(),
        };
        assert_eq!(weak.validate(), Ok("1234"));

        let short = PinForm {
            pin: "12".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
