use serde_json::json;
use uuid::Uuid;

use crate::errors::{AppError, ResultExt};
use crate::forms::{PinForm, ProfileForm};
use crate::logging::LogSettings;
use crate::models::{GoalBalance, Profile, ProfileCard, UserCard};
use crate::supabase_client::{Filter, Order, SupabaseClient};

const INCORRECT_PIN: &str = "Incorrect PIN. Try again.";

pub struct ProfileService {
    client: SupabaseClient,
    log: LogSettings,
}

impl ProfileService {
    pub fn new(client: SupabaseClient, log: LogSettings) -> Self {
        Self { client, log }
    }

    /// Every user for the picker, most recently updated first, each with the
    /// sum of their goal balances.
    ///
    /// A user whose goals cannot be loaded is still listed, with 0 saved.
    pub async fn list_users(&self) -> Result<Vec<UserCard>, AppError> {
        let profiles: Vec<ProfileCard> = self
            .client
            .select(
                "profiles",
                "id,full_name,avatar_url,description",
                &[],
                Some(Order::desc("updated_at")),
            )
            .await
            .context("Error loading users")?;

        tracing::debug!("Loaded {} users", profiles.len());

        let mut cards = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let total_saved = self.total_saved(profile.id).await;
            cards.push(UserCard {
                profile,
                total_saved,
            });
        }

        Ok(cards)
    }

    async fn total_saved(&self, user_id: Uuid) -> f64 {
        let balances: Result<Vec<GoalBalance>, _> = self
            .client
            .select(
                "saving_goals",
                "current_amount",
                &[Filter::eq("user_id", user_id)],
                None,
            )
            .await;

        match balances {
            Ok(balances) => balances
                .iter()
                .map(|b| b.current_amount.unwrap_or(0.0))
                .sum(),
            Err(e) => {
                self.log.error("Error loading a user's goals", &e);
                0.0
            }
        }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, AppError> {
        let rows: Vec<Profile> = self
            .client
            .select("profiles", "*", &[Filter::eq("id", user_id)], None)
            .await
            .context("Error loading profile")?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// Validates and saves profile edits, returning the stored row.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        form: &mut ProfileForm,
    ) -> Result<Profile, AppError> {
        let changes = form.validate()?;

        let rows: Vec<Profile> = self
            .client
            .update("profiles", &[Filter::eq("id", user_id)], &changes)
            .await
            .map_err(|e| {
                self.log.error("Error updating profile", &e);
                AppError::ExternalApiError(
                    "Error updating the profile. Try again.".to_string(),
                )
            })?;

        let profile = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        form.reset();
        Ok(profile)
    }

    /// Checks a PIN against the one stored for `user_id`.
    ///
    /// A wrong PIN and a failed check look the same to the caller. The form is
    /// cleared either way once the backend has been asked.
    pub async fn verify_pin(&self, user_id: Uuid, form: &mut PinForm) -> Result<(), AppError> {
        let pin = form.validate()?;

        self.log.sensitive("Verifying PIN");
        let verified: Result<bool, _> = self
            .client
            .rpc(
                "verify_transaction_pin",
                &json!({
                    "input_pin": pin,
                    "user_id": user_id,
                }),
            )
            .await;
        form.reset();

        match verified {
            Ok(true) => {
                tracing::info!("PIN accepted");
                Ok(())
            }
            Ok(false) => {
                tracing::warn!("PIN rejected");
                Err(AppError::Unauthorized(INCORRECT_PIN.to_string()))
            }
            Err(e) => {
                self.log.error("Error verifying PIN", &e);
                Err(AppError::Unauthorized(INCORRECT_PIN.to_string()))
            }
        }
    }
}
