//! New-user provisioning.
//!
//! A strictly ordered sequence, each step needing the previous one:
//! 1. Create the auth identity (email + password)
//! 2. Wait for the backend to materialize the base profile row
//! 3. Fill in the profile (name, age, description)
//! 4. Set the transaction PIN through its remote procedure
//! 5. Hand the new id back and reset the form
//!
//! Nothing is rolled back: an identity created in step 1 stays even if a later
//! step fails.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::{Config, ProfileWait};
use crate::errors::{AppError, ResultExt};
use crate::forms::{CreateUserForm, NewUser};
use crate::logging::LogSettings;
use crate::supabase_client::{BackendError, Filter, SupabaseClient};

/// Lower bound on the polling interval so a zero delay never spins.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Fragment the auth service uses when an email already has an identity.
const DUPLICATE_EMAIL_MARKER: &str = "already registered";

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedUser {
    pub user_id: Uuid,
    /// False when the profile update matched no row. Informational only.
    pub profile_updated: bool,
}

#[derive(Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: Uuid,
}

pub struct ProvisioningService {
    client: SupabaseClient,
    wait: ProfileWait,
    log: LogSettings,
}

impl ProvisioningService {
    pub fn new(client: SupabaseClient, config: &Config) -> Self {
        Self::with_wait(client, config.profile_wait(), config.log_settings())
    }

    pub fn with_wait(client: SupabaseClient, wait: ProfileWait, log: LogSettings) -> Self {
        Self { client, wait, log }
    }

    /// Validates the form and, if every field passes, runs the full sequence.
    ///
    /// On success the form is reset to its empty defaults. On failure the form
    /// is left as typed so the user can correct it.
    pub async fn create_user(&self, form: &mut CreateUserForm) -> Result<ProvisionedUser, AppError> {
        let user = form.validate()?;

        let provisioned = match self.provision(&user).await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                self.log.error("Error creating user", &e);
                return Err(e);
            }
        };

        form.reset();
        Ok(provisioned)
    }

    async fn provision(&self, user: &NewUser) -> Result<ProvisionedUser, AppError> {
        tracing::info!("Starting user creation");

        // 1. Identity
        let sign_up = self
            .client
            .sign_up(
                &user.email,
                &user.password,
                json!({ "full_name": user.full_name }),
            )
            .await
            .map_err(sign_up_error)?;

        let user_id = sign_up
            .user_id
            .ok_or_else(|| AppError::ExternalApiError("Could not create the user".to_string()))?;
        self.log.sensitive("Identity created");

        let client = match sign_up.access_token {
            Some(token) => self.client.with_access_token(token),
            None => self.client.clone(),
        };

        // 2. Base profile row comes from a backend trigger
        self.wait_for_profile(&client, user_id).await;

        // 3. Profile details
        tracing::info!("Updating profile");
        let updated: Vec<Value> = client
            .update(
                "profiles",
                &[Filter::eq("id", user_id)],
                &json!({
                    "full_name": user.full_name,
                    "age": user.age,
                    "description": user.description,
                    "avatar_url": Value::Null,
                }),
            )
            .await
            .context("Error updating profile")?;

        let profile_updated = !updated.is_empty();
        if profile_updated {
            tracing::info!("Profile updated");
        } else {
            tracing::warn!("Profile update matched no rows, checking whether the profile exists");
            self.diagnose_missing_update(&client, user_id).await;
        }

        // 4. PIN
        self.log.sensitive("Setting transaction PIN");
        let _: Value = client
            .rpc(
                "set_transaction_pin",
                &json!({
                    "pin_code": user.transaction_pin,
                    "user_id": user_id,
                }),
            )
            .await
            .context("Error setting security PIN")?;
        tracing::info!("Transaction PIN set");

        Ok(ProvisionedUser {
            user_id,
            profile_updated,
        })
    }

    async fn wait_for_profile(&self, client: &SupabaseClient, user_id: Uuid) {
        match self.wait {
            ProfileWait::FixedDelay(delay) => tokio::time::sleep(delay).await,
            ProfileWait::Poll { interval, timeout } => {
                let interval = interval.max(MIN_POLL_INTERVAL);
                let deadline = Instant::now() + timeout;

                loop {
                    match profile_exists(client, user_id).await {
                        Ok(true) => return,
                        Ok(false) => {}
                        Err(e) => self.log.error("Error polling for profile", &e),
                    }

                    if Instant::now() + interval > deadline {
                        tracing::warn!("Profile row not visible after {:?}, continuing", timeout);
                        return;
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    /// Best-effort existence check after an update that touched nothing.
    /// Only logs; never changes the outcome.
    async fn diagnose_missing_update(&self, client: &SupabaseClient, user_id: Uuid) {
        match profile_exists(client, user_id).await {
            Ok(true) => tracing::info!("Profile found, update was not applied"),
            Ok(false) => tracing::warn!("Profile not found after sign-up"),
            Err(e) => self.log.error("Error checking profile", &e),
        }
    }
}

async fn profile_exists(client: &SupabaseClient, user_id: Uuid) -> Result<bool, BackendError> {
    let rows: Vec<IdRow> = client
        .select("profiles", "id", &[Filter::eq("id", user_id)], None)
        .await?;
    Ok(!rows.is_empty())
}

fn sign_up_error(err: BackendError) -> AppError {
    if err.message.contains(DUPLICATE_EMAIL_MARKER) {
        AppError::DuplicateEmail
    } else {
        AppError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_rewritten() {
        let err = sign_up_error(BackendError::new(Some(422), "User already registered"));
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[test]
    fn other_sign_up_errors_pass_through() {
        let err = sign_up_error(BackendError::new(Some(429), "Email rate limit exceeded"));
        assert_eq!(err.user_message(), "Email rate limit exceeded");
    }
}
