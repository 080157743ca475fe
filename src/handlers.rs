use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::aggregation;
use crate::config::Config;
use crate::errors::AppError;
use crate::forms::{
    CreateGoalForm, CreateUserForm, GoalSnapshot, PinForm, ProfileForm, TransactionForm,
};
use crate::goals::{GoalDashboard, GoalService};
use crate::models::{Profile, SavingGoal, Transaction, TransactionType, UserCard};
use crate::profiles::ProfileService;
use crate::provisioning::{ProvisionedUser, ProvisioningService};
use crate::supabase_client::SupabaseClient;
use crate::transactions::{TransactionHistory, TransactionService};

/// Shared application state injected into handlers.
pub struct AppState {
    pub provisioning: ProvisioningService,
    pub goals: GoalService,
    pub transactions: TransactionService,
    pub profiles: ProfileService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &Config, client: SupabaseClient) -> Self {
        let log = config.log_settings();
        Self {
            provisioning: ProvisioningService::new(client.clone(), config),
            goals: GoalService::new(client.clone(), log),
            transactions: TransactionService::new(client.clone(), log),
            profiles: ProfileService::new(client, log),
        }
    }
}

/// Every `/api/v1` route. State is attached by the caller.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route("/api/v1/users/:id/pin/verify", post(verify_pin))
        .route(
            "/api/v1/users/:id/profile",
            get(get_profile).patch(update_profile),
        )
        .route(
            "/api/v1/users/:id/goals",
            get(goal_dashboard).post(create_goal),
        )
        .route(
            "/api/v1/goals/:id/transactions",
            get(transaction_history).post(record_transaction),
        )
        .route("/api/v1/goals/:id/projection", get(projection))
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "savings-wallet-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/users
///
/// Users for the picker with their total savings.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserCard>>, AppError> {
    let users = state.profiles.list_users().await?;
    Ok(Json(users))
}

/// POST /api/v1/users
///
/// Runs the provisioning sequence for a filled-in new-user form.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(mut form): Json<CreateUserForm>,
) -> Result<(StatusCode, Json<ProvisionedUser>), AppError> {
    let provisioned = state.provisioning.create_user(&mut form).await?;
    Ok((StatusCode::CREATED, Json(provisioned)))
}

/// POST /api/v1/users/:id/pin/verify
pub async fn verify_pin(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(mut form): Json<PinForm>,
) -> Result<Json<Value>, AppError> {
    state.profiles.verify_pin(user_id, &mut form).await?;
    Ok(Json(json!({ "verified": true, "user_id": user_id })))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.get_profile(user_id).await?))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(mut form): Json<ProfileForm>,
) -> Result<Json<Profile>, AppError> {
    let profile = state.profiles.update_profile(user_id, &mut form).await?;
    Ok(Json(profile))
}

/// GET /api/v1/users/:id/goals
///
/// Goals with progress, total saved and active count.
pub async fn goal_dashboard(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<GoalDashboard>, AppError> {
    Ok(Json(state.goals.dashboard(user_id).await?))
}

pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(mut form): Json<CreateGoalForm>,
) -> Result<(StatusCode, Json<SavingGoal>), AppError> {
    let goal = state.goals.create_goal(user_id, &mut form).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn transaction_history(
    State(state): State<Arc<AppState>>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<TransactionHistory>, AppError> {
    Ok(Json(state.transactions.history(goal_id).await?))
}

/// POST /api/v1/goals/:id/transactions
///
/// Loads the goal's current balance, then records the entry against it.
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Path(goal_id): Path<Uuid>,
    Json(mut form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let goal = state.goals.get_goal(goal_id).await?;
    let snapshot = GoalSnapshot::from(&goal);
    let transaction = state.transactions.record(&snapshot, &mut form).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[derive(Debug, Deserialize)]
pub struct ProjectionParams {
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    #[serde(default)]
    pub amount: String,
}

/// GET /api/v1/goals/:id/projection?type=retiro&amount=50
///
/// Balance preview while the user is still typing. Nothing is written.
pub async fn projection(
    State(state): State<Arc<AppState>>,
    Path(goal_id): Path<Uuid>,
    Query(params): Query<ProjectionParams>,
) -> Result<Json<Value>, AppError> {
    let goal = state.goals.get_goal(goal_id).await?;
    let form = TransactionForm {
        kind: params.kind,
        amount: params.amount,
        note: String::new(),
    };
    let snapshot = GoalSnapshot::from(&goal);
    let projected = form.projected_balance(&snapshot);

    Ok(Json(json!({
        "current_amount": snapshot.current_amount,
        "projected_balance": projected,
        "projected_progress": aggregation::progress_percentage(projected, snapshot.target_amount),
        "formatted": aggregation::format_currency(projected),
    })))
}
