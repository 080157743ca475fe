use serde::Serialize;
use uuid::Uuid;

use crate::aggregation;
use crate::errors::{AppError, ResultExt};
use crate::forms::CreateGoalForm;
use crate::logging::LogSettings;
use crate::models::SavingGoal;
use crate::supabase_client::{Filter, Order, SupabaseClient};

const TABLE: &str = "saving_goals";

/// A goal as shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: SavingGoal,
    pub progress: f64,
    pub method_label: &'static str,
}

/// Everything the goals dashboard shows for one user.
#[derive(Debug, Clone, Serialize)]
pub struct GoalDashboard {
    pub goals: Vec<GoalView>,
    pub total_saved: f64,
    pub active_goals: usize,
}

impl GoalDashboard {
    pub fn from_goals(goals: Vec<SavingGoal>) -> Self {
        let total_saved = aggregation::total_saved(&goals);
        let active_goals = aggregation::active_goals(&goals);
        let goals = goals
            .into_iter()
            .map(|goal| GoalView {
                progress: aggregation::progress_percentage(goal.current_amount, goal.target_amount),
                method_label: goal.method.label(),
                goal,
            })
            .collect();

        Self {
            goals,
            total_saved,
            active_goals,
        }
    }
}

pub struct GoalService {
    client: SupabaseClient,
    log: LogSettings,
}

impl GoalService {
    pub fn new(client: SupabaseClient, log: LogSettings) -> Self {
        Self { client, log }
    }

    /// Validates and inserts a new goal for `user_id`, resetting the form on success.
    pub async fn create_goal(
        &self,
        user_id: Uuid,
        form: &mut CreateGoalForm,
    ) -> Result<SavingGoal, AppError> {
        let new_goal = form.validate(user_id)?;

        tracing::info!("Creating saving goal");
        let created: Vec<SavingGoal> = self
            .client
            .insert(TABLE, &new_goal)
            .await
            .map_err(|e| {
                self.log.error("Error creating goal", &e);
                AppError::from(e)
            })?;

        let goal = created.into_iter().next().ok_or_else(|| {
            AppError::InternalError("Backend did not return the created goal".to_string())
        })?;

        tracing::info!("Saving goal created");
        form.reset();
        Ok(goal)
    }

    /// Goals owned by `user_id`, newest first.
    pub async fn list_goals(&self, user_id: Uuid) -> Result<Vec<SavingGoal>, AppError> {
        self.client
            .select(
                TABLE,
                "*",
                &[Filter::eq("user_id", user_id)],
                Some(Order::desc("created_at")),
            )
            .await
            .context("Error loading goals")
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<GoalDashboard, AppError> {
        let goals = self.list_goals(user_id).await?;
        Ok(GoalDashboard::from_goals(goals))
    }

    pub async fn get_goal(&self, goal_id: Uuid) -> Result<SavingGoal, AppError> {
        let rows: Vec<SavingGoal> = self
            .client
            .select(TABLE, "*", &[Filter::eq("id", goal_id)], None)
            .await
            .context("Error loading goal")?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal_id)))
    }
}
