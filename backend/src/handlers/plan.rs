//! HTTP handlers for weekly stock plan endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::plan::{CreatePlanInput, UpdatePlanInput, WeeklyPlanService, WeeklyStockPlan};
use crate::AppState;

/// The planning screen submits whole weeks at once, so creation accepts
/// both a single object and an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreatePlansBody {
    One(CreatePlanInput),
    Many(Vec<CreatePlanInput>),
}

impl CreatePlansBody {
    fn into_vec(self) -> Vec<CreatePlanInput> {
        match self {
            CreatePlansBody::One(plan) => vec![plan],
            CreatePlansBody::Many(plans) => plans,
        }
    }
}

/// List all weekly stock plans
pub async fn list_plans(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<WeeklyStockPlan>>> {
    current_user.0.require("plans:read")?;
    let service = WeeklyPlanService::new(state.db);
    let plans = service.list_plans().await?;
    Ok(Json(plans))
}

/// Plans whose week covers today
pub async fn current_week_plans(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<WeeklyStockPlan>>> {
    current_user.0.require("plans:read")?;
    let service = WeeklyPlanService::new(state.db);
    let plans = service.current_week_plans().await?;
    Ok(Json(plans))
}

/// Create one or more weekly stock plans
pub async fn create_plans(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CreatePlansBody>,
) -> AppResult<Json<Vec<WeeklyStockPlan>>> {
    current_user.0.require("plans:write")?;
    let service = WeeklyPlanService::new(state.db);
    let plans = service
        .create_plans(current_user.0.user_id, body.into_vec())
        .await?;
    Ok(Json(plans))
}

/// Update a plan's quantity or unit
pub async fn update_plan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plan_id): Path<i64>,
    Json(input): Json<UpdatePlanInput>,
) -> AppResult<Json<WeeklyStockPlan>> {
    current_user.0.require("plans:write")?;
    let service = WeeklyPlanService::new(state.db);
    let plan = service.update_plan(plan_id, input).await?;
    Ok(Json(plan))
}

/// Delete a weekly stock plan
pub async fn delete_plan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plan_id): Path<i64>,
) -> AppResult<Json<()>> {
    current_user.0.require("plans:write")?;
    let service = WeeklyPlanService::new(state.db);
    service.delete_plan(plan_id).await?;
    Ok(Json(()))
}
