use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use fintrack_core::goals::{Goal, GoalUpdate, NewGoal};

use crate::{
    api::caller::Caller,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let goal = state.goal_service.create_goal(&caller, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn get_goals_for_user(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Goal>>> {
    let goals = state.goal_service.get_goals_for_user(&caller, &user_id).await?;
    Ok(Json(goals))
}

async fn get_goal(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((goal_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Goal>> {
    let goal = state.goal_service.get_goal(&caller, &goal_id, &user_id).await?;
    Ok(Json(goal))
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(goal_id): Path<String>,
    payload: Result<Json<GoalUpdate>, JsonRejection>,
) -> ApiResult<Json<Goal>> {
    let goal = state
        .goal_service
        .update_goal(&caller, &goal_id, body(payload)?)
        .await?;
    Ok(Json(goal))
}

async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(goal_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.goal_service.delete_goal(&caller, &goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", post(create_goal))
        .route("/goals/user/{user_id}", get(get_goals_for_user))
        .route("/goals/{goal_id}/user/{user_id}", get(get_goal))
        .route("/goals/{goal_id}", put(update_goal).delete(delete_goal))
}
