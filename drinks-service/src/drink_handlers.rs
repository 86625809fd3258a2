use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use common_auth::Authorized;
use common_http_errors::{ApiError, ApiResult};
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::AppState;
use crate::drink::{validate_recipe, validate_title, DrinkPatch, NewDrink};
use crate::repo::{self, RepoError};

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(title) => ApiError::Unprocessable {
                code: "drink_exists",
                message: Some(format!("a drink titled '{title}' already exists")),
            },
            other => ApiError::internal(other),
        }
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(err)) => Err(ApiError::unprocessable(err.body_text())),
        Err(err) => Err(ApiError::bad_request(err.body_text())),
    }
}

fn drink_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|err| ApiError::bad_request(err.body_text()))
}

fn drink_not_found() -> ApiError {
    ApiError::NotFound { code: "drink_not_found" }
}

pub async fn list_drinks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let drinks = repo::list_drinks(&state.db).await?;
    let short: Vec<_> = drinks.iter().map(|d| d.short()).collect();
    Ok(Json(json!({ "success": true, "drinks": short })))
}

pub async fn list_drink_details(
    State(state): State<AppState>,
    Authorized(_payload): Authorized,
) -> ApiResult<Json<Value>> {
    let drinks = repo::list_drinks(&state.db).await?;
    let long: Vec<_> = drinks.iter().map(|d| d.long()).collect();
    Ok(Json(json!({ "success": true, "drinks": long })))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Authorized(payload): Authorized,
    body: Result<Json<NewDrink>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let new = json_body(body)?;
    let title = validate_title(&new.title).map_err(ApiError::unprocessable)?;
    let recipe = validate_recipe(new.recipe).map_err(ApiError::unprocessable)?;

    let drink = repo::insert_drink(&state.db, &title, &recipe).await?;
    info!(drink_id = drink.id, actor = payload.subject().unwrap_or("unknown"), "drink created");
    Ok(Json(json!({ "success": true, "drinks": [drink.long()] })))
}

pub async fn patch_drink(
    State(state): State<AppState>,
    Authorized(payload): Authorized,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DrinkPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = drink_id(path)?;
    let patch = json_body(body)?;
    let title = patch
        .title
        .as_deref()
        .map(validate_title)
        .transpose()
        .map_err(ApiError::unprocessable)?;
    let recipe = patch
        .recipe
        .map(validate_recipe)
        .transpose()
        .map_err(ApiError::unprocessable)?;

    let drink = repo::update_drink(&state.db, id, title.as_deref(), recipe.as_deref())
        .await?
        .ok_or_else(drink_not_found)?;
    info!(drink_id = id, actor = payload.subject().unwrap_or("unknown"), "drink updated");
    Ok(Json(json!({ "success": true, "drinks": [drink.long()] })))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Authorized(payload): Authorized,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let id = drink_id(path)?;
    if !repo::delete_drink(&state.db, id).await? {
        return Err(drink_not_found());
    }
    info!(drink_id = id, actor = payload.subject().unwrap_or("unknown"), "drink deleted");
    Ok(Json(json!({ "success": true, "delete": id })))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
