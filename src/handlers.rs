use crate::errors::AppError;
use crate::export::ExportFormat;
use crate::favorites::FieldSelection;
use crate::models::{
    BathroomForm, ExportQuery, Favorite, FoodForm, ImportQuery, ImportResponse, LogsResponse, RecordId,
};
use crate::state::AppState;
use crate::timeline::TimelineItem;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let tracker = &state.tracker;
    let snapshot = tracker.snapshot().await;
    let timeline = tracker.timeline().await;
    let food_types = tracker.food_types().await;
    Html(render_index(
        &snapshot,
        &timeline,
        &food_types,
        tracker.form_options(),
        tracker.backend_name(),
    ))
}

pub async fn get_logs(State(state): State<AppState>) -> Json<LogsResponse> {
    Json(logs_response(&state).await)
}

pub async fn get_timeline(State(state): State<AppState>) -> Json<Vec<TimelineItem>> {
    Json(state.tracker.timeline().await)
}

pub async fn get_food_types(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.tracker.food_types().await)
}

pub async fn add_food(
    State(state): State<AppState>,
    Json(form): Json<FoodForm>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.add_food(form).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<FoodForm>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.update_food(&RecordId::new(id), form).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.delete_food(&RecordId::new(id)).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn add_bathroom(
    State(state): State<AppState>,
    Json(form): Json<BathroomForm>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.add_bathroom(form).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn update_bathroom(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<BathroomForm>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.update_bathroom(&RecordId::new(id), form).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn delete_bathroom(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LogsResponse>, AppError> {
    state.tracker.delete_bathroom(&RecordId::new(id)).await?;
    Ok(Json(logs_response(&state).await))
}

pub async fn get_favorites(State(state): State<AppState>) -> Json<Vec<Favorite>> {
    Json(state.tracker.snapshot().await.favorites)
}

pub async fn save_favorites(
    State(state): State<AppState>,
    Json(favorites): Json<Vec<Favorite>>,
) -> Result<Json<Vec<Favorite>>, AppError> {
    let saved = state.tracker.save_favorites(favorites).await?;
    Ok(Json(saved))
}

pub async fn get_autofill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FieldSelection>>, AppError> {
    let selections = state.tracker.autofill(&RecordId::new(id)).await?;
    Ok(Json(selections))
}

pub async fn export_logs(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let format = match query.format.as_deref() {
        Some(value) => value.parse::<ExportFormat>().map_err(AppError::bad_request)?,
        None => ExportFormat::Json,
    };

    let file = state.tracker.export(format).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    ))
}

pub async fn import_logs(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let summary = state.tracker.import(&query.file_name, &body).await?;
    Ok(Json(ImportResponse {
        message: "Logs imported successfully!".to_string(),
        food_logs: summary.food_logs,
        bathroom_logs: summary.bathroom_logs,
    }))
}

async fn logs_response(state: &AppState) -> LogsResponse {
    let snapshot = state.tracker.snapshot().await;
    LogsResponse {
        food_logs: snapshot.food_logs,
        bathroom_logs: snapshot.bathroom_logs,
    }
}
