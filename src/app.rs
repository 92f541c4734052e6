use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/logs", get(handlers::get_logs))
        .route("/api/timeline", get(handlers::get_timeline))
        .route("/api/food-types", get(handlers::get_food_types))
        .route("/api/food", post(handlers::add_food))
        .route("/api/food/:id", put(handlers::update_food).delete(handlers::delete_food))
        .route("/api/bathroom", post(handlers::add_bathroom))
        .route(
            "/api/bathroom/:id",
            put(handlers::update_bathroom).delete(handlers::delete_bathroom),
        )
        .route(
            "/api/favorites",
            get(handlers::get_favorites).put(handlers::save_favorites),
        )
        .route("/api/favorites/:id/autofill", get(handlers::get_autofill))
        .route("/api/export", get(handlers::export_logs))
        .route("/api/import", post(handlers::import_logs))
        .with_state(state)
}
