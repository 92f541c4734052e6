pub mod app;
pub mod config;
pub mod errors;
pub mod export;
pub mod favorites;
pub mod format;
pub mod handlers;
pub mod import;
pub mod models;
pub mod state;
pub mod store;
pub mod timeline;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::{LogStore, connect};
pub use tracker::Tracker;
