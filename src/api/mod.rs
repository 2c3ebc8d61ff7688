mod handlers;
mod routes;
mod static_files;

pub use handlers::{AppState, FilterParams};
pub use routes::create_api_router;
