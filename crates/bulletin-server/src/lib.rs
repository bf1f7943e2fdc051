pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, Diagnostics};
pub use server::{router, serve, AppState};
