pub mod auth;
pub mod course;
pub mod media;
pub mod middleware;
pub mod progress;
pub mod purchase;
pub mod rest;
pub mod router;
pub mod state;
pub mod upload;

// Re-export the pieces the binaries need to assemble the server.
pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use router::build_router;
pub use state::AppState;
