//! HTTP API for the counseling chat
//!
//! JSON endpoints plus one SSE stream the browser listens on.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::llm::ChatModel;
use crate::session::SessionController;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub default_model: ChatModel,
}

impl AppState {
    pub fn new(controller: SessionController, default_model: ChatModel) -> Self {
        Self {
            controller: Arc::new(controller),
            default_model,
        }
    }
}
