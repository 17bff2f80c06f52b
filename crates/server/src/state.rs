use std::sync::Arc;

use service::servers::{ServerRepository, ServerService};

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub servers: Arc<ServerService<dyn ServerRepository>>,
}

impl ServerState {
    pub fn new(repo: Arc<dyn ServerRepository>) -> Self {
        Self { servers: Arc::new(ServerService::new(repo)) }
    }
}
