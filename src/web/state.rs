use std::sync::Arc;

use crate::facade::Crm;

#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<Crm>,
}

impl AppState {
    pub fn new(crm: Crm) -> Self {
        Self { crm: Arc::new(crm) }
    }
}
