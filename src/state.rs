use std::sync::Arc;

use crate::repository::CustomerRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn CustomerRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn CustomerRepository>) -> Self {
        Self { repo }
    }
}
