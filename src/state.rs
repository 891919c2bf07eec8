use std::sync::Arc;

use crate::store::HrStore;
use crate::utils::{clock::Clock, email_index::EmailIndex};

/// Shared per-process context handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HrStore>,
    pub clock: Arc<dyn Clock>,
    pub emails: Arc<EmailIndex>,
}

impl AppState {
    pub fn new(store: Arc<dyn HrStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            emails: Arc::new(EmailIndex::default()),
        }
    }
}
