use std::sync::Arc;

use crate::{api::images::ImageStorage, store::MarketplaceStore};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketplaceStore>,
    pub images: Arc<dyn ImageStorage>,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketplaceStore>, images: Arc<dyn ImageStorage>) -> Self {
        Self { store, images }
    }
}
