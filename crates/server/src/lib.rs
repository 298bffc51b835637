use db::DBService;
use services::services::{auction::AuctionService, config::AuctionConfig};

pub mod error;
pub mod http;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod shutdown;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    auctions: AuctionService,
}

impl AppState {
    pub fn new(db: DBService, config: AuctionConfig) -> Self {
        let auctions = AuctionService::new(db.clone(), config);
        Self { db, auctions }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn auctions(&self) -> &AuctionService {
        &self.auctions
    }
}
