pub mod auction_bid;
pub mod event_outbox;
pub mod ids;
pub mod organization;
pub mod point_transaction;
pub mod task;
pub mod user;
