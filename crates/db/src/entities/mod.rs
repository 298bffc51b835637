pub mod auction_bid;
pub mod department;
pub mod division;
pub mod event_outbox;
pub mod management;
pub mod point_transaction;
pub mod task;
pub mod user;
