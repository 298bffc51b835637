//! Schema CLI for the auction store, e.g. `cargo run -p db-migration -- up`.
use sea_orm_migration::cli;

#[tokio::main]
async fn main() {
    cli::run_cli(db_migration::Migrator).await;
}
