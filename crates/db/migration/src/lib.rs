use sea_orm_migration::prelude::*;

mod m20250301000000_organization;
mod m20250301000100_tasks_and_bids;
mod m20250301000200_event_outbox;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301000000_organization::Migration),
            Box::new(m20250301000100_tasks_and_bids::Migration),
            Box::new(m20250301000200_event_outbox::Migration),
        ]
    }
}
