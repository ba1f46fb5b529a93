use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(talaro_recovery_migration::Migrator).await;
}
