//! Database migration runner for AuditDesk.
//!
//! Usage:
//!   migrator up      - Apply the schema
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop every table, enum and re-apply
//!
//! Reads `DATABASE_URL` from the environment or a `.env` file.

use auditdesk_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(Migrator).await;
}
