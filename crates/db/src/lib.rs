use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod error;
pub mod models;
pub mod principal;
pub mod types;

pub use error::StoreError;
pub use principal::{PrincipalInfo, PrincipalInfoCache, PrincipalInfoProvider};

#[derive(Clone)]
pub struct DBService {
    pub conn: DatabaseConnection,
}

impl DBService {
    /// Connects and brings the schema up to date. Accepts any sea-orm
    /// database URL (`sqlite://...`, `postgres://...`).
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .max_connections(10)
            .connect_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let conn = Database::connect(options).await?;
        db_migration::Migrator::up(&conn, None).await?;
        Ok(DBService { conn })
    }
}
