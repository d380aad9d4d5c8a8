use crate::entities::{album_photos, albums, libraries, photo_tags, photos, tags};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

/// Schema is derived from the entities. Parent tables first so the generated
/// foreign keys resolve.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = vec![
        schema
            .create_table_from_entity(libraries::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(albums::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(photos::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(tags::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(photo_tags::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(album_photos::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    Ok(())
}
