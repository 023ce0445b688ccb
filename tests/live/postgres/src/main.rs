use sea_migrate::migration::{ExecutionError, MigrateError, Tracker};
use sea_migrate::prelude::*;
use sea_migrate::provision;
use std::path::{Path, PathBuf};

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../testdata")
        .join(name)
}

#[async_std::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("sea_migrate=debug")
        .init();

    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
    let options = Options::from_yaml_file(config).unwrap();

    provision::drop_database(&options).await.ok();
    provision::create_database(&options).await.unwrap();

    test_migrations(&options).await;
    test_seeds(&options).await;
    test_recovery(&options).await;

    provision::drop_database(&options).await.unwrap();
}

async fn test_migrations(options: &Options) {
    assert_eq!(migrate_up(options, testdata("migrations")).await.unwrap(), 2);
    assert_eq!(migrate_to(options, testdata("migrations"), 1).await.unwrap(), 1);
    assert_eq!(migrate_down(options, testdata("migrations")).await.unwrap(), 0);
    assert_eq!(migrate_up(options, testdata("migrations")).await.unwrap(), 2);
}

async fn test_seeds(options: &Options) {
    assert_eq!(seed_up(options, testdata("seeds")).await.unwrap(), 2);
    assert_eq!(seed_to(options, testdata("seeds"), 1).await.unwrap(), 1);

    let err = seed_up(options, testdata("seeds_broken")).await.unwrap_err();
    assert!(matches!(err, MigrateError::Execution(_)), "{:?}", err);

    assert_eq!(seed_down(options, testdata("seeds")).await.unwrap(), 0);
}

async fn test_recovery(options: &Options) {
    let conn = provision::connect(options).await.unwrap();
    let migrations = Tracker::migrations(testdata("migrations"));
    let broken = Tracker::migrations(testdata("migrations_broken"));

    migrations.to(&conn, 1).await.unwrap();
    let err = broken.up(&conn).await.unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Execution(ExecutionError::Script { version: 2, .. })
    ));
    assert_eq!(migrations.version(&conn).await.unwrap(), Some(Marker::clean(1)));

    migrations.up(&conn).await.unwrap();
    broken.down(&conn).await.unwrap_err();
    assert_eq!(migrations.version(&conn).await.unwrap(), Some(Marker::clean(2)));

    conn.close().await;
}
