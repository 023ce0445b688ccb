//! Command line front-end of the `sea-migrate` binary

use crate::migration::{DbConn, MigrateError, Tracker, Transition};
use crate::provision::{self, Options};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::error::Error;
use std::process::exit;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub async fn run_cli() {
    dotenv::dotenv().ok();
    let matches = get_matches();

    let filter = match matches.is_present("VERBOSE") {
        true => "debug",
        false => "sea_migrate=info",
    };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(handle_error);
    tracing_subscriber::fmt().with_env_filter(filter_layer).init();

    let options = || {
        let path = matches.value_of("CONFIG").unwrap_or("config/config.yaml");
        Options::from_yaml_file(path).unwrap_or_else(handle_error)
    };

    match matches.subcommand() {
        ("create", _) => provision::create_database(&options())
            .await
            .unwrap_or_else(handle_error),
        ("drop", _) => provision::drop_database(&options())
            .await
            .unwrap_or_else(handle_error),
        ("migrate", Some(args)) => {
            let dir = matches.value_of("MIGRATIONS").unwrap_or("db/migrations");
            let conn = open(&matches, options).await;
            let result = run_tracker(&Tracker::migrations(dir), &conn, args).await;
            conn.close().await;
            result.unwrap_or_else(handle_error)
        }
        ("seed", Some(args)) => {
            let dir = matches.value_of("SEEDS").unwrap_or("db/seeds");
            let conn = open(&matches, options).await;
            let result = run_tracker(&Tracker::seeds(dir), &conn, args).await;
            conn.close().await;
            result.unwrap_or_else(handle_error)
        }
        _ => unreachable!("You should never see this message"),
    }
}

fn get_matches() -> ArgMatches<'static> {
    App::new("sea-migrate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Versioned migrations and seeds")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .short("c")
                .env("SEA_MIGRATE_CONFIG")
                .help("YAML file with the connection options")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("DATABASE_URL")
                .long("database-url")
                .short("u")
                .env("DATABASE_URL")
                .help("Database url, used by migrate and seed instead of the config file")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("MIGRATIONS")
                .long("migrations")
                .help("Directory of migration scripts [default: db/migrations]")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("SEEDS")
                .long("seeds")
                .help("Directory of seed scripts [default: db/seeds]")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("VERBOSE")
                .long("verbose")
                .short("v")
                .help("Show debug messages")
                .global(true),
        )
        .subcommand(SubCommand::with_name("create").about("Create the database"))
        .subcommand(SubCommand::with_name("drop").about("Drop the database"))
        .subcommand(tracker_command("migrate", "Manage schema migrations"))
        .subcommand(tracker_command("seed", "Manage data seeds"))
        .get_matches()
}

fn tracker_command(name: &'static str, about: &'static str) -> App<'static, 'static> {
    let version_arg = || {
        Arg::with_name("VERSION")
            .help("Target version")
            .required(true)
            .index(1)
    };
    SubCommand::with_name(name)
        .about(about)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(SubCommand::with_name("up").about("Apply all pending scripts"))
        .subcommand(SubCommand::with_name("down").about("Rollback all applied scripts"))
        .subcommand(
            SubCommand::with_name("to")
                .about("Apply or rollback scripts until VERSION")
                .arg(version_arg()),
        )
        .subcommand(SubCommand::with_name("status").about("Check the status of all scripts"))
        .subcommand(SubCommand::with_name("version").about("Print the recorded version"))
        .subcommand(
            SubCommand::with_name("force")
                .about("Record VERSION as applied without running any script")
                .arg(version_arg()),
        )
}

async fn open<F>(matches: &ArgMatches<'_>, options: F) -> DbConn
where
    F: Fn() -> Options,
{
    match matches.value_of("DATABASE_URL") {
        Some(url) => DbConn::connect(url).await.unwrap_or_else(handle_error),
        None => provision::connect(&options())
            .await
            .unwrap_or_else(handle_error),
    }
}

async fn run_tracker(
    tracker: &Tracker,
    conn: &DbConn,
    args: &ArgMatches<'_>,
) -> Result<(), MigrateError> {
    let version = |args: Option<&ArgMatches<'_>>| -> u64 {
        args.and_then(|args| args.value_of("VERSION"))
            .unwrap_or_default()
            .parse()
            .unwrap_or_else(handle_error)
    };
    match args.subcommand() {
        ("up", _) => {
            tracker.up(conn).await?;
        }
        ("down", _) => {
            tracker.down(conn).await?;
        }
        ("to", sub) => {
            tracker.run(conn, Transition::ToVersion(version(sub))).await?;
        }
        ("status", _) => {
            info!("Checking status of '{}'", tracker.table());
            for migration in tracker.status(conn).await? {
                info!("Migration '{}'... {}", migration.script, migration.status);
            }
        }
        ("version", _) => match tracker.version(conn).await? {
            Some(marker) if marker.dirty => println!("{} (dirty)", marker.version),
            Some(marker) => println!("{}", marker.version),
            None => println!("0"),
        },
        ("force", sub) => tracker.force(conn, version(sub)).await?,
        _ => unreachable!("You should never see this message"),
    }
    Ok(())
}

fn handle_error<E, T>(error: E) -> T
where
    E: Error,
{
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    eprintln!("{}", message);
    exit(1);
}
