use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use iottu::api::types::{Antenna, LoginCredentials, Motorcycle, MotorcycleStatus, Tag, User, Yard};
use iottu::api::{Collection, Resource, Writable};
use iottu::app::AppContext;
use iottu::config::Config;
use iottu::error::ApiError;
use iottu::query::QueryOptions;
use iottu::storage::{KeyValueStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "iottu")]
#[command(about = "Command line client for the IoTTU fleet-tracking backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/iottu/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and remember the session
  Login {
    #[arg(long)]
    email: String,
    #[arg(long, env = "IOTTU_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Forget the stored session
  Logout,
  /// Show the signed-in user
  Whoami,
  /// List a collection, scoped to the signed-in user unless admin
  List { collection: Collection },
  /// Fetch one entity
  Get { collection: Collection, id: u64 },
  /// Create an entity from a JSON payload
  Create { collection: Collection, json: String },
  /// Replace an entity with a JSON payload
  Update {
    collection: Collection,
    id: u64,
    json: String,
  },
  /// Delete an entity
  Delete { collection: Collection, id: u64 },
  /// Show or toggle the color theme
  Theme {
    #[arg(long)]
    toggle: bool,
  },
}

/// Dispatch a generic function over the entity type behind a collection.
macro_rules! for_collection {
  ($collection:expr, $func:ident($($arg:expr),*)) => {
    match $collection {
      Collection::Users => $func::<User>($($arg),*).await,
      Collection::Yards => $func::<Yard>($($arg),*).await,
      Collection::Motorcycles => $func::<Motorcycle>($($arg),*).await,
      Collection::Antennas => $func::<Antenna>($($arg),*).await,
      Collection::Tags => $func::<Tag>($($arg),*).await,
      Collection::MotorcycleStatuses => $func::<MotorcycleStatus>($($arg),*).await,
    }
  };
}

/// Like `for_collection!`, rejecting read-only collections.
macro_rules! for_writable {
  ($collection:expr, $func:ident($($arg:expr),*)) => {
    match $collection {
      Collection::Users => $func::<User>($($arg),*).await,
      Collection::Yards => $func::<Yard>($($arg),*).await,
      Collection::Motorcycles => $func::<Motorcycle>($($arg),*).await,
      Collection::Antennas => $func::<Antenna>($($arg),*).await,
      Collection::Tags => $func::<Tag>($($arg),*).await,
      Collection::MotorcycleStatuses => Err(eyre!("{} is read-only", $collection)),
    }
  };
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _guard = init_logging()?;

  let store: Arc<dyn KeyValueStore> = match &config.storage.path {
    Some(path) => Arc::new(SqliteStore::open_at(path)?),
    None => Arc::new(SqliteStore::open()?),
  };
  let app = AppContext::new(&config, store)?;

  // Returning drops the log guard, which flushes pending lines
  match run(&app, args.command).await {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(e) => {
      eprintln!("{}", e);
      Ok(ExitCode::FAILURE)
    }
  }
}

/// Log to a file under the data directory so stdout carries only results.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("iottu");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "iottu.log"));
  let filter = EnvFilter::try_from_env("IOTTU_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

async fn run(app: &AppContext, command: Command) -> Result<()> {
  match command {
    Command::Login { email, password } => {
      let credentials = LoginCredentials { email, password };
      let session = app
        .sign_in(&credentials)
        .await
        .map_err(|e| eyre!("{}", app.login_message(&e)))?;
      print_json(&session)
    }
    Command::Logout => app.sign_out(),
    Command::Whoami => match app.session() {
      Some(session) => print_json(&session),
      None => Err(eyre!("Not signed in")),
    },
    Command::List { collection } => for_collection!(collection, list(app)),
    Command::Get { collection, id } => for_collection!(collection, get(app, id)),
    Command::Create { collection, json } => for_writable!(collection, create(app, &json)),
    Command::Update {
      collection,
      id,
      json,
    } => for_writable!(collection, update(app, id, &json)),
    Command::Delete { collection, id } => for_writable!(collection, delete(app, id)),
    Command::Theme { toggle } => {
      let theme = if toggle {
        app.toggle_theme()?
      } else {
        app.theme()
      };
      println!("{}", theme);
      Ok(())
    }
  }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  let json =
    serde_json::to_string_pretty(value).map_err(|e| eyre!("Failed to render output: {}", e))?;
  println!("{}", json);
  Ok(())
}

fn failure(app: &AppContext, error: &ApiError) -> color_eyre::Report {
  eyre!("{}", app.user_message(error))
}

fn parse_payload<R: Writable>(json: &str) -> Result<R::Payload> {
  serde_json::from_str(json).map_err(|e| eyre!("Invalid {} payload: {}", R::COLLECTION, e))
}

async fn list<R: Resource>(app: &AppContext) -> Result<()> {
  let query = app.list::<R>(QueryOptions::always())?;
  let state = query.settled().await;

  match (&state.error, state.data()) {
    (Some(error), _) => Err(failure(app, error)),
    (None, Some(items)) => print_json(items),
    (None, None) => print_json(&Vec::<R>::new()),
  }
}

async fn get<R: Resource>(app: &AppContext, id: u64) -> Result<()> {
  let item = app
    .api()
    .resource::<R>()
    .get(id)
    .await
    .map_err(|e| failure(app, &e))?;
  print_json(&item)
}

async fn create<R: Writable>(app: &AppContext, json: &str) -> Result<()> {
  let payload = parse_payload::<R>(json)?;
  let created = app
    .create_mutation::<R>()
    .run(payload)
    .await
    .map_err(|e| failure(app, &e))?;
  print_json(&created)
}

async fn update<R: Writable>(app: &AppContext, id: u64, json: &str) -> Result<()> {
  let payload = parse_payload::<R>(json)?;
  let updated = app
    .update_mutation::<R>()
    .run((id, payload))
    .await
    .map_err(|e| failure(app, &e))?;
  print_json(&updated)
}

async fn delete<R: Writable>(app: &AppContext, id: u64) -> Result<()> {
  app
    .delete_mutation::<R>()
    .run(id)
    .await
    .map_err(|e| failure(app, &e))?;
  println!("Deleted {} {}", R::COLLECTION, id);
  Ok(())
}
