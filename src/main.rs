use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use stocked::config::Endpoints;
use stocked::net::{ApiClient, ReqwestTransport, Transport};
use stocked::routes::{self, Navigation, Navigator};
use stocked::services::AuthService;
use stocked::session::{FileStorage, SessionStore, StorageMode};
use stocked::state::AuthContext;
use stocked::{ClientConfig, ClientError, Credentials, ErrorCode, Role};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("please select a role first (--role admin|manager|staff|supplier)")]
    MissingRole,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "stocked", about = "STOCKED inventory client: sign in, browse role dashboards, call the API")]
struct Cli {
    #[arg(long, env = "STOCKED_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "STOCKED_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and open the dashboard for your role.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOCKED_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role to sign in as.
        #[arg(long)]
        role: Option<Role>,
    },
    Logout,
    Whoami,
    /// Navigate to an application path, e.g. `/staff/orders`.
    Open {
        path: String,
    },
    /// GET an API path through the authenticated client.
    Get {
        path: String,
    },
}

/// Reports navigation on stdout in place of changing a browser location.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigate");
        println!("-> {path}");
    }
}

struct App {
    context: AuthContext,
    api: ApiClient,
    navigator: Arc<dyn Navigator>,
}

impl App {
    fn build(cli: &Cli) -> Result<Self, ClientError> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &cli.api_url {
            config.api = Endpoints::parse(url)?;
        }
        if let Some(dir) = &cli.storage_dir {
            config.storage_dir.clone_from(dir);
        }

        let store = Arc::new(SessionStore::open(Box::new(FileStorage::new(config.storage_dir.clone()))));
        if store.mode() == StorageMode::Memory {
            tracing::warn!(dir = %config.storage_dir.display(), "session will not persist after exit");
        }
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.timeouts)?);
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);

        let service = Arc::new(AuthService::new(Arc::clone(&transport), Arc::clone(&store), config.api.clone()));
        let context = AuthContext::new(service);
        let api = ApiClient::new(transport, store, config.api, Arc::clone(&navigator));
        Ok(Self { context, api, navigator })
    }

    fn open(&self, path: &str) {
        match routes::navigate(path, &self.context.snapshot()) {
            Navigation::Render(page) => println!("{} ({path})", page.title()),
            Navigation::Redirect(target) => self.navigator.navigate(target),
            Navigation::Loading => println!("Loading..."),
            Navigation::NotFound => println!("Page not found: {path}"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Client(e)) => {
            tracing::error!(code = e.error_code(), error = %e, "command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = App::build(&cli)?;
    app.context.initialize().await;

    match cli.command {
        Command::Login { email, password, role } => {
            let role = role.ok_or(CliError::MissingRole)?;
            let credentials = Credentials::new(email, password, Some(role));
            let user = app.context.login(&credentials).await?;
            println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
            let landing = routes::landing_path(user.role, Some(role));
            app.navigator.navigate(landing);
            app.open(landing);
        }
        Command::Logout => {
            app.context.logout();
            println!("Signed out");
        }
        Command::Whoami => match app.context.user() {
            Some(user) if app.context.is_authenticated() => {
                println!("{} <{}> ({}) id={}", user.name, user.email, user.role, user.id);
            }
            _ => println!("not signed in"),
        },
        Command::Open { path } => app.open(&path),
        Command::Get { path } => {
            let value: Value = app.api.get_json(&path).await?;
            print_json(&value)?;
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
