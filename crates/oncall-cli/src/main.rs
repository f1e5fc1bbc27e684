use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use oncall_client::{
    load_departments, DirectorySource, DutyBackend, HttpBackend, PollerSettings, PollerSnapshot,
    StartOutcome, UpdateProgressPoller,
};
use oncall_config::{Config, ConfigManager};
use oncall_core::UpdateStatus;
use oncall_observability::{create_update_span, LogManager, LogOptions};
use tracing::Instrument;
use oncall_session::{FileStorage, KeyValueStorage, MemoryStorage, SessionStore};

mod chat;

#[derive(Parser)]
#[command(name = "oncall")]
#[command(about = "Ask who is on call at the hospital")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "ONCALL_API_URL")]
    server_url: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path (default ~/.oncall/config.json)
    #[arg(long, env = "ONCALL_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat
    Chat,
    /// Send a single question
    Send {
        /// Question text
        message: String,
    },
    /// List the departments the backend knows about
    Departments,
    /// Reindex the backend's duty data and follow its progress
    Update,
    /// Conversation session commands
    Session(SessionArgs),
    /// Config management
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct SessionArgs {
    #[command(subcommand)]
    command: SessionCommands,
}

#[derive(Subcommand, Clone)]
enum SessionCommands {
    /// Print the current session id
    Show,
    /// Start a new session
    Reset,
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Get a config value
    Get {
        /// Dotted key (e.g. api.base_url, poller.interval_ms)
        key: String,
    },
    /// Set a config value
    Set {
        /// Dotted key (e.g. api.base_url, poller.interval_ms)
        key: String,
        value: String,
    },
    /// Write the default config
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Print the current config
    Show,
}

/// Everything the backend-facing commands need
pub(crate) struct Context {
    pub config: Config,
    pub base_url: String,
    pub backend: Arc<dyn DutyBackend>,
    pub debug: bool,
}

impl Context {
    async fn load(cli: &Cli) -> anyhow::Result<Self> {
        let manager = ConfigManager::load(&config_path(cli.config.as_deref())).await?;
        let config = manager.snapshot().await;

        let base_url = match &cli.server_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => oncall_config::resolve_api_base_url(config.api.base_url.as_deref()),
        };

        if cli.debug {
            eprintln!("{}", format!("[DEBUG] Server URL: {}", base_url).dimmed());
        }

        let backend = HttpBackend::with_timeout(
            &base_url,
            Duration::from_secs(config.api.request_timeout_secs),
        )?;

        Ok(Self {
            config,
            base_url,
            backend: Arc::new(backend),
            debug: cli.debug,
        })
    }

    pub async fn open_session(&self) -> anyhow::Result<SessionStore> {
        let storage: Arc<dyn KeyValueStorage> = match self.storage_path() {
            Some(path) => Arc::new(FileStorage::new(path)),
            None => {
                tracing::warn!("No storage path, session id will not persist");
                Arc::new(MemoryStorage::new())
            }
        };
        Ok(SessionStore::open(storage).await?)
    }

    fn storage_path(&self) -> Option<PathBuf> {
        self.config
            .session
            .storage_path
            .as_deref()
            .and_then(oncall_config::expand_tilde)
            .or_else(oncall_config::default_storage_path)
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            interval: Duration::from_millis(self.config.poller.interval_ms),
            success_dwell: Duration::from_millis(self.config.poller.success_dwell_ms),
            error_dwell: Duration::from_millis(self.config.poller.error_dwell_ms),
        }
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.config.startup.watchdog_secs)
    }
}

fn config_path(raw: Option<&str>) -> PathBuf {
    match raw {
        Some(raw) => oncall_config::expand_tilde(raw).unwrap_or_else(|| PathBuf::from(raw)),
        None => oncall_config::default_config_path()
            .unwrap_or_else(|| PathBuf::from("config.json")),
    }
}

/// File logging always; console only with --debug
async fn init_logging(cli: &Cli) -> Option<LogManager> {
    let config = match ConfigManager::load(&config_path(cli.config.as_deref())).await {
        Ok(manager) => manager.snapshot().await,
        Err(_) => Config::default(),
    };

    let options = LogOptions {
        level_override: cli.debug.then(|| "debug".to_string()),
        console: cli.debug,
    };

    match LogManager::init(&config.logging, options) {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("{}", format!("⚠️  Logging disabled: {}", e).yellow());
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
    }

    if let Commands::Config(args) = &cli.command {
        return handle_config(args.clone(), cli.config.as_deref(), cli.debug).await;
    }

    let mut log_manager = init_logging(&cli).await;
    let context = Context::load(&cli).await?;

    match cli.command {
        Commands::Chat => chat::run_interactive_chat(&context, log_manager.as_mut()).await,
        Commands::Send { message } => chat::send_once(&context, &message).await,
        Commands::Departments => list_departments(&context).await,
        Commands::Update => {
            run_update(&context).await;
            Ok(())
        }
        Commands::Session(args) => handle_session(args, &context).await,
        Commands::Config(_) => Ok(()),
    }
}

async fn handle_config(args: ConfigArgs, config_path_arg: Option<&str>, debug: bool) -> anyhow::Result<()> {
    let config_path = config_path(config_path_arg);

    if debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(&config_path).await?;

            // update validates and saves
            if let Err(e) = manager.update(|config| config.set_value(&key, &value)).await {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }

            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            oncall_config::init_oncall_dirs().await?;

            let manager = ConfigManager::new(Config::default(), config_path.clone());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(&config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn handle_session(args: SessionArgs, context: &Context) -> anyhow::Result<()> {
    let mut session = context.open_session().await?;

    match args.command {
        SessionCommands::Show => {
            println!("{}", format!("Session ID: {}", session.id()).green());
            if let Some(path) = context.storage_path() {
                println!("{}", format!("Stored in {:?}", path).dimmed());
            }
        }
        SessionCommands::Reset => {
            let old_id = session.id().to_string();
            let new_id = session.reset().await?;
            println!("{}", format!("🔄 New session: {}", new_id).green());
            println!("{}", format!("(was {})", old_id).dimmed());
        }
    }

    Ok(())
}

async fn list_departments(context: &Context) -> anyhow::Result<()> {
    let load = load_departments(context.backend.as_ref()).await;

    match load.source {
        DirectorySource::Backend => {
            println!("{}", "🏥 Departments:".cyan().bold());
        }
        DirectorySource::Fallback => {
            println!("{}", "🏥 Departments (built-in list):".yellow().bold());
        }
    }
    chat::print_departments(&load.directory);

    if load.connection_error {
        println!();
        println!(
            "{}",
            oncall_core::texts::unreachable_backend(&context.base_url).red()
        );
    }

    Ok(())
}

/// Start a reindex and draw progress until the job settles
pub(crate) async fn run_update(context: &Context) -> PollerSnapshot {
    let span = create_update_span(&context.base_url);
    drive_update(context).instrument(span).await
}

async fn drive_update(context: &Context) -> PollerSnapshot {
    let poller = UpdateProgressPoller::new(Arc::clone(&context.backend), context.poller_settings());
    let mut rx = poller.subscribe();

    let outcome = poller.start().await;
    if context.debug {
        eprintln!("{}", format!("[DEBUG] Update start: {:?}", outcome).dimmed());
    }

    if outcome == StartOutcome::Started {
        println!("{}", poller.snapshot().status_line.cyan());
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if !snapshot.polling {
                break;
            }
            draw_progress(&snapshot);
            if rx.changed().await.is_err() {
                break;
            }
        }
        println!();
    }

    let last = poller.snapshot();
    let line = match last.progress.status {
        UpdateStatus::Completed => last.status_line.green(),
        UpdateStatus::Error => last.status_line.red(),
        _ => last.status_line.normal(),
    };
    println!("{}", line);
    poller.stop();

    last
}

fn draw_progress(snapshot: &PollerSnapshot) {
    use std::io::Write;

    const WIDTH: usize = 30;
    let percent = snapshot.progress.progress as usize;
    let filled = percent * WIDTH / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));

    print!(
        "\r{} {:>3}% {}",
        bar.cyan(),
        percent,
        snapshot.progress.message.dimmed()
    );
    let _ = std::io::stdout().flush();
}
