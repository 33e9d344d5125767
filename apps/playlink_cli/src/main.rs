use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Select};
use playlink_adapters::configuration;
use playlink_adapters::telemetry;
use playlink_adapters::{FilePreferenceStore, HostDeviceInfo, PlayFabClient};
use playlink_core::config::Settings;
use playlink_core::entities::{Credential, LoginOutcome, PlayerStats};
use playlink_core::use_cases::SessionManager;
use playlink_core::{AuthError, Error};
use serde_json::Value;
use tracing::{error, info};

type Manager = SessionManager<PlayFabClient, PlayFabClient, PlayFabClient, FilePreferenceStore>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // --- Session commands ---
    /// Log in with the saved credential, or by device if none is saved
    Start,

    /// Show the saved login and cached stats without contacting the server
    Status,

    /// Log in with email and password (registers the account if needed)
    Login {
        /// Account email
        email: String,

        /// Display name used when registering
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Attach an email login to the current device account
    AddLogin {
        /// Account email
        email: String,

        /// Display name for the account
        #[arg(short, long)]
        username: Option<String>,
    },

    // --- Stats commands ---
    /// Upload stats to the server
    Push {
        #[arg(short, long)]
        money: f64,

        #[arg(short, long)]
        shafts: i32,
    },

    /// Download stats from the server into the local cache
    Pull,

    /// Show locally cached stats
    Stats,

    /// Save stats to the local cache only
    Record {
        #[arg(short, long)]
        money: f64,

        #[arg(short, long)]
        shafts: i32,
    },

    // --- Cloud script commands ---
    /// Run a cloud script function
    Invoke {
        /// Function name
        function: String,

        /// JSON parameter object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// Send the cached stats through the stats update script
    CloudUpdate,

    // --- Local data commands ---
    /// Forget the saved email and password
    ClearCredentials,

    /// Delete every locally stored preference
    Wipe {
        /// Skip confirmation prompt
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Menu-driven session
    Interactive,
}

fn build_manager(settings: &Settings) -> anyhow::Result<Manager> {
    let client = Arc::new(PlayFabClient::new(settings)?);
    let prefs = Arc::new(FilePreferenceStore::new(
        configuration::data_dir(),
        &settings.storage.file_name,
    ));

    Ok(SessionManager::new(
        Arc::clone(&client),
        Arc::clone(&client),
        client,
        prefs,
        settings,
    ))
}

fn print_outcome(outcome: &LoginOutcome) {
    println!("Login successful!");
    println!("- Player ID: {}", outcome.session.player_id);
    if outcome.session.newly_created {
        println!("- New account created");
    }
    match &outcome.stats {
        Some(stats) => print_stats(stats),
        None => println!("- Stats unavailable (pull failed)"),
    }
}

fn print_stats(stats: &PlayerStats) {
    println!("- Money: {}", stats.money);
    println!("- Shafts: {}", stats.shafts);
}

fn describe_auth_error(e: &AuthError) -> &'static str {
    match e {
        AuthError::Network(_) => "Could not reach the server. Check your connection.",
        AuthError::InvalidCredential => "Wrong email or password.",
        AuthError::AlreadyRegistered => "That email is already registered to another account.",
        AuthError::AccountNotFound => "No account exists for that email.",
        AuthError::Unknown(_) => "The server rejected the request.",
    }
}

fn report_failure(action: &str, e: &Error) {
    error!(?e, "{} failed", action);
    match e {
        Error::Auth(auth) => println!("{} failed: {}", action, describe_auth_error(auth)),
        _ => println!("{} failed: {}", action, e),
    }
}

/// Log in the way the app does on launch; every remote command needs a session
async fn ensure_session(manager: &Manager) -> anyhow::Result<()> {
    println!("Connecting...");
    let outcome = manager.start(&HostDeviceInfo::new()).await?;
    info!(player_id = %outcome.session.player_id, method = ?outcome.session.method, "session ready");
    Ok(())
}

fn prompt_credential(email: &str, username: &Option<String>) -> anyhow::Result<Credential> {
    let password = rpassword::prompt_password("Password: ")?;
    let credential = Credential::new(email.to_string(), password);
    Ok(match username {
        Some(name) => credential.with_display_name(name.clone()),
        None => credential,
    })
}

async fn push(manager: &Manager, stats: PlayerStats) {
    match manager.push_stats(stats).await {
        Ok(()) => {
            println!("Stats uploaded.");
            print_stats(&stats);
        }
        Err(e) => report_failure("Upload", &e),
    }
}

async fn pull(manager: &Manager) {
    match manager.pull_stats().await {
        Ok(stats) => {
            println!("Stats downloaded.");
            print_stats(&stats);
        }
        Err(e) => report_failure("Download", &e),
    }
}

async fn cloud_update(manager: &Manager) {
    match manager.cloud_update_stats().await {
        Ok(Some(reply)) => println!("Server says: {}", reply),
        Ok(None) => println!("Cloud update finished."),
        Err(e) => report_failure("Cloud update", &e),
    }
}

async fn wipe(manager: &Manager, yes: bool) -> anyhow::Result<()> {
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Delete ALL local data, including stats and saved login?")
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    manager.wipe_local_state().await?;
    println!("Local data deleted.");
    Ok(())
}

async fn interactive(manager: &Manager) -> anyhow::Result<()> {
    ensure_session(manager).await?;

    let items = [
        "Upload stats",
        "Download stats",
        "Run cloud update",
        "Delete local data",
        "Quit",
    ];

    loop {
        let selection = Select::new()
            .with_prompt("What next?")
            .items(&items)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let money: f64 = Input::new().with_prompt("Money").interact_text()?;
                let shafts: i32 = Input::new().with_prompt("Shafts").interact_text()?;
                push(manager, PlayerStats::new(money, shafts)).await;
            }
            1 => pull(manager).await,
            2 => cloud_update(manager).await,
            3 => wipe(manager, false).await?,
            _ => break,
        }
    }

    manager.logout().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // The log level comes from the configuration; tracing is not installed yet
    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber("playlink_cli", &settings.log_level);

    let cli = Cli::parse();
    let manager = build_manager(&settings)?;

    match &cli.command {
        // --- Session commands ---
        Commands::Start => match manager.start(&HostDeviceInfo::new()).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => report_failure("Login", &e),
        },
        Commands::Status => {
            match manager.saved_credential().await? {
                Some(credential) => println!("Saved login: {}", credential.email),
                None => println!("No saved login; the device account will be used."),
            }
            println!("Cached stats:");
            print_stats(&manager.cached_stats().await?);
        }
        Commands::Login { email, username } => {
            let credential = prompt_credential(email, username)?;
            println!("Authenticating...");
            match manager.login_with_stored(&credential).await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    println!("Login saved for next time.");
                }
                Err(e) => report_failure("Login", &e),
            }
        }
        Commands::AddLogin { email, username } => {
            ensure_session(&manager).await?;
            let credential = prompt_credential(email, username)?;
            match manager.add_login(&credential).await {
                Ok(()) => println!("Email login added to this account."),
                Err(e) => report_failure("Adding login", &e),
            }
        }

        // --- Stats commands ---
        Commands::Push { money, shafts } => {
            ensure_session(&manager).await?;
            push(&manager, PlayerStats::new(*money, *shafts)).await;
        }
        Commands::Pull => {
            ensure_session(&manager).await?;
            pull(&manager).await;
        }
        Commands::Stats => {
            print_stats(&manager.cached_stats().await?);
        }
        Commands::Record { money, shafts } => {
            manager
                .record_stats(PlayerStats::new(*money, *shafts))
                .await?;
            println!("Stats saved locally.");
        }

        // --- Cloud script commands ---
        Commands::Invoke { function, params } => {
            let params: Value = serde_json::from_str(params)
                .map_err(|e| anyhow::anyhow!("invalid --params JSON: {}", e))?;
            ensure_session(&manager).await?;
            match manager.invoke_script(function, params).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => report_failure("Cloud script", &e),
            }
        }
        Commands::CloudUpdate => {
            ensure_session(&manager).await?;
            cloud_update(&manager).await;
        }

        // --- Local data commands ---
        Commands::ClearCredentials => {
            manager.clear_credentials().await?;
            println!("Saved login removed. Stats cache kept.");
        }
        Commands::Wipe { yes } => wipe(&manager, *yes).await?,
        Commands::Interactive => interactive(&manager).await?,
    }

    Ok(())
}
