use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use bloom::app::{Session, SessionSettings};
use bloom::catalog::build_client;
use bloom::config::Config;
use bloom::favorites::{FavoritesLedger, KeyValueStore, MemoryStore};
use bloom::render;
use bloom::util;
use bloom::storage::{Database, DatabaseError};

/// Get the config directory path (~/.config/bloom/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("bloom"))
}

fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        if let Err(e) = std::fs::set_permissions(config_dir, perms) {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "bloom", about = "Browse the flower catalog and keep a list of favorites")]
struct Args {
    /// Catalog API base URL (overrides config and BLOOM_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Database file (default: ~/.config/bloom/bloom.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Config file (default: ~/.config/bloom/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Don't touch the network; use the last saved catalog
    #[arg(long, global = true)]
    offline: bool,

    /// Delete the database (favorites and saved catalog) before running
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List categories and their items (default)
    List,
    /// Show the details of one item
    Show { name: String },
    /// List favorite items
    Favorites,
    /// Add an item to favorites, or remove it if already there
    Toggle { name: String },
    /// Remove one item from favorites
    Remove {
        name: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove all favorites
    Clear {
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Refetch the catalog (Ctrl-C cancels)
    Refresh,
}

impl Command {
    fn mutates_favorites(&self) -> bool {
        matches!(
            self,
            Command::Toggle { .. } | Command::Remove { .. } | Command::Clear { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let command = args.command.clone().unwrap_or(Command::List);

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout_secs = secs;
    }

    let settings = SessionSettings {
        api_url: config.api_url()?,
        timeout: config.request_timeout(),
        offline: args.offline,
    };
    let client = build_client(settings.timeout).context("Failed to build HTTP client")?;

    let db_path = args.db.clone().unwrap_or_else(|| config_dir.join("bloom.db"));
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;

    match Database::open(db_path_str).await {
        Ok(db) => {
            let mut session = Session::new(client, settings, FavoritesLedger::new(db.clone()));
            if config.offline_snapshot {
                match db.load_catalog_snapshot().await {
                    Ok(Some(snapshot)) => {
                        tracing::debug!(
                            categories = snapshot.categories.len(),
                            fetched_at = %snapshot.fetched_at,
                            "Seeding catalog from snapshot"
                        );
                        session = session.with_snapshot(snapshot);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "Failed to read catalog snapshot"),
                }
                session = session.with_snapshot_store(db);
            } else if let Err(e) = db.clear_catalog_snapshot().await {
                tracing::warn!(error = %e, "Failed to drop saved catalog snapshot");
            }
            run(command, session, &config).await
        }
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of bloom appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) if !command.mutates_favorites() => {
            tracing::warn!(error = %e, "Database unavailable, favorites are read-only for this run");
            eprintln!("Warning: could not open {}: {}", db_path.display(), e);
            let session = Session::new(client, settings, FavoritesLedger::new(MemoryStore::new()));
            run(command, session, &config).await
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

async fn run<S: KeyValueStore>(
    command: Command,
    mut session: Session<S>,
    config: &Config,
) -> Result<()> {
    match command {
        Command::List => {
            session.on_focus().await;
            print!(
                "{}",
                render::render_catalog(session.categories(), session.favorites())
            );
        }
        Command::Show { name } => {
            session.on_focus().await;
            let detail = session
                .detail(&name)
                .with_context(|| format!("No item named '{}' in the catalog", name))?;
            print!("{}", render::render_detail(&detail));
        }
        Command::Favorites => {
            session.on_focus().await;
            print!("{}", render::render_favorites(&session.favorite_items()));
        }
        Command::Toggle { name } => {
            session.on_focus().await;
            if session.detail(&name).is_none() {
                eprintln!("Note: '{}' is not in the current catalog.", name);
            }
            let now_favorite = session
                .toggle_favorite(&name)
                .await
                .context("Failed to save favorites")?;
            if now_favorite {
                println!("Added '{}' to favorites.", name);
            } else {
                println!("Removed '{}' from favorites.", name);
            }
        }
        Command::Remove { name, yes } => {
            session.reload_favorites().await;
            if !session.favorites().contains(&name) {
                println!("'{}' was not a favorite.", name);
                return Ok(());
            }
            let question = format!(
                "Are you sure you want to remove '{}' from your favorites?",
                name
            );
            if config.confirm_remove && !yes && !ask(&question)? {
                println!("Cancelled.");
                return Ok(());
            }
            session
                .remove_favorite(&name)
                .await
                .context("Failed to save favorites")?;
            println!("Removed '{}' from favorites.", name);
        }
        Command::Clear { yes } => {
            session.reload_favorites().await;
            let count = session.favorites().len();
            if count == 0 {
                println!("{}", render::NO_FAVORITES);
                return Ok(());
            }
            let question = format!("Remove all {} favorite flower(s)?", count);
            if config.confirm_remove_all && !yes && !ask(&question)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = session
                .remove_all_favorites()
                .await
                .context("Failed to save favorites")?;
            println!("Removed {} favorite(s).", removed);
        }
        Command::Refresh => {
            session.start_refresh();
            let outcome = tokio::select! {
                outcome = session.complete_refresh() => outcome,
                _ = tokio::signal::ctrl_c() => None,
            };
            match outcome {
                Some(outcome) => {
                    print!("{}", render::render_refresh(&outcome, session.catalog()))
                }
                None => {
                    session.cancel_refresh();
                    eprintln!("Refresh cancelled.");
                }
            }
        }
    }

    Ok(())
}

/// Ask on the terminal before a destructive change.
fn ask(question: &str) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        anyhow::bail!("Refusing to remove favorites without confirmation; pass --yes");
    }
    Ok(util::confirm(question, stdin.lock(), std::io::stdout())?)
}
