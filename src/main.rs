//! gitpix - A terminal image bed backed by a GitHub repository
#![allow(clippy::uninlined_format_args)]

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gitpix::api::github::GitHubClient;
use gitpix::auth::{self, TokenVault};
use gitpix::cache::store::CachePersistence;
use gitpix::sync::Watcher;
use gitpix::{Config, Database, Gallery, ImageEntry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match parse_args()? {
        Command::List { limit, markdown } => list_cli(limit, markdown).await,
        Command::Upload { file } => upload_cli(&file).await,
        Command::Watch => watch_cli().await,
        Command::Auth { logout: false } => auth_flow().await,
        Command::Auth { logout: true } => logout(),
        Command::ShowConfig => show_config(),
        Command::SetConfig { key, value } => set_config(&key, &value).await,
        Command::CacheList => list_cache(),
        Command::CacheClear => clear_cache(),
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            print_version();
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    List { limit: Option<usize>, markdown: bool },
    Upload { file: String },
    Watch,
    Auth { logout: bool },
    ShowConfig,
    SetConfig { key: String, value: String },
    CacheList,
    CacheClear,
    Help,
    Version,
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() == 1 {
        return Ok(Command::List {
            limit: None,
            markdown: false,
        });
    }

    match args[1].as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),

        "list" | "ls" => {
            let limit = args
                .iter()
                .position(|a| a == "--limit" || a == "-l")
                .map(|i| {
                    args.get(i + 1)
                        .and_then(|s| s.parse().ok())
                        .filter(|n| *n > 0)
                        .ok_or_else(|| anyhow::anyhow!("--limit needs a positive number"))
                })
                .transpose()?;
            let markdown = args.iter().any(|a| a == "--markdown" || a == "-m");
            Ok(Command::List { limit, markdown })
        }

        "upload" | "up" => {
            let file = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Missing image file"))?
                .clone();
            Ok(Command::Upload { file })
        }

        "watch" => Ok(Command::Watch),
        "auth" => Ok(Command::Auth {
            logout: args.iter().any(|a| a == "--logout"),
        }),

        "config" => match args.get(2).map(String::as_str) {
            None => Ok(Command::ShowConfig),
            Some("set") => {
                let key = args
                    .get(3)
                    .ok_or_else(|| anyhow::anyhow!("Missing setting name"))?
                    .clone();
                let value = args
                    .get(4)
                    .ok_or_else(|| anyhow::anyhow!("Missing value for {key}"))?
                    .clone();
                Ok(Command::SetConfig { key, value })
            }
            Some(other) => Err(anyhow::anyhow!(
                "Unknown config command: {other}\nRun 'gitpix --help' for usage"
            )),
        },

        "cache" => match args.get(2).map(String::as_str) {
            None | Some("list") => Ok(Command::CacheList),
            Some("clear") => Ok(Command::CacheClear),
            Some(other) => Err(anyhow::anyhow!(
                "Unknown cache command: {other}\nRun 'gitpix --help' for usage"
            )),
        },

        other => Err(anyhow::anyhow!(
            "Unknown command: {other}\nRun 'gitpix --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"🖼  gitpix - A terminal image bed backed by a GitHub repository

USAGE:
    gitpix                             List recent images
    gitpix [COMMAND]

COMMANDS:
    list [OPTIONS]                     List recent images, newest first
      Options:
        -l, --limit <n>                Number of images (default: max_images)
        -m, --markdown                 Print Markdown image links
      Examples:
        gitpix list
        gitpix list --limit 5 --markdown

    upload <file>                      Upload an image
      Examples:
        gitpix upload ~/Desktop/screenshot.png

    watch                              Refresh periodically, printing new images
    auth [--logout]                    Store (or delete) the GitHub access token
    config                             Show the current configuration
    config set <key> <value>           Change a setting
      Examples:
        gitpix config set repository me/pics
        gitpix config set custom_url https://cdn.example.com
        gitpix config set allowed_extensions png,jpg,webp

    cache [list]                       Show stored commit caches
    cache clear                        Delete every stored commit cache

OPTIONS:
    -h, --help                         Show this help message
    -v, --version                      Show version information

ENVIRONMENT:
    {}                       Access token (overrides the stored one)
    RUST_LOG                           Log filter (default: warn)

CONFIG:
    {}

HOMEPAGE:
    {}
"#,
        auth::TOKEN_ENV,
        config_path,
        gitpix::REPO_URL
    );
}

fn print_version() {
    println!("gitpix {}", gitpix::VERSION);
}

/// Build a GitHub client for the configured repository
fn github_client(config: &Config) -> Result<GitHubClient> {
    let vault = TokenVault::open()?;
    let token = auth::resolve_token(&vault)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No access token configured. Run: gitpix auth (or set {})",
            auth::TOKEN_ENV
        )
    })?;

    let client = GitHubClient::with_api_base(&config.api_base, &config.repository, &token)
        .context("Failed to create GitHub client")?;
    Ok(client.with_branch(&config.branch))
}

/// Attach a suggested fix to errors that have one
fn explain(err: gitpix::Error) -> anyhow::Error {
    match err.hint() {
        Some(hint) => anyhow::anyhow!("{err}\n\nHint: {hint}"),
        None => anyhow::Error::new(err),
    }
}

fn open_gallery(config: Config) -> Result<Gallery<GitHubClient, Database>> {
    config.validate()?;
    let client = github_client(&config)?;
    let db = Database::open().context("Failed to open cache database")?;
    Ok(Gallery::open(config, client, db)?)
}

fn print_entry(entry: &ImageEntry, markdown: bool) {
    if markdown {
        println!("{}", entry.markdown());
    } else {
        println!("\n{} · {}", entry.file_name(), entry.relative_time());
        println!("  {}", entry.resolved_url);
    }
}

async fn list_cli(limit: Option<usize>, markdown: bool) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(limit) = limit {
        config.max_images = limit;
    }

    let mut gallery = open_gallery(config)?;
    let entries = gallery.list_images().await.map_err(explain)?;

    if entries.is_empty() {
        println!("No images found in recent commits.");
        println!("\nUpload one with:");
        println!("  gitpix upload <file>");
        return Ok(());
    }

    if !markdown {
        println!("🖼  {} ({} images)", gallery.source().repository(), entries.len());
        println!("{}", "─".repeat(60));
    }
    for entry in &entries {
        print_entry(entry, markdown);
    }

    Ok(())
}

async fn upload_cli(file: &str) -> Result<()> {
    let path = Path::new(file);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow::anyhow!("Not a file: {file}"))?;
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {file}"))?;

    let gallery = open_gallery(Config::load()?)?;

    println!("⬆  Uploading {} ({} bytes)...", file_name, bytes.len());
    let entry = gallery
        .upload(&file_name, &bytes, Utc::now())
        .await
        .map_err(explain)?;

    println!("✓ Uploaded: {}", entry.path);
    println!("  {}", entry.resolved_url);
    println!("  {}", entry.markdown());

    Ok(())
}

async fn watch_cli() -> Result<()> {
    let config = Config::load()?;
    let interval = config.refresh_interval_secs;
    let mut gallery = open_gallery(config)?;
    let mut watcher = Watcher::new();

    println!(
        "👀 Watching {} every {}s (Ctrl+C to stop)",
        gallery.source().repository(),
        interval.max(1)
    );

    let run = watcher.run(&mut gallery, interval, |fresh| {
        for entry in fresh {
            print_entry(entry, false);
        }
    });

    tokio::select! {
        () = run => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            println!("\nStopped.");
        }
    }

    Ok(())
}

async fn auth_flow() -> Result<()> {
    println!("🔑 Paste a GitHub access token with contents read/write permission:");
    let mut token = String::new();
    std::io::stdin().read_line(&mut token)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow::anyhow!("No token entered"));
    }

    TokenVault::open()?.store_token(token)?;
    println!("✓ Token saved");

    let config = Config::load()?;
    if config.validate().is_ok() {
        let client = GitHubClient::with_api_base(&config.api_base, &config.repository, token)?;
        match client.repository_exists().await {
            Ok(true) => println!("✓ Repository {} is reachable", client.repository()),
            Ok(false) => println!("⚠ Repository {} was not found", client.repository()),
            Err(e) => println!("⚠ Could not verify repository: {}", explain(e)),
        }
    }

    Ok(())
}

fn logout() -> Result<()> {
    TokenVault::open()?.delete_token()?;
    println!("✓ Stored token deleted");
    if std::env::var(auth::TOKEN_ENV).is_ok() {
        println!("⚠ {} is still set in the environment", auth::TOKEN_ENV);
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let path = Config::default_path()?;

    println!("# {}\n", path.display());
    print!("{}", toml::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        println!("\n⚠ {}", e);
    }
    Ok(())
}

async fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    let previous = config.repository.clone();

    config.set(key, value)?;
    if !config.repository.is_empty() {
        config.validate()?;
    }
    config.save()?;
    println!("✓ {} updated", key);

    if config.repository != previous {
        if !previous.is_empty() {
            let db = Database::open().context("Failed to open cache database")?;
            CachePersistence::new(db).clear(&previous);
            println!("✓ Cleared commit cache for {}", previous);
        }

        if let Ok(client) = github_client(&config) {
            match client.repository_exists().await {
                Ok(true) => {}
                Ok(false) => println!("⚠ Repository {} was not found", config.repository),
                Err(e) => tracing::warn!("Could not verify repository: {}", e),
            }
        }
    }

    Ok(())
}

fn list_cache() -> Result<()> {
    let db = Database::open()?;
    let snapshots = db.list_snapshots()?;

    if snapshots.is_empty() {
        println!("No commit caches stored.");
        return Ok(());
    }

    println!("Stored commit caches:\n");
    for (key, updated_at) in snapshots {
        println!("  {}  (updated {})", key, updated_at);
    }
    Ok(())
}

fn clear_cache() -> Result<()> {
    let removed = Database::open()?.clear_snapshots()?;
    println!("✓ Removed {} commit cache(s)", removed);
    Ok(())
}
