//! Pinboard CLI
//!
//! Command-line front end over [`NoteSync`].
//!
//! # Commands
//!
//! - `list` - Show the board
//! - `add` - Post a note
//! - `edit` - Replace a note this client created
//! - `rm` - Delete a note this client created
//! - `watch` - Keep the board on screen, refreshing periodically

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pinboard_client::{spawn_refresh, refresh_once, ClientConfig, NoteSync, Session, WriteMode};
use pinboard_shared::{NoteId, NoteView};

/// Shared note board client.
#[derive(Parser)]
#[command(name = "pinboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL (overrides PINBOARD_SERVER_URL)
    #[arg(global = true, short, long)]
    server: Option<String>,

    /// Write mode: shared-only or local-fallback (overrides PINBOARD_WRITE_MODE)
    #[arg(global = true, short, long)]
    mode: Option<WriteMode>,

    /// Local database file (overrides PINBOARD_DB_PATH)
    #[arg(global = true, long)]
    db: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the board
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Post a note
    Add {
        /// Note text
        text: Option<String>,

        /// Image file to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Replace the text and image of a note you created
    Edit {
        id: String,

        /// New text
        text: Option<String>,

        /// Image file to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Delete a note you created
    Rm { id: String },

    /// Keep the board on screen, refreshing periodically
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("pinboard=debug,pinboard_client=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pinboard=info,warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(mode) = cli.mode {
        config.write_mode = mode;
    }
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }

    let sync = Arc::new(NoteSync::from_config(&config)?);

    match cli.command {
        Commands::List { json } => {
            let notes = sync.get_all_notes().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&notes)?);
            } else {
                print_board(&sync, &notes);
            }
        }
        Commands::Add { text, image } => {
            let image = image.as_deref().map(image_data_url).transpose()?;
            let note = sync.create_note(text.as_deref(), image.as_deref()).await?;
            println!("Posted {}", note.id);
        }
        Commands::Edit { id, text, image } => {
            let id = NoteId::from(id);
            let image = image.as_deref().map(image_data_url).transpose()?;
            match sync
                .update_note(&id, text.as_deref(), image.as_deref())
                .await?
            {
                Some(note) => println!("Updated {}", note.id),
                None => bail!("You cannot edit note {id}"),
            }
        }
        Commands::Rm { id } => {
            let id = NoteId::from(id);
            if !sync.delete_note(&id).await? {
                bail!("You cannot delete note {id}");
            }
            println!("Deleted {id}");
        }
        Commands::Watch => watch(sync, &config).await?,
    }

    Ok(())
}

async fn watch(sync: Arc<NoteSync>, config: &ClientConfig) -> anyhow::Result<()> {
    let session = Arc::new(Mutex::new(Session::new()));

    refresh_once(&sync, &session).await;
    let mut shown = render(&sync, &session);

    let handle = spawn_refresh(sync.clone(), session.clone(), config.refresh_interval);
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let latest = session
                    .lock()
                    .map(|s| s.refreshed_at())
                    .unwrap_or(None);
                if latest != shown {
                    shown = render(&sync, &session);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.abort();
    Ok(())
}

fn render(sync: &NoteSync, session: &Mutex<Session>) -> Option<DateTime<Utc>> {
    let Ok(session) = session.lock() else {
        return None;
    };
    print_board(sync, session.notes());
    session.refreshed_at()
}

fn print_board(sync: &NoteSync, notes: &[NoteView]) {
    if notes.is_empty() {
        println!("(no notes yet)");
        return;
    }

    for note in notes {
        let marker = if sync.can_edit(&note.id) { "*" } else { " " };
        let when = DateTime::<Utc>::from_timestamp_millis(note.updated_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let image = if note.image_data_url.is_some() { " [image]" } else { "" };
        println!("{marker} {}  {when}{image}", note.id);
        for line in note.content.lines() {
            println!("    {line}");
        }
    }
}

fn image_data_url(path: &Path) -> anyhow::Result<String> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => bail!("Unsupported image type: {}", path.display()),
    };

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
