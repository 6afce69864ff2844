//! InboxDrive CLI - browse drive files and recent mail from the terminal.
//!
//! This tool signs in against the Microsoft identity platform and shows
//! the signed-in user's drive hierarchy, storage quota, and recent
//! messages. Nothing is persisted between invocations; every run is its
//! own session.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use inboxdrive_auth::{AuthConfig, MicrosoftProvider};
use inboxdrive_common::{format_bytes, ItemId, MimeCategory};
use inboxdrive_graph::{GraphClient, ListingItem, MessageSummary, StorageQuota};
use inboxdrive_session::Session;

/// Width of the storage usage bar.
const BAR_WIDTH: usize = 30;

#[derive(Parser)]
#[command(name = "inboxdrive")]
#[command(about = "InboxDrive - drive files and mail from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Override the OAuth2 client ID.
    #[arg(long)]
    client_id: Option<String>,

    /// Override the identity platform authority.
    #[arg(long)]
    authority: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user's profile.
    Profile,

    /// List drive contents.
    Ls {
        /// Folder ID to list (default: drive root).
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Show the drive storage quota.
    Quota,

    /// Show recent messages.
    Mail {
        /// How many messages to show.
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Upload a file to the drive.
    Upload {
        /// Source file to upload.
        #[arg(short, long)]
        source: PathBuf,

        /// Target folder ID (default: drive root).
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Browse the drive interactively.
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let session = build_session(cli.client_id, cli.authority)?;

    match cli.command {
        Commands::Profile => cmd_profile(&session).await,
        Commands::Ls { folder } => cmd_ls(&session, folder.as_deref()).await,
        Commands::Quota => cmd_quota(&session).await,
        Commands::Mail { top } => cmd_mail(&session, top).await,
        Commands::Upload { source, folder } => {
            cmd_upload(&session, &source, folder.as_deref()).await
        }
        Commands::Browse => cmd_browse(&session).await,
    }
}

/// Wire provider, client, and session together.
fn build_session(client_id: Option<String>, authority: Option<String>) -> Result<Session> {
    let mut config = AuthConfig::default();
    if let Some(client_id) = client_id {
        config.client_id = client_id;
    }
    if let Some(authority) = authority {
        config.authority = authority;
    }

    let provider =
        Arc::new(MicrosoftProvider::new(config).context("Failed to create credential provider")?);
    let client = Arc::new(GraphClient::new(provider.clone()));

    Ok(Session::new(provider, client))
}

/// Show the signed-in user's profile.
async fn cmd_profile(session: &Session) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;

    match session.snapshot().await.profile {
        Some(profile) => {
            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);
        }
        None => println!("Profile unavailable."),
    }

    Ok(())
}

/// List drive contents.
async fn cmd_ls(session: &Session, folder: Option<&str>) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;

    if let Some(folder) = folder {
        let id = ItemId::new(folder).context("Invalid folder ID")?;
        session
            .navigator()
            .open_folder(id)
            .await
            .context("Failed to open folder")?;
    }

    print_listing(&session.snapshot().await.listing);
    Ok(())
}

/// Show the drive storage quota.
async fn cmd_quota(session: &Session) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;
    print_quota(session.snapshot().await.quota.as_ref());
    Ok(())
}

/// Show recent messages.
async fn cmd_mail(session: &Session, top: usize) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;

    let messages = session.snapshot().await.messages;
    print_messages(messages.iter().take(top));
    Ok(())
}

/// Upload a file to the drive.
async fn cmd_upload(session: &Session, source: &Path, folder: Option<&str>) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;

    if let Some(folder) = folder {
        let id = ItemId::new(folder).context("Invalid folder ID")?;
        session
            .navigator()
            .open_folder(id)
            .await
            .context("Failed to open target folder")?;
    }

    info!("Uploading {} to the drive", source.display());
    let result = upload_file(session, source).await;

    if let Some(notice) = session.take_notice().await {
        println!("{}", notice.message);
    }

    result
}

/// Browse the drive interactively.
async fn cmd_browse(session: &Session) -> Result<()> {
    session.sign_in().await.context("Sign-in failed")?;

    let state = session.snapshot().await;
    if let Some(profile) = &state.profile {
        println!("Signed in as {} <{}>", profile.name, profile.email);
    }
    print_quota(state.quota.as_ref());
    println!();
    print_listing(&state.listing);
    print_help();

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "open" => {
                let index: usize = match argument.parse() {
                    Ok(index) => index,
                    Err(_) => {
                        println!("Usage: open <number>");
                        continue;
                    }
                };

                let listing = session.snapshot().await.listing;
                let item = match listing.get(index.wrapping_sub(1)) {
                    Some(item) => item,
                    None => {
                        println!("No item {}.", index);
                        continue;
                    }
                };
                if !item.is_folder() {
                    println!("{} is not a folder.", item.name);
                    continue;
                }

                if let Err(e) = session.navigator().open_folder(item.id.clone()).await {
                    eprintln!("Could not open folder: {}", e);
                    continue;
                }
                print_listing(&session.snapshot().await.listing);
            }
            "back" => {
                if let Err(e) = session.navigator().go_back().await {
                    eprintln!("Could not go back: {}", e);
                    continue;
                }
                print_listing(&session.snapshot().await.listing);
            }
            "refresh" => {
                if let Err(e) = session.navigator().refresh().await {
                    eprintln!("Could not refresh: {}", e);
                    continue;
                }
                print_listing(&session.snapshot().await.listing);
            }
            "upload" => {
                if argument.is_empty() {
                    println!("Usage: upload <path>");
                    continue;
                }

                if let Err(e) = upload_file(session, Path::new(argument)).await {
                    eprintln!("{}", e);
                }
                if let Some(notice) = session.take_notice().await {
                    println!("{}", notice.message);
                }
                print_listing(&session.snapshot().await.listing);
            }
            "mail" => print_messages(session.snapshot().await.messages.iter()),
            "quota" => print_quota(session.snapshot().await.quota.as_ref()),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {}", other),
        }
    }

    session.sign_out().await.context("Sign-out failed")?;
    Ok(())
}

/// Read a local file and hand it to the navigator for upload.
async fn upload_file(session: &Session, source: &Path) -> Result<()> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .context("Source file has no usable name")?;

    let content = tokio::fs::read(source)
        .await
        .context("Failed to read source file")?;
    let content_type = guess_content_type(source);

    session
        .navigator()
        .upload(name, content_type, content)
        .await?;
    Ok(())
}

/// Guess a MIME type from the file extension.
fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("txt") | Some("md") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn marker(item: &ListingItem) -> &'static str {
    match item.category {
        MimeCategory::Folder => "[DIR] ",
        MimeCategory::Image => "[IMG] ",
        MimeCategory::Video => "[VID] ",
        MimeCategory::Other => "[FILE]",
    }
}

fn print_listing(items: &[ListingItem]) {
    if items.is_empty() {
        println!("Folder is empty.");
        return;
    }

    for (index, item) in items.iter().enumerate() {
        println!("  {:>2}. {} {}", index + 1, marker(item), item.name);
    }
}

fn print_quota(quota: Option<&StorageQuota>) {
    match quota {
        Some(quota) => {
            let percent = quota.percent_used();
            let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);

            println!(
                "Storage: {} / {} ({:.1}%)",
                format_bytes(quota.used),
                format_bytes(quota.total),
                percent
            );
            println!("  [{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));
        }
        None => println!("Storage quota unavailable."),
    }
}

fn print_messages<'a>(messages: impl Iterator<Item = &'a MessageSummary>) {
    let mut empty = true;
    for message in messages {
        empty = false;
        let subject = message.subject.as_deref().unwrap_or("(no subject)");
        let sender = message.sender.as_deref().unwrap_or("unknown sender");
        let received = message
            .received_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M");

        println!("  {}  {}  (from {})", received, subject, sender);
    }

    if empty {
        println!("No messages.");
    }
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  open <n>       open folder number n");
    println!("  back           go back up one level");
    println!("  upload <path>  upload a local file into this folder");
    println!("  refresh        re-fetch the current folder");
    println!("  mail           show recent messages");
    println!("  quota          show storage usage");
    println!("  quit           sign out and exit");
}
