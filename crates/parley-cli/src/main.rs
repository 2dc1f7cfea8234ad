//! `parley` — command-line chat client.
//!
//! # Usage
//!
//! ```text
//! parley --config parley.toml chat
//! parley send "hello everyone"
//! parley send-image cat.png
//! parley watch
//! ```

mod commands;
mod settings;
mod render;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use settings::ClientConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parley chat client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "parley.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Interactive chat: type to send, `/image FILE` for images, `/quit` to leave.
  Chat,
  /// Send one text message.
  Send {
    #[arg(required = true)]
    text: Vec<String>,
  },
  /// Upload an image and post it as a message.
  SendImage {
    file: PathBuf,
    /// MIME type; guessed from the extension when omitted.
    #[arg(long)]
    content_type: Option<String>,
  },
  /// Print the most recent messages and exit.
  History,
  /// Print messages as they arrive until Ctrl-C.
  Watch,
  /// Ask for notification permission and register this device.
  Notify,
  /// Read and write documents by path.
  #[command(subcommand)]
  Doc(DocCommand),
}

#[derive(Subcommand)]
enum DocCommand {
  Get { path: String },
  List { path: String },
  /// Merge a JSON object into the document.
  Set { path: String, json: String },
  Delete { path: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = ClientConfig::load(&cli.config)?;
  let chat = wiring::connect(&config).await?;

  match cli.command {
    Command::Chat => commands::interactive(&chat).await,
    Command::Send { text } => commands::send(&chat, &text.join(" ")).await,
    Command::SendImage { file, content_type } => {
      commands::send_image(&chat, &file, content_type.as_deref()).await
    }
    Command::History => commands::history(&chat).await,
    Command::Watch => commands::watch(&chat).await,
    Command::Notify => commands::notify(&chat).await,
    Command::Doc(DocCommand::Get { path }) => commands::doc_get(&chat, &path).await,
    Command::Doc(DocCommand::List { path }) => commands::doc_list(&chat, &path).await,
    Command::Doc(DocCommand::Set { path, json }) => {
      commands::doc_set(&chat, &path, &json).await
    }
    Command::Doc(DocCommand::Delete { path }) => commands::doc_delete(&chat, &path).await,
  }
}
