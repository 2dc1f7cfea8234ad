//! Subcommand implementations.

use std::{collections::HashMap, path::Path};

use anyhow::{Context as _, Result, bail};
use bytes::Bytes;
use parley_chat::{ChatService, SendOutcome, SkipReason};
use parley_core::{message::ChatMessage, messaging::Permission};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use uuid::Uuid;

use crate::{
  render::{content_type_for, render_message},
  wiring::LocalBackend,
};

type Chat = ChatService<LocalBackend>;

// ─── Output helpers ───────────────────────────────────────────────────────────

fn report(outcome: &SendOutcome) {
  match outcome {
    SendOutcome::Sent(r) => println!("sent {}", r.path),
    SendOutcome::Skipped(SkipReason::EmptyMessage) => println!("nothing to send"),
    SendOutcome::Skipped(SkipReason::SignedOut) => {
      println!("not signed in; configure a [profile] to send")
    }
  }
}

/// Messages in `batch` that are new or whose image changed, oldest first.
///
/// `seen` ends up holding exactly the messages of `batch`.
fn unseen<'a>(
  batch: &'a [ChatMessage],
  seen: &mut HashMap<Uuid, Option<String>>,
) -> Vec<&'a ChatMessage> {
  let fresh = batch
    .iter()
    .rev()
    .filter(|m| seen.get(&m.id) != Some(&m.image_url))
    .collect();
  *seen = batch.iter().map(|m| (m.id, m.image_url.clone())).collect();
  fresh
}

fn print_new(batch: &[ChatMessage], seen: &mut HashMap<Uuid, Option<String>>) {
  for message in unseen(batch, seen) {
    println!("{}", render_message(message));
  }
}

async fn read_image(path: &Path) -> Result<(String, Bytes)> {
  let file_name = path
    .file_name()
    .and_then(|n| n.to_str())
    .with_context(|| format!("not a file path: {}", path.display()))?
    .to_owned();
  let data = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading {}", path.display()))?;
  Ok((file_name, Bytes::from(data)))
}

async fn send_image_file(chat: &Chat, path: &Path, content_type: Option<&str>) -> Result<SendOutcome> {
  let (file_name, data) = read_image(path).await?;
  let content_type = content_type.unwrap_or_else(|| content_type_for(&file_name));
  chat
    .send_image(&file_name, data, content_type)
    .await
    .context("sending image")
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// Interactive session: stdin lines are sent, the live view is printed.
///
/// `/image FILE` posts an image, `/quit` (or EOF, or Ctrl-C) leaves.
pub async fn interactive(chat: &Chat) -> Result<()> {
  chat.sign_in().await.context("sign in")?;

  let mut recent = chat.observe_recent().await.context("loading messages")?;
  let mut seen = HashMap::new();
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  loop {
    tokio::select! {
      batch = recent.next() => {
        let Some(batch) = batch else { break };
        print_new(&batch, &mut seen);
      }
      line = lines.next_line() => {
        let Some(line) = line.context("reading stdin")? else { break };
        let line = line.trim();
        if line == "/quit" {
          break;
        }
        let outcome = match line.strip_prefix("/image ") {
          Some(path) => send_image_file(chat, Path::new(path.trim()), None).await,
          None => chat.send_text(line).await.context("sending message"),
        };
        match outcome {
          Ok(SendOutcome::Sent(_)) => {}
          Ok(skipped) => report(&skipped),
          Err(e) => eprintln!("error: {e:#}"),
        }
      }
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  recent.cancel();
  chat.sign_out().await.context("sign out")
}

pub async fn send(chat: &Chat, text: &str) -> Result<()> {
  chat.sign_in().await.context("sign in")?;
  let outcome = chat.send_text(text).await.context("sending message")?;
  report(&outcome);
  chat.sign_out().await.context("sign out")
}

pub async fn send_image(chat: &Chat, path: &Path, content_type: Option<&str>) -> Result<()> {
  chat.sign_in().await.context("sign in")?;
  let outcome = send_image_file(chat, path, content_type).await?;
  report(&outcome);
  chat.sign_out().await.context("sign out")
}

/// Print the current recent messages once, oldest first.
pub async fn history(chat: &Chat) -> Result<()> {
  let recent = chat.observe_recent().await.context("loading messages")?;
  for message in recent.snapshot().iter().rev() {
    println!("{}", render_message(message));
  }
  recent.cancel();
  Ok(())
}

/// Follow the recent messages until Ctrl-C.
pub async fn watch(chat: &Chat) -> Result<()> {
  let mut recent = chat.observe_recent().await.context("loading messages")?;
  let mut seen = HashMap::new();
  loop {
    tokio::select! {
      batch = recent.next() => {
        let Some(batch) = batch else { break };
        print_new(&batch, &mut seen);
      }
      _ = tokio::signal::ctrl_c() => break,
    }
  }
  Ok(())
}

pub async fn notify(chat: &Chat) -> Result<()> {
  chat.sign_in().await.context("sign in")?;
  let permission = chat
    .request_notification_permission()
    .await
    .context("requesting notification permission")?;
  match permission {
    Permission::Granted => println!("notifications enabled; device registered"),
    Permission::Denied | Permission::Default => println!("notifications not permitted"),
  }
  chat.sign_out().await.context("sign out")
}

// ─── Documents ────────────────────────────────────────────────────────────────

pub async fn doc_get(chat: &Chat, path: &str) -> Result<()> {
  match chat.get_document(path).await? {
    Some(doc) => println!("{}", serde_json::to_string_pretty(&doc.data)?),
    None => bail!("no document at {path}"),
  }
  Ok(())
}

pub async fn doc_list(chat: &Chat, path: &str) -> Result<()> {
  for doc in chat.list_collection(path).await? {
    println!("{}\t{}", doc.path, serde_json::to_string(&doc.data)?);
  }
  Ok(())
}

pub async fn doc_set(chat: &Chat, path: &str, json: &str) -> Result<()> {
  let data = serde_json::from_str(json).context("parsing document JSON")?;
  let doc = chat.update_document(path, data).await?;
  println!("{}", serde_json::to_string_pretty(&doc.data)?);
  Ok(())
}

pub async fn doc_delete(chat: &Chat, path: &str) -> Result<()> {
  if chat.delete_document(path).await? {
    println!("deleted {path}");
  } else {
    println!("no document at {path}");
  }
  Ok(())
}
