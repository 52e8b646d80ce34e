//! Interactive prompts
//!
//! dialoguer blocks the calling thread, so prompts run on the blocking pool
//! and the Ctrl-C handler in `main` stays responsive.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use std::io::ErrorKind;

use crate::error::Error;

/// Turn a failed prompt into an error, keeping Ctrl-C distinguishable
///
/// In raw mode the terminal reads Ctrl-C as a key and the prompt fails with
/// `Interrupted` instead of the process getting the signal first.
fn prompt_error(e: dialoguer::Error, what: &'static str) -> anyhow::Error {
    match e {
        dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted => Error::Interrupted.into(),
        e => anyhow::Error::new(e).context(what),
    }
}

/// Ask for one line of text; empty answers are returned as-is
pub async fn input(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await
    .context("Prompt task failed")?
    .map_err(|e| prompt_error(e, "Failed to read input"))
}

/// Ask for a secret without echoing it
pub async fn password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || Password::new().with_prompt(prompt).interact())
        .await
        .context("Prompt task failed")?
        .map_err(|e| prompt_error(e, "Failed to read password"))
}

/// Use `value` if given, otherwise prompt for it
pub async fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => input(prompt).await,
    }
}
