//! The internal checkpoint workflow.
//!
//! Produces one commit from whatever changed in a repository's working tree:
//! `status`, then `add`, `commit` and `show`, each issued through the
//! gateway as an internal request and awaited before the next. Nothing is
//! rolled back if a later step fails.

use log::info;
use std::collections::BTreeMap;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{Gateway, GatewayRequest};
use crate::git::SHADOW_STORE_MARKER;

pub const MAX_TITLE_LENGTH: usize = 50;
pub const DEFAULT_AUTHOR: &str = "AI Assistant";
const EMAIL_DOMAIN: &str = "shadowgit.local";

/// Input for a checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRequest {
    pub repository: String,
    pub title: String,
    pub message: Option<String>,
    pub author: Option<String>,
}

impl CheckpointRequest {
    pub fn new(repository: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            title: title.into(),
            message: None,
            author: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// The working tree matched the last commit
    NoChanges,
    Created {
        hash: String,
        title: String,
        author: String,
        stat: String,
    },
}

impl std::fmt::Display for CheckpointOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointOutcome::NoChanges => write!(f, "No changes to checkpoint."),
            CheckpointOutcome::Created {
                hash,
                title,
                author,
                stat,
            } => {
                write!(f, "Checkpoint created: {}\nTitle: {}\nAuthor: {}", hash, title, author)?;
                if !stat.is_empty() {
                    write!(f, "\n\n{}", stat)?;
                }
                Ok(())
            }
        }
    }
}

pub struct Checkpoint;

impl Checkpoint {
    pub async fn create(
        gateway: &Gateway,
        request: CheckpointRequest,
    ) -> GatewayResult<CheckpointOutcome> {
        let title = request.title.trim().to_string();
        validate_title(&title)?;

        let author = request
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR)
            .to_string();
        let repository = request.repository;
        // The store may live inside the working tree; never snapshot it
        let exclude_store = format!(":(exclude){}", SHADOW_STORE_MARKER);

        let status = gateway
            .execute(GatewayRequest::internal(
                repository.as_str(),
                ["status", "--porcelain", "--", ".", exclude_store.as_str()],
            ))
            .await?;
        if status.trim().is_empty() {
            info!("Checkpoint skipped for '{}': working tree clean", repository);
            return Ok(CheckpointOutcome::NoChanges);
        }

        gateway
            .execute(GatewayRequest::internal(
                repository.as_str(),
                ["add", "-A", "--", ".", exclude_store.as_str()],
            ))
            .await?;

        let commit_message = match request.message.as_deref().map(str::trim) {
            Some(body) if !body.is_empty() => format!("{}\n\n{}", title, body),
            _ => title.clone(),
        };
        gateway
            .execute(
                GatewayRequest::internal(
                    repository.as_str(),
                    ["commit", "-m", commit_message.as_str()],
                )
                .with_env(author_env(&author)),
            )
            .await?;

        let shown = gateway
            .execute(GatewayRequest::internal(
                repository.as_str(),
                ["show", "--stat", "--format=%H", "HEAD"],
            ))
            .await?;
        let (hash, stat) = split_show_output(&shown)?;

        info!("Checkpoint {} created in '{}'", hash, repository);
        Ok(CheckpointOutcome::Created {
            hash,
            title,
            author,
            stat,
        })
    }
}

fn validate_title(title: &str) -> GatewayResult<()> {
    if title.is_empty() {
        return Err(GatewayError::InvalidInput(
            "Checkpoint title is required".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(GatewayError::InvalidInput(format!(
            "Checkpoint title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Derive a stable address from the author name: "AI Assistant" becomes
/// "ai-assistant@shadowgit.local"
pub fn author_email(author: &str) -> String {
    let local = author
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    format!("{}@{}", local, EMAIL_DOMAIN)
}

fn author_env(author: &str) -> BTreeMap<String, String> {
    let email = author_email(author);
    [
        ("GIT_AUTHOR_NAME", author.to_string()),
        ("GIT_AUTHOR_EMAIL", email.clone()),
        ("GIT_COMMITTER_NAME", author.to_string()),
        ("GIT_COMMITTER_EMAIL", email),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn split_show_output(output: &str) -> GatewayResult<(String, String)> {
    let mut lines = output.lines();
    let hash = lines
        .next()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            GatewayError::UnknownFailure("Commit succeeded but no hash was reported".to_string())
        })?
        .to_string();
    let stat = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    Ok((hash, stat))
}
