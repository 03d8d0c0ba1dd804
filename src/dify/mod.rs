pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod presets;
pub mod secrets;
pub mod transport;
pub mod workflow;

use std::fmt;

use clap::ValueEnum;

pub use client::DifyClient;
pub use config::DifyConfig;
pub use error::{DifyError, Result};
pub use presets::Preset;
pub use secrets::{clear_api_key, store_api_key};
pub use transport::{HttpTransport, Transport, healthcheck};

/// Which Dify app style a request goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum RewriteMode {
    Workflow,
    Chat,
}

impl RewriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Workflow => "workflow",
            RewriteMode::Chat => "chat",
        }
    }
}

impl fmt::Display for RewriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn with_client<F>(op: F) -> String
where
    F: FnOnce(&DifyClient) -> String,
{
    with_client_from(DifyConfig::from_sources(), op)
}

fn with_client_from<F>(config: anyhow::Result<DifyConfig>, op: F) -> String
where
    F: FnOnce(&DifyClient) -> String,
{
    match config.and_then(DifyClient::new) {
        Ok(client) => op(&client),
        Err(err) => {
            let message = DifyError::Unexpected(format!("{err:#}")).to_string();
            tracing::error!("{message}");
            message
        }
    }
}

/// Rewrites `text` through the workflow app using the configured credentials.
/// Failures come back as a human-readable message in place of the text.
pub fn workflow_rewrite(text: &str, instruction: &str) -> String {
    with_client(|client| client.workflow_rewrite(text, instruction))
}

/// Chat-app counterpart of [`workflow_rewrite`].
pub fn chat_rewrite(text: &str, instruction: &str) -> String {
    with_client(|client| client.chat_rewrite(text, instruction))
}

pub fn optimize(text: &str) -> String {
    with_client(|client| client.optimize(text))
}

pub fn expand(text: &str) -> String {
    with_client(|client| client.expand(text))
}

pub fn contract(text: &str) -> String {
    with_client(|client| client.contract(text))
}
