use serde_json::Value;

use super::config::DifyConfig;
use super::error::{DifyError, Result};
use super::presets::Preset;
use super::transport::{HttpTransport, Transport};
use super::{RewriteMode, chat, workflow};

const INSTRUCTION_PREVIEW_CHARS: usize = 50;

/// Blocking client for the workflow and chat rewrite apps.
///
/// The `try_*` methods and [`DifyClient::rewrite`] return typed errors. The
/// plain methods (`workflow_rewrite`, `chat_rewrite`, `optimize`, `expand`,
/// `contract`) never fail: any error is rendered into the returned string.
#[derive(Clone, Debug)]
pub struct DifyClient<T = HttpTransport> {
    config: DifyConfig,
    transport: T,
}

impl DifyClient<HttpTransport> {
    pub fn new(config: DifyConfig) -> anyhow::Result<Self> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> DifyClient<T> {
    pub fn with_transport(config: DifyConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &DifyConfig {
        &self.config
    }

    pub fn rewrite(&self, mode: RewriteMode, text: &str, instruction: &str) -> Result<String> {
        let preview: String = instruction.chars().take(INSTRUCTION_PREVIEW_CHARS).collect();
        tracing::info!(
            %mode,
            text_len = text.len(),
            "Calling Dify text rewrite API, instruction: {preview}..."
        );

        let result = self.send(mode, text, instruction);
        match &result {
            Ok(_) => tracing::info!(%mode, "Text rewrite succeeded"),
            Err(err) => tracing::error!(%mode, "{err}"),
        }
        result
    }

    fn send(&self, mode: RewriteMode, text: &str, instruction: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key(mode)
            .ok_or(DifyError::MissingApiKey(mode))?;

        let user = self.config.user(mode);
        let body = match mode {
            RewriteMode::Workflow => workflow::build_payload(text, instruction, user),
            RewriteMode::Chat => chat::build_payload(text, instruction, user),
        };

        let raw = self.transport.post_json(
            &self.config.endpoint(mode),
            api_key,
            &body,
            self.config.timeout,
        )?;
        let response: Value = serde_json::from_str(&raw)?;
        tracing::debug!("Full response: {response}");

        match mode {
            RewriteMode::Workflow => workflow::extract_result(&response),
            RewriteMode::Chat => chat::extract_answer(&response),
        }
    }

    pub fn try_workflow_rewrite(&self, text: &str, instruction: &str) -> Result<String> {
        self.rewrite(RewriteMode::Workflow, text, instruction)
    }

    pub fn try_chat_rewrite(&self, text: &str, instruction: &str) -> Result<String> {
        self.rewrite(RewriteMode::Chat, text, instruction)
    }

    pub fn apply(&self, preset: Preset, text: &str) -> Result<String> {
        self.try_workflow_rewrite(text, preset.instruction())
    }

    pub fn workflow_rewrite(&self, text: &str, instruction: &str) -> String {
        into_message(self.try_workflow_rewrite(text, instruction))
    }

    pub fn chat_rewrite(&self, text: &str, instruction: &str) -> String {
        into_message(self.try_chat_rewrite(text, instruction))
    }

    pub fn optimize(&self, text: &str) -> String {
        self.workflow_rewrite(text, Preset::Optimize.instruction())
    }

    pub fn expand(&self, text: &str) -> String {
        self.workflow_rewrite(text, Preset::Expand.instruction())
    }

    pub fn contract(&self, text: &str) -> String {
        self.workflow_rewrite(text, Preset::Contract.instruction())
    }
}

fn into_message(result: Result<String>) -> String {
    result.unwrap_or_else(|err| err.to_string())
}
