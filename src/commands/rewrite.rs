use anyhow::{Context, Result, bail};
use serde_json::json;

use crate::dify::{DifyClient, DifyConfig, Preset, RewriteMode};
use crate::utils::text_or_stdin;

const CUSTOM_OUTPUT_FIELD: &str = "modified_text";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    Preset(Preset),
    Custom {
        instruction: String,
        mode: RewriteMode,
    },
}

impl Task {
    fn output_field(&self) -> &'static str {
        match self {
            Task::Preset(preset) => preset.output_field(),
            Task::Custom { .. } => CUSTOM_OUTPUT_FIELD,
        }
    }
}

pub fn run(config: DifyConfig, task: Task, text: Option<String>, as_json: bool) -> Result<()> {
    let text = text_or_stdin(text)?;
    if text.trim().is_empty() {
        bail!("Nothing to rewrite: the input text is empty.");
    }

    let client = DifyClient::new(config)?;
    let rewritten = match &task {
        Task::Preset(preset) => client.apply(*preset, &text)?,
        Task::Custom { instruction, mode } => client.rewrite(*mode, &text, instruction)?,
    };

    println!("{}", render_output(&task, &rewritten, as_json)?);
    Ok(())
}

fn render_output(task: &Task, rewritten: &str, as_json: bool) -> Result<String> {
    if !as_json {
        return Ok(rewritten.to_string());
    }
    let value = json!({ task.output_field(): rewritten });
    serde_json::to_string(&value).context("Failed to serialize result")
}
