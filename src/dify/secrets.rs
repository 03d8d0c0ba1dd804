use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use serde::{Deserialize, Serialize};

use super::RewriteMode;
use crate::utils::get_data_dir;
use crate::utils::trim_line;
use crate::{palette::Palette, utils::strip_controls_and_escapes};

pub const WORKFLOW_KEY_ENV: &str = "DIFY_WORKFLOW_API_KEY";
pub const CHAT_KEY_ENV: &str = "DIFY_CHAT_API_KEY";

const AUTH_FILE_NAME: &str = "auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

pub fn key_env_var(mode: RewriteMode) -> &'static str {
    match mode {
        RewriteMode::Workflow => WORKFLOW_KEY_ENV,
        RewriteMode::Chat => CHAT_KEY_ENV,
    }
}

fn provider_name(mode: RewriteMode) -> &'static str {
    match mode {
        RewriteMode::Workflow => "dify-workflow",
        RewriteMode::Chat => "dify-chat",
    }
}

#[derive(Debug)]
pub struct ApiKeyLookup {
    pub api_key: Option<String>,
    pub source: Option<ApiKeySource>,
}

impl ApiKeyLookup {
    fn missing() -> Self {
        Self {
            api_key: None,
            source: None,
        }
    }
}

pub fn prompt_for_api_key(mode: RewriteMode) -> Result<String> {
    println!(
        "{} for the {} app (Dify console, API Access). It's stored locally for future use.",
        Palette::paint(Palette::SUCCESS, "Enter your Dify API key"),
        Palette::paint(Palette::ACCENT, mode)
    );
    println!(
        "{}",
        Palette::dim(format!(
            "Alternatively, set {} in the environment.",
            key_env_var(mode)
        ))
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(password.trim().to_string())
}

pub fn store_api_key(mode: RewriteMode, api_key: &str) -> Result<()> {
    store_api_key_at(&auth_file_path()?, mode, api_key)
}

pub fn clear_api_key(mode: RewriteMode) -> Result<bool> {
    clear_api_key_at(&auth_file_path()?, mode)
}

pub fn get_api_key_from_sources(mode: RewriteMode) -> Result<ApiKeyLookup> {
    let env_value = env::var(key_env_var(mode)).ok();
    lookup_api_key(mode, env_value, &auth_file_path()?)
}

fn store_api_key_at(auth_path: &Path, mode: RewriteMode, api_key: &str) -> Result<()> {
    let cleaned = strip_controls_and_escapes(api_key);
    let trimmed = trim_line(&cleaned).with_context(|| "Cannot store an empty API key")?;

    let mut auth = read_auth_file(auth_path)?.unwrap_or_default();
    auth.providers.insert(
        provider_name(mode).to_string(),
        ProviderAuth {
            key: trimmed.to_string(),
        },
    );

    write_auth_file(auth_path, &auth)
}

fn clear_api_key_at(auth_path: &Path, mode: RewriteMode) -> Result<bool> {
    let Some(mut auth) = read_auth_file(auth_path)? else {
        return Ok(false);
    };

    if auth.providers.remove(provider_name(mode)).is_none() {
        return Ok(false);
    }

    if auth.providers.is_empty() {
        fs::remove_file(auth_path).with_context(|| {
            format!(
                "Failed to remove empty auth file at {}",
                auth_path.display()
            )
        })?;
        return Ok(true);
    }

    write_auth_file(auth_path, &auth)?;
    Ok(true)
}

fn lookup_api_key(
    mode: RewriteMode,
    env_value: Option<String>,
    auth_path: &Path,
) -> Result<ApiKeyLookup> {
    // 1. Environment variable
    if let Some(value) = env_value
        && let Some(trimmed) = trim_line(&value)
    {
        return Ok(ApiKeyLookup {
            api_key: Some(trimmed.to_string()),
            source: Some(ApiKeySource::Environment),
        });
    }

    // 2. Auth file
    let Some(auth) = read_auth_file(auth_path)? else {
        return Ok(ApiKeyLookup::missing());
    };

    let key = auth
        .providers
        .get(provider_name(mode))
        .and_then(|entry| trim_line(&entry.key))
        .map(str::to_string);

    match key {
        Some(api_key) => Ok(ApiKeyLookup {
            api_key: Some(api_key),
            source: Some(ApiKeySource::AuthFile),
        }),
        None => Ok(ApiKeyLookup::missing()),
    }
}

fn auth_file_path() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;
    Ok(data_dir.join(AUTH_FILE_NAME))
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_auth_contents(&contents, path)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read auth file at {}", path.display()))
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    let contents = serialize_auth(value)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write auth file at {}", path.display()))?;
    Ok(())
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<Option<AuthFile>> {
    if contents.trim().is_empty() {
        return Ok(Some(AuthFile::default()));
    }

    let parsed: AuthFile = serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))?;
    Ok(Some(parsed))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}
