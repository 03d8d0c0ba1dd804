use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};

use super::RewriteMode;
use super::secrets::get_api_key_from_sources;

pub const BASE_URL_ENV: &str = "DIFY_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "DIFY_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.dify.ai/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const WORKFLOW_USER: &str = "text-rewrite-user";
const CHAT_USER: &str = "text-rewrite-chat-user";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DifyConfig {
    pub base_url: String,
    pub workflow_api_key: Option<String>,
    pub chat_api_key: Option<String>,
    pub timeout: Duration,
    pub workflow_user: String,
    pub chat_user: String,
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            workflow_api_key: None,
            chat_api_key: None,
            timeout: DEFAULT_TIMEOUT,
            workflow_user: WORKFLOW_USER.to_string(),
            chat_user: CHAT_USER.to_string(),
        }
    }
}

impl DifyConfig {
    /// Environment for base URL and timeout, then the credential lookup for both keys.
    pub fn from_sources() -> Result<Self> {
        let mut config = Self::from_lookup(|name| env::var(name).ok())?;
        config.workflow_api_key = get_api_key_from_sources(RewriteMode::Workflow)?.api_key;
        config.chat_api_key = get_api_key_from_sources(RewriteMode::Chat)?.api_key;
        Ok(config)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            config = config.with_base_url(&url);
        }

        if let Some(raw) = lookup(TIMEOUT_ENV)
            && !raw.trim().is_empty()
        {
            config.timeout = parse_timeout_secs(&raw)?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, mode: RewriteMode, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match mode {
            RewriteMode::Workflow => self.workflow_api_key = key,
            RewriteMode::Chat => self.chat_api_key = key,
        }
        self
    }

    pub fn api_key(&self, mode: RewriteMode) -> Option<&str> {
        match mode {
            RewriteMode::Workflow => self.workflow_api_key.as_deref(),
            RewriteMode::Chat => self.chat_api_key.as_deref(),
        }
    }

    pub fn user(&self, mode: RewriteMode) -> &str {
        match mode {
            RewriteMode::Workflow => &self.workflow_user,
            RewriteMode::Chat => &self.chat_user,
        }
    }

    pub fn endpoint(&self, mode: RewriteMode) -> String {
        let path = match mode {
            RewriteMode::Workflow => "workflows/run",
            RewriteMode::Chat => "chat-messages",
        };
        format!("{}/{}", self.base_url, path)
    }
}

pub fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid timeout `{}`: expected a whole number of seconds", raw.trim()))?;
    if secs == 0 {
        return Err(anyhow!("Timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}
