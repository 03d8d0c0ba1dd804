use anyhow::{Result, anyhow, bail};

use crate::dify::secrets::{
    ApiKeySource, get_api_key_from_sources, key_env_var, prompt_for_api_key,
};
use crate::dify::{self, DifyConfig, RewriteMode};
use crate::palette::Palette;
use crate::utils::ask_yn;

/// `set` is `Some(None)` when `--set` was passed without a value.
/// `load_config` only runs for `--test`.
pub fn run<F>(
    load_config: F,
    mode: RewriteMode,
    set: Option<Option<String>>,
    clear: bool,
    test: bool,
) -> Result<()>
where
    F: FnOnce() -> Result<DifyConfig>,
{
    let mut action_taken = false;

    if let Some(key) = set {
        let key = match key {
            Some(key) => key,
            None => prompt_for_api_key(mode)?,
        };
        dify::store_api_key(mode, &key)?;
        println!("Stored Dify {} API key in the local auth file.", mode);
        action_taken = true;
    }

    if clear {
        let confirmed = ask_yn(format!(
            "Remove the stored Dify {} API key?",
            Palette::paint(Palette::ACCENT, mode)
        ))?;
        if confirmed {
            if dify::clear_api_key(mode)? {
                println!("Removed the stored Dify {} API key.", mode);
            } else {
                println!("No Dify {} API key found in the auth file.", mode);
            }
        }
        action_taken = true;
    }

    if test {
        let config = load_config()?;
        let source = test_configured_api_key(&config, mode)?;
        println!(
            "Dify {} API key from the {} is {}.",
            mode,
            source.description(),
            Palette::paint(Palette::SUCCESS, "valid")
        );
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}

fn test_configured_api_key(config: &DifyConfig, mode: RewriteMode) -> Result<ApiKeySource> {
    let lookup = get_api_key_from_sources(mode)?;
    let disabled = || {
        anyhow!(
            "No Dify {} API key configured. Set {} or run `dify-rewrite key --mode {} --set <KEY>`.",
            mode,
            key_env_var(mode),
            mode
        )
    };
    let key = lookup.api_key.ok_or_else(disabled)?;
    let source = lookup.source.ok_or_else(disabled)?;

    dify::healthcheck(&config.base_url, &key, config.timeout)?;
    Ok(source)
}
