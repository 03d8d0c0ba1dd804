use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dify_rewrite::commands::rewrite::Task;
use dify_rewrite::commands::{key, rewrite};
use dify_rewrite::dify::config::parse_timeout_secs;
use dify_rewrite::dify::{DifyConfig, Preset, RewriteMode};

#[derive(Parser, Debug)]
#[command(
    name = "dify-rewrite",
    version,
    about = "Rewrite, expand and condense text with a Dify app.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Dify API base URL (defaults to DIFY_API_BASE_URL or https://api.dify.ai/v1)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    /// Request timeout in seconds (defaults to DIFY_REQUEST_TIMEOUT_SECS or 120)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<String>,
    /// Print the result as a JSON object instead of plain text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Make text clearer, more accurate and more professional
    Optimize {
        /// Text to rewrite. Read from stdin when omitted. The CLI refuses blank
        /// input; the library passes empty text to Dify unchanged.
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },
    /// Add detail while keeping the core meaning
    Expand {
        /// Text to rewrite. Read from stdin when omitted. The CLI refuses blank
        /// input; the library passes empty text to Dify unchanged.
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },
    /// Condense text, dropping redundancy
    Contract {
        /// Text to rewrite. Read from stdin when omitted. The CLI refuses blank
        /// input; the library passes empty text to Dify unchanged.
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },
    /// Rewrite text following a custom instruction
    Rewrite {
        /// Text to rewrite. Read from stdin when omitted. The CLI refuses blank
        /// input; the library passes empty text to Dify unchanged.
        #[arg(value_name = "TEXT")]
        text: Option<String>,
        /// What to do with the text
        #[arg(short, long, value_name = "INSTRUCTION")]
        instruction: String,
        /// Which Dify app to send the request to
        #[arg(long, value_enum, default_value_t = RewriteMode::Workflow)]
        mode: RewriteMode,
    },
    /// Manage stored Dify API keys
    Key {
        /// Which app's key to manage
        #[arg(long, value_enum, default_value_t = RewriteMode::Workflow)]
        mode: RewriteMode,
        /// Store a key in the local auth file; prompts when no KEY is given
        #[arg(long, value_name = "KEY", num_args = 0..=1, conflicts_with = "clear")]
        set: Option<Option<String>>,
        /// Remove the stored key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured key against the Dify API
        #[arg(long, conflicts_with = "clear")]
        test: bool,
    },
}

fn main() {
    init_tracing();
    if let Err(err) = run_cli() {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let base_url = cli.base_url.as_deref();
    let timeout = cli.timeout.as_deref();

    match cli.command {
        Command::Optimize { text } => {
            let config = load_config(base_url, timeout)?;
            rewrite::run(config, Task::Preset(Preset::Optimize), text, cli.json)?
        }
        Command::Expand { text } => {
            let config = load_config(base_url, timeout)?;
            rewrite::run(config, Task::Preset(Preset::Expand), text, cli.json)?
        }
        Command::Contract { text } => {
            let config = load_config(base_url, timeout)?;
            rewrite::run(config, Task::Preset(Preset::Contract), text, cli.json)?
        }
        Command::Rewrite {
            text,
            instruction,
            mode,
        } => {
            let config = load_config(base_url, timeout)?;
            rewrite::run(config, Task::Custom { instruction, mode }, text, cli.json)?
        }
        Command::Key {
            mode,
            set,
            clear,
            test,
        } => key::run(|| load_config(base_url, timeout), mode, set, clear, test)?,
    }

    Ok(())
}

fn load_config(base_url: Option<&str>, timeout: Option<&str>) -> Result<DifyConfig> {
    let mut config = DifyConfig::from_sources()?;
    if let Some(url) = base_url {
        config = config.with_base_url(url);
    }
    if let Some(raw) = timeout {
        config = config.with_timeout(parse_timeout_secs(raw)?);
    }
    Ok(config)
}
