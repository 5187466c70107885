//! Command-line interface definitions.
//!
//! Defined with `clap` derive; the summarization API key can come from the
//! environment so it never has to appear on the command line.

use clap::Parser;

/// Command-line arguments for the Samachar Digest pipeline.
///
/// # Examples
///
/// ```sh
/// # Full pipeline with defaults
/// samachar_digest -o ./output
///
/// # Restrict to one source, skip summarization
/// samachar_digest -o ./output --sources merolagani --no-summaries
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON artifacts (links, articles, summaries)
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Optional path to a settings YAML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Source keys to scrape (defaults to all configured sources)
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Override the per-source link cap
    #[arg(long)]
    pub max_links_per_source: Option<usize>,

    /// Summarization API key (DeepSeek/OpenRouter-style)
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Skip the LLM summarization step
    #[arg(long)]
    pub no_summaries: bool,

    /// Disable browser-rendering fallback even when compiled in
    #[arg(long)]
    pub no_browser: bool,
}
