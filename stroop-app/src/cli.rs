use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stroop_experiment::{InstructionMode, SessionConfig};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Stroop color/word reaction-time experiment")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Subject identifier, used in artifact file names
    #[arg(long, default_value = "anonymous")]
    pub subject: String,

    /// Session configuration (JSON); missing fields take their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Trial budget split across the text and swatch framings (overrides config)
    #[arg(long)]
    pub trials: Option<usize>,

    /// Language of instructions and color words (overrides config)
    #[arg(long)]
    pub language: Option<String>,

    /// Directory for the trial log, chart and summary
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// TrueType font to draw text with
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Seed for a reproducible stimulus sequence (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Wait for a click on "?" instead of timing out instruction screens
    #[arg(long, default_value_t = false)]
    pub click_to_continue: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Recompute the statistics of a saved trial log without opening a window
    Analyze {
        #[arg(value_name = "CSV_PATH")]
        log: PathBuf,

        /// Also render the box plot to this PNG
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

impl Args {
    /// Loads the config file, if any, and applies command-line overrides.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                SessionConfig::from_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SessionConfig::default(),
        };
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.click_to_continue {
            config.instruction_mode = InstructionMode::Click;
        }
        Ok(config)
    }
}
