use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Source language code, or "auto"
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    /// Target language code
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Translation provider (google, libretranslate)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// LibreTranslate base URL
    #[arg(long, global = true)]
    pub libre_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate the comments of a single source file
    Translate {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,

        /// Write the result here instead of editing the input in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Language id (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Show the rewritten lines without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate, in place, the comments of every recognised file in a directory
    Batch {
        /// Input directory
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Show the rewritten lines without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the comments found in a source file
    Extract {
        /// Input source file
        #[arg(short, long)]
        input: PathBuf,

        /// Language id (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Print the comments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate a piece of text
    Text {
        /// Text to translate
        text: String,
    },

    /// List the languages with known comment patterns
    Languages,

    /// Write the effective configuration (defaults plus overrides) to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "comment-translator.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
