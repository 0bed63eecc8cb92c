use std::path::PathBuf;

use clap::Parser;
use gguf_parser::{InspectOptions, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "gguf-inspect",
    version,
    about = "Dump metadata key/value pairs from a GGUF file."
)]
pub struct Cli {
    /// Output as pretty-printed JSON instead of YAML-style blocks.
    #[arg(long)]
    pub json: bool,

    /// Exclude keys that start with PREFIX (can be repeated).
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Path to the GGUF file.
    #[arg(value_name = "MODEL.GGUF")]
    pub gguf: PathBuf,
}

impl Cli {
    pub fn options(&self) -> InspectOptions {
        InspectOptions {
            format: if self.json {
                OutputFormat::Json
            } else {
                OutputFormat::Block
            },
            exclude: self.exclude.clone(),
        }
    }
}
