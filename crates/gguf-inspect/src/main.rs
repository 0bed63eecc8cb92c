mod cli;

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    //  Logging (stderr, so stdout carries only the dump)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();

    check_model_path(&args.gguf)?;

    let bytes = std::fs::read(&args.gguf)
        .with_context(|| format!("failed to read {}", args.gguf.display()))?;
    debug!(path = %args.gguf.display(), size = bytes.len(), "loaded model file");

    let out = gguf_parser::inspect(&bytes, &args.options())
        .with_context(|| format!("failed to decode {}", args.gguf.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Reject paths that are not an existing regular file before reading.
fn check_model_path(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_file_is_accepted() {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert!(check_model_path(&manifest).is_ok());
    }

    #[test]
    fn missing_file_is_reported() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("no-such-model.gguf");
        let err = check_model_path(&path).unwrap_err();
        assert_eq!(err.to_string(), format!("File not found: {}", path.display()));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let err = check_model_path(dir).unwrap_err();
        assert!(err.to_string().starts_with("File not found: "));
    }
}
