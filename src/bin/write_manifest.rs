//! Manifest utility for Cardialyze models.
//!
//! Writes `manifest.json` next to `gbt_model.json`, binding the model file
//! to its SHA-256 digest and schema. The application verifies the manifest
//! at startup when present.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- [model_dir]
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use cardialyze::adapters::gbt::ModelManifest;

fn usage() -> &'static str {
    "Usage: write_manifest [model_dir]  (defaults to ./models)"
}

fn parse_args() -> Result<PathBuf> {
    let mut model_dir: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => bail!(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!(usage()),
        }
    }

    let model_dir = model_dir.unwrap_or_else(|| PathBuf::from("models"));
    if model_dir.is_file() {
        return model_dir
            .parent()
            .map(PathBuf::from)
            .context("Model path has no parent directory");
    }
    Ok(model_dir)
}

fn main() -> Result<()> {
    let model_dir = parse_args()?;

    let manifest = ModelManifest::for_model_dir(&model_dir)
        .with_context(|| format!("Cannot build manifest for {model_dir:?}"))?;
    let path = manifest
        .write(&model_dir)
        .with_context(|| format!("Cannot write manifest into {model_dir:?}"))?;

    for (file, digest) in &manifest.files {
        println!("{file}  {digest}");
    }
    println!("Wrote {}", path.display());
    Ok(())
}
