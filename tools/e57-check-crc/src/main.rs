/*
 * Small application that will validate all CRC checksums of E57 files.
 * If the argument is a file path, it will check a single file.
 * If the argument is a directory, will check recursively all E57 files in that directory.
 * Set RUST_LOG=debug to see details of each checked file.
 */

use anyhow::{bail, ensure, Context, Result};
use e57_decoder::E57Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    ensure!(
        args.len() >= 2,
        "Usage:\n  e57-check-crc <path/to/my.e57>\n  e57-check-crc <path/to/folder/>"
    );

    let path = Path::new(&args[1]);
    ensure!(path.exists(), "The path '{}' does not exist", path.display());

    let all_ok = if path.is_dir() {
        let files = list_e57_files(path).context("Failed to list E57 files")?;
        println!("Found {} files, starting validation...", files.len());
        files.iter().fold(true, |ok, f| check_file(f) && ok)
    } else if path.is_file() {
        check_file(path)
    } else {
        bail!(
            "The path '{}' does not point to a directory or a file",
            path.display()
        );
    };

    if !all_ok {
        bail!("Some of the checked files are not okay")
    }

    println!("All files are okay!");
    Ok(())
}

fn list_e57_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut res = Vec::new();
    let entries = path
        .read_dir()
        .with_context(|| format!("Failed to read directory '{}'", path.display()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            let is_e57 = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("e57"));
            if is_e57 {
                res.push(path);
            }
        } else if path.is_dir() {
            res.append(&mut list_e57_files(&path)?);
        }
    }
    Ok(res)
}

fn check_file(path: &Path) -> bool {
    let result = File::open(path)
        .context("Failed to open file")
        .and_then(|f| E57Reader::validate_crc(BufReader::new(f)).map_err(anyhow::Error::from));
    match result {
        Ok(pages) => {
            tracing::debug!(file = %path.display(), pages, "Validated file");
            println!("Validated file '{}' successfully", path.display());
            true
        }
        Err(err) => {
            eprintln!("Failed to validate file '{}': {err:#}", path.display());
            false
        }
    }
}
