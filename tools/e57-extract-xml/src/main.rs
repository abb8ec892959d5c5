/*
 * Small application that will dump the XML section of any E57 to stdout.
 *
 * With --validate the file is fully decoded first: page checksums, header,
 * element tree and all typed records. Decoding errors name the offending
 * element path and nothing is written to stdout.
 */

use anyhow::{bail, Context, Result};
use e57_decoder::{E57Reader, ReaderOptions};
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: e57-extract-xml [--validate] <path/to/my.e57>";

#[derive(Debug, PartialEq)]
struct Args {
    path: String,
    validate: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut path = None;
    let mut validate = false;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--validate" => validate = true,
            flag if flag.starts_with("--") => bail!("Unknown option '{flag}'\n{USAGE}"),
            value if path.is_none() => path = Some(value.to_string()),
            _ => bail!(USAGE),
        }
    }
    match path {
        Some(path) => Ok(Args { path, validate }),
        None => bail!(USAGE),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    let file = File::open(&args.path).context("Failed to open E57 file")?;
    let reader = BufReader::new(file);
    let xml = if args.validate {
        let options = ReaderOptions {
            verify_checksums: true,
            ..Default::default()
        };
        let e57 = E57Reader::with_options(reader, options)
            .with_context(|| format!("Validation of {} failed", args.path))?;
        tracing::info!(
            pointclouds = e57.pointclouds().len(),
            images = e57.images().len(),
            extensions = e57.extensions().len(),
            "Validated E57 file"
        );
        e57.xml().as_bytes().to_vec()
    } else {
        E57Reader::raw_xml(reader).context("Failed to extract XML data")?
    };
    tracing::debug!(length = xml.len(), "Extracted XML section");

    stdout()
        .write_all(&xml)
        .context("Failed to write XML data to stdout")
}
