/*
 * Small application that extracts some metadata for
 * all scans/point clouds in the E57 file into a CSV file.
 *
 * The CSV will contain the following properties of each point cloud:
 * - GUID
 * - Name of the point cloud
 * - Number of points
 * - Names of the point attributes separated by spaces
 * - Position (translation part of the transform) as X,Y,Z
 * - Rotation quaternion of the transform as X,Y,Z,W
 *
 * There will be one line per point cloud and each value
 * is separated by an semicolon and ends with an Unix line break.
 *
 * The output file will be named like the input file plus `.csv` extension.
 */

use anyhow::{ensure, Context, Result};
use e57_decoder::{E57Reader, Quaternion, Translation};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    ensure!(
        args.len() >= 2,
        "Usage: e57-extract-scan-info <path/to/my.e57>"
    );

    let infile = &args[1];
    let outfile = format!("{infile}.csv");

    let reader = E57Reader::from_file(infile).context("Failed to open E57 file")?;
    let mut csv_data = String::new();
    for pc in reader.pointclouds() {
        let guid = pc.guid;
        let name = pc.name.unwrap_or_default();
        let points = pc.records;
        let fields: Vec<String> = pc.prototype.iter().map(|r| r.name.to_tag_name()).collect();
        let fields = fields.join(" ");
        let transform = pc.transform.unwrap_or_default();
        let Translation { x, y, z } = transform.translation;
        let position = format!("{x},{y},{z}");
        let Quaternion { w, x, y, z } = transform.rotation;
        let rotation = format!("{x},{y},{z},{w}");
        let line = format!("{guid};{name};{points};{fields};{position};{rotation}\n");
        csv_data.push_str(&line);
    }
    tracing::debug!(outfile = %outfile, "Writing scan info");

    std::fs::write(outfile, csv_data).context("Failed to write output CSV file")
}
