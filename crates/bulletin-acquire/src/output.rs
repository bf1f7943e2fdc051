use anyhow::Result;
use bulletin_model::FetchedBulletin;
use std::fs;
use std::path::Path;

/// File name of the raw grade markup inside an output directory.
pub const BULLETIN_FILE: &str = "bulletin.html";

/// Write a fetched bulletin to the given directory.
///
/// Creates the directory if it doesn't exist, then writes:
/// - `bulletin.html`: the portal markup, byte for byte
/// - `bulletin.json`: markup plus provenance, for programmatic consumers
/// - `source.md`: provenance info (no credentials)
pub fn write_bulletin(bulletin: &FetchedBulletin, output_dir: &str) -> Result<()> {
    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)?;

    let path = dir.join(BULLETIN_FILE);
    fs::write(&path, &bulletin.raw_html)?;
    tracing::info!(path = %path.display(), bytes = bulletin.raw_html.len(), "Wrote bulletin HTML");

    let json = serde_json::to_string_pretty(bulletin)?;
    fs::write(dir.join("bulletin.json"), &json)?;
    tracing::info!(path = %dir.join("bulletin.json").display(), "Wrote bulletin JSON");

    fs::write(dir.join("source.md"), bulletin.source_md())?;
    tracing::info!(path = %dir.join("source.md").display(), "Wrote source provenance");

    Ok(())
}
