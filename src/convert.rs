use std::fs;
use std::io;
use std::path::Path;

use tracing::info;
use walkdir::WalkDir;

use crate::error::ConvertError;
use crate::json::JsonMessage;
use crate::parser;
use crate::schema::Schema;

/// extension the fixture files are selected by
pub const FIXTURE_EXTENSION: &str = "textproto";

/// Converts every `*.textproto` directly under `input_dir` into
/// `out_dir/<stem>.json`, creating `out_dir` if needed and overwriting
/// existing outputs. Returns the number of files converted; the first
/// failure aborts the rest of the batch.
pub fn convert_all(input_dir: &Path, out_dir: &Path) -> Result<usize, ConvertError> {
    fs::create_dir_all(out_dir)?;

    let mut converted = 0;
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let is_fixture = entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(FIXTURE_EXTENSION);
        if !is_fixture {
            continue;
        }

        let path = entry.path();
        let text = fs::read_to_string(path)?;
        let msg = parser::parse(&text).map_err(|source| ConvertError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let json = JsonMessage::new(&msg, Schema::conformance()).to_pretty()?;

        let out_path = out_dir.join(entry.file_name()).with_extension("json");
        fs::write(&out_path, json)?;
        info!("{} -> {}", path.display(), out_path.display());
        converted += 1;
    }
    Ok(converted)
}
