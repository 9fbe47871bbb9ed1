use anyhow::Result;
use tempfile::NamedTempFile;

// Create a temporary file path for an index; the handle keeps the file
// alive for the duration of the test
#[allow(dead_code)]
pub fn create_temp_index_file() -> Result<(NamedTempFile, String)> {
    let file = NamedTempFile::new()?;
    let path = file.path().to_str().unwrap().to_string();
    Ok((file, path))
}
