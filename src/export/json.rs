use std::io::Write;
use std::path::Path;

use super::export_failed;
use crate::error::Result;

/// Export any serializable payload as pretty JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let path = output_path.as_ref();
    let json_data = serde_json::to_string_pretty(data)?;

    let mut file = std::fs::File::create(path).map_err(|e| export_failed(path, e))?;
    file.write_all(json_data.as_bytes())
        .map_err(|e| export_failed(path, e))?;

    tracing::info!(path = %path.display(), bytes = json_data.len(), "Exported JSON");
    Ok(())
}
