use crate::utils::Result;
use std::fs;
use std::path::Path;

pub fn create_writer<T, F>(output_dir: &Path, file_name: &str, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    ensure_dir(output_dir)?;
    let output_path = output_dir.join(file_name);
    f(&output_path)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}
