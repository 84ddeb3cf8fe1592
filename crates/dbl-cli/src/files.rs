use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use dbl_core::NormalizedCatalog;

pub fn read_catalog(path: &Path) -> Result<NormalizedCatalog, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    NormalizedCatalog::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid catalog '{}': {}", path.display(), e))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid JSON in '{}': {}", path.display(), e))
}

/// Pretty-print `value` to `output`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON: {}", e))?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
                }
            }
            fs::write(path, json)
                .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
        }
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
