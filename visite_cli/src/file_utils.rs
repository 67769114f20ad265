use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use visite_geo::{MarkerRecord, config::EngineConfig};

pub fn read_folder(folder_path: &PathBuf) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            files.extend(read_folder(&path)?);
        }
    }

    files.sort();

    Ok(files)
}

/// The JSON files at `input`, which may be a single file or a folder.
pub fn json_files(input: &PathBuf) -> Result<Vec<PathBuf>, std::io::Error> {
    if input.is_file() {
        return Ok(vec![input.clone()]);
    }

    let mut files = read_folder(input)?;
    files.retain(|path| path.extension().map(|ext| ext == "json").unwrap_or(false));
    Ok(files)
}

/// Reads a JSON array of records.
pub fn read_records(path: &Path) -> Result<Vec<MarkerRecord>, anyhow::Error> {
    let file = File::open(path)?;
    let records: Vec<MarkerRecord> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, anyhow::Error> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    Ok(config.with_env()?)
}
