use std::path::{Path, PathBuf};

use anyhow::Context;

fn read_folder(folder_path: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder_path)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        } else if path.is_dir() {
            files.extend(read_folder(&path)?);
        }
    }

    files.sort();

    Ok(files)
}

fn is_gpx(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gpx"))
        .unwrap_or(false)
}

/// Expands folders into the GPX files they contain, in path order.
pub fn gpx_paths(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut files = read_folder(input)
                .with_context(|| format!("Cannot read folder {}", input.display()))?;
            files.retain(|path| is_gpx(path));
            paths.extend(files);
        } else {
            paths.push(input.clone());
        }
    }

    Ok(paths)
}

pub fn read_files(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<u8>>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))
        })
        .collect()
}
