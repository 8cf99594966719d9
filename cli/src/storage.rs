use std::fs;
use std::path::Path;

use anyhow::Context;
use pipeflow_core::{Level, LevelCatalog, decode_level, encode_level};

pub fn load_level(path: &Path) -> anyhow::Result<Level> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let level = decode_level(&text).with_context(|| format!("decoding {}", path.display()))?;
    log::info!("Loaded {}", path.display());
    Ok(level)
}

pub fn save_level(path: &Path, level: &Level) -> anyhow::Result<()> {
    fs::write(path, encode_level(level)).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

/// Catalog of the level files directly inside `dir`.
pub fn scan_levels(dir: &Path) -> anyhow::Result<LevelCatalog> {
    let entries = fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if !entry.file_type().is_ok_and(|kind| kind.is_file()) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("Skipping non UTF-8 file name {:?}", name),
        }
    }

    let catalog = LevelCatalog::new(names);
    log::debug!("Found {} levels in {}", catalog.len(), dir.display());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("pipeflow-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn scan_keeps_map_files_only() {
        let dir = scratch_dir("scan");
        fs::write(dir.join("b.map"), "").unwrap();
        fs::write(dir.join("a.map"), "").unwrap();
        fs::write(dir.join("readme.txt"), "").unwrap();
        fs::create_dir(dir.join("nested.map")).unwrap();

        let catalog = scan_levels(&dir).unwrap();
        assert_eq!(catalog.names(), ["a.map", "b.map"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn save_then_load() {
        let dir = scratch_dir("save");
        let text = "4\n4\n5\nWvWW\nW║.W\nW..W\nWUWW\n═\n";
        let level = decode_level(text).unwrap();

        let path = dir.join("level.map");
        save_level(&path, &level).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
        assert_eq!(load_level(&path).unwrap(), level);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_level(Path::new("/nonexistent/level.map")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/level.map"));
    }
}
