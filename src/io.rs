//! JSON persistence for projects and palettes.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::{Palette, ProjectConfig};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn save_project(config: &ProjectConfig, path: impl AsRef<Path>) -> Result<(), PersistError> {
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

/// Load a project. Gradient stops are re-sorted on deserialization, so a
/// hand-edited file with out-of-order stops still satisfies the ordering
/// invariant.
pub fn load_project(path: impl AsRef<Path>) -> Result<ProjectConfig, PersistError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

pub fn save_palette(palette: &Palette, path: impl AsRef<Path>) -> Result<(), PersistError> {
    fs::write(path, serde_json::to_string_pretty(palette)?)?;
    Ok(())
}

pub fn load_palette(path: impl AsRef<Path>) -> Result<Palette, PersistError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Load a palette collection file. A file holding a single palette object
/// instead of a list is accepted and returned as a one-element collection.
pub fn load_palettes(path: impl AsRef<Path>) -> Result<Vec<Palette>, PersistError> {
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<Vec<Palette>>(&raw) {
        Ok(palettes) => Ok(palettes),
        Err(_) => Ok(vec![serde_json::from_str::<Palette>(&raw)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_survives_save_and_load() {
        let dir = std::env::temp_dir().join("dunegen-io-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("project.json");

        let mut config = ProjectConfig::default();
        config.seed_global = 123;
        config.noise_layers[1].seed = 900;
        save_project(&config, &path).unwrap();

        let back = load_project(&path).unwrap();
        assert_eq!(back.seed_global, 123);
        assert_eq!(back.noise_layers[1].seed, 900);
        assert_eq!(back.gradient.stops().len(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn single_palette_file_loads_as_collection() {
        let dir = std::env::temp_dir().join("dunegen-io-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("palette.json");

        save_palette(&Palette::default(), &path).unwrap();
        let palettes = load_palettes(&path).unwrap();
        assert_eq!(palettes.len(), 1);
        assert_eq!(palettes[0].name, "frost");

        fs::remove_file(&path).unwrap();
    }
}
