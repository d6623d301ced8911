use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub gardens_csv: PathBuf,
    /// Department geometries, either a GeoJSON FeatureCollection or a
    /// Shapefile (picked by extension).
    pub boundaries: PathBuf,
    /// Property (GeoJSON) or dbase field (Shapefile) holding the department
    /// name used to join against the gardens data.
    pub boundary_name_property: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Where `export` writes the static dashboard and map pages.
    pub site_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
