//! Map listings, used from background work by `maps`.
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;

use crate::config::{MapListSource, ServerConfig};

/// Lists installed maps. Called off the owning thread.
pub trait MapCatalog: Send + Sync {
    fn list_maps(&self) -> io::Result<Vec<String>>;
}

/// `*.bsp` files in one directory, extension stripped, sorted.
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MapCatalog for DirectoryCatalog {
    fn list_maps(&self) -> io::Result<Vec<String>> {
        let mut maps = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_bsp = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("bsp"))
                .unwrap_or(false);
            if !is_bsp || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                maps.push(stem.to_string());
            }
        }
        maps.sort();
        maps.dedup();
        Ok(maps)
    }
}

/// Maps named in a mapcycle file, in file order.
///
/// One map per line; a trailing `.bsp` is stripped, blank lines and `//` comments are
/// skipped and repeats keep their first position.
pub struct MapcycleCatalog {
    file: PathBuf,
}

impl MapcycleCatalog {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }
}

impl MapCatalog for MapcycleCatalog {
    fn list_maps(&self) -> io::Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.file)?;
        let mut maps: Vec<String> = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let name = match line.len().checked_sub(4) {
                Some(cut) if line.is_char_boundary(cut) && line[cut..].eq_ignore_ascii_case(".bsp") => {
                    &line[..cut]
                }
                _ => line,
            };
            if !maps.iter().any(|m| m == name) {
                maps.push(name.to_string());
            }
        }
        debug!("{} maps in {}", maps.len(), self.file.display());
        Ok(maps)
    }
}

/// The catalog selected by `[server] map_list`.
pub fn for_server(server: &ServerConfig) -> Arc<dyn MapCatalog> {
    match server.map_list {
        MapListSource::Directory => Arc::new(DirectoryCatalog::new(&server.maps_dir)),
        MapListSource::Mapcycle => Arc::new(MapcycleCatalog::new(&server.mapcycle_file)),
    }
}
