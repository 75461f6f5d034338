//! Stdout transport and a directory-backed engine for running the admin core as a
//! standalone console server.
use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::host::{Engine, Transport, Viewer};
use crate::menu::MenuFrame;
use crate::validation::validate_map_name;

/// Writes everything to stdout. Player-directed output is prefixed with the player.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    fn emit(text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }
}

impl Transport for ConsoleTransport {
    fn write_line(&mut self, to: Option<&Viewer>, text: &str) {
        match to {
            None => Self::emit(text),
            Some(v) => Self::emit(&format!("[to {} {}] {}", v.user_id, v.name, text)),
        }
    }

    fn show_menu(&mut self, to: &Viewer, frame: &MenuFrame) {
        let mut block = format!(
            "[menu for {} {}] keys={:#06x} time={}\n",
            to.user_id, to.name, frame.keys, frame.display_time
        );
        for line in frame.body.lines() {
            block.push_str("  | ");
            block.push_str(line);
            block.push('\n');
        }
        Self::emit(block.trim_end());
    }
}

/// Treats `<maps_dir>/<name>.bsp` as the set of valid maps.
pub struct ConsoleEngine {
    maps_dir: PathBuf,
    current: String,
}

impl ConsoleEngine {
    pub fn new(maps_dir: impl Into<PathBuf>, start_map: impl Into<String>) -> Self {
        Self {
            maps_dir: maps_dir.into(),
            current: start_map.into(),
        }
    }
}

impl Engine for ConsoleEngine {
    fn is_map_valid(&self, map: &str) -> bool {
        validate_map_name(map).is_ok() && self.maps_dir.join(format!("{}.bsp", map)).is_file()
    }

    fn change_level(&mut self, map: &str) {
        info!("changelevel {} -> {}", self.current, map);
        self.current = map.to_string();
    }

    fn current_map(&self) -> String {
        self.current.clone()
    }
}
