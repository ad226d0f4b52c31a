use crate::mix::Mix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "mixmaven_state.json";

/// The user's mix collection, persisted as a JSON state file.
#[derive(Debug, Serialize, Deserialize)]
pub struct MixLibrary {
    pub mixes: Vec<Mix>,
    pub active_mix_id: Option<u32>,
    next_id: u32,
}

impl MixLibrary {
    pub fn new() -> Self {
        MixLibrary {
            mixes: Vec::new(),
            active_mix_id: None,
            next_id: 1,
        }
    }

    /// Default state-file location: the platform data dir, falling back to
    /// the working directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("mixmaven").join(STATE_FILE))
            .unwrap_or_else(|| PathBuf::from(STATE_FILE))
    }

    /// Load library state from JSON, or create a new instance if not found.
    /// Derived transition data is rebuilt after loading; the tracks are the
    /// source of truth, never the persisted scores.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<MixLibrary>(&data) {
                    Ok(mut library) => {
                        for mix in &mut library.mixes {
                            mix.rebuild();
                        }
                        return library;
                    }
                    Err(e) => eprintln!("Warning: corrupt state file, starting fresh: {}", e),
                },
                Err(e) => eprintln!("Warning: could not read state file: {}", e),
            }
        }
        MixLibrary::new()
    }

    /// Persist current state to JSON.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create '{}': {}", parent.display(), e))?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Write error: {}", e))?;
        Ok(())
    }

    /// Create a new empty mix with the given name. Returns its ID.
    pub fn create_mix(&mut self, name: String) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.mixes.push(Mix::new(id, name));
        id
    }

    /// Find a mix by name (case-insensitive).
    pub fn find_mix(&self, name: &str) -> Option<&Mix> {
        self.mixes.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Find a mix by name (case-insensitive), mutable.
    pub fn find_mix_mut(&mut self, name: &str) -> Option<&mut Mix> {
        self.mixes
            .iter_mut()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Remove a mix by name. Clears the active id if it pointed there.
    pub fn delete_mix(&mut self, name: &str) -> Result<Mix, String> {
        let pos = self
            .mixes
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Mix '{}' not found", name))?;
        let removed = self.mixes.remove(pos);
        if self.active_mix_id == Some(removed.id) {
            self.active_mix_id = None;
        }
        Ok(removed)
    }

    /// Set the active mix by name. Returns the mix ID or an error.
    pub fn set_active(&mut self, name: &str) -> Result<u32, String> {
        let id = self
            .find_mix(name)
            .map(|m| m.id)
            .ok_or_else(|| format!("Mix '{}' not found", name))?;
        self.active_mix_id = Some(id);
        Ok(id)
    }

    pub fn active_mix(&self) -> Option<&Mix> {
        self.active_mix_id
            .and_then(|id| self.mixes.iter().find(|m| m.id == id))
    }

    pub fn active_mix_mut(&mut self) -> Option<&mut Mix> {
        self.active_mix_id
            .and_then(|id| self.mixes.iter_mut().find(|m| m.id == id))
    }
}

impl Default for MixLibrary {
    fn default() -> Self {
        Self::new()
    }
}
