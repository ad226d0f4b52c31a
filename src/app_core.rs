//! AppCore, the central command dispatcher for mixMaven.
//!
//! Unified interface for mix-building operations: the CLI (and any future
//! GUI) talks to the engine through AppCore methods and receives plain
//! serializable data back. Audio playback is NOT owned by AppCore: a
//! playback session is created separately around a `CrossfadeScheduler`
//! and lives only as long as the host drives it.

use crate::library::MixLibrary;
use crate::mix;
use crate::suggest::{self, Candidate, Suggestion};
use crate::track::MixTrack;
use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

// ── Log buffer ──────────────────────────────────────────────────────────────

const LOG_BUFFER_MAX: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        LogBuffer {
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, level: &str, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.entries.push_back(LogEntry {
            timestamp,
            level: level.to_string(),
            message,
        });
        while self.entries.len() > LOG_BUFFER_MAX {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, since_index: usize) -> Vec<LogEntry> {
        self.entries.iter().skip(since_index).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Response data types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    pub mix_count: usize,
    pub active_mix: Option<String>,
    pub active_flow_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MixData {
    pub id: u32,
    pub name: String,
    pub track_count: usize,
    pub flow_score: f32,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackData {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub artist: String,
    pub bpm: f32,
    pub key: String,
    pub energy: f32,
    pub duration_display: String,
    pub has_preview: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionData {
    /// Index of the outgoing track; the transition is into index + 1.
    pub from_index: usize,
    pub score: u8,
    pub label: String,
    pub color: String,
    pub details: String,
}

// ── AppCore ─────────────────────────────────────────────────────────────────

pub struct AppCore {
    pub library: MixLibrary,
    pub logs: LogBuffer,
    state_path: Option<PathBuf>,
}

impl AppCore {
    /// Create a new AppCore backed by a state file.
    pub fn new(state_path: &Path) -> Self {
        AppCore {
            library: MixLibrary::load_from(state_path),
            logs: LogBuffer::new(),
            state_path: Some(state_path.to_path_buf()),
        }
    }

    /// Create a new AppCore with a fresh, unpersisted library. For testing.
    pub fn new_test() -> Self {
        AppCore {
            library: MixLibrary::new(),
            logs: LogBuffer::new(),
            state_path: None,
        }
    }

    fn save(&self) -> Result<(), String> {
        match &self.state_path {
            Some(path) => self.library.save_to(path),
            None => Ok(()),
        }
    }

    // ── Status (read-only) ──────────────────────────────────────────────

    pub fn get_status(&self) -> StatusData {
        let active = self.library.active_mix();
        StatusData {
            mix_count: self.library.mixes.len(),
            active_mix: active.map(|m| m.name.clone()),
            active_flow_score: active.map(|m| m.flow_score),
        }
    }

    // ── Mix CRUD ────────────────────────────────────────────────────────

    pub fn get_mixes(&self) -> Vec<MixData> {
        self.library
            .mixes
            .iter()
            .map(|m| MixData {
                id: m.id,
                name: m.name.clone(),
                track_count: m.track_count(),
                flow_score: m.flow_score,
                is_active: self.library.active_mix_id == Some(m.id),
                created_at: m.created_at.clone(),
            })
            .collect()
    }

    pub fn create_mix(&mut self, name: String) -> Result<u32, String> {
        if self.library.find_mix(&name).is_some() {
            return Err(format!("Mix '{}' already exists", name));
        }
        let id = self.library.create_mix(name);
        self.save()?;
        Ok(id)
    }

    pub fn delete_mix(&mut self, name: &str) -> Result<(), String> {
        self.library.delete_mix(name)?;
        self.save()?;
        Ok(())
    }

    pub fn rename_mix(&mut self, old_name: &str, new_name: String) -> Result<(), String> {
        if self.library.find_mix(&new_name).is_some() {
            return Err(format!("Mix '{}' already exists", new_name));
        }
        let mix = self
            .library
            .find_mix_mut(old_name)
            .ok_or_else(|| format!("Mix '{}' not found", old_name))?;
        mix.name = new_name;
        self.save()?;
        Ok(())
    }

    pub fn set_active_mix(&mut self, name: &str) -> Result<u32, String> {
        let id = self.library.set_active(name)?;
        self.save()?;
        Ok(id)
    }

    // ── Track operations ────────────────────────────────────────────────

    pub fn get_mix_tracks(&self, name: &str) -> Result<Vec<TrackData>, String> {
        let mix = self
            .library
            .find_mix(name)
            .ok_or_else(|| format!("Mix '{}' not found", name))?;
        Ok(mix
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| TrackData {
                index: i,
                id: t.id.clone(),
                title: t.title.clone(),
                artist: t.artist.clone(),
                bpm: t.bpm,
                key: t.camelot.to_string(),
                energy: t.energy,
                duration_display: t.duration_display(),
                has_preview: t.has_preview(),
            })
            .collect())
    }

    pub fn add_track(&mut self, mix_name: &str, track: MixTrack) -> Result<usize, String> {
        let mix = self
            .library
            .find_mix_mut(mix_name)
            .ok_or_else(|| format!("Mix '{}' not found", mix_name))?;
        mix.add_track(track);
        let idx = mix.track_count() - 1;
        let title = mix.tracks[idx].title.clone();
        self.save()?;
        self.logs
            .push("info", format!("Added '{}' to mix '{}'", title, mix_name));
        Ok(idx)
    }

    /// Add a track by reading tags from a local audio file.
    pub fn add_track_from_path(&mut self, mix_name: &str, path: &str) -> Result<usize, String> {
        let track = MixTrack::from_path(Path::new(path))?;
        self.add_track(mix_name, track)
    }

    pub fn remove_track(&mut self, mix_name: &str, index: usize) -> Result<(), String> {
        let mix = self
            .library
            .find_mix_mut(mix_name)
            .ok_or_else(|| format!("Mix '{}' not found", mix_name))?;
        let removed = mix.remove_track(index)?;
        self.save()?;
        self.logs.push(
            "info",
            format!("Removed '{}' from mix '{}'", removed.title, mix_name),
        );
        Ok(())
    }

    pub fn move_track(&mut self, mix_name: &str, from: usize, to: usize) -> Result<(), String> {
        let mix = self
            .library
            .find_mix_mut(mix_name)
            .ok_or_else(|| format!("Mix '{}' not found", mix_name))?;
        mix.reorder(from, to)?;
        self.save()?;
        Ok(())
    }

    // ── Scoring queries (read-only, recomputable at any time) ───────────

    pub fn get_transitions(&self, name: &str) -> Result<Vec<TransitionData>, String> {
        let mix = self
            .library
            .find_mix(name)
            .ok_or_else(|| format!("Mix '{}' not found", name))?;
        Ok(mix
            .transitions
            .iter()
            .enumerate()
            .map(|(i, t)| TransitionData {
                from_index: i,
                score: t.score,
                label: t.label.to_string(),
                color: t.color.to_string(),
                details: t.details.clone(),
            })
            .collect())
    }

    pub fn get_flow_score(&self, name: &str) -> Result<f32, String> {
        let mix = self
            .library
            .find_mix(name)
            .ok_or_else(|| format!("Mix '{}' not found", name))?;
        Ok(mix::flow_score(&mix.tracks))
    }

    /// Rank candidate tracks against the mix's last track.
    pub fn get_suggestions(
        &self,
        mix_name: &str,
        candidates: &[Candidate],
        limit: usize,
    ) -> Result<Vec<Suggestion>, String> {
        let mix = self
            .library
            .find_mix(mix_name)
            .ok_or_else(|| format!("Mix '{}' not found", mix_name))?;
        let last = mix
            .tracks
            .last()
            .ok_or_else(|| format!("Mix '{}' has no tracks to suggest from", mix_name))?;
        Ok(suggest::rank_candidates(last, candidates, limit))
    }

    // ── Logs ────────────────────────────────────────────────────────────

    pub fn get_logs(&self, since_index: Option<usize>) -> Vec<LogEntry> {
        self.logs.get(since_index.unwrap_or(0))
    }

    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    pub fn log(&mut self, level: &str, message: String) {
        self.logs.push(level, message);
    }
}
