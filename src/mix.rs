use crate::track::MixTrack;
use crate::transition::{self, TransitionScore};
use serde::{Deserialize, Serialize};

/// An ordered track sequence plus its derived transition scores and flow
/// score. The derived state is rebuilt whole on every mutation; transition
/// scoring is cheap, so there is no incremental patching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mix {
    pub id: u32,
    pub name: String,
    pub tracks: Vec<MixTrack>,
    /// Always `max(0, tracks.len() - 1)` entries, one per adjacent pair.
    #[serde(default)]
    pub transitions: Vec<TransitionScore>,
    /// 0.0 - 5.0, one decimal.
    #[serde(default)]
    pub flow_score: f32,
    pub created_at: String,
}

impl Mix {
    pub fn new(id: u32, name: String) -> Self {
        Mix {
            id,
            name,
            tracks: Vec::new(),
            transitions: Vec::new(),
            flow_score: 5.0,
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// Recompute transitions and flow score from the track order.
    /// Idempotent and side-effect-free; called after every mutation and
    /// after loading persisted state.
    pub fn rebuild(&mut self) {
        self.transitions = self
            .tracks
            .windows(2)
            .map(|pair| transition::score_transition(&pair[0], &pair[1]))
            .collect();
        self.flow_score = flow_score(&self.tracks);
    }

    pub fn add_track(&mut self, track: MixTrack) {
        self.tracks.push(track);
        self.rebuild();
    }

    /// Remove a track by index. Returns the removed track.
    pub fn remove_track(&mut self, index: usize) -> Result<MixTrack, String> {
        if index >= self.tracks.len() {
            return Err(format!(
                "Index {} out of range (mix has {} tracks)",
                index,
                self.tracks.len()
            ));
        }
        let track = self.tracks.remove(index);
        self.rebuild();
        Ok(track)
    }

    /// Move a track from one position to another.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), String> {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return Err(format!(
                "Index out of range (mix has {} tracks)",
                self.tracks.len()
            ));
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        self.rebuild();
        Ok(())
    }

    /// Replace the whole track sequence.
    pub fn set_tracks(&mut self, tracks: Vec<MixTrack>) {
        self.tracks = tracks;
        self.rebuild();
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Aggregate flow score for a track sequence: the plain mean of all adjacent
/// transition scores, scaled to 0.0-5.0 and rounded to one decimal. Fewer
/// than two tracks scores a perfect 5.0 (no transitions to get wrong).
/// Unweighted: every pair counts once.
pub fn flow_score(tracks: &[MixTrack]) -> f32 {
    if tracks.len() < 2 {
        return 5.0;
    }
    let total: u32 = tracks
        .windows(2)
        .map(|pair| transition::score_transition(&pair[0], &pair[1]).score as u32)
        .sum();
    let avg = total as f32 / (tracks.len() - 1) as f32;
    (avg / 20.0 * 10.0).round() / 10.0
}
