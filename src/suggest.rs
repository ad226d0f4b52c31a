//! Compatible-next-track suggestions.
//!
//! Ranks a candidate pool by how well each track would follow the current
//! last track of a mix, using the same scorer the mix view uses.

use crate::track::{MixTrack, NEUTRAL_ENERGY};
use crate::transition::{self, TransitionScore};
use serde::Serialize;

/// How many suggestions to surface by default.
pub const DEFAULT_LIMIT: usize = 8;

/// A candidate track as supplied by the surrounding application. Energy is
/// optional here (library listings often lack audio features) and is
/// filled with the neutral default at this boundary only.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub track: MixTrack,
    pub energy: Option<f32>,
}

impl Candidate {
    pub fn new(track: MixTrack) -> Self {
        Candidate {
            track,
            energy: None,
        }
    }

    /// Resolve the candidate into a scoreable track, defaulting energy.
    fn resolve(&self) -> MixTrack {
        let mut track = self.track.clone();
        track.energy = self.energy.unwrap_or(NEUTRAL_ENERGY);
        track
    }
}

/// A ranked suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub track: MixTrack,
    /// Combined transition score from the mix's last track (0-100).
    pub compatibility: u8,
    pub details: String,
}

/// Rank `candidates` by transition quality out of `last`, best first,
/// returning at most `limit`. Candidates already in the mix should be
/// filtered by the caller. Equal scores are shuffled before the stable
/// sort so repeated calls rotate through ties.
pub fn rank_candidates(
    last: &MixTrack,
    candidates: &[Candidate],
    limit: usize,
) -> Vec<Suggestion> {
    let mut scored: Vec<Suggestion> = candidates
        .iter()
        .map(|c| {
            let resolved = c.resolve();
            let TransitionScore { score, details, .. } =
                transition::score_transition(last, &resolved);
            Suggestion {
                track: c.track.clone(),
                compatibility: score,
                details,
            }
        })
        .collect();

    fastrand::shuffle(&mut scored);
    scored.sort_by(|a, b| b.compatibility.cmp(&a.compatibility));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(id: &str, bpm: f32, key: &str, energy: f32) -> MixTrack {
        MixTrack::with_camelot(
            id,
            id,
            "Artist",
            bpm,
            key.parse().unwrap(),
            energy,
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn best_harmonic_match_ranks_first() {
        let last = track("last", 124.0, "8A", 0.6);
        let candidates = vec![
            Candidate::new(track("clash", 160.0, "2B", 0.1)),
            Candidate::new(track("perfect", 124.0, "8A", 0.6)),
            Candidate::new(track("adjacent", 125.0, "9A", 0.6)),
        ];
        let ranked = rank_candidates(&last, &candidates, DEFAULT_LIMIT);
        assert_eq!(ranked[0].track.id, "perfect");
        assert_eq!(ranked[0].compatibility, 100);
        assert_eq!(ranked[2].track.id, "clash");
        assert!(ranked[0].compatibility >= ranked[1].compatibility);
    }

    #[test]
    fn limit_caps_the_result() {
        let last = track("last", 124.0, "8A", 0.6);
        let candidates: Vec<Candidate> = (0..20)
            .map(|i| Candidate::new(track(&format!("c{}", i), 124.0, "8A", 0.6)))
            .collect();
        assert_eq!(rank_candidates(&last, &candidates, 8).len(), 8);
        assert_eq!(rank_candidates(&last, &candidates, 0).len(), 0);
    }

    #[test]
    fn missing_energy_defaults_to_neutral() {
        let last = track("last", 124.0, "8A", NEUTRAL_ENERGY);
        // Candidate's stored energy differs, but with energy: None the
        // neutral default must win at this boundary.
        let candidate = Candidate {
            track: track("c", 124.0, "8A", 1.0),
            energy: None,
        };
        let ranked = rank_candidates(&last, &[candidate], 1);
        assert_eq!(ranked[0].compatibility, 100);
    }

    #[test]
    fn explicit_energy_overrides_the_default() {
        let last = track("last", 124.0, "8A", 0.0);
        let candidate = Candidate {
            track: track("c", 124.0, "8A", 0.0),
            energy: Some(1.0),
        };
        let ranked = rank_candidates(&last, &[candidate], 1);
        // Energy component drops to 0: round(0.6*100 + 0.3*100 + 0.1*0) = 90.
        assert_eq!(ranked[0].compatibility, 90);
    }

    #[test]
    fn suggestion_keeps_the_original_track_untouched() {
        let last = track("last", 124.0, "8A", 0.6);
        let candidate = Candidate {
            track: track("c", 124.0, "8A", 0.9),
            energy: None,
        };
        let ranked = rank_candidates(&last, &[candidate], 1);
        // The returned track keeps its stored energy; only scoring used
        // the neutral default.
        assert_eq!(ranked[0].track.energy, 0.9);
    }
}
