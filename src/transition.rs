use crate::camelot::{self, CamelotCode, KeyRelation};
use crate::track::MixTrack;
use serde::{Deserialize, Serialize};
use std::fmt;

const KEY_WEIGHT: f32 = 0.6;
const TEMPO_WEIGHT: f32 = 0.3;
const ENERGY_WEIGHT: f32 = 0.1;

/// Qualitative transition quality, derived from the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Perfect,
    Smooth,
    Workable,
    Tricky,
    Clash,
}

impl Label {
    /// Fixed thresholds: >=85 Perfect, >=70 Smooth, >=50 Workable,
    /// >=30 Tricky, else Clash.
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Label::Perfect,
            70.. => Label::Smooth,
            50.. => Label::Workable,
            30.. => Label::Tricky,
            _ => Label::Clash,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::Perfect => "Perfect",
            Label::Smooth => "Smooth",
            Label::Workable => "Workable",
            Label::Tricky => "Tricky",
            Label::Clash => "Clash",
        };
        f.write_str(s)
    }
}

/// Indicator color tier: >=70 green, >=50 yellow, else red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Green,
    Yellow,
    Red,
}

impl Color {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => Color::Green,
            50.. => Color::Yellow,
            _ => Color::Red,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Red => "red",
        };
        f.write_str(s)
    }
}

/// Compatibility of an ordered pair of tracks (A → B). Stateless and cheap;
/// always recomputed from the tracks, never persisted as source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionScore {
    /// Combined score, 0-100.
    pub score: u8,
    pub label: Label,
    pub color: Color,
    /// Human-readable summary, e.g. "Key 8A→8B, +2 BPM".
    pub details: String,
}

/// Key compatibility component (0-100).
fn key_score(a: CamelotCode, b: CamelotCode) -> f32 {
    match camelot::key_relation(a, b) {
        KeyRelation::Perfect => 100.0,
        KeyRelation::Adjacent => 80.0,
        KeyRelation::EnergyShift => 70.0,
        KeyRelation::Distant => {
            let dist = camelot::camelot_distance(a, b) as i32;
            (100 - dist * 15).max(0) as f32
        }
    }
}

/// Tempo compatibility component (0-100), from the relative BPM difference.
fn tempo_score(bpm_a: f32, bpm_b: f32) -> f32 {
    let diff = (bpm_a - bpm_b).abs() / bpm_a.max(bpm_b);
    if diff == 0.0 {
        100.0
    } else if diff <= 0.03 {
        80.0
    } else if diff <= 0.06 {
        50.0
    } else {
        (100.0 - diff * 300.0).max(0.0)
    }
}

/// Energy compatibility component (0-100); energy is on a 0-1 scale.
fn energy_score(a: f32, b: f32) -> f32 {
    (100.0 - (a - b).abs() * 200.0).max(0.0)
}

/// Score the transition from track `a` into track `b`. Pure and total:
/// the inputs were validated at construction, so this cannot fail.
pub fn score_transition(a: &MixTrack, b: &MixTrack) -> TransitionScore {
    let ks = key_score(a.camelot, b.camelot);
    let ts = tempo_score(a.bpm, b.bpm);
    let es = energy_score(a.energy, b.energy);

    // Each component is already in [0,100], so the weighted sum is too.
    let score = (ks * KEY_WEIGHT + ts * TEMPO_WEIGHT + es * ENERGY_WEIGHT).round() as u8;

    let bpm_diff = (b.bpm - a.bpm).round() as i32;
    let bpm_str = if bpm_diff == 0 {
        "same BPM".to_string()
    } else {
        format!("{:+} BPM", bpm_diff)
    };
    let details = format!("Key {}→{}, {}", a.camelot, b.camelot, bpm_str);

    TransitionScore {
        score,
        label: Label::from_score(score),
        color: Color::from_score(score),
        details,
    }
}
