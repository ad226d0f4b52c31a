//! Dual playback slots for crossfaded preview playback.
//!
//! The scheduler owns a [`DeckPair`]: two interchangeable audio outputs of
//! which exactly one is "active" (the source of visible transport state) and
//! one is "standby" at any time. During a crossfade both play at once; the
//! *identity* of the active slot flips, the slots themselves never move.

use serde::Serialize;
use std::time::Duration;

/// The seam between the scheduler and real audio. Audio is opaque here:
/// something that can be loaded, played, paused, faded, and asked where it
/// is. The rodio implementation lives in `player`; tests script their own.
pub trait AudioSlot {
    /// Load a preview source (file path or URL), replacing any prior one.
    /// Failures are reported, but callers treat them as "no preview".
    fn load(&mut self, source: &str) -> Result<(), String>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Stop and unload.
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn seek(&mut self, position: Duration) -> Result<(), String>;
    /// Current position within the loaded source.
    fn position(&self) -> Duration;
    /// Total duration of the loaded source, if known.
    fn duration(&self) -> Option<Duration>;
    fn is_loaded(&self) -> bool;
    /// True once the loaded source has played to its natural end.
    fn has_ended(&self) -> bool;
}

/// Logical slot identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub fn other(self) -> SlotId {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }
}

/// Two audio slots with an active/standby flip.
pub struct DeckPair<S> {
    slot_a: S,
    slot_b: S,
    active: SlotId,
}

impl<S: AudioSlot> DeckPair<S> {
    pub fn new(slot_a: S, slot_b: S) -> Self {
        DeckPair {
            slot_a,
            slot_b,
            active: SlotId::A,
        }
    }

    pub fn active_id(&self) -> SlotId {
        self.active
    }

    pub fn active(&self) -> &S {
        match self.active {
            SlotId::A => &self.slot_a,
            SlotId::B => &self.slot_b,
        }
    }

    pub fn active_mut(&mut self) -> &mut S {
        match self.active {
            SlotId::A => &mut self.slot_a,
            SlotId::B => &mut self.slot_b,
        }
    }

    pub fn standby(&self) -> &S {
        match self.active {
            SlotId::A => &self.slot_b,
            SlotId::B => &self.slot_a,
        }
    }

    pub fn standby_mut(&mut self) -> &mut S {
        match self.active {
            SlotId::A => &mut self.slot_b,
            SlotId::B => &mut self.slot_a,
        }
    }

    /// Swap which slot is active. Called when a crossfade completes.
    pub fn flip(&mut self) {
        self.active = self.active.other();
    }

    /// Both slots as `(active, standby)`, for the crossfade volume ramp.
    pub fn both_mut(&mut self) -> (&mut S, &mut S) {
        match self.active {
            SlotId::A => (&mut self.slot_a, &mut self.slot_b),
            SlotId::B => (&mut self.slot_b, &mut self.slot_a),
        }
    }

    pub fn pause_both(&mut self) {
        self.slot_a.pause();
        self.slot_b.pause();
    }

    pub fn stop_both(&mut self) {
        self.slot_a.stop();
        self.slot_b.stop();
    }
}
