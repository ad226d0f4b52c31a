//! Crossfade playback scheduler.
//!
//! A pull-based state machine over a [`DeckPair`]: the host calls [`tick`]
//! at its rendering cadence (~60 Hz in the CLI) while something is playing.
//! Near the end of the active track the next preview is preloaded on the
//! standby slot and faded in while the outgoing track fades out; when the
//! outgoing track ends, the active-slot identity flips and playback carries
//! on seamlessly. Transport controls work the same whichever slot is active.
//!
//! [`tick`]: CrossfadeScheduler::tick

use crate::deck::{AudioSlot, DeckPair, SlotId};
use crate::track::MixTrack;
use serde::Serialize;
use std::time::Duration;

/// Trailing window of the outgoing track during which the next one is
/// preloaded and faded in.
pub const CROSSFADE_WINDOW: Duration = Duration::from_secs(3);

/// Assumed length for preview clips whose real duration is unknown.
const FALLBACK_DURATION: Duration = Duration::from_secs(30);

const DEFAULT_VOLUME: f32 = 0.8;

/// Observable transport state, sampled once per tick.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub current_index: usize,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub volume: f32,
    pub has_preview: bool,
    pub crossfading: bool,
    pub active_slot: SlotId,
}

/// Drives gapless, DJ-style playback over an ordered track list.
///
/// The track list is read-only for the lifetime of the session; reordering
/// the mix requires starting a new session. The two slots are exclusively
/// owned here; nothing else may touch their volume or position.
pub struct CrossfadeScheduler<S: AudioSlot> {
    deck: DeckPair<S>,
    tracks: Vec<MixTrack>,
    index: usize,
    is_playing: bool,
    /// Both slots audible; the ramp runs off the outgoing time left.
    crossfading: bool,
    /// One-shot latch: which track index a crossfade has been armed for.
    /// Re-entering the window (e.g. after a seek back) must not re-arm.
    armed_index: Option<usize>,
    /// User's target volume; the ramp multiplies against this ceiling.
    volume: f32,
    position: Duration,
    duration: Duration,
}

impl<S: AudioSlot> CrossfadeScheduler<S> {
    pub fn new(deck: DeckPair<S>, tracks: Vec<MixTrack>) -> Self {
        CrossfadeScheduler {
            deck,
            tracks,
            index: 0,
            is_playing: false,
            crossfading: false,
            armed_index: None,
            volume: DEFAULT_VOLUME,
            position: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    // ── Transport ───────────────────────────────────────────────────────

    /// Start or resume playback of the current track.
    pub fn play(&mut self) {
        if self.deck.active().is_loaded() {
            self.deck.active_mut().play();
            self.is_playing = true;
        } else {
            self.load_and_play(self.index);
        }
    }

    /// Pause both slots (covers a crossfade in progress) and freeze the
    /// visible position. The driver stops ticking once `is_playing` drops.
    pub fn pause(&mut self) {
        self.deck.pause_both();
        self.is_playing = false;
    }

    /// Skip forward. Cancels any in-flight crossfade; no fade on manual skip.
    pub fn next(&mut self) {
        if self.index + 1 < self.tracks.len() {
            self.skip_to(self.index + 1);
        }
    }

    /// Skip backward. Cancels any in-flight crossfade; no fade on manual skip.
    pub fn previous(&mut self) {
        if self.index > 0 {
            self.skip_to(self.index - 1);
        }
    }

    /// Hard cut to another track: cancel any in-flight crossfade, stop both
    /// slots, start the target from the top. No fade on manual skips.
    fn skip_to(&mut self, index: usize) {
        self.crossfading = false;
        self.armed_index = None;
        self.deck.stop_both();
        self.load_and_play(index);
    }

    /// Reposition the active slot. The standby slot is deliberately left
    /// unsynchronized mid-crossfade (known limitation, see DESIGN.md).
    pub fn seek(&mut self, position: Duration) -> Result<(), String> {
        if !self.deck.active().is_loaded() {
            return Err("No preview available for the current track".to_string());
        }
        let target = position.min(self.duration);
        self.deck.active_mut().seek(target)?;
        self.position = target;
        Ok(())
    }

    /// Set the user's target volume. Applied immediately outside a
    /// crossfade; during one it only raises or lowers the ramp's ceiling,
    /// so there is no audible step.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if !self.crossfading {
            let v = self.volume;
            self.deck.active_mut().set_volume(v);
        }
    }

    /// Tear down the session: stop both slots, clear all pending state.
    pub fn stop(&mut self) {
        self.deck.stop_both();
        self.is_playing = false;
        self.crossfading = false;
        self.armed_index = None;
        self.position = Duration::ZERO;
    }

    /// Load track `index` into the active slot and start it. Tracks without
    /// a playable preview still become "current", but with playback inert
    /// and transport controls disabled (`has_preview` = false downstream).
    pub fn load_and_play(&mut self, index: usize) {
        let Some(track) = self.tracks.get(index) else {
            return;
        };
        let preview = track.preview.clone();
        let track_duration = track.duration;

        self.crossfading = false;
        self.armed_index = None;
        self.index = index;
        self.position = Duration::ZERO;
        self.duration = if track_duration.is_zero() {
            FALLBACK_DURATION
        } else {
            track_duration
        };

        self.deck.standby_mut().stop();
        self.deck.standby_mut().set_volume(0.0);

        let volume = self.volume;
        let active = self.deck.active_mut();
        active.set_volume(volume);

        match preview {
            Some(source) => match active.load(&source) {
                Ok(()) => {
                    active.play();
                    if let Some(d) = active.duration() {
                        self.duration = d;
                    }
                    self.is_playing = true;
                }
                Err(e) => {
                    // Best-effort: degrade to the no-preview path.
                    eprintln!("Preview unavailable: {}", e);
                    active.stop();
                    self.is_playing = false;
                }
            },
            None => {
                active.stop();
                self.is_playing = false;
            }
        }
    }

    /// One scheduler tick. Fixed internal order: position sample →
    /// crossfade arming → volume ramp → end-of-track handling, so the tick
    /// that arms a crossfade also performs its first ramp computation.
    pub fn tick(&mut self) {
        if !self.is_playing {
            return;
        }

        // 1. Sample the active slot.
        self.position = self.deck.active().position();
        if let Some(d) = self.deck.active().duration() {
            self.duration = d;
        }
        let time_left = self.duration.saturating_sub(self.position);

        // 2. Arm the crossfade, once per pair.
        if !self.crossfading
            && self.armed_index != Some(self.index)
            && time_left <= CROSSFADE_WINDOW
            && !time_left.is_zero()
        {
            if let Some(source) = self
                .tracks
                .get(self.index + 1)
                .and_then(|t| t.preview.clone())
            {
                self.armed_index = Some(self.index);
                let standby = self.deck.standby_mut();
                standby.set_volume(0.0);
                match standby.load(&source) {
                    Ok(()) => {
                        standby.play();
                        self.crossfading = true;
                    }
                    Err(e) => {
                        // Fall back to a sequential advance at track end.
                        eprintln!("Preview unavailable: {}", e);
                    }
                }
            }
        }

        // 3. Volume ramp, recomputed from remaining time so tick jitter
        // cannot distort the fade curve.
        if self.crossfading {
            let fade = (1.0
                - time_left.as_secs_f32() / CROSSFADE_WINDOW.as_secs_f32())
            .clamp(0.0, 1.0);
            let volume = self.volume;
            let (outgoing, incoming) = self.deck.both_mut();
            outgoing.set_volume(volume * (1.0 - fade));
            incoming.set_volume(volume * fade);
        }

        // 4. Natural end of the outgoing track.
        if self.deck.active().has_ended() {
            self.on_active_ended();
        }
    }

    fn on_active_ended(&mut self) {
        if self.crossfading {
            // Commit the swap: the incoming slot becomes active.
            self.deck.active_mut().stop();
            self.deck.flip();
            self.crossfading = false;
            self.index += 1;
            let volume = self.volume;
            let active = self.deck.active_mut();
            active.set_volume(volume);
            self.position = active.position();
            self.duration = active
                .duration()
                .or_else(|| self.tracks.get(self.index).map(|t| t.duration))
                .filter(|d| !d.is_zero())
                .unwrap_or(FALLBACK_DURATION);
        } else if self.index + 1 < self.tracks.len() {
            self.load_and_play(self.index + 1);
        } else {
            // Last track finished with nothing armed.
            self.deck.stop_both();
            self.is_playing = false;
        }
    }

    // ── Observable state ────────────────────────────────────────────────

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_index: self.index,
            is_playing: self.is_playing,
            position_ms: self.position.as_millis() as u64,
            duration_ms: self.duration.as_millis() as u64,
            volume: self.volume,
            has_preview: self.current_track().is_some_and(|t| t.has_preview()),
            crossfading: self.crossfading,
            active_slot: self.deck.active_id(),
        }
    }

    pub fn current_track(&self) -> Option<&MixTrack> {
        self.tracks.get(self.index)
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}
