//! End-to-end tests that run without an audio device or a GUI: the mix
//! engine through `AppCore`, and playback through `CrossfadeScheduler`
//! over scripted audio slots.

use mix_maven::app_core::AppCore;
use mix_maven::deck::{AudioSlot, DeckPair, SlotId};
use mix_maven::scheduler::CrossfadeScheduler;
use mix_maven::suggest::Candidate;
use mix_maven::track::MixTrack;
use std::cell::RefCell;
use std::rc::Rc;
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

// ── Mix engine through AppCore ──────────────────────────────────────────────

#[test]
fn full_mix_lifecycle() {
    let mut core = AppCore::new_test();

    core.create_mix("Warmup".to_string()).unwrap();
    core.create_mix("Peak Time".to_string()).unwrap();
    assert_eq!(core.get_mixes().len(), 2);

    core.set_active_mix("peak time").unwrap();
    assert_eq!(core.get_status().active_mix.as_deref(), Some("Peak Time"));

    core.add_track("Peak Time", track("opener", 124.0, "8A", 0.6))
        .unwrap();
    core.add_track("Peak Time", track("builder", 125.0, "9A", 0.7))
        .unwrap();
    core.add_track("Peak Time", track("closer", 126.0, "9B", 0.8))
        .unwrap();

    let tracks = core.get_mix_tracks("Peak Time").unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks[0].key, "8A");
    assert_eq!(tracks[0].duration_display, "0:30");

    // Two adjacent moves and one energy-shift: all decent transitions.
    let transitions = core.get_transitions("Peak Time").unwrap();
    assert_eq!(transitions.len(), 2);
    assert!(transitions.iter().all(|t| t.score >= 70));
    assert!(core.get_flow_score("Peak Time").unwrap() >= 3.5);

    core.rename_mix("Peak Time", "Saturday".to_string()).unwrap();
    core.delete_mix("Warmup").unwrap();
    let mixes = core.get_mixes();
    assert_eq!(mixes.len(), 1);
    assert_eq!(mixes[0].name, "Saturday");
    assert!(mixes[0].is_active);
}

#[test]
fn state_round_trips_through_the_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut core = AppCore::new(&path);
        core.create_mix("Persisted".to_string()).unwrap();
        core.set_active_mix("Persisted").unwrap();
        core.add_track("Persisted", track("a", 120.0, "5A", 0.5))
            .unwrap();
        core.add_track("Persisted", track("b", 121.0, "6A", 0.5))
            .unwrap();
    }

    let core = AppCore::new(&path);
    let status = core.get_status();
    assert_eq!(status.active_mix.as_deref(), Some("Persisted"));
    // Derived scores come back from the tracks, not the file.
    let transitions = core.get_transitions("Persisted").unwrap();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].label, "Smooth");
}

#[test]
fn reordering_rescores_the_mix() {
    let mut core = AppCore::new_test();
    core.create_mix("Set".to_string()).unwrap();
    core.add_track("Set", track("a", 120.0, "8A", 0.5)).unwrap();
    core.add_track("Set", track("clash", 174.0, "2B", 1.0))
        .unwrap();
    core.add_track("Set", track("b", 120.0, "8A", 0.5)).unwrap();

    let before = core.get_flow_score("Set").unwrap();
    core.move_track("Set", 1, 2).unwrap();
    let after = core.get_flow_score("Set").unwrap();
    assert!(after > before);

    // The first pair is now a perfect transition.
    let transitions = core.get_transitions("Set").unwrap();
    assert_eq!(transitions[0].score, 100);
}

#[test]
fn suggestions_rank_harmonic_neighbours_first() {
    let mut core = AppCore::new_test();
    core.create_mix("Set".to_string()).unwrap();
    core.add_track("Set", track("last", 124.0, "8A", 0.6))
        .unwrap();

    let candidates = vec![
        Candidate::new(track("distant", 150.0, "2B", 0.2)),
        Candidate::new(track("adjacent", 124.5, "7A", 0.6)),
        Candidate::new(track("relative", 124.0, "8B", 0.6)),
    ];
    let ranked = core.get_suggestions("Set", &candidates, 2).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_ne!(ranked[0].track.id, "distant");
    assert_ne!(ranked[1].track.id, "distant");
    assert!(ranked[0].compatibility >= ranked[1].compatibility);
}

// ── Playback through scripted slots ─────────────────────────────────────────

#[derive(Default)]
struct SlotState {
    source: Option<String>,
    playing: bool,
    started: bool,
    volume: f32,
    position: Duration,
    duration: Duration,
}

#[derive(Clone, Default)]
struct ScriptedSlot(Rc<RefCell<SlotState>>);

impl ScriptedSlot {
    fn advance(&self, dt: Duration) {
        let mut s = self.0.borrow_mut();
        if s.playing && s.source.is_some() {
            s.position = (s.position + dt).min(s.duration);
        }
    }
    fn volume(&self) -> f32 {
        self.0.borrow().volume
    }
    fn source(&self) -> Option<String> {
        self.0.borrow().source.clone()
    }
}

impl AudioSlot for ScriptedSlot {
    fn load(&mut self, source: &str) -> Result<(), String> {
        let mut s = self.0.borrow_mut();
        s.source = Some(source.to_string());
        s.position = Duration::ZERO;
        s.duration = Duration::from_secs(30);
        s.started = false;
        s.playing = false;
        Ok(())
    }
    fn play(&mut self) {
        let mut s = self.0.borrow_mut();
        s.playing = true;
        if s.source.is_some() {
            s.started = true;
        }
    }
    fn pause(&mut self) {
        self.0.borrow_mut().playing = false;
    }
    fn stop(&mut self) {
        let mut s = self.0.borrow_mut();
        s.playing = false;
        s.started = false;
        s.source = None;
        s.position = Duration::ZERO;
    }
    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().volume = volume;
    }
    fn volume(&self) -> f32 {
        self.0.borrow().volume
    }
    fn seek(&mut self, position: Duration) -> Result<(), String> {
        self.0.borrow_mut().position = position;
        Ok(())
    }
    fn position(&self) -> Duration {
        self.0.borrow().position
    }
    fn duration(&self) -> Option<Duration> {
        let s = self.0.borrow();
        if s.source.is_some() {
            Some(s.duration)
        } else {
            None
        }
    }
    fn is_loaded(&self) -> bool {
        self.0.borrow().source.is_some()
    }
    fn has_ended(&self) -> bool {
        let s = self.0.borrow();
        s.started && s.source.is_some() && s.position >= s.duration
    }
}

fn preview_track(id: &str) -> MixTrack {
    let mut t = track(id, 120.0, "8A", 0.5);
    t.preview = Some(format!("{}.mp3", id));
    t
}

fn playback(
    tracks: Vec<MixTrack>,
) -> (CrossfadeScheduler<ScriptedSlot>, ScriptedSlot, ScriptedSlot) {
    let a = ScriptedSlot::default();
    let b = ScriptedSlot::default();
    let deck = DeckPair::new(a.clone(), b.clone());
    (CrossfadeScheduler::new(deck, tracks), a, b)
}

fn step(
    sched: &mut CrossfadeScheduler<ScriptedSlot>,
    a: &ScriptedSlot,
    b: &ScriptedSlot,
    dt: Duration,
) {
    a.advance(dt);
    b.advance(dt);
    sched.tick();
}

#[test]
fn three_track_mix_plays_through_with_two_crossfades() {
    let (mut sched, a, b) = playback(vec![
        preview_track("one"),
        preview_track("two"),
        preview_track("three"),
    ]);
    sched.play();

    let mut crossfades = 0;
    let mut was_fading = false;
    let mut flips = 0;
    let mut last_slot = SlotId::A;

    // Three 30-second tracks at a 100 ms cadence, with margin.
    for _ in 0..1000 {
        step(&mut sched, &a, &b, Duration::from_millis(100));
        let snap = sched.snapshot();
        if snap.crossfading && !was_fading {
            crossfades += 1;
        }
        was_fading = snap.crossfading;
        if snap.active_slot != last_slot {
            flips += 1;
            last_slot = snap.active_slot;
        }
        if !snap.is_playing {
            break;
        }
    }

    assert_eq!(crossfades, 2);
    assert_eq!(flips, 2);
    let snap = sched.snapshot();
    assert_eq!(snap.current_index, 2);
    assert!(!snap.is_playing, "mix ran to completion");
    assert!(a.source().is_none());
    assert!(b.source().is_none());
}

#[test]
fn crossfade_hands_over_without_a_volume_dropout() {
    let (mut sched, a, b) = playback(vec![preview_track("one"), preview_track("two")]);
    sched.set_volume(0.8);
    sched.play();

    let mut min_total = f32::MAX;
    for _ in 0..650 {
        step(&mut sched, &a, &b, Duration::from_millis(100));
        let snap = sched.snapshot();
        if !snap.is_playing {
            break;
        }
        let audible = a.volume().max(b.volume());
        min_total = min_total.min(if snap.crossfading {
            a.volume() + b.volume()
        } else {
            audible
        });
    }
    // Neither mid-fade nor across the flip does audible volume collapse.
    assert!(min_total > 0.75, "volume dipped to {}", min_total);
}

#[test]
fn transport_controls_work_after_the_flip() {
    let (mut sched, a, b) = playback(vec![
        preview_track("one"),
        preview_track("two"),
        preview_track("three"),
    ]);
    sched.play();

    // Run through the first crossfade so slot B is active.
    for _ in 0..320 {
        step(&mut sched, &a, &b, Duration::from_millis(100));
        if sched.snapshot().current_index == 1 {
            break;
        }
    }
    assert_eq!(sched.snapshot().active_slot, SlotId::B);

    sched.pause();
    assert!(!sched.is_playing());
    sched.play();
    assert!(sched.is_playing());

    sched.seek(Duration::from_secs(5)).unwrap();
    assert_eq!(b.position(), Duration::from_secs(5));

    sched.previous();
    let snap = sched.snapshot();
    assert_eq!(snap.current_index, 0);
    assert!(snap.is_playing);
    assert!(!snap.crossfading);
}

#[test]
fn mix_with_a_silent_middle_track_degrades_gracefully() {
    let (mut sched, a, b) = playback(vec![
        preview_track("one"),
        track("silent", 120.0, "8A", 0.5),
        preview_track("three"),
    ]);
    sched.play();

    for _ in 0..320 {
        step(&mut sched, &a, &b, Duration::from_millis(100));
        if !sched.is_playing() {
            break;
        }
    }

    // No crossfade armed into the silent track; playback parks on it.
    let snap = sched.snapshot();
    assert_eq!(snap.current_index, 1);
    assert!(!snap.has_preview);
    assert!(!snap.is_playing);

    // A manual skip resumes audible playback.
    sched.next();
    let snap = sched.snapshot();
    assert_eq!(snap.current_index, 2);
    assert!(snap.is_playing);
}
