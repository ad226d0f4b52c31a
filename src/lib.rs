//! mixMaven core library: the Harmonic Mix Engine.
//!
//! Transition scoring (Camelot wheel, tempo, energy), mix flow aggregation,
//! and dual-deck crossfade preview playback all live here. The CLI and any
//! future GUI consume this crate.

pub mod app_core;
pub mod camelot;
pub mod deck;
pub mod library;
pub mod mix;
pub mod player;
pub mod scheduler;
pub mod suggest;
pub mod track;
pub mod transition;
