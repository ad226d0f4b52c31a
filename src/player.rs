//! Rodio-backed audio slots. Not serializable; created fresh per session.

use crate::deck::{AudioSlot, DeckPair};
use lofty::file::AudioFile;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared audio output. Owns the OS stream both slots play into.
pub struct AudioOutput {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Initialize the default audio output device.
    pub fn new() -> Result<Self, String> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;
        Ok(AudioOutput {
            _stream: stream,
            stream_handle: handle,
        })
    }

    /// Create an independent playback slot on this output.
    pub fn create_slot(&self) -> Result<RodioSlot, String> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
        sink.pause();
        Ok(RodioSlot {
            sink,
            loaded: None,
            duration: None,
            volume: 1.0,
            started: false,
        })
    }

    /// Create the dual-slot deck the crossfade scheduler drives.
    pub fn create_deck(&self) -> Result<DeckPair<RodioSlot>, String> {
        Ok(DeckPair::new(self.create_slot()?, self.create_slot()?))
    }
}

/// One playback slot wrapping a rodio sink.
pub struct RodioSlot {
    sink: Sink,
    loaded: Option<PathBuf>,
    duration: Option<Duration>,
    volume: f32,
    started: bool,
}

impl RodioSlot {
    /// Decode a file and queue it on the sink, paused.
    fn decode_into_sink(&mut self, path: &Path) -> Result<(), String> {
        let file = File::open(path)
            .map_err(|e| format!("Cannot open '{}': {}", path.display(), e))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("Cannot decode '{}': {}", path.display(), e))?;

        // Decoder often knows the duration; fall back to the tag reader.
        let duration = source
            .total_duration()
            .or_else(|| probe_duration(path));

        self.sink.stop();
        self.sink.pause();
        self.sink.append(source);
        self.sink.set_volume(self.volume);
        self.duration = duration;
        self.loaded = Some(path.to_path_buf());
        self.started = false;
        Ok(())
    }
}

/// Read a file's duration from its container metadata.
fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|f| f.properties().duration())
}

impl AudioSlot for RodioSlot {
    fn load(&mut self, source: &str) -> Result<(), String> {
        self.decode_into_sink(Path::new(source))
    }

    fn play(&mut self) {
        self.sink.play();
        if self.loaded.is_some() {
            self.started = true;
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.loaded = None;
        self.duration = None;
        self.started = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn seek(&mut self, position: Duration) -> Result<(), String> {
        self.sink
            .try_seek(position)
            .map_err(|e| format!("Seek failed: {}", e))
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn has_ended(&self) -> bool {
        self.started && self.loaded.is_some() && self.sink.empty()
    }
}
