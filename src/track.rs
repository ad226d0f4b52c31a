use crate::camelot::CamelotCode;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::{Accessor, ItemKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Energy assumed for tracks whose source carries no energy attribute.
/// Applied only at adapter boundaries (tag import, suggestion candidates),
/// never inside the scorer.
pub const NEUTRAL_ENERGY: f32 = 0.5;

/// A track enriched with everything the scorer and the crossfade scheduler
/// need. Immutable once built; validation happens in the constructors, so
/// downstream code can trust the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Tempo in BPM, always > 0.
    pub bpm: f32,
    pub camelot: CamelotCode,
    /// 0.0 - 1.0.
    pub energy: f32,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Playable preview source (file path or URL). Absent previews degrade
    /// to disabled transport controls, never an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
}

impl MixTrack {
    /// Build a track from raw audio-feature attributes, deriving the
    /// Camelot code from pitch class + mode.
    #[allow(clippy::too_many_arguments)]
    pub fn from_features(
        id: &str,
        title: &str,
        artist: &str,
        bpm: f32,
        pitch_class: u8,
        is_major: bool,
        energy: f32,
        duration: Duration,
    ) -> Result<Self, String> {
        let camelot = CamelotCode::from_raw_key(pitch_class, is_major)?;
        Self::with_camelot(id, title, artist, bpm, camelot, energy, duration)
    }

    /// Build a track from a precomputed Camelot code.
    pub fn with_camelot(
        id: &str,
        title: &str,
        artist: &str,
        bpm: f32,
        camelot: CamelotCode,
        energy: f32,
        duration: Duration,
    ) -> Result<Self, String> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(format!("Invalid BPM: {} (must be > 0)", bpm));
        }
        if !(0.0..=1.0).contains(&energy) {
            return Err(format!("Invalid energy: {} (expected 0.0-1.0)", energy));
        }
        Ok(MixTrack {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            bpm,
            camelot,
            energy,
            duration,
            preview: None,
            album_art: None,
        })
    }

    /// Create a MixTrack by reading metadata from a local audio file.
    /// Requires TBPM and a Camelot-format TKEY tag (e.g. "8A"); title and
    /// artist fall back to the file stem / "Unknown". Energy has no standard
    /// tag, so it defaults to [`NEUTRAL_ENERGY`]. The file itself becomes
    /// the preview source.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let path = path
            .canonicalize()
            .map_err(|e| format!("Invalid path '{}': {}", path.display(), e))?;

        let tagged_file = lofty::read_from_path(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

        let duration = tagged_file.properties().duration();
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        let title = tag
            .and_then(|t| t.title().map(|s| s.to_string()))
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "Unknown".to_string())
            });

        let artist = tag
            .and_then(|t| t.artist().map(|s| s.to_string()))
            .unwrap_or_else(|| "Unknown".to_string());

        let bpm: f32 = tag
            .and_then(|t| t.get_string(&ItemKey::Bpm))
            .ok_or_else(|| format!("'{}' has no BPM tag", path.display()))?
            .trim()
            .parse()
            .map_err(|_| format!("'{}' has an unparseable BPM tag", path.display()))?;

        let camelot: CamelotCode = tag
            .and_then(|t| t.get_string(&ItemKey::InitialKey))
            .ok_or_else(|| format!("'{}' has no initial key tag", path.display()))?
            .parse()?;

        let id = path.to_string_lossy().to_string();
        let mut track = Self::with_camelot(
            &id,
            &title,
            &artist,
            bpm,
            camelot,
            NEUTRAL_ENERGY,
            duration,
        )?;
        track.preview = Some(id);
        Ok(track)
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Format duration as MM:SS.
    pub fn duration_display(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct DurationRepr {
        secs: u64,
        nanos: u32,
    }

    pub fn serialize<S: Serializer>(dur: &Duration, s: S) -> Result<S::Ok, S::Error> {
        DurationRepr {
            secs: dur.as_secs(),
            nanos: dur.subsec_nanos(),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let repr = DurationRepr::deserialize(d)?;
        Ok(Duration::new(repr.secs, repr.nanos))
    }
}
