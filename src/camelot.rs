use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pitch class (0 = C .. 11 = B) → Camelot wheel number for minor keys (A ring).
/// These encode the circle-of-fifths layout of the wheel; they are not
/// derivable from the pitch class arithmetically.
const MINOR_WHEEL: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

/// Pitch class (0 = C .. 11 = B) → Camelot wheel number for major keys (B ring).
const MAJOR_WHEEL: [u8; 12] = [8, 3, 10, 5, 12, 1, 6, 11, 4, 9, 2, 7];

/// Which ring of the Camelot wheel a key sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ring {
    /// Minor keys, the "A" ring.
    Minor,
    /// Major keys, the "B" ring.
    Major,
}

impl Ring {
    pub fn letter(self) -> char {
        match self {
            Ring::Minor => 'A',
            Ring::Major => 'B',
        }
    }
}

/// A position on the Camelot wheel, e.g. "8A" (A minor) or "8B" (C major).
/// Invariant: `number` is always in 1..=12. Derived once per track and
/// cached on the track record; the scorer trusts it without re-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CamelotCode {
    pub number: u8,
    pub ring: Ring,
}

impl CamelotCode {
    /// Build a code from a wheel number (1-12) and ring.
    pub fn new(number: u8, ring: Ring) -> Result<Self, String> {
        if !(1..=12).contains(&number) {
            return Err(format!(
                "Invalid Camelot number: {} (expected 1-12)",
                number
            ));
        }
        Ok(CamelotCode { number, ring })
    }

    /// Convert a raw pitch class (0-11) + mode into its Camelot code.
    pub fn from_raw_key(pitch_class: u8, is_major: bool) -> Result<Self, String> {
        if pitch_class > 11 {
            return Err(format!(
                "Invalid key: {} (expected pitch class 0-11)",
                pitch_class
            ));
        }
        let (number, ring) = if is_major {
            (MAJOR_WHEEL[pitch_class as usize], Ring::Major)
        } else {
            (MINOR_WHEEL[pitch_class as usize], Ring::Minor)
        };
        Ok(CamelotCode { number, ring })
    }

    /// The four harmonically compatible codes: same, ±1 on the wheel, and
    /// the relative major/minor.
    pub fn compatible_keys(&self) -> [CamelotCode; 4] {
        let other = match self.ring {
            Ring::Minor => Ring::Major,
            Ring::Major => Ring::Minor,
        };
        [
            *self,
            CamelotCode { number: wrap(self.number as i8 + 1), ring: self.ring },
            CamelotCode { number: wrap(self.number as i8 - 1), ring: self.ring },
            CamelotCode { number: self.number, ring: other },
        ]
    }
}

/// Wrap a wheel number back into 1-12.
fn wrap(n: i8) -> u8 {
    (((n - 1) + 12) % 12 + 1) as u8
}

impl fmt::Display for CamelotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.ring.letter())
    }
}

impl FromStr for CamelotCode {
    type Err = String;

    /// Parse codes like "7A" or "12B" (lowercase letters accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || format!("Invalid Camelot code: '{}'", s);
        if trimmed.len() < 2 || trimmed.len() > 3 {
            return Err(err());
        }
        let (digits, letter) = trimmed.split_at(trimmed.len() - 1);
        let number: u8 = digits.parse().map_err(|_| err())?;
        let ring = match letter {
            "A" | "a" => Ring::Minor,
            "B" | "b" => Ring::Major,
            _ => return Err(err()),
        };
        CamelotCode::new(number, ring).map_err(|_| err())
    }
}

/// How two keys relate on the Camelot wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRelation {
    /// Same number, same ring.
    Perfect,
    /// Same ring, one step around the wheel.
    Adjacent,
    /// Same number, other ring (relative major/minor).
    EnergyShift,
    Distant,
}

/// Minimal circular distance between two wheel numbers, ignoring ring (0-6).
pub fn wheel_distance(a: CamelotCode, b: CamelotCode) -> u8 {
    let diff = (a.number as i8 - b.number as i8).unsigned_abs();
    diff.min(12 - diff)
}

/// Distance used for distant-key scoring: wheel distance plus one penalty
/// step when the rings differ. Applied uniformly (see DESIGN.md).
pub fn camelot_distance(a: CamelotCode, b: CamelotCode) -> u8 {
    let penalty = if a.ring != b.ring { 1 } else { 0 };
    wheel_distance(a, b) + penalty
}

pub fn key_relation(a: CamelotCode, b: CamelotCode) -> KeyRelation {
    if a.number == b.number {
        return if a.ring == b.ring {
            KeyRelation::Perfect
        } else {
            KeyRelation::EnergyShift
        };
    }
    if a.ring == b.ring && wheel_distance(a, b) == 1 {
        return KeyRelation::Adjacent;
    }
    KeyRelation::Distant
}
