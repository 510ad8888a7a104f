// Pattern table - Rhythmic subdivisions of a beat
// Each subdivision splits a beat into N slots; a slot either sounds or stays silent

use std::fmt;

/// Subdivision of a beat, keyed by a stable string id
///
/// Unknown ids never fail: they resolve to [`Subdivision::Quarter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Subdivision {
    #[default]
    Quarter,
    Eighth,
    Triplet,
    Sixteenth,
    /// Eighth then two sixteenths
    EighthTwoSixteenths,
    /// Two sixteenths then eighth
    TwoSixteenthsEighth,
    /// First and third slot of a triplet
    Shuffle,
    /// First and fourth sixteenth
    FirstFourthSixteenth,
    /// Off-beat eighth only
    Offbeat,
    /// Second and fourth sixteenth
    SecondFourthSixteenth,
    /// Second and third slot of a triplet
    SecondThirdTriplet,
    /// Third and fourth sixteenth
    ThirdFourthSixteenth,
    Quintuplet,
    Sextuplet,
    Septuplet,
    /// Three eighths over a sextuplet grid (binary felt as ternary)
    Ternary,
}

/// Fixed onset pattern for one beat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubdivisionPattern {
    slots: &'static [bool],
}

impl SubdivisionPattern {
    const fn new(slots: &'static [bool]) -> Self {
        Self { slots }
    }

    /// Number of slots per beat (always >= 1)
    pub fn divisions(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Whether slot `index` produces an audible onset. Out-of-range slots never sound.
    pub fn is_onset(&self, index: u32) -> bool {
        self.slots.get(index as usize).copied().unwrap_or(false)
    }

    /// Raw slot table
    pub fn slots(&self) -> &'static [bool] {
        self.slots
    }
}

const X: bool = true;
const O: bool = false;

const QUARTER: SubdivisionPattern = SubdivisionPattern::new(&[X]);
const EIGHTH: SubdivisionPattern = SubdivisionPattern::new(&[X, X]);
const TRIPLET: SubdivisionPattern = SubdivisionPattern::new(&[X, X, X]);
const SIXTEENTH: SubdivisionPattern = SubdivisionPattern::new(&[X, X, X, X]);
const EIGHTH_TWO_SIXTEENTHS: SubdivisionPattern = SubdivisionPattern::new(&[X, O, X, X]);
const TWO_SIXTEENTHS_EIGHTH: SubdivisionPattern = SubdivisionPattern::new(&[X, X, X, O]);
const SHUFFLE: SubdivisionPattern = SubdivisionPattern::new(&[X, O, X]);
const FIRST_FOURTH_SIXTEENTH: SubdivisionPattern = SubdivisionPattern::new(&[X, O, O, X]);
const OFFBEAT: SubdivisionPattern = SubdivisionPattern::new(&[O, X]);
const SECOND_FOURTH_SIXTEENTH: SubdivisionPattern = SubdivisionPattern::new(&[O, X, O, X]);
const SECOND_THIRD_TRIPLET: SubdivisionPattern = SubdivisionPattern::new(&[O, X, X]);
const THIRD_FOURTH_SIXTEENTH: SubdivisionPattern = SubdivisionPattern::new(&[O, O, X, X]);
const QUINTUPLET: SubdivisionPattern = SubdivisionPattern::new(&[X; 5]);
const SEXTUPLET: SubdivisionPattern = SubdivisionPattern::new(&[X; 6]);
const SEPTUPLET: SubdivisionPattern = SubdivisionPattern::new(&[X; 7]);
const TERNARY: SubdivisionPattern = SubdivisionPattern::new(&[X, O, X, O, X, O]);

impl Subdivision {
    /// Every subdivision, in display order
    pub const ALL: [Subdivision; 16] = [
        Subdivision::Quarter,
        Subdivision::Eighth,
        Subdivision::Triplet,
        Subdivision::Sixteenth,
        Subdivision::EighthTwoSixteenths,
        Subdivision::TwoSixteenthsEighth,
        Subdivision::Shuffle,
        Subdivision::FirstFourthSixteenth,
        Subdivision::Offbeat,
        Subdivision::SecondFourthSixteenth,
        Subdivision::SecondThirdTriplet,
        Subdivision::ThirdFourthSixteenth,
        Subdivision::Quintuplet,
        Subdivision::Sextuplet,
        Subdivision::Septuplet,
        Subdivision::Ternary,
    ];

    /// Onset pattern for this subdivision
    pub fn pattern(&self) -> SubdivisionPattern {
        match self {
            Subdivision::Quarter => QUARTER,
            Subdivision::Eighth => EIGHTH,
            Subdivision::Triplet => TRIPLET,
            Subdivision::Sixteenth => SIXTEENTH,
            Subdivision::EighthTwoSixteenths => EIGHTH_TWO_SIXTEENTHS,
            Subdivision::TwoSixteenthsEighth => TWO_SIXTEENTHS_EIGHTH,
            Subdivision::Shuffle => SHUFFLE,
            Subdivision::FirstFourthSixteenth => FIRST_FOURTH_SIXTEENTH,
            Subdivision::Offbeat => OFFBEAT,
            Subdivision::SecondFourthSixteenth => SECOND_FOURTH_SIXTEENTH,
            Subdivision::SecondThirdTriplet => SECOND_THIRD_TRIPLET,
            Subdivision::ThirdFourthSixteenth => THIRD_FOURTH_SIXTEENTH,
            Subdivision::Quintuplet => QUINTUPLET,
            Subdivision::Sextuplet => SEXTUPLET,
            Subdivision::Septuplet => SEPTUPLET,
            Subdivision::Ternary => TERNARY,
        }
    }

    /// Number of slots per beat
    pub fn divisions(&self) -> u32 {
        self.pattern().divisions()
    }

    /// Stable identifier (used by presets and the CLI)
    pub fn id(&self) -> &'static str {
        match self {
            Subdivision::Quarter => "quarter",
            Subdivision::Eighth => "eighth",
            Subdivision::Triplet => "triplet",
            Subdivision::Sixteenth => "sixteenth",
            Subdivision::EighthTwoSixteenths => "1e2d",
            Subdivision::TwoSixteenthsEighth => "2d1e",
            Subdivision::Shuffle => "shuffle",
            Subdivision::FirstFourthSixteenth => "1-4-16",
            Subdivision::Offbeat => "offbeat",
            Subdivision::SecondFourthSixteenth => "2-4-16",
            Subdivision::SecondThirdTriplet => "2-3-trip",
            Subdivision::ThirdFourthSixteenth => "3-4-16",
            Subdivision::Quintuplet => "quintolet",
            Subdivision::Sextuplet => "sextolet",
            Subdivision::Septuplet => "septolet",
            Subdivision::Ternary => "trinaire",
        }
    }

    /// Look up a subdivision by id, `None` if unknown
    pub fn lookup(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.id().eq_ignore_ascii_case(id))
    }

    /// Look up a subdivision by id, falling back to quarter notes
    pub fn from_id(id: &str) -> Self {
        Self::lookup(id).unwrap_or_else(|| {
            log::warn!("Unknown subdivision '{}', falling back to quarter", id);
            Self::default()
        })
    }
}

impl From<String> for Subdivision {
    fn from(id: String) -> Self {
        Self::from_id(&id)
    }
}

impl From<Subdivision> for &'static str {
    fn from(subdivision: Subdivision) -> Self {
        subdivision.id()
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
