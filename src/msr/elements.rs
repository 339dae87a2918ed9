//! Structural elements cascaded from parts to staves to voices
//!
//! These are plain values: the engine compares them for redundancy
//! suppression and hands clones to every voice that should see them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{Length, WholeNotes};

// ============================================================================
// CLEFS, KEYS, TIME SIGNATURES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClefSign {
    G,
    F,
    C,
    Percussion,
    Tablature,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clef {
    pub sign: ClefSign,
    /// Staff line the clef sits on, counted from the bottom
    pub line: u8,
    pub octave_change: i8,
}

impl Clef {
    pub fn new(sign: ClefSign, line: u8) -> Self {
        Self {
            sign,
            line,
            octave_change: 0,
        }
    }

    pub fn treble() -> Self {
        Clef::new(ClefSign::G, 2)
    }

    pub fn bass() -> Self {
        Clef::new(ClefSign::F, 4)
    }

    pub fn alto() -> Self {
        Clef::new(ClefSign::C, 3)
    }

    pub fn percussion() -> Self {
        Clef::new(ClefSign::Percussion, 3)
    }
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.sign, self.line)?;
        if self.octave_change != 0 {
            write!(f, "{:+}", self.octave_change)?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyMode {
    Major,
    Minor,
}

/// Traditional key signature, as a position on the circle of fifths
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// -7 (seven flats) to +7 (seven sharps)
    pub fifths: i8,
    pub mode: KeyMode,
}

impl Key {
    pub fn new(fifths: i8, mode: KeyMode) -> Self {
        Self { fifths, mode }
    }

    pub fn c_major() -> Self {
        Key::new(0, KeyMode::Major)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fifths {:?}", self.fifths, self.mode)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats: u32,
    pub beat_type: u32,
}

impl TimeSignature {
    pub fn new(beats: u32, beat_type: u32) -> Self {
        Self { beats, beat_type }
    }

    /// Duration of a full measure under this time signature, `None` for a
    /// beat type of 0
    pub fn measure_whole_notes(&self) -> Option<WholeNotes> {
        WholeNotes::checked_new(self.beats as i64, self.beat_type as i64)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

// ============================================================================
// STAFF-WIDE ELEMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transposition {
    pub diatonic: i32,
    pub chromatic: i32,
    pub octave_change: i32,
    pub double: bool,
}

impl Transposition {
    pub fn new(diatonic: i32, chromatic: i32) -> Self {
        Self {
            diatonic,
            chromatic,
            octave_change: 0,
            double: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub beat_unit: WholeNotes,
    pub per_minute: u32,
    pub words: Option<String>,
}

impl Tempo {
    pub fn new(beat_unit: WholeNotes, per_minute: u32) -> Self {
        Self {
            beat_unit,
            per_minute,
            words: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehearsalMark {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBreak {
    pub next_bar_number: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBreak {
    pub next_bar_number: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarLineLocation {
    Left,
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarLineStyle {
    Regular,
    Dotted,
    Dashed,
    Heavy,
    LightLight,
    LightHeavy,
    HeavyLight,
    HeavyHeavy,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatDirection {
    Forward,
    Backward,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarLine {
    pub location: BarLineLocation,
    pub style: BarLineStyle,
    pub repeat_direction: Option<RepeatDirection>,
    pub times: Option<u32>,
}

impl BarLine {
    pub fn new(location: BarLineLocation, style: BarLineStyle) -> Self {
        Self {
            location,
            style,
            repeat_direction: None,
            times: None,
        }
    }

    /// Final bar line at the right of a measure
    pub fn final_bar() -> Self {
        BarLine::new(BarLineLocation::Right, BarLineStyle::LightHeavy)
    }
}

/// Tuning of one string, used by scordaturas and tablature staff details
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTuning {
    pub string_number: u8,
    pub step: char,
    pub alter: i8,
    pub octave: i8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scordatura {
    pub accords: Vec<StringTuning>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccordionRegistration {
    pub high_dots: u8,
    pub middle_dots: u8,
    pub low_dots: u8,
}

/// One pedal per diatonic step, with its alteration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarpPedalsTuning {
    pub pedals: Vec<(char, i8)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaffDetails {
    pub lines_number: Option<u8>,
    pub tunings: Vec<StringTuning>,
    pub staff_distance: Option<Length>,
    pub print_object: bool,
}

impl StaffDetails {
    pub fn with_lines(lines_number: u8) -> Self {
        Self {
            lines_number: Some(lines_number),
            tunings: Vec::new(),
            staff_distance: None,
            print_object: true,
        }
    }
}

// ============================================================================
// REPEATS AND RESTS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatEndingKind {
    Hooked,
    Hookless,
}

/// A repeat built in a first pass and replayed into a part clone
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatClone {
    pub start_measure_number: String,
    pub times: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleMeasureRest {
    pub measures_number: u32,
    pub first_measure_number: String,
}

// ============================================================================
// MEASURE CONTENTS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    Regular,
    Rest,
    Skip,
    Unpitched,
    Chord,
    Tuplet,
    Grace,
}

impl NoteKind {
    /// Skips make room in a measure but never sound
    pub fn is_skip(&self) -> bool {
        matches!(self, NoteKind::Skip)
    }
}

/// What a voice needs to know about a note to keep its measures consistent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteContent {
    pub kind: NoteKind,
    pub sounding_whole_notes: WholeNotes,
    /// Display form for diagnostics, such as `"c'4"`
    pub text: String,
}

impl NoteContent {
    pub fn new(kind: NoteKind, sounding_whole_notes: WholeNotes, text: &str) -> Self {
        Self {
            kind,
            sounding_whole_notes,
            text: text.to_string(),
        }
    }

    pub fn rest(sounding_whole_notes: WholeNotes) -> Self {
        NoteContent::new(NoteKind::Rest, sounding_whole_notes, "r")
    }

    pub fn skip(sounding_whole_notes: WholeNotes) -> Self {
        NoteContent::new(NoteKind::Skip, sounding_whole_notes, "s")
    }
}

/// Chord symbol carried by a harmonies voice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Harmony {
    pub root: String,
    pub kind: String,
    pub whole_notes: WholeNotes,
}

/// Figured bass annotation carried by a figured bass voice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FiguredBassElement {
    pub figures: Vec<String>,
    pub whole_notes: WholeNotes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_whole_notes() {
        assert_eq!(
            TimeSignature::new(6, 8).measure_whole_notes(),
            Some(WholeNotes::new(3, 4))
        );
        assert_eq!(
            TimeSignature::new(4, 4).measure_whole_notes(),
            Some(WholeNotes::from_integer(1))
        );
        assert_eq!(TimeSignature::new(3, 0).measure_whole_notes(), None);
    }
}
