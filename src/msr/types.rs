//! Value types shared by the MSR layer
//!
//! - [`WholeNotes`]: rational durations, 1 = one whole note
//! - [`Length`]: physical lengths with their unit
//! - [`StaffKind`] / [`VoiceKind`]: the tagged kinds driving dispatch

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Rational type used for all duration bookkeeping
pub type Rational = Rational64;

/// Line number in the source document, supplied by the caller for diagnostics
pub type InputLine = u32;

// ============================================================================
// WHOLE NOTES
// ============================================================================

/// A duration expressed in whole notes (1/4 is a quarter note)
///
/// Always kept in lowest terms with a positive denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WholeNotes(Rational);

impl WholeNotes {
    /// Create a duration from a known-good fraction, such as a literal.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero, as [`Rational::new`] does. Use
    /// [`WholeNotes::checked_new`] for fractions coming from input data.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        WholeNotes(Rational::new(numerator, denominator))
    }

    /// Create a duration, or `None` if `denominator` is zero
    pub fn checked_new(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        Some(WholeNotes(Rational::new(numerator, denominator)))
    }

    pub fn zero() -> Self {
        WholeNotes(Rational::from_integer(0))
    }

    pub fn from_integer(value: i64) -> Self {
        WholeNotes(Rational::from_integer(value))
    }

    pub fn numerator(&self) -> i64 {
        *self.0.numer()
    }

    pub fn denominator(&self) -> i64 {
        *self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.numerator() == 0
    }

    pub fn is_negative(&self) -> bool {
        self.numerator() < 0
    }

    pub fn as_rational(&self) -> Rational {
        self.0
    }

    /// Convert to floating point (for debugging/display)
    pub fn to_f64(&self) -> f64 {
        self.numerator() as f64 / self.denominator() as f64
    }
}

impl Default for WholeNotes {
    fn default() -> Self {
        WholeNotes::zero()
    }
}

impl From<Rational> for WholeNotes {
    fn from(value: Rational) -> Self {
        WholeNotes(value)
    }
}

impl Add for WholeNotes {
    type Output = WholeNotes;

    fn add(self, rhs: WholeNotes) -> WholeNotes {
        WholeNotes(self.0 + rhs.0)
    }
}

impl AddAssign for WholeNotes {
    fn add_assign(&mut self, rhs: WholeNotes) {
        self.0 += rhs.0;
    }
}

impl Sub for WholeNotes {
    type Output = WholeNotes;

    fn sub(self, rhs: WholeNotes) -> WholeNotes {
        WholeNotes(self.0 - rhs.0)
    }
}

impl SubAssign for WholeNotes {
    fn sub_assign(&mut self, rhs: WholeNotes) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for WholeNotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator() == 1 {
            write!(f, "{}", self.numerator())
        } else {
            write!(f, "{}/{}", self.numerator(), self.denominator())
        }
    }
}

// ============================================================================
// LENGTHS
// ============================================================================

/// Unit of a physical [`Length`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    Inch,
    Centimeter,
    Millimeter,
}

impl LengthUnit {
    /// Number of millimeters in one of this unit
    fn millimeters(&self) -> f32 {
        match self {
            LengthUnit::Inch => 25.4,
            LengthUnit::Centimeter => 10.0,
            LengthUnit::Millimeter => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Inch => "in",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
        }
    }
}

/// A physical length such as a staff distance or a page margin
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Length {
    pub unit: LengthUnit,
    pub value: f32,
}

impl Length {
    pub fn new(unit: LengthUnit, value: f32) -> Self {
        Self { unit, value }
    }

    /// The same length expressed in another unit
    pub fn convert_to_unit(&self, unit: LengthUnit) -> Length {
        if unit == self.unit {
            return *self;
        }

        Length {
            unit,
            value: self.value * self.unit.millimeters() / unit.millimeters(),
        }
    }

    pub fn in_millimeters(&self) -> f32 {
        self.convert_to_unit(LengthUnit::Millimeter).value
    }
}

impl PartialEq for Length {
    /// Lengths compare by physical size, whatever their units
    fn eq(&self, other: &Self) -> bool {
        (self.in_millimeters() - other.in_millimeters()).abs() < 1e-4
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

// ============================================================================
// KINDS
// ============================================================================

/// What a staff is used for
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StaffKind {
    Regular,
    Tablature,
    Harmonies,
    FiguredBass,
    Drum,
    Rhythmic,
}

impl StaffKind {
    pub const ALL: [StaffKind; 6] = [
        StaffKind::Regular,
        StaffKind::Tablature,
        StaffKind::Harmonies,
        StaffKind::FiguredBass,
        StaffKind::Drum,
        StaffKind::Rhythmic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffKind::Regular => "regular",
            StaffKind::Tablature => "tablature",
            StaffKind::Harmonies => "harmonies",
            StaffKind::FiguredBass => "figured bass",
            StaffKind::Drum => "drum",
            StaffKind::Rhythmic => "rhythmic",
        }
    }
}

impl fmt::Display for StaffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a voice carries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceKind {
    Regular,
    Dynamics,
    Harmonies,
    FiguredBass,
}

impl VoiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceKind::Regular => "regular",
            VoiceKind::Dynamics => "dynamics",
            VoiceKind::Harmonies => "harmonies",
            VoiceKind::FiguredBass => "figured bass",
        }
    }
}

impl fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a measure is implicit (an anacrusis or a measure split by a repeat)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureImplicitKind {
    Yes,
    No,
}

/// Whether a note or rest sounds alone in its staff at its position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoloNoteOrRest {
    Unknown,
    Yes,
    No,
}

impl Default for SoloNoteOrRest {
    fn default() -> Self {
        SoloNoteOrRest::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_notes_arithmetic() {
        let quarter = WholeNotes::new(1, 4);
        let eighth = WholeNotes::new(1, 8);

        assert_eq!(quarter + eighth, WholeNotes::new(3, 8));
        assert_eq!(quarter - eighth, eighth);
        assert!((eighth - quarter).is_negative());
        assert_eq!(WholeNotes::new(2, 8), quarter);
        assert_eq!(WholeNotes::new(1, -4).denominator(), 4);
    }

    #[test]
    fn test_checked_new_rejects_zero_denominator() {
        assert_eq!(WholeNotes::checked_new(3, 0), None);
        assert_eq!(WholeNotes::checked_new(6, 8), Some(WholeNotes::new(3, 4)));
    }

    #[test]
    fn test_whole_notes_display() {
        assert_eq!(WholeNotes::new(15, 8).to_string(), "15/8");
        assert_eq!(WholeNotes::new(4, 4).to_string(), "1");
        assert_eq!(WholeNotes::zero().to_string(), "0");
    }

    #[test]
    fn test_length_conversion_and_equality() {
        let inch = Length::new(LengthUnit::Inch, 1.0);
        let mm = inch.convert_to_unit(LengthUnit::Millimeter);

        assert!((mm.value - 25.4).abs() < 1e-4);
        assert_eq!(inch, Length::new(LengthUnit::Centimeter, 2.54));
        assert_ne!(inch, Length::new(LengthUnit::Centimeter, 2.0));
    }
}
