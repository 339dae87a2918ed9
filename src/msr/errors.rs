//! Error types for MSR structural assembly
//!
//! Every integrity check in the part/staff/voice engine maps onto one of
//! these kinds. Each variant carries the caller-supplied input line and the
//! offending identifier so the host application can report it.

use thiserror::Error;

use super::types::{InputLine, StaffKind, WholeNotes};

/// Errors raised while registering staves and voices or dispatching to them
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MsrError {
    /// A staff with this number is already registered in the part
    #[error("staff number {staff_number} already exists in part {part}, line {line}")]
    DuplicateStaffNumber {
        part: String,
        staff_number: i32,
        line: InputLine,
    },

    /// A second harmonies or figured bass staff in the same part
    #[error("a {staff_kind} staff already exists in part {part}, line {line}")]
    DuplicateSingletonStaff {
        part: String,
        staff_kind: StaffKind,
        line: InputLine,
    },

    /// A second part-level harmonies or figured bass voice
    #[error("part {part} already has a {voice_kind} voice, line {line}")]
    DuplicateSingletonVoice {
        part: String,
        voice_kind: String,
        line: InputLine,
    },

    /// A voice with the same name is already in the staff's all voices list
    #[error("a voice named \"{voice}\" is already present in staff \"{staff}\", line {line}")]
    DuplicateVoiceIdentity {
        staff: String,
        voice: String,
        line: InputLine,
    },

    /// A regular voice with this number already exists in the staff
    #[error("regular voice number {voice_number} already exists in staff \"{staff}\", line {line}")]
    DuplicateVoiceNumber {
        staff: String,
        voice_number: i32,
        line: InputLine,
    },

    /// Regular staff numbers must not be negative
    #[error("regular staff number {staff_number} is negative, line {line}")]
    InvalidStaffNumber { staff_number: i32, line: InputLine },

    /// Access to the part measures whole notes vector out of its bounds
    #[error(
        "measure index {index} is out of bounds in part {part}, \
         the measures whole notes vector has {size} slots, line {line}"
    )]
    MeasureIndexOutOfRange {
        part: String,
        index: i64,
        size: usize,
        line: InputLine,
    },

    /// The staff is already filled up with regular voices
    #[error(
        "staff \"{staff}\" is already filled up with {max} regular voices, \
         voice number {voice_number} overflows it, line {line}"
    )]
    RegularVoiceOverflow {
        staff: String,
        voice_number: i32,
        max: usize,
        line: InputLine,
    },

    /// The staff has no regular voice to fetch
    #[error("staff {staff_number} in part {part} doesn't contain any regular voice, line {line}")]
    NoRegularVoice {
        part: String,
        staff_number: i32,
        line: InputLine,
    },

    #[error("part group {part_group_number} is unknown, line {line}")]
    UnknownPartGroup {
        part_group_number: usize,
        line: InputLine,
    },

    #[error("staff number {staff_number} is unknown in part {part}, line {line}")]
    UnknownStaff {
        part: String,
        staff_number: i32,
        line: InputLine,
    },

    #[error("voice number {voice_number} is unknown in staff \"{staff}\", line {line}")]
    UnknownVoice {
        staff: String,
        voice_number: i32,
        line: InputLine,
    },

    /// Two measures slices sequences can only be merged when equally long
    #[error(
        "cannot merge measures slices sequence \"{origin}\" ({size} slices) \
         with \"{other_origin}\" ({other_size} slices), line {line}"
    )]
    SlicesSequenceSizeMismatch {
        origin: String,
        size: usize,
        other_origin: String,
        other_size: usize,
        line: InputLine,
    },

    /// Slices at the same index must belong to the same measure
    #[error(
        "cannot append measures slice for measure '{other_measure}' \
         to slice for measure '{measure}', line {line}"
    )]
    SliceMeasureNumberMismatch {
        measure: String,
        other_measure: String,
        line: InputLine,
    },

    #[error("position in measure cannot become negative ({position}) in part {part}, line {line}")]
    NegativePositionInMeasure {
        part: String,
        position: WholeNotes,
        line: InputLine,
    },

    #[error("{what} has already been finalized, line {line}")]
    AlreadyFinalized { what: String, line: InputLine },

    /// Settings could not be read or decoded
    #[error("settings error: {0}")]
    Settings(String),
}

impl MsrError {
    /// Whether this error leaves the model in a state that cannot be
    /// rendered. Only the voice overflow is recoverable: the extra voice is
    /// simply not created.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MsrError::RegularVoiceOverflow { .. })
    }
}

/// Result alias used throughout the MSR layer
pub type MsrResult<T> = Result<T, MsrError>;
