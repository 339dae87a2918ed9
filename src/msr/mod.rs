//! Music Score Representation (MSR) Module
//!
//! The part/staff/voice assembly engine of the MSR layer: it creates and
//! tracks staves and voices within parts, routes structural events to the
//! right staves and voices, keeps per-measure duration bookkeeping and
//! merges measures slices upward.
//!
//! # Architecture
//!
//! ```text
//! Score → PartGroup → Part → Staff → Voice     (creation, ownership)
//! Part  → Staves    → Voices                   (structural events cascade down)
//! Voice → Staff     → Part                     (measures slices merge up)
//! ```
//!
//! # Modules
//!
//! - **types**: rational durations, lengths and the staff/voice kinds
//! - **elements**: clefs, keys, tempos, bar lines and other structural elements
//! - **clef_key_time**: batching of clefs, keys and times sharing a group line
//! - **voice**, **staff**, **part**, **score**: the containers
//! - **slices**: measures slices and their merging
//! - **dispatch**: which staff kinds receive which part-level events
//! - **settings**: the options the engine consults
//!
//! # Usage
//!
//! ```rust,ignore
//! use score_msr::msr::{Clef, MsrSettings, Score, StaffKind};
//!
//! let mut score = Score::new(MsrSettings::default());
//! let part = score.create_part(1, "P1", None)?;
//! part.add_regular_staff_by_number(2, StaffKind::Regular, 1)?;
//! part.create_regular_voice_in_staff(3, 1, 1, "1")?;
//! part.append_clef_to_part(4, 4, &Clef::treble());
//! score.finalize(100)?;
//! ```

pub mod clef_key_time;
pub mod dispatch;
pub mod elements;
pub mod errors;
pub mod part;
pub mod score;
pub mod settings;
pub mod slices;
pub mod staff;
pub mod types;
pub mod voice;

pub use clef_key_time::{ClefKeyTimeGroup, ClefKeyTimeGroupBuilder};
pub use dispatch::{DispatchPolicy, PartEvent, StaffKindSet};
pub use elements::*;
pub use errors::{MsrError, MsrResult};
pub use part::{
    Part, PartCounter, StaffId, VoiceRef, MEASURE_WHOLE_NOTES_FALLBACK,
    PART_FIGURED_BASS_STAFF_NUMBER, PART_FIGURED_BASS_VOICE_NUMBER, PART_HARMONIES_STAFF_NUMBER,
    PART_HARMONIES_VOICE_NUMBER,
};
pub use score::{InstrumentNamesMaxLengths, PartGroup, Score};
pub use settings::MsrSettings;
pub use slices::{MeasureSummary, MeasuresSlice, MeasuresSlicesSequence, SliceNote};
pub use staff::{Staff, StaffContext, VoiceId};
pub use types::{
    InputLine, Length, LengthUnit, MeasureImplicitKind, Rational, SoloNoteOrRest, StaffKind,
    VoiceKind, WholeNotes,
};
pub use voice::{
    Measure, Voice, VoiceEvent, VOICE_FIGURED_BASS_VOICE_BASE_NUMBER,
    VOICE_HARMONIES_VOICE_BASE_NUMBER,
};
