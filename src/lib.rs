//! Score MSR
//!
//! The part/staff/voice registration and structural-assembly engine of a
//! music score representation, sitting between a MusicXML reader and a
//! typesetter backend.
//!
//! The library installs no logger; it reports through the `log` facade and
//! leaves the backend to the embedding application.

pub mod msr;
pub mod utils;

// Re-export commonly used types
pub use msr::{
    MeasuresSlicesSequence, MsrError, MsrResult, MsrSettings, Part, PartGroup, Score, Staff,
    StaffKind, Voice, VoiceKind, WholeNotes,
};
