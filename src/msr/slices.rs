//! Measures slices
//!
//! A measures slice gathers, for one measure number, what every voice of a
//! staff (or every staff of a part) contains in that measure. Voices produce
//! one sequence each; staves merge their voices' sequences and parts merge
//! their staves' sequences, slice by slice.
//!
//! The merged slices are where cross-voice checks happen, such as finding
//! the notes and rests that sound alone at their position.

use serde::{Deserialize, Serialize};

use super::elements::NoteKind;
use super::errors::{MsrError, MsrResult};
use super::types::{InputLine, SoloNoteOrRest, WholeNotes};

/// A note or rest as seen from a slice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliceNote {
    pub text: String,
    pub kind: NoteKind,
    pub position_in_measure: WholeNotes,
    pub sounding_whole_notes: WholeNotes,
    #[serde(default)]
    pub solo: SoloNoteOrRest,
}

impl SliceNote {
    pub fn end_position(&self) -> WholeNotes {
        self.position_in_measure + self.sounding_whole_notes
    }
}

/// The contents of one voice in one measure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureSummary {
    pub voice_name: String,
    pub whole_notes: WholeNotes,
    pub notes: Vec<SliceNote>,
}

// ============================================================================
// SLICE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasuresSlice {
    pub measure_number: String,
    pub purist_measure_number: i32,
    pub summaries: Vec<MeasureSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NoteEventKind {
    // stops sort before starts at the same position
    Stop,
    Start,
}

#[derive(Clone, Copy, Debug)]
struct NoteEvent {
    position: WholeNotes,
    kind: NoteEventKind,
    /// (summary index, note index)
    note: (usize, usize),
}

impl MeasuresSlice {
    pub fn new(measure_number: &str, purist_measure_number: i32) -> Self {
        Self {
            measure_number: measure_number.to_string(),
            purist_measure_number,
            summaries: Vec::new(),
        }
    }

    pub fn append_summary(&mut self, summary: MeasureSummary) {
        self.summaries.push(summary);
    }

    /// Append the measure summaries of `other`, which must be a slice for
    /// the same measure
    pub fn append_slice_measures_from(
        &mut self,
        input_line: InputLine,
        other: &MeasuresSlice,
    ) -> MsrResult<()> {
        if other.measure_number != self.measure_number {
            return Err(MsrError::SliceMeasureNumberMismatch {
                measure: self.measure_number.clone(),
                other_measure: other.measure_number.clone(),
                line: input_line,
            });
        }

        self.summaries.extend(other.summaries.iter().cloned());
        Ok(())
    }

    /// Mark every sounding note as solo or not.
    ///
    /// A note is solo when it starts while nothing else sounds and stops
    /// before anything else starts. Skips are left alone.
    pub fn identify_solo_notes_and_rests(&mut self) {
        let mut events = Vec::new();

        for (summary_index, summary) in self.summaries.iter_mut().enumerate() {
            for (note_index, note) in summary.notes.iter_mut().enumerate() {
                if note.kind.is_skip() {
                    continue;
                }
                note.solo = SoloNoteOrRest::No;

                if note.sounding_whole_notes.is_zero() {
                    continue;
                }

                let id = (summary_index, note_index);
                events.push(NoteEvent {
                    position: note.position_in_measure,
                    kind: NoteEventKind::Start,
                    note: id,
                });
                events.push(NoteEvent {
                    position: note.end_position(),
                    kind: NoteEventKind::Stop,
                    note: id,
                });
            }
        }

        events.sort_by(|a, b| (a.position, a.kind).cmp(&(b.position, b.kind)));

        let mut sounding = 0usize;
        let mut candidate: Option<(usize, usize)> = None;
        let mut solos = Vec::new();

        for event in &events {
            match event.kind {
                NoteEventKind::Start => {
                    sounding += 1;
                    candidate = if sounding == 1 { Some(event.note) } else { None };
                }
                NoteEventKind::Stop => {
                    if candidate == Some(event.note) {
                        solos.push(event.note);
                        candidate = None;
                    }
                    sounding = sounding.saturating_sub(1);
                }
            }
        }

        for (summary_index, note_index) in solos {
            self.summaries[summary_index].notes[note_index].solo = SoloNoteOrRest::Yes;
        }
    }
}

// ============================================================================
// SEQUENCE
// ============================================================================

/// Ordered measures slices, tagged with where they come from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasuresSlicesSequence {
    pub origin: String,
    pub slices: Vec<MeasuresSlice>,
}

impl MeasuresSlicesSequence {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            slices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn append_slice(&mut self, slice: MeasuresSlice) {
        self.slices.push(slice);
    }

    /// Merge two sequences slice by slice into a new one named `origin`.
    ///
    /// An empty side yields a copy of the other one.
    pub fn merge_with(
        &self,
        input_line: InputLine,
        origin: &str,
        other: &MeasuresSlicesSequence,
    ) -> MsrResult<MeasuresSlicesSequence> {
        if self.is_empty() || other.is_empty() {
            let source = if self.is_empty() { other } else { self };
            return Ok(MeasuresSlicesSequence {
                origin: origin.to_string(),
                slices: source.slices.clone(),
            });
        }

        if self.len() != other.len() {
            return Err(MsrError::SlicesSequenceSizeMismatch {
                origin: self.origin.clone(),
                size: self.len(),
                other_origin: other.origin.clone(),
                other_size: other.len(),
                line: input_line,
            });
        }

        let mut result = MeasuresSlicesSequence::new(origin);
        for (slice, other_slice) in self.slices.iter().zip(&other.slices) {
            let mut merged = slice.clone();
            merged.append_slice_measures_from(input_line, other_slice)?;
            result.append_slice(merged);
        }

        Ok(result)
    }

    pub fn identify_solo_notes_and_rests(&mut self) {
        for slice in &mut self.slices {
            slice.identify_solo_notes_and_rests();
        }
    }

    /// JSON dump for diagnostics
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(kind: NoteKind, position: (i64, i64), duration: (i64, i64)) -> SliceNote {
        SliceNote {
            text: "n".to_string(),
            kind,
            position_in_measure: WholeNotes::new(position.0, position.1),
            sounding_whole_notes: WholeNotes::new(duration.0, duration.1),
            solo: SoloNoteOrRest::Unknown,
        }
    }

    fn summary(voice_name: &str, notes: Vec<SliceNote>) -> MeasureSummary {
        MeasureSummary {
            voice_name: voice_name.to_string(),
            whole_notes: WholeNotes::from_integer(1),
            notes,
        }
    }

    fn sequence(origin: &str, measure_numbers: &[&str]) -> MeasuresSlicesSequence {
        let mut result = MeasuresSlicesSequence::new(origin);
        for (index, number) in measure_numbers.iter().enumerate() {
            let mut slice = MeasuresSlice::new(number, index as i32 + 1);
            slice.append_summary(summary(origin, Vec::new()));
            result.append_slice(slice);
        }
        result
    }

    #[test]
    fn test_merge_with_empty_copies_other() {
        let empty = MeasuresSlicesSequence::new("empty");
        let other = sequence("v1", &["1", "2"]);

        let merged = empty.merge_with(1, "staff", &other).unwrap();
        assert_eq!(merged.origin, "staff");
        assert_eq!(merged.slices, other.slices);

        let merged = other.merge_with(1, "staff", &empty).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_concatenates_summaries() {
        let merged = sequence("v1", &["1", "2"])
            .merge_with(1, "staff", &sequence("v2", &["1", "2"]))
            .unwrap();

        assert_eq!(merged.len(), 2);
        let names: Vec<&str> = merged.slices[1]
            .summaries
            .iter()
            .map(|s| s.voice_name.as_str())
            .collect();
        assert_eq!(names, vec!["v1", "v2"]);
    }

    #[test]
    fn test_merge_size_mismatch() {
        let result = sequence("v1", &["1", "2"]).merge_with(7, "staff", &sequence("v2", &["1"]));
        assert!(matches!(
            result,
            Err(MsrError::SlicesSequenceSizeMismatch { size: 2, other_size: 1, line: 7, .. })
        ));
    }

    #[test]
    fn test_merge_measure_number_mismatch() {
        let result = sequence("v1", &["1", "2"]).merge_with(7, "staff", &sequence("v2", &["1", "3"]));
        assert!(matches!(result, Err(MsrError::SliceMeasureNumberMismatch { .. })));
    }

    #[test]
    fn test_solo_notes() {
        let mut slice = MeasuresSlice::new("1", 1);
        // v1: half note then half note; v2: skip, then quarter rest at 3/4
        slice.append_summary(summary(
            "v1",
            vec![
                note(NoteKind::Regular, (0, 1), (1, 2)),
                note(NoteKind::Regular, (1, 2), (1, 2)),
            ],
        ));
        slice.append_summary(summary(
            "v2",
            vec![
                note(NoteKind::Skip, (0, 1), (3, 4)),
                note(NoteKind::Rest, (3, 4), (1, 4)),
            ],
        ));

        slice.identify_solo_notes_and_rests();

        assert_eq!(slice.summaries[0].notes[0].solo, SoloNoteOrRest::Yes);
        assert_eq!(slice.summaries[0].notes[1].solo, SoloNoteOrRest::No);
        assert_eq!(slice.summaries[1].notes[0].solo, SoloNoteOrRest::Unknown);
        assert_eq!(slice.summaries[1].notes[1].solo, SoloNoteOrRest::No);
    }

    #[test]
    fn test_adjacent_notes_are_both_solo() {
        let mut slice = MeasuresSlice::new("1", 1);
        slice.append_summary(summary("v1", vec![note(NoteKind::Regular, (0, 1), (1, 2))]));
        slice.append_summary(summary("v2", vec![note(NoteKind::Rest, (1, 2), (1, 2))]));

        slice.identify_solo_notes_and_rests();

        assert_eq!(slice.summaries[0].notes[0].solo, SoloNoteOrRest::Yes);
        assert_eq!(slice.summaries[1].notes[0].solo, SoloNoteOrRest::Yes);
    }

    #[test]
    fn test_to_json_contains_origin() {
        let json = sequence("Part_POne", &["1"]).to_json().unwrap();
        assert!(json.contains("\"origin\": \"Part_POne\""));
    }
}
