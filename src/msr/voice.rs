//! Voices
//!
//! A voice is the atomic performer of notes. Staves and parts only talk to
//! it through the operations below: structural elements are recorded in
//! order as [`VoiceEvent`]s, notes accumulate into the voice's measures, and
//! finalizing the voice turns its measures into a [`MeasuresSlicesSequence`].

use serde::{Deserialize, Serialize};

use super::clef_key_time::ClefKeyTimeGroup;
use super::elements::{
    AccordionRegistration, BarLine, FiguredBassElement, HarpPedalsTuning, Harmony, LineBreak,
    MultipleMeasureRest, NoteContent, PageBreak, RehearsalMark, RepeatClone, RepeatEndingKind,
    Scordatura, StaffDetails, Tempo, TimeSignature, Transposition,
};
use super::errors::{MsrError, MsrResult};
use super::slices::{MeasureSummary, MeasuresSlice, MeasuresSlicesSequence, SliceNote};
use super::types::{InputLine, MeasureImplicitKind, SoloNoteOrRest, VoiceKind, WholeNotes};

/// Harmonies voices are numbered from this base plus their regular voice number
pub const VOICE_HARMONIES_VOICE_BASE_NUMBER: i32 = 20;

/// Figured bass voices are numbered from this base plus their regular voice number
pub const VOICE_FIGURED_BASS_VOICE_BASE_NUMBER: i32 = 40;

// ============================================================================
// EVENTS
// ============================================================================

/// Everything a voice has been told, in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VoiceEvent {
    ClefKeyTimeGroup(ClefKeyTimeGroup),
    Tempo(Tempo),
    RehearsalMark(RehearsalMark),
    LineBreak(LineBreak),
    PageBreak(PageBreak),
    BarLine(BarLine),
    Transposition(Transposition),
    StaffDetails(StaffDetails),
    Scordatura(Scordatura),
    AccordionRegistration(AccordionRegistration),
    HarpPedalsTuning(HarpPedalsTuning),

    MeasureCreated {
        measure_number: String,
        ordinal_number: usize,
        implicit_kind: MeasureImplicitKind,
    },
    NextMeasureNumber(String),
    LastMeasureFinalized(String),
    HiddenMeasureAndBarLine {
        measure_number: String,
        position_in_measure: WholeNotes,
    },

    RepeatStart,
    RepeatEnd {
        measure_number: String,
        times: u32,
    },
    RepeatEndingStart,
    RepeatEndingEnd {
        ending_number: String,
        ending_kind: RepeatEndingKind,
    },
    RepeatClone(RepeatClone),

    MultipleMeasureRest(MultipleMeasureRest),
    PendingMultipleMeasureRests(MultipleMeasureRest),
    MultipleMeasureRestClone(MultipleMeasureRest),
    EmptyMeasures {
        previous_measure_number: String,
        count: u32,
    },
    LastMeasureReplicated {
        times: u32,
    },

    Harmony(Harmony),
    FiguredBass(FiguredBassElement),

    Finalized,
}

// ============================================================================
// MEASURES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub number: String,
    /// 1-based position of the measure in its voice
    pub ordinal_number: usize,
    /// Bar number as printed: an implicit first measure is number 0
    pub purist_number: i32,
    pub implicit_kind: MeasureImplicitKind,
    /// Accumulated duration of the measure contents
    pub whole_notes: WholeNotes,
    /// Duration of a full measure, when the time signature is known
    pub full_whole_notes: Option<WholeNotes>,
    pub notes: Vec<SliceNote>,
    pub finalized: bool,
}

impl Measure {
    fn append_note(&mut self, note: &NoteContent) {
        self.notes.push(SliceNote {
            text: note.text.clone(),
            kind: note.kind,
            position_in_measure: self.whole_notes,
            sounding_whole_notes: note.sounding_whole_notes,
            solo: SoloNoteOrRest::Unknown,
        });
        self.whole_notes += note.sounding_whole_notes;
    }

    fn summary(&self, voice_name: &str) -> MeasureSummary {
        MeasureSummary {
            voice_name: voice_name.to_string(),
            whole_notes: self.whole_notes,
            notes: self.notes.clone(),
        }
    }
}

/// Harmonies and figured bass voices created for a regular voice carry its
/// number plus their base number; other voices are their own regular voice
pub fn regular_voice_number(kind: VoiceKind, number: i32) -> i32 {
    match kind {
        VoiceKind::Harmonies if number > VOICE_HARMONIES_VOICE_BASE_NUMBER => {
            number - VOICE_HARMONIES_VOICE_BASE_NUMBER
        }
        VoiceKind::FiguredBass if number > VOICE_FIGURED_BASS_VOICE_BASE_NUMBER => {
            number - VOICE_FIGURED_BASS_VOICE_BASE_NUMBER
        }
        _ => number,
    }
}

/// Number of the measure following `measure_number`, when it is numeric
fn following_measure_number(measure_number: &str, offset: u32) -> String {
    if offset == 0 {
        return measure_number.to_string();
    }
    match measure_number.parse::<i64>() {
        Ok(value) => (value + offset as i64).to_string(),
        Err(_) => format!("{}_{}", measure_number, offset),
    }
}

// ============================================================================
// VOICE
// ============================================================================

#[derive(Clone, Debug)]
pub struct Voice {
    number: i32,
    kind: VoiceKind,
    name: String,
    staff_number: i32,
    /// 1-based rank among the regular voices of the staff
    staff_sequential_number: Option<usize>,

    events: Vec<VoiceEvent>,
    measures: Vec<Measure>,
    current_measure_number: String,
    next_measure_number: Option<String>,
    current_time: Option<TimeSignature>,

    repeat_depth: usize,
    pending_multiple_measure_rest: Option<MultipleMeasureRest>,
    multiple_measure_rests_count: usize,

    finalized: bool,
    measures_slices_sequence: MeasuresSlicesSequence,
}

impl Voice {
    pub fn new(
        number: i32,
        kind: VoiceKind,
        name: &str,
        staff_number: i32,
        current_measure_number: &str,
    ) -> Self {
        log::trace!("creating {} voice \"{}\" in staff {}", kind, name, staff_number);

        Self {
            number,
            kind,
            name: name.to_string(),
            staff_number,
            staff_sequential_number: None,
            events: Vec::new(),
            measures: Vec::new(),
            current_measure_number: current_measure_number.to_string(),
            next_measure_number: None,
            current_time: None,
            repeat_depth: 0,
            pending_multiple_measure_rest: None,
            multiple_measure_rests_count: 0,
            finalized: false,
            measures_slices_sequence: MeasuresSlicesSequence::new(name),
        }
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn kind(&self) -> VoiceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn staff_number(&self) -> i32 {
        self.staff_number
    }

    pub fn staff_sequential_number(&self) -> Option<usize> {
        self.staff_sequential_number
    }

    pub(crate) fn set_staff_sequential_number(&mut self, number: usize) {
        self.staff_sequential_number = Some(number);
    }

    /// Number of the regular voice a harmonies or figured bass voice belongs to
    pub fn regular_voice_number(&self) -> i32 {
        regular_voice_number(self.kind, self.number)
    }

    /// Key placing harmonies voices right above and figured bass voices
    /// right below their regular voice
    pub(crate) fn layering_key(&self) -> (i32, u8) {
        let rank = match self.kind {
            VoiceKind::Harmonies => 0,
            VoiceKind::Regular | VoiceKind::Dynamics => 1,
            VoiceKind::FiguredBass => 2,
        };
        (self.regular_voice_number(), rank)
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    pub fn events(&self) -> &[VoiceEvent] {
        &self.events
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn last_measure(&self) -> Option<&Measure> {
        self.measures.last()
    }

    pub fn current_measure_number(&self) -> &str {
        &self.current_measure_number
    }

    pub fn next_measure_number(&self) -> Option<&str> {
        self.next_measure_number.as_deref()
    }

    pub fn current_time(&self) -> Option<&TimeSignature> {
        self.current_time.as_ref()
    }

    pub fn repeat_depth(&self) -> usize {
        self.repeat_depth
    }

    pub fn multiple_measure_rests_count(&self) -> usize {
        self.multiple_measure_rests_count
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn measures_slices_sequence(&self) -> &MeasuresSlicesSequence {
        &self.measures_slices_sequence
    }

    // ------------------------------------------------------------------------
    // Structural elements
    // ------------------------------------------------------------------------

    pub fn append_clef_key_time_group(&mut self, group: &ClefKeyTimeGroup) {
        if let Some(time) = &group.time {
            if time.measure_whole_notes().is_none() {
                log::warn!(
                    "voice \"{}\": time {} has no usable measure duration, line {}",
                    self.name,
                    time,
                    group.input_line
                );
            }
            self.current_time = Some(time.clone());
        }
        self.events.push(VoiceEvent::ClefKeyTimeGroup(group.clone()));
    }

    pub fn append_tempo(&mut self, tempo: &Tempo) {
        self.events.push(VoiceEvent::Tempo(tempo.clone()));
    }

    pub fn append_rehearsal_mark(&mut self, mark: &RehearsalMark) {
        self.events.push(VoiceEvent::RehearsalMark(mark.clone()));
    }

    pub fn append_line_break(&mut self, line_break: &LineBreak) {
        self.events.push(VoiceEvent::LineBreak(line_break.clone()));
    }

    pub fn append_page_break(&mut self, page_break: &PageBreak) {
        self.events.push(VoiceEvent::PageBreak(page_break.clone()));
    }

    pub fn append_bar_line(&mut self, bar_line: &BarLine) {
        self.events.push(VoiceEvent::BarLine(bar_line.clone()));
    }

    pub fn append_transposition(&mut self, transposition: &Transposition) {
        self.events.push(VoiceEvent::Transposition(transposition.clone()));
    }

    pub fn append_staff_details(&mut self, details: &StaffDetails) {
        self.events.push(VoiceEvent::StaffDetails(details.clone()));
    }

    pub fn append_scordatura(&mut self, scordatura: &Scordatura) {
        self.events.push(VoiceEvent::Scordatura(scordatura.clone()));
    }

    pub fn append_accordion_registration(&mut self, registration: &AccordionRegistration) {
        self.events
            .push(VoiceEvent::AccordionRegistration(registration.clone()));
    }

    pub fn append_harp_pedals_tuning(&mut self, tuning: &HarpPedalsTuning) {
        self.events.push(VoiceEvent::HarpPedalsTuning(tuning.clone()));
    }

    // ------------------------------------------------------------------------
    // Measures
    // ------------------------------------------------------------------------

    /// Create a measure and append it, finalizing the previous one
    pub fn create_measure_and_append(
        &mut self,
        input_line: InputLine,
        measure_number: &str,
        implicit_kind: MeasureImplicitKind,
    ) {
        self.finalize_last_measure_silently();

        let purist_number = match self.measures.last() {
            None if implicit_kind == MeasureImplicitKind::Yes => 0,
            None => 1,
            // a measure split by a repeat keeps its bar number
            Some(previous) if implicit_kind == MeasureImplicitKind::Yes => previous.purist_number,
            Some(previous) => previous.purist_number + 1,
        };
        let ordinal_number = self.measures.len() + 1;

        log::trace!(
            "voice \"{}\": creating measure '{}' (ordinal {}), line {}",
            self.name,
            measure_number,
            ordinal_number,
            input_line
        );

        self.measures.push(Measure {
            number: measure_number.to_string(),
            ordinal_number,
            purist_number,
            implicit_kind,
            whole_notes: WholeNotes::zero(),
            full_whole_notes: self.full_measure_whole_notes(),
            notes: Vec::new(),
            finalized: false,
        });
        self.current_measure_number = measure_number.to_string();
        self.next_measure_number = None;

        self.events.push(VoiceEvent::MeasureCreated {
            measure_number: measure_number.to_string(),
            ordinal_number,
            implicit_kind,
        });
    }

    /// Duration of a full measure, unknown without a usable time signature
    fn full_measure_whole_notes(&self) -> Option<WholeNotes> {
        self.current_time.as_ref().and_then(|t| t.measure_whole_notes())
    }

    pub fn set_next_measure_number(&mut self, next_measure_number: &str) {
        self.next_measure_number = Some(next_measure_number.to_string());
        self.events
            .push(VoiceEvent::NextMeasureNumber(next_measure_number.to_string()));
    }

    pub fn finalize_last_appended_measure(&mut self, input_line: InputLine) {
        if let Some(number) = self.finalize_last_measure_silently() {
            log::trace!(
                "voice \"{}\": finalized measure '{}', line {}",
                self.name,
                number,
                input_line
            );
            self.events.push(VoiceEvent::LastMeasureFinalized(number));
        }
    }

    /// Returns the number of the measure that got finalized, if any
    fn finalize_last_measure_silently(&mut self) -> Option<String> {
        match self.measures.last_mut() {
            Some(measure) if !measure.finalized => {
                measure.finalized = true;
                Some(measure.number.clone())
            }
            _ => None,
        }
    }

    /// Append a note or rest to the current measure, creating one if needed
    pub fn append_note(&mut self, input_line: InputLine, note: &NoteContent) -> MsrResult<()> {
        self.check_not_finalized(input_line)?;
        self.current_open_measure(input_line).append_note(note);
        Ok(())
    }

    pub fn append_harmony(&mut self, input_line: InputLine, harmony: &Harmony) -> MsrResult<()> {
        self.check_not_finalized(input_line)?;
        self.current_open_measure(input_line).whole_notes += harmony.whole_notes;
        self.events.push(VoiceEvent::Harmony(harmony.clone()));
        Ok(())
    }

    pub fn append_figured_bass(
        &mut self,
        input_line: InputLine,
        figured_bass: &FiguredBassElement,
    ) -> MsrResult<()> {
        self.check_not_finalized(input_line)?;
        self.current_open_measure(input_line).whole_notes += figured_bass.whole_notes;
        self.events.push(VoiceEvent::FiguredBass(figured_bass.clone()));
        Ok(())
    }

    fn current_open_measure(&mut self, input_line: InputLine) -> &mut Measure {
        let needs_measure = self.measures.last().map_or(true, |m| m.finalized);
        if needs_measure {
            let number = self.current_measure_number.clone();
            self.create_measure_and_append(input_line, &number, MeasureImplicitKind::No);
        }

        let index = self.measures.len() - 1;
        &mut self.measures[index]
    }

    pub fn insert_hidden_measure_and_bar_line(&mut self, position_in_measure: WholeNotes) {
        self.events.push(VoiceEvent::HiddenMeasureAndBarLine {
            measure_number: self.current_measure_number.clone(),
            position_in_measure,
        });
    }

    // ------------------------------------------------------------------------
    // Repeats
    // ------------------------------------------------------------------------

    pub fn handle_repeat_start(&mut self) {
        self.repeat_depth += 1;
        self.events.push(VoiceEvent::RepeatStart);
    }

    pub fn handle_repeat_end(&mut self, measure_number: &str, times: u32) {
        self.repeat_depth = self.repeat_depth.saturating_sub(1);
        self.events.push(VoiceEvent::RepeatEnd {
            measure_number: measure_number.to_string(),
            times,
        });
    }

    pub fn handle_repeat_ending_start(&mut self) {
        self.events.push(VoiceEvent::RepeatEndingStart);
    }

    pub fn handle_repeat_ending_end(&mut self, ending_number: &str, ending_kind: RepeatEndingKind) {
        self.events.push(VoiceEvent::RepeatEndingEnd {
            ending_number: ending_number.to_string(),
            ending_kind,
        });
    }

    pub fn append_repeat_clone(&mut self, repeat_clone: &RepeatClone) {
        self.events.push(VoiceEvent::RepeatClone(repeat_clone.clone()));
    }

    // ------------------------------------------------------------------------
    // Multiple measure rests and empty measures
    // ------------------------------------------------------------------------

    /// Record a multiple measure rest; its measures are appended when the
    /// pending rests are flushed
    pub fn append_multiple_measure_rest(&mut self, rest: &MultipleMeasureRest) {
        self.pending_multiple_measure_rest = Some(rest.clone());
        self.events.push(VoiceEvent::MultipleMeasureRest(rest.clone()));
    }

    /// Append the measures of the pending multiple measure rest, numbered
    /// from its first measure number, each holding a full measure rest when
    /// the time signature is known
    pub fn append_pending_multiple_measure_rests(&mut self, input_line: InputLine) {
        let Some(rest) = self.pending_multiple_measure_rest.take() else {
            return;
        };

        log::trace!(
            "voice \"{}\": appending {} rest measures from '{}', line {}",
            self.name,
            rest.measures_number,
            rest.first_measure_number,
            input_line
        );

        for offset in 0..rest.measures_number {
            let number = following_measure_number(&rest.first_measure_number, offset);
            self.create_measure_and_append(input_line, &number, MeasureImplicitKind::No);

            if let Some(full) = self.full_measure_whole_notes() {
                let index = self.measures.len() - 1;
                self.measures[index].append_note(&NoteContent::rest(full));
            }
        }

        self.multiple_measure_rests_count += 1;
        self.events.push(VoiceEvent::PendingMultipleMeasureRests(rest));
    }

    pub fn append_multiple_measure_rest_clone(&mut self, rest: &MultipleMeasureRest) {
        self.multiple_measure_rests_count += 1;
        self.events
            .push(VoiceEvent::MultipleMeasureRestClone(rest.clone()));
    }

    /// Append `count` measures after `previous_measure_number`, each holding
    /// a skip as long as a full measure when the time signature is known
    pub fn append_empty_measures(
        &mut self,
        input_line: InputLine,
        previous_measure_number: &str,
        count: u32,
    ) {
        for offset in 1..=count {
            let number = following_measure_number(previous_measure_number, offset);
            self.create_measure_and_append(input_line, &number, MeasureImplicitKind::No);

            if let Some(full) = self.full_measure_whole_notes() {
                let index = self.measures.len() - 1;
                self.measures[index].append_note(&NoteContent::skip(full));
            }
        }

        self.events.push(VoiceEvent::EmptyMeasures {
            previous_measure_number: previous_measure_number.to_string(),
            count,
        });
    }

    /// Append `times` copies of the last measure, numbered after it
    pub fn replicate_last_appended_measure(&mut self, input_line: InputLine, times: u32) {
        let Some(last) = self.measures.last().cloned() else {
            log::warn!(
                "voice \"{}\" has no measure to replicate, line {}",
                self.name,
                input_line
            );
            return;
        };

        for offset in 1..=times {
            let number = following_measure_number(&last.number, offset);
            self.create_measure_and_append(input_line, &number, last.implicit_kind);

            let index = self.measures.len() - 1;
            let measure = &mut self.measures[index];
            measure.notes = last.notes.clone();
            measure.whole_notes = last.whole_notes;
        }

        self.events.push(VoiceEvent::LastMeasureReplicated { times });
    }

    // ------------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------------

    fn check_not_finalized(&self, input_line: InputLine) -> MsrResult<()> {
        if self.finalized {
            return Err(MsrError::AlreadyFinalized {
                what: format!("voice \"{}\"", self.name),
                line: input_line,
            });
        }
        Ok(())
    }

    /// Finalize the voice and all its measures, then build its slices
    pub fn finalize(&mut self, input_line: InputLine) -> MsrResult<()> {
        self.check_not_finalized(input_line)?;

        self.append_pending_multiple_measure_rests(input_line);
        for measure in &mut self.measures {
            measure.finalized = true;
        }

        let mut sequence = MeasuresSlicesSequence::new(&self.name);
        for measure in &self.measures {
            let mut slice = MeasuresSlice::new(&measure.number, measure.purist_number);
            slice.append_summary(measure.summary(&self.name));
            sequence.append_slice(slice);
        }
        self.measures_slices_sequence = sequence;

        self.finalized = true;
        self.events.push(VoiceEvent::Finalized);

        log::debug!(
            "finalized voice \"{}\" with {} measures, line {}",
            self.name,
            self.measures.len(),
            input_line
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::elements::NoteKind;

    fn regular_voice() -> Voice {
        Voice::new(1, VoiceKind::Regular, "Part_POne_Staff_One_Voice_One", 1, "1")
    }

    fn quarter(text: &str) -> NoteContent {
        NoteContent::new(NoteKind::Regular, WholeNotes::new(1, 4), text)
    }

    #[test]
    fn test_layering_key() {
        let harmonies = Voice::new(21, VoiceKind::Harmonies, "h", 1, "1");
        let figured_bass = Voice::new(41, VoiceKind::FiguredBass, "fb", 1, "1");

        assert_eq!(harmonies.layering_key(), (1, 0));
        assert_eq!(regular_voice().layering_key(), (1, 1));
        assert_eq!(figured_bass.layering_key(), (1, 2));
    }

    #[test]
    fn test_notes_accumulate_positions() {
        let mut voice = regular_voice();
        voice.append_note(10, &quarter("c")).unwrap();
        voice.append_note(11, &quarter("d")).unwrap();

        let measure = voice.last_measure().unwrap();
        assert_eq!(measure.number, "1");
        assert_eq!(measure.whole_notes, WholeNotes::new(1, 2));
        assert_eq!(measure.notes[1].position_in_measure, WholeNotes::new(1, 4));
    }

    #[test]
    fn test_implicit_first_measure_is_number_zero() {
        let mut voice = regular_voice();
        voice.create_measure_and_append(1, "0", MeasureImplicitKind::Yes);
        voice.create_measure_and_append(2, "1", MeasureImplicitKind::No);
        voice.create_measure_and_append(3, "2", MeasureImplicitKind::No);

        let purist: Vec<i32> = voice.measures().iter().map(|m| m.purist_number).collect();
        assert_eq!(purist, vec![0, 1, 2]);
        assert!(voice.measures()[0].finalized);
        assert!(!voice.measures()[2].finalized);
    }

    #[test]
    fn test_empty_measures_hold_full_skips() {
        let mut voice = regular_voice();
        let mut group = ClefKeyTimeGroup::new(1, 1);
        group.time = Some(TimeSignature::new(3, 4));
        voice.append_clef_key_time_group(&group);

        voice.append_empty_measures(5, "4", 2);

        let numbers: Vec<&str> = voice.measures().iter().map(|m| m.number.as_str()).collect();
        assert_eq!(numbers, vec!["5", "6"]);
        assert_eq!(voice.measures()[0].whole_notes, WholeNotes::new(3, 4));
        assert!(voice.measures()[0].notes[0].kind.is_skip());
    }

    #[test]
    fn test_time_with_zero_beat_type_leaves_measures_unsized() {
        let mut voice = regular_voice();
        let mut group = ClefKeyTimeGroup::new(1, 1);
        group.time = Some(TimeSignature::new(3, 0));
        voice.append_clef_key_time_group(&group);

        voice.create_measure_and_append(2, "1", MeasureImplicitKind::No);
        voice.append_empty_measures(3, "1", 1);

        assert_eq!(voice.measures()[0].full_whole_notes, None);
        assert!(voice.measures()[1].notes.is_empty());
        assert!(voice.measures()[1].whole_notes.is_zero());
    }

    #[test]
    fn test_repeat_depth() {
        let mut voice = regular_voice();
        voice.handle_repeat_start();
        voice.handle_repeat_start();
        voice.handle_repeat_end("4", 2);
        assert_eq!(voice.repeat_depth(), 1);
        voice.handle_repeat_end("8", 2);
        voice.handle_repeat_end("9", 2);
        assert_eq!(voice.repeat_depth(), 0);
    }

    #[test]
    fn test_pending_multiple_measure_rests() {
        let mut voice = regular_voice();
        let rest = MultipleMeasureRest {
            measures_number: 4,
            first_measure_number: "3".to_string(),
        };
        voice.append_multiple_measure_rest(&rest);
        assert_eq!(voice.multiple_measure_rests_count(), 0);
        assert!(voice.measures().is_empty());

        voice.append_pending_multiple_measure_rests(5);
        voice.append_pending_multiple_measure_rests(6);
        assert_eq!(voice.multiple_measure_rests_count(), 1);

        // no time signature: the measures are there, but empty
        let numbers: Vec<&str> = voice.measures().iter().map(|m| m.number.as_str()).collect();
        assert_eq!(numbers, vec!["3", "4", "5", "6"]);
        assert!(voice.measures().iter().all(|m| m.notes.is_empty()));
    }

    #[test]
    fn test_multiple_measure_rest_measures_hold_full_rests() {
        let mut voice = regular_voice();
        let mut group = ClefKeyTimeGroup::new(1, 1);
        group.time = Some(TimeSignature::new(4, 4));
        voice.append_clef_key_time_group(&group);
        voice.create_measure_and_append(2, "1", MeasureImplicitKind::No);

        voice.append_multiple_measure_rest(&MultipleMeasureRest {
            measures_number: 3,
            first_measure_number: "2".to_string(),
        });
        voice.append_pending_multiple_measure_rests(3);

        let numbers: Vec<&str> = voice.measures().iter().map(|m| m.number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3", "4"]);
        for measure in &voice.measures()[1..] {
            assert_eq!(measure.whole_notes, WholeNotes::from_integer(1));
            assert_eq!(measure.notes.len(), 1);
            assert_eq!(measure.notes[0].kind, NoteKind::Rest);
        }

        voice.finalize(4).unwrap();
        assert_eq!(voice.measures_slices_sequence().len(), 4);
    }

    #[test]
    fn test_pending_rest_is_flushed_at_finalize() {
        let mut voice = regular_voice();
        voice.append_multiple_measure_rest(&MultipleMeasureRest {
            measures_number: 2,
            first_measure_number: "7".to_string(),
        });

        voice.finalize(9).unwrap();
        assert_eq!(voice.multiple_measure_rests_count(), 1);
        assert_eq!(voice.measures_slices_sequence().len(), 2);
    }

    #[test]
    fn test_replicate_last_measure() {
        let mut voice = regular_voice();
        voice.create_measure_and_append(1, "1", MeasureImplicitKind::No);
        voice.append_note(2, &quarter("e")).unwrap();
        voice.replicate_last_appended_measure(3, 2);

        assert_eq!(voice.measures().len(), 3);
        assert_eq!(voice.measures()[2].number, "3");
        assert_eq!(voice.measures()[2].notes.len(), 1);
    }

    #[test]
    fn test_finalize_builds_slices_once() {
        let mut voice = regular_voice();
        voice.create_measure_and_append(1, "1", MeasureImplicitKind::No);
        voice.append_note(2, &quarter("c")).unwrap();
        voice.create_measure_and_append(3, "2", MeasureImplicitKind::No);

        voice.finalize(10).unwrap();
        let sequence = voice.measures_slices_sequence();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.slices[0].summaries[0].notes.len(), 1);

        assert!(matches!(
            voice.finalize(11),
            Err(MsrError::AlreadyFinalized { line: 11, .. })
        ));
        assert!(voice.append_note(12, &quarter("d")).is_err());
    }
}
