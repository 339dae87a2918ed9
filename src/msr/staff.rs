//! Staves
//!
//! A staff owns its voices and is the only registry of record for them:
//!
//! - `voices` is the arena, addressed by [`VoiceId`]
//! - `all_voices` gives the dispatch order, with harmonies voices right
//!   above and figured bass voices right below their regular voice
//! - `regular_voices` and the number maps serve lookups
//!
//! Structural events reaching the staff are fanned out to every voice in
//! `all_voices` order. Clefs, keys and time signatures sharing a group input
//! line are batched into one [`ClefKeyTimeGroup`] per notational point.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::clef_key_time::{ClefKeyTimeGroup, ClefKeyTimeGroupBuilder};
use super::elements::{
    AccordionRegistration, BarLine, Clef, FiguredBassElement, HarpPedalsTuning, Harmony, Key,
    LineBreak, MultipleMeasureRest, NoteContent, PageBreak, RehearsalMark, RepeatClone,
    RepeatEndingKind, Scordatura, StaffDetails, Tempo, TimeSignature, Transposition,
};
use super::errors::{MsrError, MsrResult};
use super::settings::MsrSettings;
use super::slices::MeasuresSlicesSequence;
use super::types::{InputLine, MeasureImplicitKind, StaffKind, VoiceKind, WholeNotes};
use super::voice::{regular_voice_number, Voice};
use crate::utils::english_words::int_to_english_word;

/// Index of a voice in its staff's arena
pub type VoiceId = usize;

/// What a new staff inherits from its part
#[derive(Clone, Copy, Debug)]
pub struct StaffContext<'a> {
    pub part_msr_name: &'a str,
    pub clef: Option<&'a Clef>,
    pub key: Option<&'a Key>,
    pub transposition: Option<&'a Transposition>,
    pub staff_details: Option<&'a StaffDetails>,
    pub instrument_name: &'a str,
    pub instrument_abbreviation: &'a str,
}

/// Name of a staff, derived from its part's MSR name
pub fn staff_name(part_msr_name: &str, kind: StaffKind, number: i32) -> String {
    let word = int_to_english_word(number as i64);

    match kind {
        StaffKind::Regular => format!("{}_Staff_{}", part_msr_name, word),
        StaffKind::Tablature => format!("{}_Tablature_{}", part_msr_name, word),
        StaffKind::Harmonies => format!("{}_HARMONIES_Staff", part_msr_name),
        StaffKind::FiguredBass => format!("{}_FIGURED_BASS_Staff", part_msr_name),
        StaffKind::Drum => format!("{}_DRUM_Staff", part_msr_name),
        StaffKind::Rhythmic => format!("{}_RHYTHMIC_Staff", part_msr_name),
    }
}

/// Name of a voice, derived from its staff's name
pub fn voice_name(staff_name: &str, kind: VoiceKind, number: i32) -> String {
    let word = int_to_english_word(regular_voice_number(kind, number) as i64);

    match kind {
        VoiceKind::Regular => format!("{}_Voice_{}", staff_name, word),
        VoiceKind::Dynamics => format!("{}_Voice_{}_DYNAMICS", staff_name, word),
        VoiceKind::Harmonies => format!("{}_Voice_{}_HARMONIES", staff_name, word),
        VoiceKind::FiguredBass => format!("{}_Voice_{}_FIGURED_BASS", staff_name, word),
    }
}

#[derive(Clone, Debug)]
pub struct Staff {
    settings: Rc<MsrSettings>,

    number: i32,
    kind: StaffKind,
    name: String,
    part_msr_name: String,

    voices: Vec<Voice>,
    all_voices: Vec<VoiceId>,
    voice_numbers_to_all_voices: BTreeMap<i32, VoiceId>,
    regular_voices: Vec<VoiceId>,
    voice_numbers_to_regular_voices: BTreeMap<i32, VoiceId>,
    regular_voices_counter: usize,

    current_clef: Option<Clef>,
    current_key: Option<Key>,
    current_time: Option<TimeSignature>,
    current_transposition: Option<Transposition>,
    current_staff_details: Option<StaffDetails>,
    clef_key_time_builder: ClefKeyTimeGroupBuilder,

    contains_multiple_measure_rests: bool,

    instrument_name: String,
    instrument_abbreviation: String,

    finalized: bool,
    measures_slices_sequence: MeasuresSlicesSequence,
}

impl Staff {
    /// Create a staff, copying the current clef, key, transposition and
    /// staff details of its part
    pub fn new(
        settings: Rc<MsrSettings>,
        input_line: InputLine,
        number: i32,
        kind: StaffKind,
        context: &StaffContext<'_>,
    ) -> MsrResult<Self> {
        if kind == StaffKind::Regular && number < 0 {
            return Err(MsrError::InvalidStaffNumber {
                staff_number: number,
                line: input_line,
            });
        }

        let name = staff_name(context.part_msr_name, kind, number);
        log::debug!("creating {} staff \"{}\", line {}", kind, name, input_line);

        let mut staff = Self {
            settings,
            number,
            kind,
            measures_slices_sequence: MeasuresSlicesSequence::new(&name),
            name,
            part_msr_name: context.part_msr_name.to_string(),
            voices: Vec::new(),
            all_voices: Vec::new(),
            voice_numbers_to_all_voices: BTreeMap::new(),
            regular_voices: Vec::new(),
            voice_numbers_to_regular_voices: BTreeMap::new(),
            regular_voices_counter: 0,
            current_clef: context.clef.cloned(),
            current_key: context.key.cloned(),
            current_time: None,
            current_transposition: context.transposition.cloned(),
            current_staff_details: None,
            clef_key_time_builder: ClefKeyTimeGroupBuilder::new(),
            contains_multiple_measure_rests: false,
            instrument_name: context.instrument_name.to_string(),
            instrument_abbreviation: context.instrument_abbreviation.to_string(),
            finalized: false,
        };

        if let Some(details) = context.staff_details {
            staff.record_staff_details(details);
        }

        Ok(staff)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn kind(&self) -> StaffKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn part_msr_name(&self) -> &str {
        &self.part_msr_name
    }

    pub fn instrument_name(&self) -> &str {
        &self.instrument_name
    }

    pub fn instrument_abbreviation(&self) -> &str {
        &self.instrument_abbreviation
    }

    pub fn current_clef(&self) -> Option<&Clef> {
        self.current_clef.as_ref()
    }

    pub fn current_key(&self) -> Option<&Key> {
        self.current_key.as_ref()
    }

    pub fn current_time(&self) -> Option<&TimeSignature> {
        self.current_time.as_ref()
    }

    pub fn current_transposition(&self) -> Option<&Transposition> {
        self.current_transposition.as_ref()
    }

    pub fn current_staff_details(&self) -> Option<&StaffDetails> {
        self.current_staff_details.as_ref()
    }

    pub fn contains_multiple_measure_rests(&self) -> bool {
        self.contains_multiple_measure_rests
    }

    pub fn regular_voices_count(&self) -> usize {
        self.regular_voices_counter
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn measures_slices_sequence(&self) -> &MeasuresSlicesSequence {
        &self.measures_slices_sequence
    }

    pub fn voice(&self, id: VoiceId) -> &Voice {
        &self.voices[id]
    }

    /// All the voices, in dispatch order
    pub fn all_voices(&self) -> impl Iterator<Item = &Voice> {
        self.all_voices.iter().map(move |&id| &self.voices[id])
    }

    pub fn regular_voices(&self) -> impl Iterator<Item = &Voice> {
        self.regular_voices.iter().map(move |&id| &self.voices[id])
    }

    pub fn all_voice_names(&self) -> Vec<&str> {
        self.all_voices().map(|voice| voice.name()).collect()
    }

    pub fn fetch_voice_by_number(&self, voice_number: i32) -> Option<&Voice> {
        self.voice_numbers_to_all_voices
            .get(&voice_number)
            .map(|&id| &self.voices[id])
    }

    pub(crate) fn set_current_clef_and_key(&mut self, clef: Option<&Clef>, key: Option<&Key>) {
        self.current_clef = clef.cloned();
        self.current_key = key.cloned();
    }

    // ========================================================================
    // VOICE REGISTRATION
    // ========================================================================

    fn check_regular_voices_limit(&self, input_line: InputLine, voice_number: i32) -> MsrResult<()> {
        let max = self.settings.max_regular_voices_per_staff;
        if self.regular_voices_counter >= max {
            return Err(MsrError::RegularVoiceOverflow {
                staff: self.name.clone(),
                voice_number,
                max,
                line: input_line,
            });
        }
        Ok(())
    }

    pub(crate) fn create_regular_voice(
        &mut self,
        input_line: InputLine,
        voice_number: i32,
        current_measure_number: &str,
    ) -> MsrResult<VoiceId> {
        if self.voice_numbers_to_regular_voices.contains_key(&voice_number) {
            return Err(MsrError::DuplicateVoiceNumber {
                staff: self.name.clone(),
                voice_number,
                line: input_line,
            });
        }
        self.check_regular_voices_limit(input_line, voice_number)?;

        let voice = Voice::new(
            voice_number,
            VoiceKind::Regular,
            &voice_name(&self.name, VoiceKind::Regular, voice_number),
            self.number,
            current_measure_number,
        );

        self.register_voice_by_number(input_line, voice)
    }

    /// Register a voice created elsewhere. Dynamics voices are not tracked
    /// and yield `None`.
    pub(crate) fn register_voice(
        &mut self,
        input_line: InputLine,
        voice: Voice,
    ) -> MsrResult<Option<VoiceId>> {
        match voice.kind() {
            VoiceKind::Regular => {
                self.check_regular_voices_limit(input_line, voice.number())?;
                self.register_voice_by_number(input_line, voice).map(Some)
            }
            VoiceKind::Dynamics => {
                log::trace!(
                    "dynamics voice \"{}\" is not registered in staff \"{}\"",
                    voice.name(),
                    self.name
                );
                Ok(None)
            }
            // special voices don't count as regular ones
            VoiceKind::Harmonies | VoiceKind::FiguredBass => {
                self.register_voice_by_number(input_line, voice).map(Some)
            }
        }
    }

    fn register_voice_by_number(&mut self, input_line: InputLine, mut voice: Voice) -> MsrResult<VoiceId> {
        if self.settings.sanity_checks && self.all_voices().any(|v| v.name() == voice.name()) {
            return Err(MsrError::DuplicateVoiceIdentity {
                staff: self.name.clone(),
                voice: voice.name().to_string(),
                line: input_line,
            });
        }

        log::debug!(
            "registering {} voice \"{}\" as number {} in staff \"{}\", line {}",
            voice.kind(),
            voice.name(),
            voice.number(),
            self.name,
            input_line
        );

        let voice_number = voice.number();
        let kind = voice.kind();
        if kind == VoiceKind::Regular {
            self.regular_voices_counter += 1;
            voice.set_staff_sequential_number(self.regular_voices_counter);
        }

        let id = self.voices.len();
        self.voices.push(voice);
        self.all_voices.push(id);
        self.voice_numbers_to_all_voices.insert(voice_number, id);

        match kind {
            VoiceKind::Regular => {
                self.regular_voices.push(id);
                self.voice_numbers_to_regular_voices.insert(voice_number, id);
            }
            VoiceKind::Harmonies | VoiceKind::FiguredBass => self.sort_all_voices_for_layering(),
            VoiceKind::Dynamics => {}
        }

        Ok(id)
    }

    /// Stable sort placing each harmonies voice right above and each
    /// figured bass voice right below its regular voice
    fn sort_all_voices_for_layering(&mut self) {
        let voices = &self.voices;
        self.all_voices.sort_by_key(|&id| voices[id].layering_key());
    }

    /// Number the regular voices 1..N by increasing voice number
    pub fn assign_sequential_numbers_to_regular_voices(&mut self, input_line: InputLine) {
        let voices = &self.voices;
        self.regular_voices.sort_by_key(|&id| voices[id].number());

        for (rank, &id) in self.regular_voices.iter().enumerate() {
            self.voices[id].set_staff_sequential_number(rank + 1);
        }

        log::trace!(
            "assigned sequential numbers to {} regular voices in staff \"{}\", line {}",
            self.regular_voices.len(),
            self.name,
            input_line
        );
    }

    pub fn fetch_regular_voice_by_number(
        &self,
        _input_line: InputLine,
        voice_number: i32,
    ) -> Option<&Voice> {
        self.voice_numbers_to_regular_voices
            .values()
            .map(|&id| &self.voices[id])
            .find(|voice| voice.number() == voice_number)
    }

    pub fn fetch_first_regular_voice(&self, input_line: InputLine) -> MsrResult<&Voice> {
        self.regular_voices
            .first()
            .map(|&id| &self.voices[id])
            .ok_or_else(|| MsrError::NoRegularVoice {
                part: self.part_msr_name.clone(),
                staff_number: self.number,
                line: input_line,
            })
    }

    // ========================================================================
    // CLEF, KEY, TIME SIGNATURE
    // ========================================================================

    pub fn append_clef(&mut self, input_line: InputLine, group_input_line: InputLine, clef: Clef) {
        if self.settings.ignore_redundant_clefs && self.current_clef.as_ref() == Some(&clef) {
            log::warn!("ignoring redundant clef {} in staff \"{}\"", clef, self.name);
            return;
        }

        self.current_clef = Some(clef.clone());
        if let Some(group) = self
            .clef_key_time_builder
            .add_clef(input_line, group_input_line, clef)
        {
            self.cascade_clef_key_time_group(&group);
        }
    }

    pub fn append_key(&mut self, input_line: InputLine, group_input_line: InputLine, key: Key) {
        if self.settings.ignore_redundant_keys && self.current_key.as_ref() == Some(&key) {
            log::warn!("ignoring redundant key {} in staff \"{}\"", key, self.name);
            return;
        }

        self.current_key = Some(key.clone());
        if let Some(group) = self
            .clef_key_time_builder
            .add_key(input_line, group_input_line, key)
        {
            self.cascade_clef_key_time_group(&group);
        }
    }

    pub fn append_time_signature(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        time: TimeSignature,
    ) {
        if self.settings.ignore_redundant_times && self.current_time.as_ref() == Some(&time) {
            log::warn!("ignoring redundant time {} in staff \"{}\"", time, self.name);
            return;
        }

        self.current_time = Some(time.clone());
        if let Some(group) = self
            .clef_key_time_builder
            .add_time(input_line, group_input_line, time)
        {
            self.cascade_clef_key_time_group(&group);
        }
    }

    /// Publish the pending clef, key and time group to the voices
    pub fn flush_clef_key_time_group(&mut self) {
        if let Some(group) = self.clef_key_time_builder.flush() {
            self.cascade_clef_key_time_group(&group);
        }
    }

    fn cascade_clef_key_time_group(&mut self, group: &ClefKeyTimeGroup) {
        log::trace!(
            "cascading clef/key/time group of line {} to staff \"{}\"",
            group.group_input_line,
            self.name
        );
        for &id in &self.all_voices {
            self.voices[id].append_clef_key_time_group(group);
        }
    }

    /// Apply `f` to every voice in dispatch order, after publishing any
    /// pending clef, key and time group
    fn for_each_voice(&mut self, mut f: impl FnMut(&mut Voice)) {
        self.flush_clef_key_time_group();
        for &id in &self.all_voices {
            f(&mut self.voices[id]);
        }
    }

    // ========================================================================
    // OTHER STRUCTURAL ELEMENTS
    // ========================================================================

    pub fn append_tempo(&mut self, tempo: &Tempo) {
        self.for_each_voice(|voice| voice.append_tempo(tempo));
    }

    pub fn append_rehearsal_mark(&mut self, mark: &RehearsalMark) {
        self.for_each_voice(|voice| voice.append_rehearsal_mark(mark));
    }

    pub fn append_line_break(&mut self, line_break: &LineBreak) {
        self.for_each_voice(|voice| voice.append_line_break(line_break));
    }

    pub fn append_page_break(&mut self, page_break: &PageBreak) {
        self.for_each_voice(|voice| voice.append_page_break(page_break));
    }

    pub fn append_bar_line(&mut self, bar_line: &BarLine) {
        self.for_each_voice(|voice| voice.append_bar_line(bar_line));
    }

    pub fn append_scordatura(&mut self, scordatura: &Scordatura) {
        self.for_each_voice(|voice| voice.append_scordatura(scordatura));
    }

    pub fn append_accordion_registration(&mut self, registration: &AccordionRegistration) {
        self.for_each_voice(|voice| voice.append_accordion_registration(registration));
    }

    pub fn append_harp_pedals_tuning(&mut self, tuning: &HarpPedalsTuning) {
        self.for_each_voice(|voice| voice.append_harp_pedals_tuning(tuning));
    }

    pub fn append_transposition(&mut self, transposition: &Transposition) {
        if self.settings.ignore_redundant_transpositions
            && self.current_transposition.as_ref() == Some(transposition)
        {
            log::warn!("ignoring redundant transposition in staff \"{}\"", self.name);
            return;
        }

        self.current_transposition = Some(transposition.clone());
        self.for_each_voice(|voice| voice.append_transposition(transposition));
    }

    pub fn append_staff_details(&mut self, details: &StaffDetails) {
        self.record_staff_details(details);
        self.for_each_voice(|voice| voice.append_staff_details(details));
    }

    /// A single-line staff is a rhythmic or drum staff
    fn record_staff_details(&mut self, details: &StaffDetails) {
        self.current_staff_details = Some(details.clone());

        let special = matches!(self.kind, StaffKind::Harmonies | StaffKind::FiguredBass);
        if details.lines_number == Some(1) && !special {
            let kind = if self.settings.single_line_staves_as_rhythmic {
                StaffKind::Rhythmic
            } else {
                StaffKind::Drum
            };
            if kind != self.kind {
                log::debug!("staff \"{}\" becomes a {} staff", self.name, kind);
                self.kind = kind;
            }
        }
    }

    // ========================================================================
    // REPEATS
    // ========================================================================

    pub fn cascade_handle_repeat_start(&mut self, _input_line: InputLine) {
        self.for_each_voice(|voice| voice.handle_repeat_start());
    }

    pub fn cascade_handle_repeat_end(&mut self, _input_line: InputLine, measure_number: &str, times: u32) {
        self.for_each_voice(|voice| voice.handle_repeat_end(measure_number, times));
    }

    pub fn cascade_handle_repeat_ending_start(&mut self, _input_line: InputLine) {
        self.for_each_voice(|voice| voice.handle_repeat_ending_start());
    }

    pub fn cascade_handle_repeat_ending_end(
        &mut self,
        _input_line: InputLine,
        ending_number: &str,
        ending_kind: RepeatEndingKind,
    ) {
        self.for_each_voice(|voice| voice.handle_repeat_ending_end(ending_number, ending_kind));
    }

    pub fn append_repeat_clone(&mut self, repeat_clone: &RepeatClone) {
        self.for_each_voice(|voice| voice.append_repeat_clone(repeat_clone));
    }

    // ========================================================================
    // MULTIPLE MEASURE RESTS AND EMPTY MEASURES
    // ========================================================================

    pub fn cascade_append_multiple_measure_rest(&mut self, rest: &MultipleMeasureRest) {
        self.contains_multiple_measure_rests = true;
        self.for_each_voice(|voice| voice.append_multiple_measure_rest(rest));
    }

    pub fn append_pending_multiple_measure_rests(&mut self, input_line: InputLine) {
        self.for_each_voice(|voice| voice.append_pending_multiple_measure_rests(input_line));
    }

    pub fn append_multiple_measure_rest_clone(&mut self, rest: &MultipleMeasureRest) {
        self.contains_multiple_measure_rests = true;
        self.for_each_voice(|voice| voice.append_multiple_measure_rest_clone(rest));
    }

    pub fn cascade_append_empty_measures(
        &mut self,
        input_line: InputLine,
        previous_measure_number: &str,
        count: u32,
    ) {
        self.contains_multiple_measure_rests = true;
        self.for_each_voice(|voice| {
            voice.append_empty_measures(input_line, previous_measure_number, count)
        });
    }

    pub fn replicate_last_appended_measure(&mut self, input_line: InputLine, times: u32) {
        self.for_each_voice(|voice| voice.replicate_last_appended_measure(input_line, times));
    }

    // ========================================================================
    // MEASURES AND CONTENTS
    // ========================================================================

    pub fn create_measure_and_append(
        &mut self,
        input_line: InputLine,
        measure_number: &str,
        implicit_kind: MeasureImplicitKind,
    ) {
        self.for_each_voice(|voice| {
            voice.create_measure_and_append(input_line, measure_number, implicit_kind)
        });
    }

    pub fn set_next_measure_number(&mut self, next_measure_number: &str) {
        self.for_each_voice(|voice| voice.set_next_measure_number(next_measure_number));
    }

    pub fn finalize_last_appended_measure(&mut self, input_line: InputLine) {
        self.for_each_voice(|voice| voice.finalize_last_appended_measure(input_line));
    }

    pub fn insert_hidden_measure_and_bar_line(&mut self, position_in_measure: WholeNotes) {
        self.for_each_voice(|voice| voice.insert_hidden_measure_and_bar_line(position_in_measure));
    }

    fn voice_mut(&mut self, input_line: InputLine, voice_number: i32) -> MsrResult<&mut Voice> {
        self.flush_clef_key_time_group();
        match self.voice_numbers_to_all_voices.get(&voice_number) {
            Some(&id) => Ok(&mut self.voices[id]),
            None => Err(MsrError::UnknownVoice {
                staff: self.name.clone(),
                voice_number,
                line: input_line,
            }),
        }
    }

    /// Special voice of `kind` numbered `voice_number`
    fn special_voice_mut(
        &mut self,
        input_line: InputLine,
        voice_number: i32,
        kind: VoiceKind,
    ) -> MsrResult<&mut Voice> {
        let staff = self.name.clone();
        let voice = self.voice_mut(input_line, voice_number)?;
        if voice.kind() != kind {
            return Err(MsrError::UnknownVoice {
                staff,
                voice_number,
                line: input_line,
            });
        }
        Ok(voice)
    }

    pub fn append_note_to_voice(
        &mut self,
        input_line: InputLine,
        voice_number: i32,
        note: &NoteContent,
    ) -> MsrResult<()> {
        self.voice_mut(input_line, voice_number)?
            .append_note(input_line, note)
    }

    pub fn append_harmony_to_voice(
        &mut self,
        input_line: InputLine,
        voice_number: i32,
        harmony: &Harmony,
    ) -> MsrResult<()> {
        self.special_voice_mut(input_line, voice_number, VoiceKind::Harmonies)?
            .append_harmony(input_line, harmony)
    }

    pub fn append_figured_bass_to_voice(
        &mut self,
        input_line: InputLine,
        voice_number: i32,
        figured_bass: &FiguredBassElement,
    ) -> MsrResult<()> {
        self.special_voice_mut(input_line, voice_number, VoiceKind::FiguredBass)?
            .append_figured_bass(input_line, figured_bass)
    }

    // ========================================================================
    // FINALIZATION
    // ========================================================================

    /// Finalize every voice, then merge their slices into the staff's
    pub fn finalize(&mut self, input_line: InputLine) -> MsrResult<()> {
        if self.finalized {
            return Err(MsrError::AlreadyFinalized {
                what: format!("staff \"{}\"", self.name),
                line: input_line,
            });
        }

        self.flush_clef_key_time_group();
        for &id in &self.all_voices {
            self.voices[id].finalize(input_line)?;
        }

        let mut sequence = MeasuresSlicesSequence::new(&self.name);
        for &id in &self.all_voices {
            sequence = sequence.merge_with(
                input_line,
                &self.name,
                self.voices[id].measures_slices_sequence(),
            )?;
        }
        sequence.identify_solo_notes_and_rests();
        self.measures_slices_sequence = sequence;

        self.finalized = true;
        Ok(())
    }
}
