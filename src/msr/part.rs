//! Parts
//!
//! A part owns its staves and classifies them into the buckets used for
//! dispatch:
//!
//! - `all_staves`: every staff, in registration order unless sorted
//! - `regular_staves`: staves registered as regular ones
//! - `non_harmonies_nor_figured_bass_staves`: regular, tablature, drum and
//!   rhythmic staves
//! - the harmonies and figured bass staves, at most one of each
//!
//! Part-level structural events are cascaded to the staves selected by the
//! [`DispatchPolicy`](super::dispatch::DispatchPolicy), and from there to
//! their voices. The part also keeps the whole notes duration of every
//! measure ordinal, used downstream for position-in-measure computations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::dispatch::PartEvent;
use super::elements::{
    AccordionRegistration, BarLine, Clef, FiguredBassElement, HarpPedalsTuning, Harmony, Key,
    LineBreak, MultipleMeasureRest, NoteContent, PageBreak, RehearsalMark, RepeatClone,
    RepeatEndingKind, Scordatura, StaffDetails, Tempo, TimeSignature, Transposition,
};
use super::errors::{MsrError, MsrResult};
use super::score::InstrumentNamesMaxLengths;
use super::settings::MsrSettings;
use super::slices::MeasuresSlicesSequence;
use super::staff::{voice_name, Staff, StaffContext, VoiceId};
use super::types::{InputLine, MeasureImplicitKind, StaffKind, VoiceKind, WholeNotes};
use super::voice::{
    Voice, VOICE_FIGURED_BASS_VOICE_BASE_NUMBER, VOICE_HARMONIES_VOICE_BASE_NUMBER,
};
use crate::utils::english_words::string_numbers_to_english_words;

pub const PART_HARMONIES_STAFF_NUMBER: i32 = 10;
pub const PART_HARMONIES_VOICE_NUMBER: i32 = 11;
pub const PART_FIGURED_BASS_STAFF_NUMBER: i32 = 20;
pub const PART_FIGURED_BASS_VOICE_NUMBER: i32 = 21;

/// Fallback whole notes returned for an unknown measure ordinal
pub const MEASURE_WHOLE_NOTES_FALLBACK: (i64, i64) = (15, 8);

/// Index of a staff in its part's arena
pub type StaffId = usize;

// ============================================================================
// PART COUNTER
// ============================================================================

/// Hands out part absolute numbers, starting at 1
#[derive(Clone, Debug, Default)]
pub struct PartCounter {
    last: usize,
}

impl PartCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_number(&mut self) -> usize {
        self.last += 1;
        self.last
    }

    /// Number handed out last, 0 if none yet
    pub fn last_number(&self) -> usize {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

/// A voice as known by the part registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceRef {
    pub staff_number: i32,
    pub voice_number: i32,
    pub name: String,
}

// ============================================================================
// PART
// ============================================================================

#[derive(Clone, Debug)]
pub struct Part {
    settings: Rc<MsrSettings>,

    absolute_number: usize,
    part_id: String,
    msr_name: String,
    part_group_number: Option<usize>,

    part_name: String,
    part_name_display_text: String,
    part_abbreviation: String,
    part_abbreviation_display_text: String,
    instrument_name: String,
    instrument_abbreviation: String,

    staves: Vec<Staff>,
    all_staves: Vec<StaffId>,
    regular_staves: Vec<StaffId>,
    non_harmonies_nor_figured_bass_staves: Vec<StaffId>,
    harmonies_staff: Option<StaffId>,
    figured_bass_staff: Option<StaffId>,
    staff_numbers_to_staves: BTreeMap<i32, StaffId>,

    all_voices: Vec<VoiceRef>,
    harmonies_voice: Option<VoiceRef>,
    figured_bass_voice: Option<VoiceRef>,

    current_clef: Option<Clef>,
    current_key: Option<Key>,
    current_time: Option<TimeSignature>,
    current_transposition: Option<Transposition>,
    current_staff_details: Option<StaffDetails>,

    current_measure_number: String,
    first_measure_number: Option<String>,
    number_of_measures: usize,
    measures_whole_notes_vector: Vec<WholeNotes>,
    contains_multiple_measure_rests: bool,
    shortest_note_whole_notes: Option<WholeNotes>,
    current_position_in_measure: WholeNotes,

    finalized: bool,
    measures_slices_sequence: MeasuresSlicesSequence,
}

impl Part {
    pub fn new(
        settings: Rc<MsrSettings>,
        counter: &mut PartCounter,
        input_line: InputLine,
        part_id: &str,
    ) -> Self {
        let part_id = part_id.replace(' ', "_");

        let msr_name = match settings.renamed_part(&part_id) {
            Some(renamed) => {
                log::warn!(
                    "renaming part \"{}\" to \"{}\", line {}",
                    part_id,
                    renamed,
                    input_line
                );
                renamed.to_string()
            }
            None => format!("Part_{}", string_numbers_to_english_words(&part_id)),
        };

        let absolute_number = counter.next_number();
        log::debug!(
            "creating part \"{}\" ({}) as number {}, line {}",
            part_id,
            msr_name,
            absolute_number,
            input_line
        );

        Self {
            settings,
            absolute_number,
            measures_slices_sequence: MeasuresSlicesSequence::new(&msr_name),
            part_id,
            msr_name,
            part_group_number: None,
            part_name: String::new(),
            part_name_display_text: String::new(),
            part_abbreviation: String::new(),
            part_abbreviation_display_text: String::new(),
            instrument_name: String::new(),
            instrument_abbreviation: String::new(),
            staves: Vec::new(),
            all_staves: Vec::new(),
            regular_staves: Vec::new(),
            non_harmonies_nor_figured_bass_staves: Vec::new(),
            harmonies_staff: None,
            figured_bass_staff: None,
            staff_numbers_to_staves: BTreeMap::new(),
            all_voices: Vec::new(),
            harmonies_voice: None,
            figured_bass_voice: None,
            current_clef: None,
            current_key: None,
            current_time: None,
            current_transposition: None,
            current_staff_details: None,
            current_measure_number: String::new(),
            first_measure_number: None,
            number_of_measures: 0,
            measures_whole_notes_vector: Vec::new(),
            contains_multiple_measure_rests: false,
            shortest_note_whole_notes: None,
            current_position_in_measure: WholeNotes::zero(),
            finalized: false,
        }
    }

    /// A fresh part with the same identity and names and the same number of
    /// measures, but no staves, for a second pass over the score
    pub fn create_newborn_clone(&self, counter: &mut PartCounter, input_line: InputLine) -> Part {
        let mut clone = Part::new(Rc::clone(&self.settings), counter, input_line, &self.part_id);

        clone.msr_name = self.msr_name.clone();
        clone.measures_slices_sequence = MeasuresSlicesSequence::new(&self.msr_name);
        clone.part_group_number = self.part_group_number;
        clone.part_name = self.part_name.clone();
        clone.part_name_display_text = self.part_name_display_text.clone();
        clone.part_abbreviation = self.part_abbreviation.clone();
        clone.part_abbreviation_display_text = self.part_abbreviation_display_text.clone();
        clone.instrument_name = self.instrument_name.clone();
        clone.instrument_abbreviation = self.instrument_abbreviation.clone();
        clone.set_part_number_of_measures(self.number_of_measures);

        clone
    }

    // ========================================================================
    // IDENTITY AND NAMES
    // ========================================================================

    pub fn absolute_number(&self) -> usize {
        self.absolute_number
    }

    pub fn part_id(&self) -> &str {
        &self.part_id
    }

    pub fn msr_name(&self) -> &str {
        &self.msr_name
    }

    pub fn part_group_number(&self) -> Option<usize> {
        self.part_group_number
    }

    pub(crate) fn set_part_group_number(&mut self, number: Option<usize>) {
        self.part_group_number = number;
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn set_part_name(&mut self, name: &str) {
        self.part_name = name.to_string();
    }

    pub fn part_name_display_text(&self) -> &str {
        &self.part_name_display_text
    }

    pub fn set_part_name_display_text(&mut self, text: &str) {
        self.part_name_display_text = text.to_string();
    }

    pub fn part_abbreviation(&self) -> &str {
        &self.part_abbreviation
    }

    pub fn set_part_abbreviation(&mut self, abbreviation: &str) {
        self.part_abbreviation = abbreviation.to_string();
    }

    pub fn part_abbreviation_display_text(&self) -> &str {
        &self.part_abbreviation_display_text
    }

    pub fn set_part_abbreviation_display_text(&mut self, text: &str) {
        self.part_abbreviation_display_text = text.to_string();
    }

    pub fn instrument_name(&self) -> &str {
        &self.instrument_name
    }

    pub fn set_instrument_name(&mut self, name: &str) {
        self.instrument_name = name.to_string();
    }

    pub fn instrument_abbreviation(&self) -> &str {
        &self.instrument_abbreviation
    }

    pub fn set_instrument_abbreviation(&mut self, abbreviation: &str) {
        self.instrument_abbreviation = abbreviation.to_string();
    }

    /// `Part_POne (partID "P1", partName "Piano")`
    pub fn combined_name(&self) -> String {
        let mut result = format!("{} (partID \"{}\"", self.msr_name, self.part_id);
        if !self.part_name.is_empty() {
            result.push_str(&format!(", partName \"{}\"", self.part_name));
        }
        result.push(')');
        result
    }

    // ========================================================================
    // STAVES
    // ========================================================================

    pub fn staves_count(&self) -> usize {
        self.all_staves.len()
    }

    /// Every staff, in current order
    pub fn all_staves(&self) -> impl Iterator<Item = &Staff> {
        self.all_staves.iter().map(move |&id| &self.staves[id])
    }

    pub fn regular_staves(&self) -> impl Iterator<Item = &Staff> {
        self.regular_staves.iter().map(move |&id| &self.staves[id])
    }

    pub fn non_harmonies_nor_figured_bass_staves(&self) -> impl Iterator<Item = &Staff> {
        self.non_harmonies_nor_figured_bass_staves
            .iter()
            .map(move |&id| &self.staves[id])
    }

    pub fn harmonies_staff(&self) -> Option<&Staff> {
        self.harmonies_staff.map(|id| &self.staves[id])
    }

    pub fn figured_bass_staff(&self) -> Option<&Staff> {
        self.figured_bass_staff.map(|id| &self.staves[id])
    }

    pub fn fetch_staff_by_number(&self, staff_number: i32) -> Option<&Staff> {
        self.staff_numbers_to_staves
            .get(&staff_number)
            .map(|&id| &self.staves[id])
    }

    pub fn fetch_staff_by_number_mut(&mut self, staff_number: i32) -> Option<&mut Staff> {
        match self.staff_numbers_to_staves.get(&staff_number) {
            Some(&id) => Some(&mut self.staves[id]),
            None => None,
        }
    }

    fn staff_id(&self, input_line: InputLine, staff_number: i32) -> MsrResult<StaffId> {
        self.staff_numbers_to_staves
            .get(&staff_number)
            .copied()
            .ok_or_else(|| MsrError::UnknownStaff {
                part: self.msr_name.clone(),
                staff_number,
                line: input_line,
            })
    }

    fn staff_context(&self) -> StaffContext<'_> {
        StaffContext {
            part_msr_name: &self.msr_name,
            clef: self.current_clef.as_ref(),
            key: self.current_key.as_ref(),
            transposition: self.current_transposition.as_ref(),
            staff_details: self.current_staff_details.as_ref(),
            instrument_name: &self.instrument_name,
            instrument_abbreviation: &self.instrument_abbreviation,
        }
    }

    pub fn add_regular_staff_by_number(
        &mut self,
        input_line: InputLine,
        kind: StaffKind,
        staff_number: i32,
    ) -> MsrResult<&mut Staff> {
        if self.staff_numbers_to_staves.contains_key(&staff_number) {
            return Err(MsrError::DuplicateStaffNumber {
                part: self.msr_name.clone(),
                staff_number,
                line: input_line,
            });
        }

        let staff = Staff::new(
            Rc::clone(&self.settings),
            input_line,
            staff_number,
            kind,
            &self.staff_context(),
        )?;
        let id = self.register_staff_in_part(input_line, staff)?;

        let clef = self.current_clef.clone();
        let key = self.current_key.clone();
        let staff = &mut self.staves[id];
        staff.set_current_clef_and_key(clef.as_ref(), key.as_ref());

        Ok(staff)
    }

    pub fn add_harmonies_staff(&mut self, input_line: InputLine) -> MsrResult<&mut Staff> {
        self.add_special_staff(input_line, StaffKind::Harmonies, PART_HARMONIES_STAFF_NUMBER)
    }

    pub fn add_figured_bass_staff(&mut self, input_line: InputLine) -> MsrResult<&mut Staff> {
        self.add_special_staff(
            input_line,
            StaffKind::FiguredBass,
            PART_FIGURED_BASS_STAFF_NUMBER,
        )
    }

    fn add_special_staff(
        &mut self,
        input_line: InputLine,
        kind: StaffKind,
        staff_number: i32,
    ) -> MsrResult<&mut Staff> {
        let staff = Staff::new(
            Rc::clone(&self.settings),
            input_line,
            staff_number,
            kind,
            &self.staff_context(),
        )?;
        let id = self.register_staff_in_part(input_line, staff)?;
        Ok(&mut self.staves[id])
    }

    /// Register and classify a staff. The singleton checks happen first, so
    /// a rejected staff leaves the part untouched.
    pub fn register_staff_in_part(&mut self, input_line: InputLine, staff: Staff) -> MsrResult<StaffId> {
        let kind = staff.kind();

        if self.settings.sanity_checks {
            let taken = match kind {
                StaffKind::Harmonies => self.harmonies_staff.is_some(),
                StaffKind::FiguredBass => self.figured_bass_staff.is_some(),
                _ => false,
            };
            if taken {
                return Err(MsrError::DuplicateSingletonStaff {
                    part: self.msr_name.clone(),
                    staff_kind: kind,
                    line: input_line,
                });
            }
        }

        log::debug!(
            "registering staff \"{}\" in part \"{}\", line {}",
            staff.name(),
            self.msr_name,
            input_line
        );

        let id = self.staves.len();
        self.staff_numbers_to_staves.insert(staff.number(), id);
        self.staves.push(staff);
        self.all_staves.push(id);

        match kind {
            StaffKind::Regular => {
                self.regular_staves.push(id);
                self.non_harmonies_nor_figured_bass_staves.push(id);
            }
            StaffKind::Tablature | StaffKind::Drum | StaffKind::Rhythmic => {
                self.non_harmonies_nor_figured_bass_staves.push(id);
            }
            StaffKind::Harmonies => self.harmonies_staff = Some(id),
            StaffKind::FiguredBass => self.figured_bass_staff = Some(id),
        }

        Ok(id)
    }

    pub fn sort_staves_by_increasing_number(&mut self) {
        let staves = &self.staves;
        self.all_staves.sort_by_key(|&id| staves[id].number());
        self.non_harmonies_nor_figured_bass_staves
            .sort_by_key(|&id| staves[id].number());
    }

    /// Move the figured bass staff right below the last regular staff
    fn sort_figured_bass_staff_below_regular_staves(&mut self) {
        let Some(figured_bass) = self.figured_bass_staff else {
            return;
        };

        self.all_staves.retain(|&id| id != figured_bass);
        let staves = &self.staves;
        let position = self
            .all_staves
            .iter()
            .rposition(|&id| staves[id].kind() == StaffKind::Regular)
            .map_or(self.all_staves.len(), |index| index + 1);
        self.all_staves.insert(position, figured_bass);
    }

    // ========================================================================
    // VOICES
    // ========================================================================

    /// Every voice registered through the part's staves, in registration order
    pub fn all_voices(&self) -> &[VoiceRef] {
        &self.all_voices
    }

    pub fn harmonies_voice(&self) -> Option<&VoiceRef> {
        self.harmonies_voice.as_ref()
    }

    pub fn figured_bass_voice(&self) -> Option<&VoiceRef> {
        self.figured_bass_voice.as_ref()
    }

    pub fn fetch_voice(&self, staff_number: i32, voice_number: i32) -> Option<&Voice> {
        self.fetch_staff_by_number(staff_number)?
            .fetch_voice_by_number(voice_number)
    }

    fn record_voice(&mut self, staff_id: StaffId, voice_id: VoiceId) -> VoiceRef {
        let voice = self.staves[staff_id].voice(voice_id);
        let voice_ref = VoiceRef {
            staff_number: self.staves[staff_id].number(),
            voice_number: voice.number(),
            name: voice.name().to_string(),
        };
        self.all_voices.push(voice_ref.clone());
        voice_ref
    }

    pub fn create_regular_voice_in_staff(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        voice_number: i32,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        let staff_id = self.staff_id(input_line, staff_number)?;
        let voice_id =
            self.staves[staff_id].create_regular_voice(input_line, voice_number, current_measure_number)?;
        Ok(self.record_voice(staff_id, voice_id))
    }

    /// Register a voice created elsewhere; dynamics voices are not tracked
    pub fn register_voice_in_staff(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        voice: Voice,
    ) -> MsrResult<Option<VoiceRef>> {
        let staff_id = self.staff_id(input_line, staff_number)?;
        let registered = self.staves[staff_id].register_voice(input_line, voice)?;
        Ok(registered.map(|voice_id| self.record_voice(staff_id, voice_id)))
    }

    /// Create the harmonies voice of regular voice `regular_voice_number`,
    /// in the same staff
    pub fn create_voice_harmonies_voice(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        regular_voice_number: i32,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        self.create_voice_special_voice(
            input_line,
            staff_number,
            regular_voice_number,
            VoiceKind::Harmonies,
            VOICE_HARMONIES_VOICE_BASE_NUMBER + regular_voice_number,
            current_measure_number,
        )
    }

    /// Create the figured bass voice of regular voice `regular_voice_number`,
    /// in the same staff
    pub fn create_voice_figured_bass_voice(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        regular_voice_number: i32,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        self.create_voice_special_voice(
            input_line,
            staff_number,
            regular_voice_number,
            VoiceKind::FiguredBass,
            VOICE_FIGURED_BASS_VOICE_BASE_NUMBER + regular_voice_number,
            current_measure_number,
        )
    }

    fn create_voice_special_voice(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        regular_voice_number: i32,
        kind: VoiceKind,
        voice_number: i32,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        let staff_id = self.staff_id(input_line, staff_number)?;
        let staff = &self.staves[staff_id];

        if staff
            .fetch_regular_voice_by_number(input_line, regular_voice_number)
            .is_none()
        {
            return Err(MsrError::UnknownVoice {
                staff: staff.name().to_string(),
                voice_number: regular_voice_number,
                line: input_line,
            });
        }

        let voice = Voice::new(
            voice_number,
            kind,
            &voice_name(staff.name(), kind, voice_number),
            staff_number,
            current_measure_number,
        );

        let registered = self.register_voice_in_staff(input_line, staff_number, voice)?;
        registered.ok_or_else(|| MsrError::UnknownVoice {
            staff: self.staves[staff_id].name().to_string(),
            voice_number,
            line: input_line,
        })
    }

    /// Create the part-level harmonies voice, in the harmonies staff
    pub fn create_part_harmonies_voice(
        &mut self,
        input_line: InputLine,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        if self.harmonies_voice.is_some() {
            return Err(MsrError::DuplicateSingletonVoice {
                part: self.msr_name.clone(),
                voice_kind: VoiceKind::Harmonies.to_string(),
                line: input_line,
            });
        }

        let voice_ref = self.create_part_special_voice(
            input_line,
            StaffKind::Harmonies,
            PART_HARMONIES_VOICE_NUMBER,
            VoiceKind::Harmonies,
            current_measure_number,
        )?;
        self.harmonies_voice = Some(voice_ref.clone());
        Ok(voice_ref)
    }

    /// Create the part-level figured bass voice, in the figured bass staff
    pub fn create_part_figured_bass_voice(
        &mut self,
        input_line: InputLine,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        if self.figured_bass_voice.is_some() {
            return Err(MsrError::DuplicateSingletonVoice {
                part: self.msr_name.clone(),
                voice_kind: VoiceKind::FiguredBass.to_string(),
                line: input_line,
            });
        }

        let voice_ref = self.create_part_special_voice(
            input_line,
            StaffKind::FiguredBass,
            PART_FIGURED_BASS_VOICE_NUMBER,
            VoiceKind::FiguredBass,
            current_measure_number,
        )?;
        self.figured_bass_voice = Some(voice_ref.clone());
        Ok(voice_ref)
    }

    fn create_part_special_voice(
        &mut self,
        input_line: InputLine,
        staff_kind: StaffKind,
        voice_number: i32,
        voice_kind: VoiceKind,
        current_measure_number: &str,
    ) -> MsrResult<VoiceRef> {
        let existing = match staff_kind {
            StaffKind::Harmonies => self.harmonies_staff,
            _ => self.figured_bass_staff,
        };
        let staff_id = match existing {
            Some(id) => id,
            None => {
                let staff_number = if staff_kind == StaffKind::Harmonies {
                    PART_HARMONIES_STAFF_NUMBER
                } else {
                    PART_FIGURED_BASS_STAFF_NUMBER
                };
                self.add_special_staff(input_line, staff_kind, staff_number)?;
                self.staff_id(input_line, staff_number)?
            }
        };

        let staff = &self.staves[staff_id];
        let voice = Voice::new(
            voice_number,
            voice_kind,
            &voice_name(staff.name(), voice_kind, voice_number),
            staff.number(),
            current_measure_number,
        );

        let voice_id = self.staves[staff_id]
            .register_voice(input_line, voice)?
            .ok_or_else(|| MsrError::UnknownVoice {
                staff: self.staves[staff_id].name().to_string(),
                voice_number,
                line: input_line,
            })?;
        Ok(self.record_voice(staff_id, voice_id))
    }

    pub fn assign_sequential_numbers_to_regular_voices(&mut self, input_line: InputLine) {
        for staff in &mut self.staves {
            staff.assign_sequential_numbers_to_regular_voices(input_line);
        }
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Staves receiving events of category `event`, in dispatch order. For
    /// clefs, keys and times the harmonies and figured bass staves come first.
    fn dispatch_targets(&self, event: PartEvent) -> Vec<StaffId> {
        let policy = &self.settings.dispatch_policy;
        let mut targets = Vec::new();

        if event == PartEvent::ClefKeyTime {
            for id in [self.harmonies_staff, self.figured_bass_staff].into_iter().flatten() {
                if policy.includes(event, self.staves[id].kind()) {
                    targets.push(id);
                }
            }
        }

        for &id in &self.all_staves {
            if !targets.contains(&id) && policy.includes(event, self.staves[id].kind()) {
                targets.push(id);
            }
        }

        targets
    }

    fn for_each_staff(&mut self, event: PartEvent, mut f: impl FnMut(&mut Staff)) {
        for id in self.dispatch_targets(event) {
            f(&mut self.staves[id]);
        }
    }

    pub fn append_clef_to_part(&mut self, input_line: InputLine, group_input_line: InputLine, clef: &Clef) {
        self.current_clef = Some(clef.clone());
        self.for_each_staff(PartEvent::ClefKeyTime, |staff| {
            staff.append_clef(input_line, group_input_line, clef.clone())
        });
    }

    pub fn append_key_to_part(&mut self, input_line: InputLine, group_input_line: InputLine, key: &Key) {
        self.current_key = Some(key.clone());
        self.for_each_staff(PartEvent::ClefKeyTime, |staff| {
            staff.append_key(input_line, group_input_line, key.clone())
        });
    }

    pub fn append_time_signature_to_part(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        time: &TimeSignature,
    ) {
        self.current_time = Some(time.clone());
        self.for_each_staff(PartEvent::ClefKeyTime, |staff| {
            staff.append_time_signature(input_line, group_input_line, time.clone())
        });
    }

    pub fn flush_clef_key_time_groups(&mut self) {
        for staff in &mut self.staves {
            staff.flush_clef_key_time_group();
        }
    }

    pub fn append_tempo_to_part(&mut self, tempo: &Tempo) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_tempo(tempo));
    }

    pub fn append_rehearsal_mark_to_part(&mut self, mark: &RehearsalMark) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_rehearsal_mark(mark));
    }

    pub fn append_line_break_to_part(&mut self, line_break: &LineBreak) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_line_break(line_break));
    }

    pub fn append_page_break_to_part(&mut self, page_break: &PageBreak) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_page_break(page_break));
    }

    pub fn append_bar_line_to_part(&mut self, bar_line: &BarLine) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_bar_line(bar_line));
    }

    pub fn insert_hidden_measure_and_bar_line_in_part_clone(
        &mut self,
        input_line: InputLine,
        position_in_measure: WholeNotes,
    ) {
        log::trace!(
            "inserting hidden measure and bar line at {} in part \"{}\", line {}",
            position_in_measure,
            self.msr_name,
            input_line
        );
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.insert_hidden_measure_and_bar_line(position_in_measure)
        });
    }

    pub fn append_transposition_to_part(&mut self, transposition: &Transposition) {
        self.current_transposition = Some(transposition.clone());
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.append_transposition(transposition)
        });
    }

    pub fn append_staff_details_to_part(&mut self, details: &StaffDetails) {
        self.current_staff_details = Some(details.clone());
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_staff_details(details));
        self.reclassify_staves();
    }

    /// Drop the staves that single-line staff details turned into drum or
    /// rhythmic staves from the regular bucket. Those kinds stay in
    /// `non_harmonies_nor_figured_bass_staves`.
    fn reclassify_staves(&mut self) {
        let staves = &self.staves;
        let msr_name = &self.msr_name;
        self.regular_staves.retain(|&id| {
            let regular = staves[id].kind() == StaffKind::Regular;
            if !regular {
                log::debug!(
                    "staff \"{}\" is no longer a regular staff of part \"{}\"",
                    staves[id].name(),
                    msr_name
                );
            }
            regular
        });
    }

    pub fn append_scordatura_to_part(&mut self, scordatura: &Scordatura) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_scordatura(scordatura));
    }

    pub fn append_accordion_registration_to_part(&mut self, registration: &AccordionRegistration) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.append_accordion_registration(registration)
        });
    }

    pub fn append_harp_pedals_tuning_to_part(&mut self, tuning: &HarpPedalsTuning) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| staff.append_harp_pedals_tuning(tuning));
    }

    pub fn cascade_handle_repeat_start(&mut self, input_line: InputLine) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_handle_repeat_start(input_line)
        });
    }

    pub fn cascade_handle_repeat_end(&mut self, input_line: InputLine, measure_number: &str, times: u32) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_handle_repeat_end(input_line, measure_number, times)
        });
    }

    pub fn cascade_handle_repeat_ending_start(&mut self, input_line: InputLine) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_handle_repeat_ending_start(input_line)
        });
    }

    pub fn cascade_handle_repeat_ending_end(
        &mut self,
        input_line: InputLine,
        ending_number: &str,
        ending_kind: RepeatEndingKind,
    ) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_handle_repeat_ending_end(input_line, ending_number, ending_kind)
        });
    }

    pub fn append_repeat_clone_to_part(&mut self, repeat_clone: &RepeatClone) {
        self.for_each_staff(PartEvent::RepeatClone, |staff| {
            staff.append_repeat_clone(repeat_clone)
        });
    }

    pub fn cascade_append_multiple_measure_rest_to_part(&mut self, rest: &MultipleMeasureRest) {
        self.contains_multiple_measure_rests = true;
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_append_multiple_measure_rest(rest)
        });
    }

    pub fn append_pending_multiple_measure_rests_to_part(&mut self, input_line: InputLine) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.append_pending_multiple_measure_rests(input_line)
        });
    }

    pub fn append_multiple_measure_rest_clone_to_part(&mut self, rest: &MultipleMeasureRest) {
        self.contains_multiple_measure_rests = true;
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.append_multiple_measure_rest_clone(rest)
        });
    }

    pub fn cascade_append_empty_measures_to_part(
        &mut self,
        input_line: InputLine,
        previous_measure_number: &str,
        count: u32,
    ) {
        self.contains_multiple_measure_rests = true;
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.cascade_append_empty_measures(input_line, previous_measure_number, count)
        });
    }

    pub fn replicate_last_appended_measure_in_part(&mut self, input_line: InputLine, times: u32) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.replicate_last_appended_measure(input_line, times)
        });
    }

    pub fn create_measure_and_append_to_part(
        &mut self,
        input_line: InputLine,
        measure_number: &str,
        implicit_kind: MeasureImplicitKind,
    ) {
        self.set_part_current_measure_number(measure_number);
        self.current_position_in_measure = WholeNotes::zero();
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.create_measure_and_append(input_line, measure_number, implicit_kind)
        });
    }

    pub fn set_next_measure_number_in_part(&mut self, next_measure_number: &str) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.set_next_measure_number(next_measure_number)
        });
    }

    pub fn finalize_last_appended_measure_in_part(&mut self, input_line: InputLine) {
        self.for_each_staff(PartEvent::ScoreWide, |staff| {
            staff.finalize_last_appended_measure(input_line)
        });
    }

    pub fn append_note_to_voice(
        &mut self,
        input_line: InputLine,
        staff_number: i32,
        voice_number: i32,
        note: &NoteContent,
    ) -> MsrResult<()> {
        let staff_id = self.staff_id(input_line, staff_number)?;
        self.staves[staff_id].append_note_to_voice(input_line, voice_number, note)?;
        self.register_shortest_note_whole_notes_if_relevant(note.sounding_whole_notes);
        Ok(())
    }

    /// Append a harmony to the part-level harmonies voice
    pub fn append_harmony_to_part(&mut self, input_line: InputLine, harmony: &Harmony) -> MsrResult<()> {
        let voice = self.harmonies_voice.clone().ok_or_else(|| MsrError::UnknownVoice {
            staff: self.msr_name.clone(),
            voice_number: PART_HARMONIES_VOICE_NUMBER,
            line: input_line,
        })?;
        let staff_id = self.staff_id(input_line, voice.staff_number)?;
        self.staves[staff_id].append_harmony_to_voice(input_line, voice.voice_number, harmony)
    }

    /// Append a figured bass element to the part-level figured bass voice
    pub fn append_figured_bass_to_part(
        &mut self,
        input_line: InputLine,
        figured_bass: &FiguredBassElement,
    ) -> MsrResult<()> {
        let voice = self
            .figured_bass_voice
            .clone()
            .ok_or_else(|| MsrError::UnknownVoice {
                staff: self.msr_name.clone(),
                voice_number: PART_FIGURED_BASS_VOICE_NUMBER,
                line: input_line,
            })?;
        let staff_id = self.staff_id(input_line, voice.staff_number)?;
        self.staves[staff_id].append_figured_bass_to_voice(input_line, voice.voice_number, figured_bass)
    }

    // ========================================================================
    // MEASURE BOOKKEEPING
    // ========================================================================

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

    pub fn current_measure_number(&self) -> &str {
        &self.current_measure_number
    }

    pub fn first_measure_number(&self) -> Option<&str> {
        self.first_measure_number.as_deref()
    }

    /// The first call also latches the first measure number
    pub fn set_part_current_measure_number(&mut self, measure_number: &str) {
        if self.first_measure_number.is_none() {
            self.first_measure_number = Some(measure_number.to_string());
        }
        self.current_measure_number = measure_number.to_string();
    }

    pub fn number_of_measures(&self) -> usize {
        self.number_of_measures
    }

    /// Growing past the vector's length discards its contents: the vector
    /// becomes `number_of_measures + 1` zeros
    pub fn set_part_number_of_measures(&mut self, number_of_measures: usize) {
        self.number_of_measures = number_of_measures;

        if number_of_measures > self.measures_whole_notes_vector.len() {
            self.measures_whole_notes_vector.clear();
            self.measures_whole_notes_vector
                .resize(number_of_measures + 1, WholeNotes::zero());
        }
    }

    pub fn measures_whole_notes_vector(&self) -> &[WholeNotes] {
        &self.measures_whole_notes_vector
    }

    fn measure_index_out_of_range(&self, input_line: InputLine, index: i64) -> MsrError {
        MsrError::MeasureIndexOutOfRange {
            part: self.msr_name.clone(),
            index,
            size: self.measures_whole_notes_vector.len(),
            line: input_line,
        }
    }

    /// Record the duration of the measure with 1-based `ordinal_number`
    pub fn register_ordinal_measure_number_whole_notes(
        &mut self,
        input_line: InputLine,
        ordinal_number: usize,
        whole_notes: WholeNotes,
    ) -> MsrResult<()> {
        let index = ordinal_number as i64 - 1;
        if index < 0 || index as usize >= self.measures_whole_notes_vector.len() {
            return Err(self.measure_index_out_of_range(input_line, index));
        }

        let slot = &mut self.measures_whole_notes_vector[index as usize];
        if *slot != whole_notes {
            log::debug!(
                "measure ordinal {} of part \"{}\" changes from {} to {} whole notes, line {}",
                ordinal_number,
                self.msr_name,
                slot,
                whole_notes,
                input_line
            );
        }
        *slot = whole_notes;
        Ok(())
    }

    pub fn fetch_part_measures_whole_notes_vector_at(
        &self,
        input_line: InputLine,
        index: usize,
    ) -> MsrResult<WholeNotes> {
        self.measures_whole_notes_vector
            .get(index)
            .copied()
            .ok_or_else(|| self.measure_index_out_of_range(input_line, index as i64))
    }

    /// Like [`Part::fetch_part_measures_whole_notes_vector_at`], logging the
    /// error and returning [`MEASURE_WHOLE_NOTES_FALLBACK`] out of range
    pub fn fetch_part_measures_whole_notes_vector_at_or_fallback(
        &self,
        input_line: InputLine,
        index: usize,
    ) -> WholeNotes {
        match self.fetch_part_measures_whole_notes_vector_at(input_line, index) {
            Ok(whole_notes) => whole_notes,
            Err(e) => {
                log::error!("{}", e);
                let (numerator, denominator) = MEASURE_WHOLE_NOTES_FALLBACK;
                WholeNotes::new(numerator, denominator)
            }
        }
    }

    pub fn shortest_note_whole_notes(&self) -> Option<WholeNotes> {
        self.shortest_note_whole_notes
    }

    pub fn register_shortest_note_whole_notes_if_relevant(&mut self, whole_notes: WholeNotes) {
        if whole_notes.is_zero() {
            return;
        }
        match self.shortest_note_whole_notes {
            Some(shortest) if shortest <= whole_notes => {}
            _ => self.shortest_note_whole_notes = Some(whole_notes),
        }
    }

    pub fn current_position_in_measure(&self) -> WholeNotes {
        self.current_position_in_measure
    }

    pub fn set_part_current_position_in_measure(
        &mut self,
        input_line: InputLine,
        position: WholeNotes,
    ) -> MsrResult<()> {
        if position.is_negative() {
            return Err(MsrError::NegativePositionInMeasure {
                part: self.msr_name.clone(),
                position,
                line: input_line,
            });
        }
        self.current_position_in_measure = position;
        Ok(())
    }

    pub fn increment_part_current_position_in_measure(
        &mut self,
        input_line: InputLine,
        delta: WholeNotes,
    ) -> MsrResult<()> {
        self.set_part_current_position_in_measure(input_line, self.current_position_in_measure + delta)
    }

    pub fn decrement_part_current_position_in_measure(
        &mut self,
        input_line: InputLine,
        delta: WholeNotes,
    ) -> MsrResult<()> {
        self.set_part_current_position_in_measure(input_line, self.current_position_in_measure - delta)
    }

    // ========================================================================
    // FINALIZATION
    // ========================================================================

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn measures_slices_sequence(&self) -> &MeasuresSlicesSequence {
        &self.measures_slices_sequence
    }

    pub fn finalize_part(
        &mut self,
        input_line: InputLine,
        max_lengths: &mut InstrumentNamesMaxLengths,
    ) -> MsrResult<()> {
        log::debug!("finalizing part {}, line {}", self.combined_name(), input_line);
        self.finalize(input_line, max_lengths)
    }

    pub fn finalize_part_clone(
        &mut self,
        input_line: InputLine,
        max_lengths: &mut InstrumentNamesMaxLengths,
    ) -> MsrResult<()> {
        log::debug!("finalizing part clone {}, line {}", self.combined_name(), input_line);
        self.finalize(input_line, max_lengths)
    }

    fn finalize(
        &mut self,
        input_line: InputLine,
        max_lengths: &mut InstrumentNamesMaxLengths,
    ) -> MsrResult<()> {
        if self.finalized {
            return Err(MsrError::AlreadyFinalized {
                what: format!("part {}", self.combined_name()),
                line: input_line,
            });
        }

        if self.all_staves.is_empty() {
            log::warn!("part {} doesn't contain any staff, line {}", self.combined_name(), input_line);
        }

        if self.settings.sort_figured_bass_staves_below_regular {
            self.sort_figured_bass_staff_below_regular_staves();
        }

        for &id in &self.all_staves {
            self.staves[id].finalize(input_line)?;
        }

        max_lengths.update(&self.instrument_name, &self.instrument_abbreviation);

        let origin = self.combined_name();
        let mut sequence = MeasuresSlicesSequence::new(&origin);
        for &id in &self.all_staves {
            let staff_sequence = self.staves[id].measures_slices_sequence();
            if staff_sequence.is_empty() {
                log::trace!("staff \"{}\" has no measures slices", self.staves[id].name());
                continue;
            }
            sequence = sequence.merge_with(input_line, &origin, staff_sequence)?;
        }
        self.measures_slices_sequence = sequence;

        self.finalized = true;
        Ok(())
    }
}
