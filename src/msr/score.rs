//! Scores and part groups
//!
//! The score is the top of the up-link chain: it owns the settings, the part
//! counter and the parts, grouped or not, and keeps the global maximum
//! lengths of instrument names used to align them in the output.

use std::rc::Rc;

use super::errors::{MsrError, MsrResult};
use super::part::{Part, PartCounter, VoiceRef};
use super::settings::MsrSettings;
use super::types::InputLine;

/// Longest instrument name and abbreviation among the finalized parts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstrumentNamesMaxLengths {
    pub instrument_names_max_length: usize,
    pub instrument_abbreviations_max_length: usize,
}

impl InstrumentNamesMaxLengths {
    pub fn update(&mut self, instrument_name: &str, instrument_abbreviation: &str) {
        self.instrument_names_max_length = self
            .instrument_names_max_length
            .max(instrument_name.chars().count());
        self.instrument_abbreviations_max_length = self
            .instrument_abbreviations_max_length
            .max(instrument_abbreviation.chars().count());
    }
}

// ============================================================================
// PART GROUP
// ============================================================================

#[derive(Clone, Debug)]
pub struct PartGroup {
    number: usize,
    name: String,
    parts: Vec<Part>,
}

impl PartGroup {
    pub fn new(number: usize, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn append_part(&mut self, mut part: Part) -> &mut Part {
        part.set_part_group_number(Some(self.number));
        self.parts.push(part);
        let index = self.parts.len() - 1;
        &mut self.parts[index]
    }

    pub fn fetch_part_by_id(&self, part_id: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.part_id() == part_id)
    }

    pub fn fetch_part_by_id_mut(&mut self, part_id: &str) -> Option<&mut Part> {
        self.parts.iter_mut().find(|part| part.part_id() == part_id)
    }

    /// Voices of all the parts, part by part
    pub fn all_voices(&self) -> impl Iterator<Item = &VoiceRef> {
        self.parts.iter().flat_map(|part| part.all_voices().iter())
    }
}

// ============================================================================
// SCORE
// ============================================================================

#[derive(Clone, Debug)]
pub struct Score {
    settings: Rc<MsrSettings>,
    part_counter: PartCounter,
    part_groups: Vec<PartGroup>,
    parts_without_group: Vec<Part>,
    instrument_names_max_lengths: InstrumentNamesMaxLengths,
}

impl Score {
    pub fn new(settings: MsrSettings) -> Self {
        Self {
            settings: Rc::new(settings),
            part_counter: PartCounter::new(),
            part_groups: Vec::new(),
            parts_without_group: Vec::new(),
            instrument_names_max_lengths: InstrumentNamesMaxLengths::default(),
        }
    }

    pub fn settings(&self) -> &Rc<MsrSettings> {
        &self.settings
    }

    pub fn part_counter_mut(&mut self) -> &mut PartCounter {
        &mut self.part_counter
    }

    pub fn instrument_names_max_lengths(&self) -> InstrumentNamesMaxLengths {
        self.instrument_names_max_lengths
    }

    pub fn part_groups(&self) -> &[PartGroup] {
        &self.part_groups
    }

    /// Create a part group and return its number
    pub fn create_part_group(&mut self, name: &str) -> usize {
        let number = self.part_groups.len() + 1;
        self.part_groups.push(PartGroup::new(number, name));
        number
    }

    /// Create a part, in part group `part_group_number` if given. An unknown
    /// part group is an error and consumes no part number.
    pub fn create_part(
        &mut self,
        input_line: InputLine,
        part_id: &str,
        part_group_number: Option<usize>,
    ) -> MsrResult<&mut Part> {
        let group_index = match part_group_number {
            Some(number) => Some(
                self.part_groups
                    .iter()
                    .position(|g| g.number() == number)
                    .ok_or(MsrError::UnknownPartGroup {
                        part_group_number: number,
                        line: input_line,
                    })?,
            ),
            None => None,
        };
        log::debug!(
            "creating part \"{}\" in part group {:?}, line {}",
            part_id,
            part_group_number,
            input_line
        );

        let part = Part::new(
            Rc::clone(&self.settings),
            &mut self.part_counter,
            input_line,
            part_id,
        );

        match group_index {
            Some(index) => Ok(self.part_groups[index].append_part(part)),
            None => {
                self.parts_without_group.push(part);
                let index = self.parts_without_group.len() - 1;
                Ok(&mut self.parts_without_group[index])
            }
        }
    }

    /// Every part, grouped ones first
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.part_groups
            .iter()
            .flat_map(|group| group.parts().iter())
            .chain(self.parts_without_group.iter())
    }

    pub fn fetch_part_by_id(&self, part_id: &str) -> Option<&Part> {
        self.parts().find(|part| part.part_id() == part_id)
    }

    pub fn fetch_part_by_id_mut(&mut self, part_id: &str) -> Option<&mut Part> {
        for group in &mut self.part_groups {
            if let Some(part) = group.fetch_part_by_id_mut(part_id) {
                return Some(part);
            }
        }
        self.parts_without_group
            .iter_mut()
            .find(|part| part.part_id() == part_id)
    }

    /// Finalize every part, stopping at the first error
    pub fn finalize(&mut self, input_line: InputLine) -> MsrResult<()> {
        let max_lengths = &mut self.instrument_names_max_lengths;

        let grouped = self.part_groups.iter_mut().flat_map(|g| g.parts.iter_mut());
        for part in grouped.chain(self.parts_without_group.iter_mut()) {
            part.finalize_part(input_line, max_lengths)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msr::types::StaffKind;

    #[test]
    fn test_parts_get_increasing_numbers() {
        let mut score = Score::new(MsrSettings::default());
        let group = score.create_part_group("Strings");

        score.create_part(1, "P1", Some(group)).unwrap();
        assert_eq!(
            score.create_part(2, "P9", Some(99)).unwrap_err(),
            MsrError::UnknownPartGroup {
                part_group_number: 99,
                line: 2,
            }
        );
        score.create_part(3, "P2", None).unwrap();

        assert!(score.fetch_part_by_id("P9").is_none());
        assert_eq!(score.part_counter_mut().last_number(), 2);
        assert_eq!(score.fetch_part_by_id("P1").unwrap().absolute_number(), 1);
        assert_eq!(score.fetch_part_by_id("P1").unwrap().part_group_number(), Some(group));
        assert_eq!(score.fetch_part_by_id("P2").unwrap().absolute_number(), 2);
        assert_eq!(score.fetch_part_by_id("P2").unwrap().part_group_number(), None);
    }

    #[test]
    fn test_part_group_voice_registry() {
        let mut score = Score::new(MsrSettings::default());
        let group = score.create_part_group("Piano");
        let part = score.create_part(1, "P1", Some(group)).unwrap();
        part.add_regular_staff_by_number(2, StaffKind::Regular, 1).unwrap();
        part.create_regular_voice_in_staff(3, 1, 1, "1").unwrap();

        let names: Vec<&str> = score.part_groups()[0]
            .all_voices()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["Part_POne_Staff_One_Voice_One"]);
    }

    #[test]
    fn test_finalize_updates_instrument_names_max_lengths() {
        let mut score = Score::new(MsrSettings::default());
        score.create_part(1, "P1", None).unwrap().set_instrument_name("Flute");
        let part = score.create_part(2, "P2", None).unwrap();
        part.set_instrument_name("Clarinet");
        part.set_instrument_abbreviation("Cl.");

        score.finalize(10).unwrap();
        assert!(score.parts().all(|part| part.is_finalized()));

        let lengths = score.instrument_names_max_lengths();
        assert_eq!(lengths.instrument_names_max_length, 8);
        assert_eq!(lengths.instrument_abbreviations_max_length, 3);
    }
}
