//! Which staff kinds receive which part-level events
//!
//! Part-level events fall into three categories, each with its own set of
//! receiving staff kinds. The defaults are:
//!
//! | Category        | Receiving staff kinds                      |
//! |-----------------|--------------------------------------------|
//! | `ClefKeyTime`   | harmonies, figured bass, regular           |
//! | `RepeatClone`   | regular, drum, rhythmic                    |
//! | `ScoreWide`     | all                                        |
//!
//! Settings may override any row, e.g. to send clefs to tablature staves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::StaffKind;

/// Category of a part-level event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartEvent {
    /// Clefs, keys and time signatures
    ClefKeyTime,
    /// Repeats replayed into a part clone
    RepeatClone,
    /// Tempos, breaks, bar lines, repeats, rests and measure lifecycle
    ScoreWide,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffKindSet(BTreeSet<StaffKind>);

impl StaffKindSet {
    pub fn new(kinds: &[StaffKind]) -> Self {
        StaffKindSet(kinds.iter().copied().collect())
    }

    pub fn all() -> Self {
        StaffKindSet::new(&StaffKind::ALL)
    }

    pub fn contains(&self, kind: StaffKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn insert(&mut self, kind: StaffKind) {
        self.0.insert(kind);
    }

    pub fn remove(&mut self, kind: StaffKind) {
        self.0.remove(&kind);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchPolicy {
    pub clef_key_time: StaffKindSet,
    pub repeat_clone: StaffKindSet,
    pub score_wide: StaffKindSet,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            clef_key_time: StaffKindSet::new(&[
                StaffKind::Harmonies,
                StaffKind::FiguredBass,
                StaffKind::Regular,
            ]),
            repeat_clone: StaffKindSet::new(&[
                StaffKind::Regular,
                StaffKind::Drum,
                StaffKind::Rhythmic,
            ]),
            score_wide: StaffKindSet::all(),
        }
    }
}

impl DispatchPolicy {
    pub fn kinds_for(&self, event: PartEvent) -> &StaffKindSet {
        match event {
            PartEvent::ClefKeyTime => &self.clef_key_time,
            PartEvent::RepeatClone => &self.repeat_clone,
            PartEvent::ScoreWide => &self.score_wide,
        }
    }

    /// Whether a staff of `kind` receives events of category `event`
    pub fn includes(&self, event: PartEvent, kind: StaffKind) -> bool {
        self.kinds_for(event).contains(kind)
    }
}
