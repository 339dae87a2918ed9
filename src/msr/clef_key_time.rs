//! Combined clef, key and time signature groups
//!
//! MusicXML emits clef, key and time together at one notational point,
//! identified by a shared group input line. A staff batches them so its
//! voices receive one [`ClefKeyTimeGroup`] per notational point rather than
//! three separate events.
//!
//! Groups are immutable once published: the builder collects the fields of
//! the pending group and only hands a snapshot out when the group is closed,
//! either by an element carrying a different group line, by an element whose
//! field is already set in the pending group, or by an explicit flush.

use serde::{Deserialize, Serialize};

use super::elements::{Clef, Key, TimeSignature};
use super::types::InputLine;

/// Clef, key and time signature appearing at the same notational point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClefKeyTimeGroup {
    /// Line of the first element of the group
    pub input_line: InputLine,
    /// Line shared by all the elements of the group
    pub group_input_line: InputLine,
    pub clef: Option<Clef>,
    pub key: Option<Key>,
    pub time: Option<TimeSignature>,
}

impl ClefKeyTimeGroup {
    pub fn new(input_line: InputLine, group_input_line: InputLine) -> Self {
        Self {
            input_line,
            group_input_line,
            clef: None,
            key: None,
            time: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clef.is_none() && self.key.is_none() && self.time.is_none()
    }

    /// Number of fields set, 0 to 3
    pub fn fields_count(&self) -> usize {
        self.clef.is_some() as usize + self.key.is_some() as usize + self.time.is_some() as usize
    }
}

/// Collects the pending group of a staff
#[derive(Clone, Debug, Default)]
pub struct ClefKeyTimeGroupBuilder {
    pending: Option<ClefKeyTimeGroup>,
}

impl ClefKeyTimeGroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_group_input_line(&self) -> Option<InputLine> {
        self.pending.as_ref().map(|group| group.group_input_line)
    }

    /// Add a clef, returning the group it closed if any
    pub fn add_clef(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        clef: Clef,
    ) -> Option<ClefKeyTimeGroup> {
        let closed = self.close_unless_open_for(input_line, group_input_line, |group| {
            group.clef.is_some()
        });
        if let Some(group) = self.pending.as_mut() {
            group.clef = Some(clef);
        }
        closed
    }

    /// Add a key, returning the group it closed if any
    pub fn add_key(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        key: Key,
    ) -> Option<ClefKeyTimeGroup> {
        let closed = self.close_unless_open_for(input_line, group_input_line, |group| {
            group.key.is_some()
        });
        if let Some(group) = self.pending.as_mut() {
            group.key = Some(key);
        }
        closed
    }

    /// Add a time signature, returning the group it closed if any
    pub fn add_time(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        time: TimeSignature,
    ) -> Option<ClefKeyTimeGroup> {
        let closed = self.close_unless_open_for(input_line, group_input_line, |group| {
            group.time.is_some()
        });
        if let Some(group) = self.pending.as_mut() {
            group.time = Some(time);
        }
        closed
    }

    /// Close the pending group, if any
    pub fn flush(&mut self) -> Option<ClefKeyTimeGroup> {
        self.pending.take()
    }

    /// Make sure a pending group open for `group_input_line` exists, whose
    /// field tested by `is_taken` is still free. Returns the group that had
    /// to be closed for that.
    fn close_unless_open_for(
        &mut self,
        input_line: InputLine,
        group_input_line: InputLine,
        is_taken: impl Fn(&ClefKeyTimeGroup) -> bool,
    ) -> Option<ClefKeyTimeGroup> {
        let reusable = match &self.pending {
            Some(group) => group.group_input_line == group_input_line && !is_taken(group),
            None => false,
        };

        if reusable {
            return None;
        }

        let closed = self.pending.take();
        self.pending = Some(ClefKeyTimeGroup::new(input_line, group_input_line));
        closed
    }
}
