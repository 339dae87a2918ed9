//! MSR settings
//!
//! The options the part/staff/voice engine consults, gathered in one value
//! that the [`Score`](super::score::Score) owns and hands down. Settings can
//! be written in YAML or JSON; every field is optional:
//!
//! ```yaml
//! parts_renaming:
//!   P1: Soprano
//! max_regular_voices_per_staff: 4
//! ignore_redundant_clefs: true
//! single_line_staves_as_rhythmic: true
//! dispatch_policy:
//!   clef_key_time: [Harmonies, FiguredBass, Regular, Tablature]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::dispatch::DispatchPolicy;
use super::errors::{MsrError, MsrResult};

/// Default limit of regular voices in one staff
pub const DEFAULT_MAX_REGULAR_VOICES_PER_STAFF: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsrSettings {
    /// Part ID to the MSR name it should get instead of the generated one
    pub parts_renaming: BTreeMap<String, String>,

    pub max_regular_voices_per_staff: usize,

    /// Drop elements equal to the staff's current one
    pub ignore_redundant_clefs: bool,
    pub ignore_redundant_keys: bool,
    pub ignore_redundant_times: bool,
    pub ignore_redundant_transpositions: bool,

    /// Single-line staves become rhythmic staves instead of drum staves
    pub single_line_staves_as_rhythmic: bool,

    /// Check singleton staves and voice name uniqueness
    pub sanity_checks: bool,

    /// Place figured bass staves right below the regular staff they annotate
    pub sort_figured_bass_staves_below_regular: bool,

    pub dispatch_policy: DispatchPolicy,
}

impl Default for MsrSettings {
    fn default() -> Self {
        Self {
            parts_renaming: BTreeMap::new(),
            max_regular_voices_per_staff: DEFAULT_MAX_REGULAR_VOICES_PER_STAFF,
            ignore_redundant_clefs: false,
            ignore_redundant_keys: false,
            ignore_redundant_times: false,
            ignore_redundant_transpositions: true,
            single_line_staves_as_rhythmic: false,
            sanity_checks: true,
            sort_figured_bass_staves_below_regular: false,
            dispatch_policy: DispatchPolicy::default(),
        }
    }
}

impl MsrSettings {
    pub fn from_yaml_str(text: &str) -> MsrResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| MsrError::Settings(format!("invalid YAML settings: {}", e)))
    }

    pub fn from_json_str(text: &str) -> MsrResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| MsrError::Settings(format!("invalid JSON settings: {}", e)))
    }

    /// Load settings from a file, `.json` files as JSON and anything else
    /// as YAML
    pub fn load(path: &Path) -> MsrResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MsrError::Settings(format!("failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let settings = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        log::debug!("loaded MSR settings from {}", path.display());
        Ok(settings)
    }

    /// The name chosen for `part_id`, if it is renamed
    pub fn renamed_part(&self, part_id: &str) -> Option<&str> {
        self.parts_renaming.get(part_id).map(String::as_str)
    }
}
