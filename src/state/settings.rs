use crate::config::FilterConfig;
use crate::state::Revision;

/// Display filters applied to every derived view of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSettings {
    /// Keep revisions flagged as minor edits
    pub allow_minors: bool,

    /// Keep revisions whose editor name is hidden or unknown
    pub allow_unknown_editors: bool,
}

impl DataSettings {
    /// Restores both filters to their defaults (everything allowed)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn toggle_allow_minors(&mut self) {
        self.allow_minors = !self.allow_minors;
    }

    pub fn toggle_allow_unknown_editors(&mut self) {
        self.allow_unknown_editors = !self.allow_unknown_editors;
    }

    /// Returns true if the revision passes both filters
    pub fn accepts(&self, revision: &Revision) -> bool {
        if !self.allow_minors && revision.minor {
            return false;
        }
        if !self.allow_unknown_editors && revision.editor.name.is_none() {
            return false;
        }
        true
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            allow_minors: true,
            allow_unknown_editors: true,
        }
    }
}

impl From<&FilterConfig> for DataSettings {
    fn from(config: &FilterConfig) -> Self {
        Self {
            allow_minors: config.allow_minors,
            allow_unknown_editors: config.allow_unknown_editors,
        }
    }
}
