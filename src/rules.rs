//! Per-tag formatting rules
//!
//! A [`Ruleset`] maps tag names to a [`FormatSpec`], with an optional wildcard
//! entry used for any tag not listed. Two presets ship with the crate:
//!
//! - `book`: sections render without inline text, paras put their text on a
//!   wrapped line of its own, everything else recurses.
//! - `full`: everything recurses with text inline.

use crate::error::ConfigurationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Key that stands for "any other tag" in the serialized form of a ruleset
pub const WILDCARD: &str = "*";

/// Formatting options for a single element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSpec {
    /// Descend into children after rendering this element
    pub recurse: bool,
    /// Append the element's text to its summary line
    pub with_text: bool,
    /// Put the text on its own line, one level deeper than the summary
    pub linebreak: bool,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            recurse: false,
            with_text: true,
            linebreak: false,
        }
    }
}

impl FormatSpec {
    pub fn recursive() -> Self {
        FormatSpec {
            recurse: true,
            ..Default::default()
        }
    }
}

/// Tag-keyed table of [`FormatSpec`]s with an optional wildcard default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, FormatSpec>",
    into = "IndexMap<String, FormatSpec>"
)]
pub struct Ruleset {
    rules: IndexMap<String, FormatSpec>,
    wildcard: Option<FormatSpec>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the rule for `tag`
    pub fn rule(mut self, tag: impl Into<String>, spec: FormatSpec) -> Self {
        self.rules.insert(tag.into(), spec);
        self
    }

    /// Sets the rule used for tags without an explicit entry
    pub fn wildcard(mut self, spec: FormatSpec) -> Self {
        self.wildcard = Some(spec);
        self
    }

    /// Looks up a built-in ruleset by name
    pub fn preset(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "book" => Ok(Ruleset::new()
                .rule("section", FormatSpec { with_text: false, ..Default::default() })
                .rule("para", FormatSpec { linebreak: true, ..Default::default() })
                .wildcard(FormatSpec::recursive())),
            "full" => Ok(Ruleset::new().wildcard(FormatSpec::recursive())),
            other => Err(ConfigurationError::UnknownPreset(other.to_string())),
        }
    }

    /// Resolves the `FormatSpec` for `tag`: explicit entry first, then the wildcard
    pub fn lookup(&self, tag: &str) -> Result<FormatSpec, ConfigurationError> {
        let spec = self
            .rules
            .get(tag)
            .or(self.wildcard.as_ref())
            .copied()
            .ok_or_else(|| ConfigurationError::NoRule { tag: tag.to_string() })?;
        trace!(tag, ?spec, "resolved format rule");
        Ok(spec)
    }
}

impl From<IndexMap<String, FormatSpec>> for Ruleset {
    fn from(mut rules: IndexMap<String, FormatSpec>) -> Self {
        let wildcard = rules.shift_remove(WILDCARD);
        Ruleset { rules, wildcard }
    }
}

impl From<Ruleset> for IndexMap<String, FormatSpec> {
    fn from(ruleset: Ruleset) -> Self {
        let mut map = ruleset.rules;
        if let Some(spec) = ruleset.wildcard {
            map.insert(WILDCARD.to_string(), spec);
        }
        map
    }
}

/// Where a dump gets its rules from: a preset name or a literal table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesSource {
    Preset(String),
    Explicit(Ruleset),
}

impl Default for RulesSource {
    fn default() -> Self {
        RulesSource::Preset("book".to_string())
    }
}

impl RulesSource {
    pub fn resolve(&self) -> Result<Ruleset, ConfigurationError> {
        match self {
            RulesSource::Preset(name) => Ruleset::preset(name),
            RulesSource::Explicit(ruleset) => Ok(ruleset.clone()),
        }
    }
}

impl From<&str> for RulesSource {
    fn from(name: &str) -> Self {
        RulesSource::Preset(name.to_string())
    }
}

impl From<Ruleset> for RulesSource {
    fn from(ruleset: Ruleset) -> Self {
        RulesSource::Explicit(ruleset)
    }
}
