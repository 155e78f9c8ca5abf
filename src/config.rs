//! Dump configuration and per-call overrides

use crate::error::ConfigurationError;
use crate::rules::RulesSource;
use serde::{Deserialize, Serialize};

/// How deep below depth 0 a dump may descend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum MaxDepth {
    #[default]
    Unbounded,
    Limit(usize),
}

impl MaxDepth {
    /// Whether children of a node rendered at `depth` may be visited
    pub fn allows_children_of(self, depth: usize) -> bool {
        match self {
            MaxDepth::Unbounded => true,
            MaxDepth::Limit(max) => max > depth,
        }
    }
}

impl From<Option<usize>> for MaxDepth {
    fn from(value: Option<usize>) -> Self {
        value.map_or(MaxDepth::Unbounded, MaxDepth::Limit)
    }
}

impl From<MaxDepth> for Option<usize> {
    fn from(value: MaxDepth) -> Self {
        match value {
            MaxDepth::Unbounded => None,
            MaxDepth::Limit(n) => Some(n),
        }
    }
}

/// Stored defaults for a [`crate::TreeDumper`]
///
/// In JSON, `maxdepth: null` means unbounded and `rules` is either a preset
/// name or a tag → options map with `"*"` as the wildcard. Unknown keys are
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Depth the starting node is rendered at
    pub depth: usize,
    pub maxdepth: MaxDepth,
    pub rules: RulesSource,
    /// Line width for wrapping, indentation included
    pub width: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig {
            depth: 0,
            maxdepth: MaxDepth::Unbounded,
            rules: RulesSource::default(),
            width: 80,
        }
    }
}

impl DumpConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: DumpConfig = serde_json::from_str(json)?;
        if config.width == 0 {
            return Err(ConfigurationError::InvalidWidth(config.width));
        }
        Ok(config)
    }
}

/// Per-call overrides; unset fields fall back to the dumper's [`DumpConfig`]
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub depth: Option<usize>,
    pub maxdepth: Option<MaxDepth>,
    pub rules: Option<RulesSource>,
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn maxdepth(mut self, maxdepth: MaxDepth) -> Self {
        self.maxdepth = Some(maxdepth);
        self
    }

    pub fn rules(mut self, rules: impl Into<RulesSource>) -> Self {
        self.rules = Some(rules.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{FormatSpec, Ruleset};

    #[test]
    fn test_defaults() {
        let config = DumpConfig::default();
        assert_eq!(config.depth, 0);
        assert_eq!(config.maxdepth, MaxDepth::Unbounded);
        assert_eq!(config.rules, RulesSource::Preset("book".into()));
        assert_eq!(config.width, 80);
    }

    #[test]
    fn test_from_json_with_explicit_rules() {
        let config = DumpConfig::from_json(
            r#"{"maxdepth": 2, "width": 60, "rules": {"*": {"recurse": true}}}"#,
        )
        .unwrap();
        assert_eq!(config.maxdepth, MaxDepth::Limit(2));
        assert_eq!(config.width, 60);
        assert_eq!(config.depth, 0);
        assert_eq!(
            config.rules,
            RulesSource::Explicit(Ruleset::new().wildcard(FormatSpec::recursive()))
        );
    }

    #[test]
    fn test_from_json_null_maxdepth_is_unbounded() {
        let config = DumpConfig::from_json(r#"{"maxdepth": null, "rules": "full"}"#).unwrap();
        assert_eq!(config.maxdepth, MaxDepth::Unbounded);
        assert_eq!(config.rules, RulesSource::Preset("full".into()));
    }

    #[test]
    fn test_from_json_rejects_unknown_keys_and_bad_rules() {
        assert!(matches!(
            DumpConfig::from_json(r#"{"max_depth": 2}"#),
            Err(ConfigurationError::Invalid(_))
        ));
        assert!(matches!(
            DumpConfig::from_json(r#"{"rules": 42}"#),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_zero_width() {
        assert!(matches!(
            DumpConfig::from_json(r#"{"width": 0}"#),
            Err(ConfigurationError::InvalidWidth(0))
        ));
        assert!(DumpConfig::from_json(r#"{"width": 1}"#).is_ok());
    }

    #[test]
    fn test_maxdepth_gate() {
        assert!(MaxDepth::Unbounded.allows_children_of(100));
        assert!(MaxDepth::Limit(2).allows_children_of(1));
        assert!(!MaxDepth::Limit(2).allows_children_of(2));
        assert!(!MaxDepth::Limit(0).allows_children_of(0));
    }
}
