//! # Flags
//!
//! Posts carry a small set of named markers ("bookmark", "substantive", ...)
//! persisted as a single comma-joined column. In memory the set is a proper
//! value type; the delimited string exists only at the storage boundary.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Delimiter of the packed storage field.
pub const FLAG_SEPARATOR: char = ',';

/// The set of flag names a deployment recognizes.
///
/// The registry is the schema for the packed field: decoding drops any token
/// it does not know about, so state left behind by removed flags does not
/// survive the next write.
#[derive(Debug, Clone)]
pub struct FlagRegistry {
    names: Vec<String>,
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new(["bookmark", "substantive"])
    }
}

impl FlagRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    /// Registered flag names, in registration order.
    pub fn flags(&self) -> &[String] {
        &self.names
    }

    pub fn is_registered(&self, flag: &str) -> bool {
        self.names.iter().any(|n| n == flag)
    }

    fn ensure_registered(&self, flag: &str) -> Result<()> {
        if self.is_registered(flag) {
            Ok(())
        } else {
            Err(EngineError::InvalidFlag(flag.to_string()))
        }
    }

    /// Decodes a stored field value, dropping unknown tokens and duplicates.
    pub fn parse(&self, field: Option<&str>) -> FlagSet {
        let mut set = FlagSet::default();
        if let Some(raw) = field {
            for token in raw.split(FLAG_SEPARATOR) {
                let token = token.trim();
                if !token.is_empty() && self.is_registered(token) {
                    set.insert(token);
                }
            }
        }
        set
    }

    /// Whether `flag` is set in a stored field value.
    ///
    /// Fails with `InvalidFlag` for names outside the registry.
    pub fn is_flagged(&self, field: Option<&str>, flag: &str) -> Result<bool> {
        self.ensure_registered(flag)?;
        Ok(self.parse(field).contains(flag))
    }

    /// Parses `field`, then flips `flag`: removed when present, appended when
    /// absent. Unknown stored tokens do not survive the round trip.
    pub fn toggle(&self, field: Option<&str>, flag: &str) -> Result<FlagSet> {
        self.ensure_registered(flag)?;
        let mut set = self.parse(field);
        if !set.remove(flag) {
            set.insert(flag);
        }
        Ok(set)
    }
}

/// A deduplicated, insertion-ordered set of flag names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet {
    items: Vec<String>,
}

impl FlagSet {
    pub fn contains(&self, flag: &str) -> bool {
        self.items.iter().any(|f| f == flag)
    }

    /// Adds `flag` at the end of the set. Returns false when already present.
    pub fn insert(&mut self, flag: &str) -> bool {
        if self.contains(flag) {
            return false;
        }
        self.items.push(flag.to_string());
        true
    }

    /// Removes `flag`. Returns false when it was not set.
    pub fn remove(&mut self, flag: &str) -> bool {
        match self.items.iter().position(|f| f == flag) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Storage encoding: `None` when the set is empty, never `Some("")`.
    /// Callers distinguish "no flags" from an absent field.
    pub fn to_field(&self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FlagRegistry {
        FlagRegistry::default()
    }

    #[test]
    fn toggle_removes_then_appends() {
        let reg = registry();
        let removed = reg.toggle(Some("bookmark,substantive"), "bookmark").unwrap();
        assert_eq!(removed.to_field().as_deref(), Some("substantive"));

        // Re-addition appends, it is not reinserted at the original position.
        let added = reg
            .toggle(removed.to_field().as_deref(), "bookmark")
            .unwrap();
        assert_eq!(added.to_field().as_deref(), Some("substantive,bookmark"));
    }

    #[test]
    fn double_toggle_round_trips() {
        let reg = registry();
        let v = Some("substantive,bookmark");
        let once = reg.toggle(v, "bookmark").unwrap();
        let twice = reg.toggle(once.to_field().as_deref(), "bookmark").unwrap();
        // The toggled flag was last, so the exact string survives.
        assert_eq!(twice.to_field().as_deref(), v);
    }

    #[test]
    fn double_toggle_round_trips_as_set() {
        let reg = registry();
        let v = Some("bookmark,substantive");
        let normalized = reg.parse(v);
        let once = reg.toggle(v, "bookmark").unwrap();
        let twice = reg.toggle(once.to_field().as_deref(), "bookmark").unwrap();

        let mut a: Vec<&str> = twice.iter().collect();
        let mut b: Vec<&str> = normalized.iter().collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_drops_unregistered_and_duplicate_tokens() {
        let reg = registry();
        let set = reg.parse(Some("bookmark,ghost,bookmark, substantive ,"));
        assert_eq!(set.to_field().as_deref(), Some("bookmark,substantive"));
    }

    #[test]
    fn toggle_output_never_contains_unregistered_tokens() {
        let reg = registry();
        let set = reg.toggle(Some("ghost,bookmark"), "substantive").unwrap();
        assert!(!set.contains("ghost"));
        assert_eq!(
            set.to_field().as_deref(),
            Some("bookmark,substantive")
        );
    }

    #[test]
    fn toggling_unregistered_flag_fails_fast() {
        let reg = registry();
        let err = reg.toggle(Some("bookmark"), "ghost").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFlag(name) if name == "ghost"));

        let err = reg.is_flagged(None, "ghost").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFlag(_)));
    }

    #[test]
    fn empty_set_encodes_to_none() {
        let reg = registry();
        let set = reg.toggle(Some("bookmark"), "bookmark").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.to_field(), None);
    }

    #[test]
    fn is_flagged_reads_packed_field() {
        let reg = registry();
        assert!(reg.is_flagged(Some("bookmark,substantive"), "bookmark").unwrap());
        assert!(!reg.is_flagged(Some("substantive"), "bookmark").unwrap());
        assert!(!reg.is_flagged(None, "bookmark").unwrap());
    }

    #[test]
    fn registry_is_extensible_and_dedups_registration() {
        let reg = FlagRegistry::new(["bookmark", "starred", "bookmark"]);
        assert_eq!(reg.flags(), ["bookmark", "starred"]);
        assert!(reg.is_registered("starred"));
        assert!(!reg.is_registered("substantive"));
    }

    #[test]
    fn flag_set_serializes_as_plain_array() {
        let reg = registry();
        let set = reg.parse(Some("bookmark,substantive"));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!(["bookmark", "substantive"]));
    }
}
