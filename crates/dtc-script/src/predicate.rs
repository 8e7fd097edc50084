//! Named remote predicates and live-state snapshots
//!
//! Predicates are target-specific data: a name plus a string argument
//! vector, evaluated by whoever executes the script against the cockpit's
//! most recently reported state. The builder never evaluates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of a remote boolean probe
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    /// Create a predicate name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Predicate name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Key under which the cockpit reports this probe for `args`
    ///
    /// `IsStationStore` with `["3", "AIM-120C"]` reports as
    /// `IsStationStore:3:AIM-120C`; without arguments the key is the bare name.
    #[must_use]
    pub fn state_key<S: AsRef<str>>(&self, args: &[S]) -> String {
        let mut key = self.0.clone();
        for arg in args {
            key.push(':');
            key.push_str(arg.as_ref());
        }
        key
    }
}

impl From<&str> for Predicate {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Predicate {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live-state value a builder wants fetched before building
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateQuery {
    /// Key the answer is stored under
    pub key: String,
    /// Remote probe to run
    pub predicate: Predicate,
    /// Probe arguments
    pub args: Vec<String>,
}

impl StateQuery {
    /// Create a query; the key is derived from the predicate and arguments
    #[must_use]
    pub fn new(predicate: impl Into<Predicate>, args: &[&str]) -> Self {
        let predicate = predicate.into();
        Self {
            key: predicate.state_key(args),
            predicate,
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Values fetched from the cockpit before building
///
/// Absent keys mean "unknown"; builders must then fall back to runtime
/// guards instead of assuming either answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    values: BTreeMap<String, String>,
}

impl TargetSnapshot {
    /// Empty snapshot (everything unknown)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value by key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Answer to a query, if it was fetched
    #[inline]
    #[must_use]
    pub fn answer(&self, query: &StateQuery) -> Option<&str> {
        self.get(&query.key)
    }

    /// Number of known values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_key_without_args() {
        let p = Predicate::new("IsCockpitPowered");
        assert_eq!(p.state_key::<&str>(&[]), "IsCockpitPowered");
    }

    #[test]
    fn state_key_with_args() {
        let p = Predicate::new("IsStationStore");
        assert_eq!(p.state_key(&["3", "AIM-120C"]), "IsStationStore:3:AIM-120C");
    }

    #[test]
    fn query_key_matches_predicate_key() {
        let q = StateQuery::new("StationStore", &["5"]);
        assert_eq!(q.key, "StationStore:5");
        assert_eq!(q.args, vec!["5".to_string()]);
    }

    #[test]
    fn snapshot_answers() {
        let q = StateQuery::new("StationStore", &["5"]);
        let snapshot = TargetSnapshot::new().with("StationStore:5", "GBU-12");
        assert_eq!(snapshot.answer(&q), Some("GBU-12"));
        assert_eq!(snapshot.get("StationStore:6"), None);
        assert_eq!(snapshot.len(), 1);
    }
}
