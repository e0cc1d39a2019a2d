//! # Subsystem presence map.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Presence flag per named subsystem.
///
/// Starts with every expected name absent and always reflects the most
/// recent probe. Names outside the expected set are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubsystemStatus {
    flags: BTreeMap<String, bool>,
}

impl SubsystemStatus {
    /// Creates a map with every name marked absent.
    pub fn absent<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: names.into_iter().map(|n| (n.into(), false)).collect(),
        }
    }

    /// Sets the flag for a tracked name. Returns `false` if the name is not tracked.
    pub fn set(&mut self, name: &str, present: bool) -> bool {
        match self.flags.get_mut(name) {
            Some(flag) => {
                *flag = present;
                true
            }
            None => false,
        }
    }

    /// Copies flags for every name tracked by both maps.
    pub fn merge(&mut self, other: &SubsystemStatus) {
        for (name, present) in &other.flags {
            self.set(name, *present);
        }
    }

    /// Applies a probe result object (`{ name: bool }`).
    ///
    /// Tracked names missing from the object, or with a non-boolean value,
    /// are marked absent.
    pub fn apply_json(&mut self, systems: &Value) {
        for (name, flag) in self.flags.iter_mut() {
            *flag = systems.get(name).and_then(Value::as_bool).unwrap_or(false);
        }
    }

    /// Presence flag for `name`, if tracked.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Names currently marked absent, in name order.
    pub fn missing(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Number of subsystems currently present.
    pub fn present_count(&self) -> usize {
        self.flags.values().filter(|p| **p).count()
    }

    /// Number of tracked subsystems.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// True if no subsystems are tracked.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// True if every tracked subsystem is present (vacuously true when empty).
    pub fn all_present(&self) -> bool {
        self.flags.values().all(|p| *p)
    }
}
