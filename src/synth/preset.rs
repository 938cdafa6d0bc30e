use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::param::ParamId;
use crate::{Error, Result};

/// A snapshot of parameter values.
///
/// Presets taken from a synth cover every [`ParamId`]; hand-built ones may
/// be partial, and loading those leaves the missing params untouched.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preset(BTreeMap<ParamId, f32>);

impl Preset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(id, value)` pairs, rejecting ids outside the id space.
    pub fn from_raw(values: impl IntoIterator<Item = (u8, f32)>) -> Result<Self> {
        values
            .into_iter()
            .map(|(raw, value)| Ok((ParamId::try_from(raw)?, value)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Preset)
    }

    pub fn to_raw(&self) -> Vec<(u8, f32)> {
        self.0.iter().map(|(&id, &value)| (id.into(), value)).collect()
    }

    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.0.get(&id).copied()
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        self.0.insert(id, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, f32)> + '_ {
        self.0.iter().map(|(&id, &value)| (id, value))
    }
}

impl FromIterator<(ParamId, f32)> for Preset {
    fn from_iter<I: IntoIterator<Item = (ParamId, f32)>>(iter: I) -> Self {
        Preset(iter.into_iter().collect())
    }
}

/// Named presets kept in memory.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct PresetBank {
    presets: BTreeMap<String, Preset>,
}

impl PresetBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store under `name`, returning the preset it replaced.
    pub fn insert(&mut self, name: impl Into<String>, preset: Preset) -> Option<Preset> {
        self.presets.insert(name.into(), preset)
    }

    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<Preset> {
        self.presets
            .remove(name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
