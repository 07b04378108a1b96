//! Selectable amounts and resolutions offered to the user.

use serde::Serialize;

use crate::domain::{Amount, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptionEntry {
    pub value: &'static str,
    pub label: &'static str,
}

impl OptionEntry {
    const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

pub const AMOUNT_OPTIONS: &[OptionEntry] = &[
    OptionEntry::new("1", "1 Photo"),
    OptionEntry::new("2", "2 Photos"),
    OptionEntry::new("3", "3 Photos"),
    OptionEntry::new("4", "4 Photos"),
    OptionEntry::new("5", "5 Photos"),
];

pub const RESOLUTION_OPTIONS: &[OptionEntry] = &[
    OptionEntry::new("256x256", "256x256"),
    OptionEntry::new("512x512", "512x512"),
    OptionEntry::new("1024x1024", "1024x1024"),
];

/// Immutable set of allowed values. The first entry of each list is its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionCatalog {
    amounts: &'static [OptionEntry],
    resolutions: &'static [OptionEntry],
}

impl Default for OptionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl OptionCatalog {
    pub const fn standard() -> Self {
        Self {
            amounts: AMOUNT_OPTIONS,
            resolutions: RESOLUTION_OPTIONS,
        }
    }

    pub fn amounts(&self) -> &'static [OptionEntry] {
        self.amounts
    }

    pub fn resolutions(&self) -> &'static [OptionEntry] {
        self.resolutions
    }

    pub fn default_amount(&self) -> Amount {
        Amount::from_entry(&self.amounts[0])
    }

    pub fn default_resolution(&self) -> Resolution {
        Resolution::from_entry(&self.resolutions[0])
    }

    pub fn amount(&self, value: &str) -> Option<Amount> {
        lookup(self.amounts, value).map(Amount::from_entry)
    }

    pub fn resolution(&self, value: &str) -> Option<Resolution> {
        lookup(self.resolutions, value).map(Resolution::from_entry)
    }

    pub fn amount_label(&self, amount: Amount) -> &'static str {
        lookup(self.amounts, amount.value())
            .map(|entry| entry.label)
            .unwrap_or(amount.value())
    }

    pub fn resolution_label(&self, resolution: Resolution) -> &'static str {
        lookup(self.resolutions, resolution.value())
            .map(|entry| entry.label)
            .unwrap_or(resolution.value())
    }
}

fn lookup(entries: &'static [OptionEntry], value: &str) -> Option<&'static OptionEntry> {
    entries.iter().find(|entry| entry.value == value)
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
