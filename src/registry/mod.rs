mod error;

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::portal::url::strip_url;

pub use error::{RegistryError, RegistryResult};

/// Seed data shipped with the crate, SEPTA and NJ Transit as published on 2022-02-03
const BUNDLED_SOURCES: &str = include_str!("../../data/sources.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Stops,
    Lines,
}

impl FromStr for DataKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stops" => Ok(DataKind::Stops),
            "lines" => Ok(DataKind::Lines),
            other => Err(RegistryError::InvalidKind(other.to_string())),
        }
    }
}

impl Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataKind::Stops => write!(f, "stops"),
            DataKind::Lines => write!(f, "lines"),
        }
    }
}

/// Bare dataset identifiers for one mode. Either half may be missing
/// while a caller is still building the entry up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetEntry {
    pub stops: Option<String>,
    pub lines: Option<String>,
}

impl DatasetEntry {
    pub fn get(&self, kind: DataKind) -> Option<&str> {
        match kind {
            DataKind::Stops => self.stops.as_deref(),
            DataKind::Lines => self.lines.as_deref(),
        }
    }

    fn slot_mut(&mut self, kind: DataKind) -> &mut Option<String> {
        match kind {
            DataKind::Stops => &mut self.stops,
            DataKind::Lines => &mut self.lines,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stops.is_some() && self.lines.is_some()
    }
}

/// One row of a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub mode: String,
    pub stops: String,
    pub lines: String,
    /// When the provider last republished the data, informational only
    #[serde(default)]
    pub published: Option<String>,
}

/// What [`Registry::add_or_update`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Inserted,
    Overwritten { previous: String },
}

/// Mode name to dataset identifiers, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(String, DatasetEntry)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled seed data
    pub fn seeded() -> RegistryResult<Self> {
        Self::from_json_str(BUNDLED_SOURCES)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading sources from {}", path.display());
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> RegistryResult<Self> {
        let seed: Vec<SeedEntry> = serde_json::from_str(data)?;
        Self::from_seed(seed)
    }

    pub fn from_seed(seed: impl IntoIterator<Item = SeedEntry>) -> RegistryResult<Self> {
        let mut registry = Self::new();

        for entry in seed {
            if registry.contains(&entry.mode) {
                return Err(RegistryError::DuplicateMode(entry.mode));
            }

            let stops = non_empty(&entry.mode, DataKind::Stops, &entry.stops)?;
            let lines = non_empty(&entry.mode, DataKind::Lines, &entry.lines)?;

            if let Some(published) = &entry.published {
                log::trace!("{} published {}", entry.mode, published);
            }

            registry.entries.push((
                entry.mode,
                DatasetEntry {
                    stops: Some(stops),
                    lines: Some(lines),
                },
            ));
        }

        Ok(registry)
    }

    /// All known modes, in the order they were added
    pub fn list_modes(&self) -> Vec<&str> {
        self.entries.iter().map(|(mode, _)| mode.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetEntry)> {
        self.entries.iter().map(|(mode, entry)| (mode.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, mode: &str) -> bool {
        self.entry(mode).is_some()
    }

    pub fn entry(&self, mode: &str) -> Option<&DatasetEntry> {
        self.entries
            .iter()
            .find(|(m, _)| m == mode)
            .map(|(_, entry)| entry)
    }

    /// Both identifiers for a mode, `(stops, lines)`, provided the entry is complete
    pub fn dataset(&self, mode: &str) -> RegistryResult<(&str, &str)> {
        let entry = self
            .entry(mode)
            .ok_or_else(|| RegistryError::UnknownMode(mode.to_string()))?;

        let missing = |kind| RegistryError::IncompleteEntry {
            mode: mode.to_string(),
            missing: kind,
        };
        let stops = entry.get(DataKind::Stops).ok_or_else(|| missing(DataKind::Stops))?;
        let lines = entry.get(DataKind::Lines).ok_or_else(|| missing(DataKind::Lines))?;

        Ok((stops, lines))
    }

    /// Add a stop or line dataset for a mode, or replace an existing one.
    ///
    /// `kind` must be `"stops"` or `"lines"`, anything else leaves the registry untouched.
    /// Full download URLs are reduced to their identifier before being stored.
    pub fn add_or_update(
        &mut self,
        mode: &str,
        kind: &str,
        identifier_or_url: &str,
    ) -> RegistryResult<Update> {
        let kind = kind.parse::<DataKind>()?;
        self.set(mode, kind, identifier_or_url)
    }

    pub fn set(
        &mut self,
        mode: &str,
        kind: DataKind,
        identifier_or_url: &str,
    ) -> RegistryResult<Update> {
        let code = non_empty(mode, kind, identifier_or_url)?;

        let index = match self.entries.iter().position(|(m, _)| m == mode) {
            Some(index) => index,
            None => {
                self.entries.push((mode.to_string(), DatasetEntry::default()));
                self.entries.len() - 1
            }
        };

        let slot = self.entries[index].1.slot_mut(kind);
        match slot.replace(code) {
            Some(previous) => {
                log::warn!("{} - {} already exists: overwriting {}", mode, kind, previous);
                Ok(Update::Overwritten { previous })
            }
            None => Ok(Update::Inserted),
        }
    }
}

fn non_empty(mode: &str, kind: DataKind, identifier_or_url: &str) -> RegistryResult<String> {
    let code = strip_url(identifier_or_url);
    if code.is_empty() {
        return Err(RegistryError::EmptyIdentifier {
            mode: mode.to_string(),
            kind,
        });
    }
    Ok(code.to_string())
}
