use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A foreign-key reference as returned by the backend.
///
/// The API sends related entities either as a bare id (`"project": 5`) or
/// expanded (`"project": {"id": 5, "name": "Apollo"}`). Both decode into the
/// same `Ref`, so nothing past the wire layer has to care which one arrived.
/// Serializing always writes the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
    pub id: u64,
    /// Display label carried by an expanded object, if any
    pub label: Option<String>,
}

impl Ref {
    pub fn new(id: u64) -> Self {
        Ref { id, label: None }
    }

    pub fn labeled(id: u64, label: impl Into<String>) -> Self {
        Ref {
            id,
            label: Some(label.into()),
        }
    }
}

impl From<u64> for Ref {
    fn from(id: u64) -> Self {
        Ref::new(id)
    }
}

impl Serialize for Ref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id)
    }
}

impl<'de> Deserialize<'de> for Ref {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Id(u64),
            Text(String),
            Object {
                id: u64,
                #[serde(default)]
                name: Option<String>,
                #[serde(default)]
                title: Option<String>,
                #[serde(default)]
                username: Option<String>,
            },
        }

        match Wire::deserialize(deserializer)? {
            Wire::Id(id) => Ok(Ref::new(id)),
            Wire::Text(text) => text
                .trim()
                .parse::<u64>()
                .map(Ref::new)
                .map_err(|_| de::Error::custom(format!("invalid reference id: {:?}", text))),
            Wire::Object {
                id,
                name,
                title,
                username,
            } => Ok(Ref {
                id,
                label: name.or(title).or(username),
            }),
        }
    }
}

/// Id → label lookup owned by a single view.
///
/// Filled from list responses (project names, task titles, usernames) and
/// from any labels carried on expanded references.
#[derive(Debug, Clone, Default)]
pub struct LabelCache {
    labels: HashMap<u64, String>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache with a fresh set of entries
    pub fn replace<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        self.labels = entries
            .into_iter()
            .map(|(id, label)| (id, label.into()))
            .collect();
    }

    pub fn insert(&mut self, id: u64, label: impl Into<String>) {
        self.labels.insert(id, label.into());
    }

    /// Record the label of an expanded reference (no-op for bare ids)
    pub fn absorb(&mut self, r: &Ref) {
        if let Some(label) = &r.label {
            self.labels.insert(r.id, label.clone());
        }
    }

    pub fn get(&self, id: u64) -> Option<&str> {
        self.labels.get(&id).map(|s| s.as_str())
    }

    /// Label for a reference: the cache first, then the reference's own
    /// label, then the raw id.
    pub fn display(&self, r: &Ref) -> String {
        self.get(r.id)
            .map(str::to_string)
            .or_else(|| r.label.clone())
            .unwrap_or_else(|| r.id.to_string())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
