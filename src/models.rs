use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A trimmed, non-empty `(name, sex)` pair read from one CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub name: String,
    pub sex: String,
}

impl NameRecord {
    pub fn new(name: impl Into<String>, sex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sex: sex.into(),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::of(self)
    }
}

/// Identity of a record within one run: lowercased name plus the sex value the
/// store will hold, so two keys differ exactly when the persisted rows would.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn of(record: &NameRecord) -> Self {
        let sex = Sex::from_label(&record.sex).as_str();
        let mut key = String::with_capacity(record.name.len() + sex.len() + 1);
        key.push_str(&record.name.to_lowercase());
        key.push('|');
        key.push_str(sex);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The store's enumerated sex column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "boy" => Sex::Male,
            "f" | "female" | "girl" => Sex::Female,
            _ => Sex::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A persisted row of the names table
#[derive(Debug, Clone, Serialize)]
pub struct StoredName {
    pub id: u32,
    pub name: String,
    pub sex: Sex,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
