//! Person model shared by the leaderboard and duo screens
//!
//! Mirrors the backend's person record. Field names follow the backend wire
//! format (`schoolClass`, and the gender tag under the historical key `male`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::photo::PhotoPayload;

/// Backend identity of a person
pub type PersonId = i64;

/// Gender tag of a person
///
/// The backend stores the tag as the string `"male"` or `"female"`. Any other
/// value (including null) decodes as `Unknown`, which matches no gender tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Wire/path representation (`male`, `female`, `unknown`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    /// Parse a gender tag, case-insensitively
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Gender::parse).unwrap_or_default())
    }
}

/// A rankable person
///
/// `rating` is owned by the backend; the client only ever replaces a person
/// with a fresher copy from a response, it never adjusts the number itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub surname: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub school_class: String,

    #[serde(default)]
    pub rating: f64,

    #[serde(default, rename = "male")]
    pub gender: Gender,

    /// Absent in bulk roster listings
    #[serde(default)]
    pub photo: PhotoPayload,
}

impl Person {
    /// "name surname"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }

    /// "surname name", the leaderboard row label
    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.name).trim().to_string()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
