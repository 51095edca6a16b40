//! Parsed résumé record — the parse stage's output artifact.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured résumé produced by the parse collaborator and persisted as a
/// JSON artifact.
///
/// The pipeline itself only ever looks at `name` (ranking labels); every
/// other section is carried opaquely. All fields are defaulted because the
/// extraction model omits sections that are absent from the source PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub education: Option<Value>,
    #[serde(default)]
    pub experience: Option<Value>,
    #[serde(default)]
    pub projects: Option<Value>,
    #[serde(default)]
    pub skills: Option<Value>,
    #[serde(default)]
    pub certifications: Option<Value>,
    #[serde(default)]
    pub awards: Option<Value>,
    #[serde(default)]
    pub volunteering: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ParsedResume {
    /// Candidate label for ranking output. `None` when the extracted name is
    /// missing or blank, in which case callers fall back to the filename.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
