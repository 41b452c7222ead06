use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A complete resume snapshot as edited by the form layer.
///
/// The pagination core only ever receives an immutable snapshot of this type
/// (wrapped in an `Arc` per revision). Every field defaults, so a client that
/// omits a section simply contributes nothing to the layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeDocument {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub personal_statement: String,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub projects: Vec<ProjectItem>,
    pub achievements: Vec<AchievementItem>,
    pub certifications: Vec<CertificationItem>,
    pub languages: Vec<LanguageItem>,
    pub volunteer: Vec<VolunteerItem>,
    pub publications: Vec<PublicationItem>,
    pub references: Vec<ReferenceItem>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub headline: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
}

impl PersonalInfo {
    /// Contact fields in display order, blanks removed.
    pub fn contact_fields(&self) -> Vec<&str> {
        [
            &self.email,
            &self.phone,
            &self.location,
            &self.website,
            &self.linkedin,
        ]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
    }
}

/// Item ids are assigned once at creation and never rewritten by edits.
/// Pagination tracks which page owns which entry through them, so `id` is the
/// one field a client must always send: an entry without it fails to parse
/// instead of being given a fresh id the client has never seen.
fn new_item_id() -> Uuid {
    Uuid::new_v4()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub id: Uuid,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl Default for ExperienceItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            position: String::new(),
            company: String::new(),
            location: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
            description: String::new(),
            achievements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub id: Uuid,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub description: String,
}

impl Default for EducationItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            degree: String::new(),
            institution: String::new(),
            location: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            gpa: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

impl Default for ProjectItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            description: String::new(),
            technologies: Vec::new(),
            link: String::new(),
            start_date: String::new(),
            end_date: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementItem {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl Default for AchievementItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            title: String::new(),
            description: String::new(),
            date: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub credential_id: String,
}

impl Default for CertificationItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            issuer: String::new(),
            date: String::new(),
            credential_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub proficiency: String,
}

impl Default for LanguageItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            proficiency: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerItem {
    pub id: Uuid,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

impl Default for VolunteerItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            role: String::new(),
            organization: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationItem {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
}

impl Default for PublicationItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            title: String::new(),
            publisher: String::new(),
            date: String::new(),
            link: String::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub relationship: String,
}

impl Default for ReferenceItem {
    fn default() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            position: String::new(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            relationship: String::new(),
        }
    }
}

/// Formats a `start – end` range, treating `current` as an open end.
pub fn date_range(start: &str, end: &str, current: bool) -> String {
    let end = if current { "Present" } else { end.trim() };
    match (start.trim(), end) {
        ("", "") => String::new(),
        (s, "") => s.to_string(),
        ("", e) => e.to_string(),
        (s, e) => format!("{s} – {e}"),
    }
}
