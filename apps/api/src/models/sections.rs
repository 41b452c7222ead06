use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Section kinds
// ────────────────────────────────────────────────────────────────────────────

/// Every section kind the resume renderer knows how to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Summary,
    PersonalStatement,
    Experience,
    Education,
    Skills,
    Projects,
    Achievements,
    Certifications,
    Languages,
    Volunteer,
    Publications,
    References,
    Interests,
}

impl SectionKey {
    pub const ALL: [SectionKey; 13] = [
        SectionKey::Summary,
        SectionKey::PersonalStatement,
        SectionKey::Experience,
        SectionKey::Education,
        SectionKey::Skills,
        SectionKey::Projects,
        SectionKey::Achievements,
        SectionKey::Certifications,
        SectionKey::Languages,
        SectionKey::Volunteer,
        SectionKey::Publications,
        SectionKey::References,
        SectionKey::Interests,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Summary => "summary",
            SectionKey::PersonalStatement => "personal_statement",
            SectionKey::Experience => "experience",
            SectionKey::Education => "education",
            SectionKey::Skills => "skills",
            SectionKey::Projects => "projects",
            SectionKey::Achievements => "achievements",
            SectionKey::Certifications => "certifications",
            SectionKey::Languages => "languages",
            SectionKey::Volunteer => "volunteer",
            SectionKey::Publications => "publications",
            SectionKey::References => "references",
            SectionKey::Interests => "interests",
        }
    }

    /// Looks up a section by its wire id. Unknown ids yield `None`.
    #[cfg(test)]
    pub fn from_id(id: &str) -> Option<SectionKey> {
        SectionKey::ALL.into_iter().find(|k| k.as_str() == id)
    }

    /// Whether the section's entries may be divided across a page boundary.
    ///
    /// Scalar text and flat tag sections are only ever deferred whole.
    pub fn can_split(self) -> bool {
        matches!(
            self,
            SectionKey::Experience
                | SectionKey::Education
                | SectionKey::Projects
                | SectionKey::Achievements
                | SectionKey::Certifications
                | SectionKey::Volunteer
                | SectionKey::Publications
                | SectionKey::References
        )
    }

    pub fn default_title(self) -> &'static str {
        match self {
            SectionKey::Summary => "Professional Summary",
            SectionKey::PersonalStatement => "Personal Statement",
            SectionKey::Experience => "Work Experience",
            SectionKey::Education => "Education",
            SectionKey::Skills => "Skills",
            SectionKey::Projects => "Projects",
            SectionKey::Achievements => "Achievements",
            SectionKey::Certifications => "Certifications",
            SectionKey::Languages => "Languages",
            SectionKey::Volunteer => "Volunteer Experience",
            SectionKey::Publications => "Publications",
            SectionKey::References => "References",
            SectionKey::Interests => "Interests",
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section configuration & order
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: SectionKey,
    pub title: String,
    pub visible: bool,
    #[serde(default)]
    pub required: bool,
}

impl SectionConfig {
    fn standard(id: SectionKey) -> Self {
        Self {
            id,
            title: id.default_title().to_string(),
            visible: true,
            required: matches!(id, SectionKey::Summary | SectionKey::Experience),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SectionOrderError {
    #[error("section '{0}' appears more than once")]
    Duplicate(SectionKey),

    #[error("section '{0}' is required and cannot be hidden")]
    RequiredHidden(SectionKey),

    #[error("section '{0}' is not configured")]
    Unknown(SectionKey),

    #[error("reorder must list every configured section exactly once")]
    NotAPermutation,
}

/// User-chosen ordering and visibility of sections, independent of content.
///
/// Always a permutation of its configured ids; required sections stay visible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionOrder {
    sections: Vec<SectionConfig>,
}

impl SectionOrder {
    pub fn new(sections: Vec<SectionConfig>) -> Result<Self, SectionOrderError> {
        let mut seen = std::collections::HashSet::new();
        for section in &sections {
            if !seen.insert(section.id) {
                return Err(SectionOrderError::Duplicate(section.id));
            }
            if section.required && !section.visible {
                return Err(SectionOrderError::RequiredHidden(section.id));
            }
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[SectionConfig] {
        &self.sections
    }

    /// Visible section ids in display order.
    pub fn visible(&self) -> Vec<SectionKey> {
        self.sections
            .iter()
            .filter(|s| s.visible)
            .map(|s| s.id)
            .collect()
    }

    pub fn title_of(&self, key: SectionKey) -> &str {
        self.sections
            .iter()
            .find(|s| s.id == key)
            .map(|s| s.title.as_str())
            .unwrap_or_else(|| key.default_title())
    }

    pub fn set_visible(&mut self, key: SectionKey, visible: bool) -> Result<(), SectionOrderError> {
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.id == key)
            .ok_or(SectionOrderError::Unknown(key))?;
        if section.required && !visible {
            return Err(SectionOrderError::RequiredHidden(key));
        }
        section.visible = visible;
        Ok(())
    }

    /// Moves `key` to `to_index`, clamped to the end of the order.
    pub fn move_section(&mut self, key: SectionKey, to_index: usize) -> Result<(), SectionOrderError> {
        let from = self
            .sections
            .iter()
            .position(|s| s.id == key)
            .ok_or(SectionOrderError::Unknown(key))?;
        let section = self.sections.remove(from);
        let to = to_index.min(self.sections.len());
        self.sections.insert(to, section);
        Ok(())
    }

    /// Replaces the order wholesale. `keys` must be a permutation of the configured ids.
    pub fn reorder(&mut self, keys: &[SectionKey]) -> Result<(), SectionOrderError> {
        if keys.len() != self.sections.len() {
            return Err(SectionOrderError::NotAPermutation);
        }
        let mut remaining = self.sections.clone();
        let mut reordered = Vec::with_capacity(keys.len());
        for key in keys {
            let pos = remaining
                .iter()
                .position(|s| s.id == *key)
                .ok_or(SectionOrderError::NotAPermutation)?;
            reordered.push(remaining.swap_remove(pos));
        }
        self.sections = reordered;
        Ok(())
    }
}

impl Default for SectionOrder {
    fn default() -> Self {
        Self {
            sections: SectionKey::ALL.into_iter().map(SectionConfig::standard).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for SectionOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let sections = Vec::<SectionConfig>::deserialize(deserializer)?;
        SectionOrder::new(sections).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_contains_every_section_once() {
        let order = SectionOrder::default();
        assert_eq!(order.sections().len(), SectionKey::ALL.len());
        assert_eq!(order.visible().len(), SectionKey::ALL.len());
    }

    #[test]
    fn test_from_id_unknown_is_none() {
        assert_eq!(SectionKey::from_id("experience"), Some(SectionKey::Experience));
        assert_eq!(SectionKey::from_id("hobbies"), None);
    }

    #[test]
    fn test_required_section_cannot_be_hidden() {
        let mut order = SectionOrder::default();
        let err = order.set_visible(SectionKey::Experience, false).unwrap_err();
        assert_eq!(err, SectionOrderError::RequiredHidden(SectionKey::Experience));
        assert!(order.visible().contains(&SectionKey::Experience));
    }

    #[test]
    fn test_optional_section_can_be_hidden() {
        let mut order = SectionOrder::default();
        order.set_visible(SectionKey::Interests, false).unwrap();
        assert!(!order.visible().contains(&SectionKey::Interests));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dup = vec![
            SectionConfig::standard(SectionKey::Skills),
            SectionConfig::standard(SectionKey::Skills),
        ];
        assert_eq!(
            SectionOrder::new(dup).unwrap_err(),
            SectionOrderError::Duplicate(SectionKey::Skills)
        );
    }

    #[test]
    fn test_move_section_to_front() {
        let mut order = SectionOrder::default();
        order.move_section(SectionKey::Skills, 0).unwrap();
        assert_eq!(order.sections()[0].id, SectionKey::Skills);
        assert_eq!(order.sections().len(), SectionKey::ALL.len());
    }

    #[test]
    fn test_move_section_past_end_clamps() {
        let mut order = SectionOrder::default();
        order.move_section(SectionKey::Summary, 99).unwrap();
        assert_eq!(order.sections().last().unwrap().id, SectionKey::Summary);
    }

    #[test]
    fn test_reorder_requires_permutation() {
        let mut order = SectionOrder::new(vec![
            SectionConfig::standard(SectionKey::Summary),
            SectionConfig::standard(SectionKey::Skills),
        ])
        .unwrap();
        assert_eq!(
            order.reorder(&[SectionKey::Skills, SectionKey::Skills]),
            Err(SectionOrderError::NotAPermutation)
        );
        order
            .reorder(&[SectionKey::Skills, SectionKey::Summary])
            .unwrap();
        assert_eq!(order.visible(), vec![SectionKey::Skills, SectionKey::Summary]);
    }

    #[test]
    fn test_deserialize_rejects_hidden_required() {
        let json = r#"[{"id": "summary", "title": "Summary", "visible": false, "required": true}]"#;
        assert!(serde_json::from_str::<SectionOrder>(json).is_err());
    }

    #[test]
    fn test_title_falls_back_to_default() {
        let order = SectionOrder::new(vec![]).unwrap();
        assert_eq!(order.title_of(SectionKey::Skills), "Skills");
    }
}
