//! Data models for the ideate board.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target social-media platform for an idea.
///
/// Stored as lowercase text in the database; validated at the API boundary.
/// The set is closed because the share-intent builder only understands these
/// four networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
    Linkedin,
    Instagram,
}

impl Platform {
    /// All supported platforms, in display order.
    pub const ALL: [Platform; 4] = [
        Platform::Twitter,
        Platform::Reddit,
        Platform::Linkedin,
        Platform::Instagram,
    ];

    /// Canonical lowercase name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::Linkedin => "linkedin",
            Platform::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" => Ok(Platform::Twitter),
            "reddit" => Ok(Platform::Reddit),
            "linkedin" => Ok(Platform::Linkedin),
            "instagram" => Ok(Platform::Instagram),
            other => Err(format!(
                "unknown platform '{}' (expected one of: twitter, reddit, linkedin, instagram)",
                other
            )),
        }
    }
}

/// A single content idea tracked on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    /// Row identity.
    pub id: i32,
    /// Short headline for the idea. Never empty.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Target platform.
    pub platform: Platform,
    /// Creation timestamp, set once and never mutated.
    pub created_at_utc: DateTime<Utc>,
    /// Display rank; higher sorts first. Serialized as `order` on the wire
    /// for compatibility with the board client.
    #[serde(rename = "order")]
    pub sort_key: i32,
}

/// A free-text label shared across ideas.
///
/// Names are case-folded to lowercase before every lookup and insert, so two
/// inputs that agree after folding are the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

/// An idea hydrated with its full tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaWithTags {
    #[serde(flatten)]
    pub idea: Idea,
    /// Tags ordered by name.
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip() {
        for p in Platform::ALL {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
    }

    #[test]
    fn test_platform_parse_folds_case_and_whitespace() {
        assert_eq!(" Twitter ".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!("LINKEDIN".parse::<Platform>().unwrap(), Platform::Linkedin);
    }

    #[test]
    fn test_platform_parse_rejects_unknown() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(err.contains("myspace"));
    }

    #[test]
    fn test_platform_serde_lowercase() {
        let json = serde_json::to_string(&Platform::Reddit).unwrap();
        assert_eq!(json, "\"reddit\"");
        let back: Platform = serde_json::from_str("\"instagram\"").unwrap();
        assert_eq!(back, Platform::Instagram);
    }

    #[test]
    fn test_idea_serializes_sort_key_as_order() {
        let idea = Idea {
            id: 1,
            title: "Thread on borrow checker tips".to_string(),
            description: None,
            platform: Platform::Twitter,
            created_at_utc: Utc::now(),
            sort_key: 7,
        };
        let value = serde_json::to_value(&idea).unwrap();
        assert_eq!(value["order"], 7);
        assert!(value.get("sort_key").is_none());
    }

    #[test]
    fn test_idea_with_tags_flattens_idea_fields() {
        let full = IdeaWithTags {
            idea: Idea {
                id: 3,
                title: "Launch recap".to_string(),
                description: Some("numbers and lessons".to_string()),
                platform: Platform::Linkedin,
                created_at_utc: Utc::now(),
                sort_key: 0,
            },
            tags: vec![Tag {
                id: 1,
                name: "launch".to_string(),
            }],
        };
        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["platform"], "linkedin");
        assert_eq!(value["tags"][0]["name"], "launch");
    }
}
