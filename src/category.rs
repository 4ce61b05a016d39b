//! # Category Classifier
//!
//! Maps a free-text sentiment plus its (optional) original label to one of three
//! reporting buckets.
//!
//! Precedence, first hit wins:
//! 1. direct label match (case-insensitive, trimmed)
//! 2. keyword substring scan of the lower-cased text: Administration → Instruction → Facilities
//! 3. looser label match, only when a label is present
//! 4. `Administration`
//!
//! Keyword lists are plain substring matches, so short entries like `lab` also hit words
//! such as "available". The order above decides overlaps.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Administration")]
    Administration,
    #[serde(rename = "Instruction")]
    Instruction,
    #[serde(rename = "Physical Facilities & Equipment")]
    Facilities,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Administration,
        Category::Instruction,
        Category::Facilities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Administration => "Administration",
            Category::Instruction => "Instruction",
            Category::Facilities => "Physical Facilities & Equipment",
        }
    }

    /// Exact canonical label lookup.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN_KEYWORDS: &[&str] = &[
    "registrar",
    "guard",
    "security",
    "admin",
    "administration",
    "grade percentage",
    "grading percentage",
    "not enough rooms",
    "insufficient rooms",
    "room shortage",
];

const INSTRUCTION_KEYWORDS: &[&str] = &[
    "faculty",
    "professor",
    "teacher",
    "instructor",
    "subject",
    "late grade",
    "late grades",
    "grade delay",
    "doesn't attend",
    "does not attend",
    "not attending class",
    "missed classes",
];

const FACILITIES_KEYWORDS: &[&str] = &[
    "canteen",
    "classroom",
    "classrooms",
    "comfort room",
    "comfort rooms",
    "restroom",
    "restrooms",
    "toilet",
    "computers",
    "computer",
    "white board",
    "whiteboard",
    "equipment",
    "laboratory",
    "lab",
];

fn direct_label(label: &str) -> Option<Category> {
    match label {
        "faculty" | "subject" => Some(Category::Instruction),
        "facilities" | "it services" => Some(Category::Facilities),
        "academic support" | "registrar" | "administration" => Some(Category::Administration),
        _ => None,
    }
}

fn loose_label(label: &str) -> Option<Category> {
    match label {
        "it services" | "facilities" => Some(Category::Facilities),
        "faculty" | "subject" | "department" => Some(Category::Instruction),
        "academic support" | "registrar" | "administration" => Some(Category::Administration),
        _ => None,
    }
}

fn keyword_hit(text: &str) -> Option<Category> {
    let hits = |kws: &[&str]| kws.iter().any(|k| text.contains(k));
    if hits(ADMIN_KEYWORDS) {
        Some(Category::Administration)
    } else if hits(INSTRUCTION_KEYWORDS) {
        Some(Category::Instruction)
    } else if hits(FACILITIES_KEYWORDS) {
        Some(Category::Facilities)
    } else {
        None
    }
}

/// Resolve the canonical category for one row. Missing inputs behave as empty strings.
pub fn classify_category(text: Option<&str>, original_category: Option<&str>) -> Category {
    let text = text.unwrap_or_default().to_lowercase();
    let label = original_category.unwrap_or_default().trim().to_lowercase();

    if let Some(c) = direct_label(&label) {
        return c;
    }
    if let Some(c) = keyword_hit(&text) {
        return c;
    }
    if !label.is_empty() {
        if let Some(c) = loose_label(&label) {
            return c;
        }
    }
    Category::Administration
}
