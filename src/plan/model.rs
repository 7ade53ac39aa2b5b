//! Career plan models: the 3-option summary plan and the detailed roadmap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intake::StudentProfile;

/// One career option of a summary plan, in canonical field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerOption {
    pub title: String,
    pub why: String,
    pub path: String,
    pub example_programs: Vec<String>,
    /// "easy" | "medium" | "stretch" as produced by the model; not enforced.
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// The summary plan returned when intake completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerPlan {
    pub careers: Vec<CareerOption>,
}

/// Where a summary plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Generated,
    Fallback,
}

/// A persisted plan row. Never updated once written.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub owner: String,
    pub plan: CareerPlan,
    pub student_profile: StudentProfile,
    pub created_at: DateTime<Utc>,
}

impl PlanRecord {
    pub fn new(owner: &str, plan: CareerPlan, student_profile: StudentProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            plan,
            student_profile,
            created_at: Utc::now(),
        }
    }
}

// ── Roadmap ─────────────────────────────────────────────────────────

/// Career selected for a roadmap: a bare title or a plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CareerTarget {
    Title(String),
    Career { title: String },
}

impl CareerTarget {
    pub fn title(&self) -> &str {
        match self {
            Self::Title(title) | Self::Career { title } => title.trim(),
        }
    }
}

/// Which roadmap shape the model is asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoadmapSchema {
    /// Years broken into months of rated actions.
    #[default]
    Monthly,
    /// Deprecated year-only shape with course/activity lists.
    Flat,
}

impl std::str::FromStr for RoadmapSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "flat" | "legacy" => Ok(Self::Flat),
            other => Err(format!("unknown roadmap schema '{other}' (expected monthly or flat)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollegeTier {
    Reach,
    Target,
    Safety,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollegeTarget {
    pub name: String,
    #[serde(rename = "type")]
    pub tier: CollegeTier,
    #[serde(default)]
    pub why: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionDifficulty {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapAction {
    pub title: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub difficulty: ActionDifficulty,
    #[serde(default)]
    pub calendar_suggested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapMonth {
    pub label: String,
    #[serde(default)]
    pub actions: Vec<RoadmapAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyYear {
    pub label: String,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months: Vec<RoadmapMonth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatYear {
    pub label: String,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub extracurriculars: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub applications: Vec<String>,
}

/// Roadmap body shared by both schemas; only the year shape differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap<Y> {
    pub career_title: String,
    #[serde(default)]
    pub start_from: String,
    #[serde(default)]
    pub college_targets: Vec<CollegeTarget>,
    pub years: Vec<Y>,
}

/// Detailed plan for one career. Returned to the caller, not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DetailedPlan {
    Monthly(Roadmap<MonthlyYear>),
    Flat(Roadmap<FlatYear>),
}

impl DetailedPlan {
    pub fn career_title(&self) -> &str {
        match self {
            Self::Monthly(r) => &r.career_title,
            Self::Flat(r) => &r.career_title,
        }
    }

    pub fn start_from(&self) -> &str {
        match self {
            Self::Monthly(r) => &r.start_from,
            Self::Flat(r) => &r.start_from,
        }
    }

    pub(crate) fn set_start_from(&mut self, start_from: &str) {
        match self {
            Self::Monthly(r) => r.start_from = start_from.to_string(),
            Self::Flat(r) => r.start_from = start_from.to_string(),
        }
    }

    pub fn year_count(&self) -> usize {
        match self {
            Self::Monthly(r) => r.years.len(),
            Self::Flat(r) => r.years.len(),
        }
    }
}
