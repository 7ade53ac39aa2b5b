//! Fixed plan used when no model is configured or generation fails.

use super::model::{CareerOption, CareerPlan};

/// The deterministic 3-career plan. Independent of the student's answers.
pub fn fallback_plan() -> CareerPlan {
    CareerPlan {
        careers: vec![
            CareerOption {
                title: "Software Developer".to_string(),
                why: "you said you like tech / problem-solving".to_string(),
                path: "BS in CS or IT, build projects, apply to internships".to_string(),
                example_programs: vec!["Virginia Tech CS".to_string(), "GMU CS".to_string()],
                difficulty: "medium".to_string(),
                category: Some("academic".to_string()),
            },
            CareerOption {
                title: "Electrician".to_string(),
                why: "hands-on, solid pay, shorter school".to_string(),
                path: "apprenticeship + cert at local CC".to_string(),
                example_programs: vec!["local community college".to_string()],
                difficulty: "medium".to_string(),
                category: Some("trade".to_string()),
            },
            CareerOption {
                title: "DJ / Music Tech".to_string(),
                why: "you said you like music / events".to_string(),
                path: "learn mixes, post on TikTok, do school events".to_string(),
                example_programs: vec![],
                difficulty: "medium".to_string(),
                category: Some("creative".to_string()),
            },
        ],
    }
}
