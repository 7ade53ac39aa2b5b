//! Instructions sent to the model for summary plans and roadmaps.

use std::sync::LazyLock;

use regex::Regex;

use crate::intake::StudentProfile;
use crate::llm::ChatMessage;

use super::model::RoadmapSchema;

const PERSONA: &str = "You are Kai, a casual, friendly high school career guide. \
You ALWAYS return valid JSON. You ALWAYS return exactly 3 options in a `careers` array. \
You prioritize realistic, low-cost, local, or trade options when the student is unsure.";

const SUMMARY_SCHEMA: &str = r#"Output schema:
{
  "careers": [
    {
      "title": "string",
      "why_matched": "string",
      "path": "string",
      "alt_programs": ["string"],
      "difficulty": "easy" | "medium" | "stretch"
    }
  ]
}"#;

const SUMMARY_RULES: &str = "Generate 3 options. Make each one traceable to what the student said. \
If the student said 'music' or 'DJ', include one creative path. \
If the student said 'money' or 'trade', include at least one trade/licensed path. \
Return JSON only.";

static CREATIVE_INTEREST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(music|musicians?|dj|djing|art|arts|artists?|design|designers?|designing|film|filmmaking|videos?|youtube|youtubers?|tattoos?|tattooing|danc(e|er|ers|ing)|theat(er|re)|photos?|photography|perform(er|ers|ing|ance)?|sing|singer|singing|rap|rapper|rapping|producers?|producing)\b",
    )
    .expect("creative interest pattern is valid")
});

static MONEY_OR_TRADE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\$|\b(money|cash|good pay|pays? well|paying well|paid well|salary|trades?|electricians?|electrical|plumb(er|ers|ing)|weld(er|ers|ing)|hvac|mechanics?)\b)")
        .expect("money/trade pattern is valid")
});

/// Whether the profile mentions creative or performance interests.
pub fn mentions_creative(profile: &StudentProfile) -> bool {
    CREATIVE_INTEREST.is_match(&profile.combined_text())
}

/// Whether the profile mentions money or the trades.
pub fn mentions_money_or_trade(profile: &StudentProfile) -> bool {
    MONEY_OR_TRADE.is_match(&profile.combined_text())
}

/// Build the chat messages for a 3-career summary plan.
pub fn summary_messages(profile: &StudentProfile) -> Vec<ChatMessage> {
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());

    let mut rules = SUMMARY_RULES.to_string();
    if mentions_creative(profile) {
        rules.push_str("\nThis student mentioned a creative interest: at least one option MUST be a creative path.");
    }
    if mentions_money_or_trade(profile) {
        rules.push_str("\nThis student mentioned money or trades: at least one option MUST be a licensed trade.");
    }

    vec![
        ChatMessage::system(PERSONA),
        ChatMessage::system(SUMMARY_SCHEMA),
        ChatMessage::user(format!("Student profile:\n{profile_json}")),
        ChatMessage::user(rules),
    ]
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

const MONTHLY_SHAPE: &str = r#"{
  "career_title": "string",
  "start_from": "string",
  "college_targets": [
    {
      "name": "string",
      "type": "reach | target | safety",
      "why": "string"
    }
  ],
  "years": [
    {
      "label": "string",
      "milestones": ["string"],
      "months": [
        {
          "label": "string",
          "actions": [
            {
              "title": "string",
              "reason": "string",
              "difficulty": "low | medium | high",
              "calendar_suggested": true
            }
          ]
        }
      ]
    }
  ]
}"#;

const FLAT_SHAPE: &str = r#"{
  "career_title": "string",
  "start_from": "string",
  "college_targets": [
    {
      "name": "string",
      "type": "reach | target | safety",
      "why": "string"
    }
  ],
  "years": [
    {
      "label": "string",
      "courses": ["string"],
      "extracurriculars": ["string"],
      "projects": ["string"],
      "applications": ["string"]
    }
  ]
}"#;

/// Build the chat messages for a detailed roadmap.
pub fn roadmap_messages(
    profile: &StudentProfile,
    career_title: &str,
    schema: RoadmapSchema,
) -> Vec<ChatMessage> {
    let location = profile.location.as_deref().unwrap_or("");

    let requirements = match schema {
        RoadmapSchema::Monthly => "\
1. Start from the student's current level (use the grade string exactly).
2. First give YEAR-level structure (zoomed out).
3. Inside each year, give MONTH-level actions (zoomed in) for at least the next 6–12 months.
4. For each action, say how hard it is so the user can adjust it later.
5. Suggest 3–5 colleges/programs that match the career and the student's preferences. Label each as reach / target / safety and say why.
6. Mark which actions are good to \"add to calendar\" (deadlines, apps, tests).
7. If the student is already in college, skip high school years.",
        RoadmapSchema::Flat => "\
1. Start from the student's current level (use the grade string exactly).
2. Give one entry per school year with courses, extracurriculars, projects, and applications.
3. Suggest 3–5 colleges/programs that match the career and the student's preferences. Label each as reach / target / safety and say why.
4. If the student is already in college, skip high school years.",
    };

    let shape = match schema {
        RoadmapSchema::Monthly => MONTHLY_SHAPE,
        RoadmapSchema::Flat => FLAT_SHAPE,
    };

    let prompt = format!(
        "You are Kai, an AI career planner.

Create a realistic, step-by-step roadmap for this student.

Student profile:
- grade: {grade}
- liked classes/clubs: {liked}
- strengths: {strengths}
- post-HS preference: {post_hs}
- priority: {priority}
- wildcard: {wildcard}
- location (if known): {location}

Target career: {career_title}

Requirements:
{requirements}

Return ONLY JSON in this exact shape:

{shape}",
        grade = or_unknown(&profile.grade),
        liked = or_unknown(&profile.liked_classes_clubs),
        strengths = or_unknown(&profile.strengths),
        post_hs = or_unknown(&profile.post_hs_preference),
        priority = or_unknown(&profile.priority),
        wildcard = or_unknown(&profile.wildcard),
        location = or_unknown(location),
    );

    vec![
        ChatMessage::system("You are Kai, an AI career planner."),
        ChatMessage::user(prompt),
    ]
}
