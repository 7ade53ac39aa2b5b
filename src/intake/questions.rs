//! Intake question sequence and the state transition function.
//!
//! A session's `current_state` counts the prompts already shown. The reply to
//! a submission is always the prompt for the state being left, so the
//! question on screen is one step behind the stored answer count.

use serde::{Deserialize, Serialize};

/// The fixed intake questions, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeQuestion {
    Grade,
    LikedClassesClubs,
    Strengths,
    PostHsPreference,
    Priority,
    Wildcard,
}

/// Number of intake questions.
pub const QUESTION_COUNT: usize = 6;

/// State returned once a plan has been produced.
pub const COMPLETED_STATE: u32 = QUESTION_COUNT as u32 + 1;

/// Reply sent together with the generated plan.
pub const COMPLETION_REPLY: &str = "ok based on what u said, here’s 3 paths you could actually do 👇";

impl IntakeQuestion {
    /// All questions in asking order.
    pub const ALL: [IntakeQuestion; QUESTION_COUNT] = [
        IntakeQuestion::Grade,
        IntakeQuestion::LikedClassesClubs,
        IntakeQuestion::Strengths,
        IntakeQuestion::PostHsPreference,
        IntakeQuestion::Priority,
        IntakeQuestion::Wildcard,
    ];

    /// Literal prompt text. Clients match on these strings; do not reword.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Grade => "yo 👋 I’m Kai. what grade are you in?",
            Self::LikedClassesClubs => "what classes/clubs u actually like?",
            Self::Strengths => "what are u good at — math, writing, people stuff, hands-on?",
            Self::PostHsPreference => "u thinking college, trade, military, or idk?",
            Self::Priority => "how important is $$ vs doing something fun?",
            Self::Wildcard => "any random thing u wanna try? (dj, youtuber, tattoo, music)",
        }
    }

    /// Zero-based position in the sequence.
    pub fn index(&self) -> usize {
        match self {
            Self::Grade => 0,
            Self::LikedClassesClubs => 1,
            Self::Strengths => 2,
            Self::PostHsPreference => 3,
            Self::Priority => 4,
            Self::Wildcard => 5,
        }
    }

    /// Position in the session's message list holding the answer.
    ///
    /// Index 0 holds the opening message that started the session.
    pub fn answer_index(&self) -> usize {
        self.index() + 1
    }

    pub fn from_index(index: usize) -> Option<IntakeQuestion> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for IntakeQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Grade => "grade",
            Self::LikedClassesClubs => "liked_classes_clubs",
            Self::Strengths => "strengths",
            Self::PostHsPreference => "post_hs_preference",
            Self::Priority => "priority",
            Self::Wildcard => "wildcard",
        };
        write!(f, "{s}")
    }
}

/// What a submission does to a session in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Store the answer, move to `next_state`, reply with `question`'s prompt.
    Ask {
        question: IntakeQuestion,
        next_state: u32,
    },
    /// All questions asked: build the profile and generate a plan.
    Complete,
}

/// Compute the transition for a session currently at `current_state`.
pub fn transition(current_state: u32) -> Transition {
    match IntakeQuestion::from_index(current_state as usize) {
        Some(question) => Transition::Ask {
            question,
            next_state: current_state + 1,
        },
        None => Transition::Complete,
    }
}

/// Prompt shown when a new session is opened.
pub fn opening_prompt() -> &'static str {
    IntakeQuestion::Grade.prompt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_match_fixed_sequence() {
        let prompts: Vec<&str> = IntakeQuestion::ALL.iter().map(|q| q.prompt()).collect();
        assert_eq!(
            prompts,
            vec![
                "yo 👋 I’m Kai. what grade are you in?",
                "what classes/clubs u actually like?",
                "what are u good at — math, writing, people stuff, hands-on?",
                "u thinking college, trade, military, or idk?",
                "how important is $$ vs doing something fun?",
                "any random thing u wanna try? (dj, youtuber, tattoo, music)",
            ]
        );
    }

    #[test]
    fn transition_walks_every_question() {
        // A new session starts at state 1 having already shown the first prompt.
        let mut state = 1;
        let mut asked = vec![opening_prompt()];
        while let Transition::Ask {
            question,
            next_state,
        } = transition(state)
        {
            assert_eq!(question.index() as u32, state, "reply lags the state by one");
            assert_eq!(next_state, state + 1);
            asked.push(question.prompt());
            state = next_state;
        }
        assert_eq!(state, QUESTION_COUNT as u32);
        // Grade is shown once on creation; the rest follow in order.
        assert_eq!(asked.len(), QUESTION_COUNT);
        assert_eq!(asked[5], IntakeQuestion::Wildcard.prompt());
    }

    #[test]
    fn transition_completes_at_and_past_last_question() {
        assert_eq!(transition(6), Transition::Complete);
        assert_eq!(transition(COMPLETED_STATE), Transition::Complete);
        assert_eq!(transition(99), Transition::Complete);
    }

    #[test]
    fn state_zero_asks_first_question() {
        assert_eq!(
            transition(0),
            Transition::Ask {
                question: IntakeQuestion::Grade,
                next_state: 1
            }
        );
    }

    #[test]
    fn answer_indices_are_one_based() {
        for (i, question) in IntakeQuestion::ALL.iter().enumerate() {
            assert_eq!(question.answer_index(), i + 1);
        }
    }

    #[test]
    fn display_matches_serde() {
        for question in IntakeQuestion::ALL {
            let display = format!("{question}");
            let json = serde_json::to_string(&question).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {question:?}"
            );
        }
    }
}
