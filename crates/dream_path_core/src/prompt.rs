//! crates/dream_path_core/src/prompt.rs
//!
//! Builds the exact instruction text sent to the completion provider for each
//! generation mode. Pure string construction.

use crate::domain::{GenerationMode, LearnerProfile};

pub const CONTENT_BEGIN: &str = "---BEGIN CONTENT---";
pub const CONTENT_END: &str = "---END CONTENT---";
pub const ANSWER_HEADING: &str = "### Answering Your Question";

const LESSON_PREAMBLE: &str = "You are an expert in inclusive education. Your task is to adapt the following academic/technical content for a specific learner profile. You must maintain 100% factual accuracy and must not remove, omit or distort any core concept.";

const FLASHCARDS_INSTRUCTIONS: &str = r#"Based on the following text, create 5-8 flashcards for studying. Each flashcard should have a "term" (the concept) and a "definition" (a clear explanation).

IMPORTANT: Return ONLY a JSON array, no other text. Format:
[
  {"term": "Concept 1", "definition": "Clear explanation of concept 1"},
  {"term": "Concept 2", "definition": "Clear explanation of concept 2"}
]

Content to create flashcards from:"#;

const QUIZ_INSTRUCTIONS: &str = r#"Based on the following text, create a 5-question multiple choice quiz. Each question must have exactly 4 options and one correct answer.

IMPORTANT: Return ONLY a JSON array, no other text. Format:
[
  {
    "question": "What is...?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": "Option A"
  }
]

The correctAnswer MUST exactly match one of the options.

Content to create quiz from:"#;

const GAME_INSTRUCTIONS: &str = r#"Based on the following text, create exactly 6 matching pairs for a memory game. Each pair should have a "term" and a "match" (definition or related concept).

IMPORTANT: Return ONLY a JSON array, no other text. Format:
[
  {"term": "Term 1", "match": "Definition or related concept 1"},
  {"term": "Term 2", "match": "Definition or related concept 2"}
]

Content to create matching game from:"#;

/// The adaptation instruction for a lesson prompt.
pub fn profile_instruction(profile: LearnerProfile) -> &'static str {
    match profile {
        LearnerProfile::Adhd => "Adapt for a learner with ADHD. Use short, concise sentences, bullet points, and clear headings. Emphasize key terms using bold formatting (e.g., **Keyword**). Create a strong visual hierarchy to make the content easily scannable.",
        LearnerProfile::NonNativeEnglish => "Adapt for a non-native English speaker. Simplify vocabulary, use plain English, and avoid complex sentence structures. Provide clear, step-by-step explanations for technical concepts.",
        LearnerProfile::Advanced => "Adapt for an advanced learner. Provide deeper conceptual and technical explanations. Connect concepts to real-world applications and introduce related advanced topics to encourage further exploration.",
    }
}

fn delimited(content: &str) -> String {
    format!("{CONTENT_BEGIN}\n{content}\n{CONTENT_END}")
}

fn question_section(question: &str) -> String {
    format!(
        "\nAdditionally, the student has a question: \"{question}\". Based *only* on the provided text, answer this question clearly and concisely. Frame the answer at the end of the adapted content under a heading '{ANSWER_HEADING}'.\n"
    )
}

fn lesson_prompt(profile: LearnerProfile, content: &str, question: Option<&str>) -> String {
    let question = question
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(question_section)
        .unwrap_or_default();
    format!(
        "{LESSON_PREAMBLE}\n\n**Learner Profile:** {}\n**Instructions:** {}\n{}\n**Original Content:**\n{}\n\n**Your Adapted Content (in Markdown):**",
        profile.label(),
        profile_instruction(profile),
        question,
        delimited(content),
    )
}

/// Builds the prompt for one request. The profile and question only shape lesson prompts.
///
/// User text is placed positionally and never re-scanned, so braces in the content or
/// the question reach the provider unchanged.
pub fn build_prompt(
    mode: GenerationMode,
    profile: LearnerProfile,
    content: &str,
    question: Option<&str>,
) -> String {
    let instructions = match mode {
        GenerationMode::Lesson => return lesson_prompt(profile, content, question),
        GenerationMode::Flashcards => FLASHCARDS_INSTRUCTIONS,
        GenerationMode::Quiz => QUIZ_INSTRUCTIONS,
        GenerationMode::Game => GAME_INSTRUCTIONS,
    };
    format!("{instructions}\n{}", delimited(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lesson_prompt_uses_profile_instruction() {
        let prompt = build_prompt(
            GenerationMode::Lesson,
            LearnerProfile::NonNativeEnglish,
            "Water boils at 100C.",
            None,
        );
        assert!(prompt.contains("**Learner Profile:** Non-Native English"));
        assert!(prompt.contains(profile_instruction(LearnerProfile::NonNativeEnglish)));
        assert!(prompt.contains("100% factual accuracy"));
        assert!(!prompt.contains(ANSWER_HEADING));
    }

    #[test]
    fn lesson_prompt_appends_question_under_heading() {
        let prompt = build_prompt(
            GenerationMode::Lesson,
            LearnerProfile::Advanced,
            "Water boils at 100C.",
            Some("Why does altitude matter?"),
        );
        assert!(prompt.contains("\"Why does altitude matter?\""));
        assert!(prompt.contains(ANSWER_HEADING));
        assert!(prompt.contains("Based *only* on the provided text"));
    }

    #[test]
    fn blank_question_is_ignored() {
        let with_blank = build_prompt(GenerationMode::Lesson, LearnerProfile::Adhd, "x", Some("  "));
        let without = build_prompt(GenerationMode::Lesson, LearnerProfile::Adhd, "x", None);
        assert_eq!(with_blank, without);
    }

    #[test]
    fn structured_modes_demand_json_arrays() {
        let flash = build_prompt(GenerationMode::Flashcards, LearnerProfile::Adhd, "c", None);
        assert!(flash.contains("5-8 flashcards"));
        assert!(flash.contains("\"definition\""));

        let quiz = build_prompt(GenerationMode::Quiz, LearnerProfile::Adhd, "c", None);
        assert!(quiz.contains("exactly 4 options"));
        assert!(quiz.contains("correctAnswer MUST exactly match"));

        let game = build_prompt(GenerationMode::Game, LearnerProfile::Adhd, "c", None);
        assert!(game.contains("exactly 6 matching pairs"));
        assert!(game.contains("\"match\""));

        for prompt in [flash, quiz, game] {
            assert!(prompt.contains("Return ONLY a JSON array"));
        }
    }

    #[test]
    fn placeholder_text_in_content_survives() {
        let content = "Use {profile} and {content} literally.";
        let prompt = build_prompt(GenerationMode::Lesson, LearnerProfile::Adhd, content, None);
        assert!(prompt.contains(content));
    }

    #[test]
    fn question_is_embedded_verbatim() {
        let question = "what is {content} under {heading}?";
        let prompt = build_prompt(
            GenerationMode::Lesson,
            LearnerProfile::Adhd,
            "UNIQUE_BODY",
            Some(question),
        );
        assert_eq!(prompt.matches("UNIQUE_BODY").count(), 1);
        assert!(prompt.contains(&format!("\"{question}\"")));
        assert_eq!(prompt.matches(ANSWER_HEADING).count(), 1);
    }

    proptest! {
        #[test]
        fn prompt_embeds_content_verbatim(content in "\\PC{1,200}", mode_index in 0usize..4, profile_index in 0usize..3) {
            let mode = GenerationMode::ALL[mode_index];
            let profile = LearnerProfile::ALL[profile_index];
            let prompt = build_prompt(mode, profile, &content, None);
            let expected = format!("{CONTENT_BEGIN}\n{content}\n{CONTENT_END}");
            prop_assert!(prompt.contains(&expected));
        }

        #[test]
        fn question_never_duplicates_content(question in "[a-z {}]{1,40}") {
            let prompt = build_prompt(GenerationMode::Lesson, LearnerProfile::Advanced, "UNIQUE_BODY", Some(&question));
            prop_assert_eq!(prompt.matches("UNIQUE_BODY").count(), 1);
        }
    }
}
