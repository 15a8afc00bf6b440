//! crates/dream_path_core/src/domain.rs
//!
//! Defines the core data structures for the application: requests, generated
//! artifacts, users and notebooks. Artifact types carry the JSON field names the
//! completion provider is asked to produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Generation Inputs
//=========================================================================================

/// A fixed adaptation strategy controlling how a lesson is phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LearnerProfile {
    Adhd,
    NonNativeEnglish,
    Advanced,
}

impl LearnerProfile {
    pub const ALL: [LearnerProfile; 3] = [Self::Adhd, Self::NonNativeEnglish, Self::Advanced];

    /// The label shown to learners and embedded in lesson prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Adhd => "ADHD",
            Self::NonNativeEnglish => "Non-Native English",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for LearnerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects the prompt template and the expected shape of the provider output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMode {
    Lesson,
    Flashcards,
    Quiz,
    Game,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 4] = [Self::Lesson, Self::Flashcards, Self::Quiz, Self::Game];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lesson => "Adapted Lesson",
            Self::Flashcards => "Flash Cards",
            Self::Quiz => "Quiz",
            Self::Game => "Game",
        }
    }

    /// Whether artifacts of this mode get an image URL per item.
    pub fn is_illustrated(&self) -> bool {
        matches!(self, Self::Flashcards | Self::Game)
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single user submission. Created per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub content: String,
    pub profile: LearnerProfile,
    pub mode: GenerationMode,
    pub question: Option<String>,
    /// Set when the content came from an uploaded file or a saved notebook.
    pub file_name: Option<String>,
}

impl GenerationRequest {
    pub fn new(content: impl Into<String>, profile: LearnerProfile, mode: GenerationMode) -> Self {
        Self {
            content: content.into(),
            profile,
            mode,
            question: None,
            file_name: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

//=========================================================================================
// Generated Artifacts
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashCard {
    pub term: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuizQuestion {
    /// Exact string comparison against the correct answer.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePair {
    pub term: String,
    #[serde(rename = "match")]
    pub matched: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// The generated output of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GenerationResult {
    /// Markdown lesson body, exactly as returned by the provider.
    Lesson(String),
    Flashcards(Vec<FlashCard>),
    Quiz(Vec<QuizQuestion>),
    Game(Vec<GamePair>),
}

impl GenerationResult {
    pub fn mode(&self) -> GenerationMode {
        match self {
            Self::Lesson(_) => GenerationMode::Lesson,
            Self::Flashcards(_) => GenerationMode::Flashcards,
            Self::Quiz(_) => GenerationMode::Quiz,
            Self::Game(_) => GenerationMode::Game,
        }
    }
}

/// Counts how many answers match their question's correct answer.
/// Unanswered trailing questions count as wrong.
pub fn score_quiz(questions: &[QuizQuestion], answers: &[String]) -> usize {
    questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.is_correct(a))
        .count()
}

//=========================================================================================
// History
//=========================================================================================

/// A previously used (file name, content) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub file_name: String,
    pub content: String,
}

//=========================================================================================
// Users
//=========================================================================================

/// Represents a signed-in user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Free-form profile metadata captured at sign-up or provided by an identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl User {
    /// Builds the display identity: full name, then name, then the local part of
    /// the email, then the literal `"User"`.
    pub fn from_identity(id: Uuid, email: Option<&str>, metadata: &UserMetadata) -> Self {
        let email = email.unwrap_or_default().to_string();
        let name = non_blank(&metadata.full_name)
            .or_else(|| non_blank(&metadata.name))
            .or_else(|| email.split('@').next().filter(|local| !local.is_empty()))
            .unwrap_or("User")
            .to_string();
        let avatar_url = non_blank(&metadata.avatar_url)
            .or_else(|| non_blank(&metadata.picture))
            .map(str::to_string);

        Self {
            id,
            name,
            email,
            avatar_url,
        }
    }
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

//=========================================================================================
// Notebooks
//=========================================================================================

/// Prefix of ids minted by the local fallback store.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Identifier of a saved notebook. Backend ids are UUIDs; local ids carry a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotebookId(pub String);

impl NotebookId {
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for NotebookId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for NotebookId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NotebookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted document owned by a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotebook {
    pub title: String,
    pub content: String,
    pub file_name: Option<String>,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_name: Option<String>,
}

impl NotebookUpdate {
    pub fn apply_to(&self, notebook: &mut Notebook, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            notebook.title = title.clone();
        }
        if let Some(content) = &self.content {
            notebook.content = content.clone();
        }
        if let Some(file_name) = &self.file_name {
            notebook.file_name = Some(file_name.clone());
        }
        notebook.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name() {
        let metadata = UserMetadata {
            full_name: Some("Ada Lovelace".into()),
            name: Some("ada".into()),
            ..Default::default()
        };
        let user = User::from_identity(Uuid::nil(), Some("ada@example.com"), &metadata);
        assert_eq!(user.name, "Ada Lovelace");
    }

    #[test]
    fn display_name_falls_back_through_the_chain() {
        let named = UserMetadata {
            full_name: Some("  ".into()),
            name: Some("ada".into()),
            ..Default::default()
        };
        assert_eq!(User::from_identity(Uuid::nil(), None, &named).name, "ada");

        let empty = UserMetadata::default();
        let by_email = User::from_identity(Uuid::nil(), Some("grace@example.com"), &empty);
        assert_eq!(by_email.name, "grace");
        assert_eq!(by_email.email, "grace@example.com");

        let anonymous = User::from_identity(Uuid::nil(), None, &empty);
        assert_eq!(anonymous.name, "User");
        assert_eq!(anonymous.email, "");
    }

    #[test]
    fn avatar_falls_back_to_picture() {
        let metadata = UserMetadata {
            picture: Some("https://img.example/p.png".into()),
            ..Default::default()
        };
        let user = User::from_identity(Uuid::nil(), None, &metadata);
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example/p.png"));
    }

    #[test]
    fn game_pair_uses_match_key() {
        let pair: GamePair = serde_json::from_str(r#"{"term":"Cell","match":"Unit of life"}"#).unwrap();
        assert_eq!(pair.matched, "Unit of life");
        assert!(pair.image_url.is_none());

        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"term":"Cell","match":"Unit of life"}"#);
    }

    #[test]
    fn quiz_scoring_is_exact_match() {
        let question = QuizQuestion {
            question: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            correct_answer: "4".into(),
        };
        let questions = vec![question.clone(), question];
        assert_eq!(score_quiz(&questions, &["4".into(), "4 ".into()]), 1);
        assert_eq!(score_quiz(&questions, &["4".into()]), 1);
    }

    #[test]
    fn notebook_ids_distinguish_local_entries() {
        assert!(NotebookId::from("local_1700000000000").is_local());
        assert!(!NotebookId::from(Uuid::new_v4()).is_local());
    }
}
