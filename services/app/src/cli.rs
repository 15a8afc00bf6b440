//! services/app/src/cli.rs
//!
//! Command-line surface of the `dreampath` binary and the dispatch of each command
//! against an `AppState`.

use crate::error::{AppError, AppResult};
use crate::ingest::ingest_file;
use crate::render;
use crate::state::AppState;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dream_path_core::domain::score_quiz;
use dream_path_core::{
    FileHistory, GamePair, GenerationMode, GenerationRequest, GenerationResult, LearnerProfile,
    MatchingGame, NotebookId, NotebookUpdate, PortError, QuizQuestion, Selection, User,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dreampath")]
#[command(version, about = "Adaptive lessons, flashcards, quizzes and games from your own material")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a learning artifact from a file, text, a notebook or a recent file
    Generate(GenerateArgs),
    /// Manage saved notebooks
    #[command(subcommand)]
    Notebooks(NotebookCommand),
    /// Show the signed-in user's recent files
    History,
    /// Sign up, sign in and out
    #[command(subcommand)]
    Auth(AuthCommand),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// A .txt or .pdf file; it is also saved as a notebook
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Lesson content given inline
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,
    /// A saved notebook
    #[arg(long, value_name = "ID")]
    pub notebook: Option<String>,
    /// A file from your recent history, by file name
    #[arg(long, value_name = "NAME")]
    pub recent: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, value_enum, default_value_t = ModeArg::Lesson)]
    pub mode: ModeArg,
    #[arg(long, value_enum, default_value_t = ProfileArg::Adhd)]
    pub profile: ProfileArg,
    /// A question answered after the lesson (lesson mode only)
    #[arg(long)]
    pub question: Option<String>,
    /// Play the quiz or the matching game interactively (quiz and game modes)
    #[arg(long)]
    pub play: bool,
}

#[derive(Subcommand, Debug)]
pub enum NotebookCommand {
    List,
    Show { id: String },
    Rename { id: String, title: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Lesson,
    Flashcards,
    Quiz,
    Game,
}

impl From<ModeArg> for GenerationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Lesson => GenerationMode::Lesson,
            ModeArg::Flashcards => GenerationMode::Flashcards,
            ModeArg::Quiz => GenerationMode::Quiz,
            ModeArg::Game => GenerationMode::Game,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileArg {
    Adhd,
    NonNativeEnglish,
    Advanced,
}

impl From<ProfileArg> for LearnerProfile {
    fn from(profile: ProfileArg) -> Self {
        match profile {
            ProfileArg::Adhd => LearnerProfile::Adhd,
            ProfileArg::NonNativeEnglish => LearnerProfile::NonNativeEnglish,
            ProfileArg::Advanced => LearnerProfile::Advanced,
        }
    }
}

//=========================================================================================
// Dispatch
//=========================================================================================

/// Runs one command and returns the text to print on stdout.
pub async fn execute(state: &AppState, command: Command) -> AppResult<String> {
    match command {
        Command::Generate(args) => generate(state, args).await,
        Command::Notebooks(cmd) => notebooks(state, cmd).await,
        Command::History => {
            let user = require_user(state).await?;
            let items = state.orchestrator.history_for(&user).await;
            Ok(render::render_history(&items))
        }
        Command::Auth(cmd) => auth(state, cmd).await,
    }
}

async fn require_user(state: &AppState) -> AppResult<User> {
    if state.auth.is_none() {
        return Err(AppError::Auth(
            "Accounts need a database; set DATABASE_URL to enable them".to_string(),
        ));
    }
    state
        .current_user()
        .await
        .ok_or_else(|| AppError::Auth("Please sign in first".to_string()))
}

async fn generate(state: &AppState, args: GenerateArgs) -> AppResult<String> {
    let user = state.current_user().await;
    let owner = user.as_ref().map(|u| u.id);
    let mode = GenerationMode::from(args.mode);
    let profile = LearnerProfile::from(args.profile);

    let source = args.source;
    let mut request = if let Some(path) = source.file {
        let ingested = ingest_file(state, &path, owner).await?;
        if let Some(notebook) = &ingested.notebook {
            info!(id = %notebook.id, "Saved as notebook");
        }
        GenerationRequest::new(ingested.content, profile, mode).with_file_name(ingested.file_name)
    } else if let Some(id) = source.notebook {
        let id = NotebookId(id);
        let notebook = state
            .notebooks
            .get(owner, &id)
            .await
            .ok_or_else(|| PortError::NotFound(format!("Notebook {} not found", id)))?;
        GenerationRequest::new(notebook.content, profile, mode).with_file_name(notebook.title)
    } else if let Some(name) = source.recent {
        let user = require_user(state).await?;
        let history = FileHistory::from_items(state.orchestrator.history_for(&user).await);
        let item = history
            .find(&name)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No recent file named {}", name)))?;
        GenerationRequest::new(item.content, profile, mode).with_file_name(item.file_name)
    } else {
        GenerationRequest::new(source.text.unwrap_or_default(), profile, mode)
    };

    if let Some(question) = args.question {
        request = request.with_question(question);
    }

    let result = state.orchestrator.submit(request, user.as_ref()).await?;

    match (&result, args.play) {
        (GenerationResult::Quiz(questions), true) => play_quiz(questions).await,
        (GenerationResult::Game(pairs), true) => play_game(pairs).await,
        _ => Ok(render::render_result(&result)),
    }
}

/// Asks each question on stdout and reads answers from stdin, by letter or full text.
async fn play_quiz(questions: &[QuizQuestion]) -> AppResult<String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        println!("{}. {}", index + 1, question.question);
        for (letter, option) in ('a'..='z').zip(&question.options) {
            println!("   {}) {}", letter, option);
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        answers.push(resolve_answer(question, line.trim()));
    }

    let score = score_quiz(questions, &answers);
    Ok(format!("You scored {} out of {}", score, questions.len()))
}

/// Maps a single letter to its option; anything else is taken as the answer text.
fn resolve_answer(question: &QuizQuestion, input: &str) -> String {
    let mut chars = input.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        let offset = (letter.to_ascii_lowercase() as u32).wrapping_sub('a' as u32) as usize;
        if let Some(option) = question.options.get(offset) {
            return option.clone();
        }
    }
    input.to_string()
}

/// Deals the shuffled deck and reads two card numbers per line until every pair is matched.
async fn play_game(pairs: &[GamePair]) -> AppResult<String> {
    if pairs.is_empty() {
        return Ok("Nothing to match".to_string());
    }
    let mut game = MatchingGame::new(pairs);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while !game.is_complete() {
        for (position, card) in game.cards().iter().enumerate() {
            let marker = if game.is_matched(card.id) { "*" } else { " " };
            println!("{}{:>3}. {}", marker, position + 1, card.content);
        }
        println!("Pick two cards, e.g. 1 4:");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some((first, second)) = parse_move(&line, game.cards().len()) else {
            println!("Enter two different card numbers.");
            continue;
        };
        let ids = (game.cards()[first].id, game.cards()[second].id);
        if game.is_matched(ids.0) || game.is_matched(ids.1) {
            println!("Already matched.");
            continue;
        }
        game.select(ids.0);
        match game.select(ids.1) {
            Selection::Matched { .. } => println!("Match!"),
            _ => println!("Not a pair."),
        }
    }

    Ok(game_summary(&game, pairs.len()))
}

/// Reads two distinct 1-based card positions and returns them 0-based.
fn parse_move(line: &str, deck_size: usize) -> Option<(usize, usize)> {
    let mut numbers = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().ok());
    let (Some(Some(first)), Some(Some(second)), None) =
        (numbers.next(), numbers.next(), numbers.next())
    else {
        return None;
    };
    let in_deck = |n: usize| (1..=deck_size).contains(&n);
    (first != second && in_deck(first) && in_deck(second)).then(|| (first - 1, second - 1))
}

fn game_summary(game: &MatchingGame, pair_count: usize) -> String {
    if game.is_complete() {
        format!("Matched all {} pairs in {} moves", pair_count, game.moves())
    } else {
        let matched = game
            .cards()
            .iter()
            .filter(|card| game.is_matched(card.id))
            .count()
            / 2;
        format!(
            "Stopped after {} moves with {} of {} pairs matched",
            game.moves(),
            matched,
            pair_count
        )
    }
}

async fn notebooks(state: &AppState, command: NotebookCommand) -> AppResult<String> {
    let owner = state.current_user().await.map(|u| u.id);
    match command {
        NotebookCommand::List => {
            let notebooks = state.notebooks.list(owner).await;
            Ok(render::render_notebooks(&notebooks))
        }
        NotebookCommand::Show { id } => {
            let id = NotebookId(id);
            let notebook = state
                .notebooks
                .get(owner, &id)
                .await
                .ok_or_else(|| PortError::NotFound(format!("Notebook {} not found", id)))?;
            Ok(render::render_notebook(&notebook))
        }
        NotebookCommand::Rename { id, title } => {
            let changes = NotebookUpdate {
                title: Some(title),
                ..Default::default()
            };
            let notebook = state
                .notebooks
                .update(owner, &NotebookId(id), changes)
                .await?;
            Ok(format!("Renamed {} to {}", notebook.id, notebook.title))
        }
        NotebookCommand::Delete { id } => {
            let id = NotebookId(id);
            state.notebooks.delete(owner, &id).await?;
            Ok(format!("Deleted {}", id))
        }
    }
}

async fn auth(state: &AppState, command: AuthCommand) -> AppResult<String> {
    let Some(manager) = &state.auth else {
        return Err(AppError::Auth(
            "Accounts need a database; set DATABASE_URL to enable them".to_string(),
        ));
    };
    match command {
        AuthCommand::Signup {
            email,
            password,
            name,
        } => {
            let user = manager.sign_up(&email, &password, name.as_deref()).await?;
            Ok(format!("Welcome, {}", user.name))
        }
        AuthCommand::Login { email, password } => {
            let user = manager.sign_in(&email, &password).await?;
            Ok(format!("Signed in as {}", render::render_user(&user)))
        }
        AuthCommand::Logout => {
            manager.sign_out().await?;
            Ok("Signed out".to_string())
        }
        AuthCommand::Whoami => Ok(match manager.current_user().await {
            Some(user) => render::render_user(&user),
            None => "Not signed in".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults_to_an_adhd_lesson() {
        let cli = Cli::try_parse_from(["dreampath", "generate", "--text", "Cells."]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.mode, ModeArg::Lesson);
        assert_eq!(args.profile, ProfileArg::Adhd);
        assert_eq!(args.source.text.as_deref(), Some("Cells."));
    }

    #[test]
    fn generate_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["dreampath", "generate"]).is_err());
        assert!(Cli::try_parse_from([
            "dreampath", "generate", "--text", "a", "--notebook", "b"
        ])
        .is_err());
    }

    #[test]
    fn profiles_use_kebab_case_names() {
        let cli = Cli::try_parse_from([
            "dreampath",
            "generate",
            "--recent",
            "cells.txt",
            "--profile",
            "non-native-english",
            "--mode",
            "quiz",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(LearnerProfile::from(args.profile), LearnerProfile::NonNativeEnglish);
        assert_eq!(GenerationMode::from(args.mode), GenerationMode::Quiz);
    }

    #[test]
    fn answers_resolve_by_letter_or_text() {
        let question = QuizQuestion {
            question: "q".into(),
            options: vec!["Water".into(), "Salt".into(), "Air".into(), "Iron".into()],
            correct_answer: "Air".into(),
        };
        assert_eq!(resolve_answer(&question, "c"), "Air");
        assert_eq!(resolve_answer(&question, "C"), "Air");
        assert_eq!(resolve_answer(&question, "Salt"), "Salt");
        assert_eq!(resolve_answer(&question, "z"), "z");
    }

    #[test]
    fn moves_are_two_distinct_card_numbers() {
        assert_eq!(parse_move("1 4", 4), Some((0, 3)));
        assert_eq!(parse_move(" 2, 3 ", 4), Some((1, 2)));
        assert_eq!(parse_move("2 2", 4), None);
        assert_eq!(parse_move("1 5", 4), None);
        assert_eq!(parse_move("0 1", 4), None);
        assert_eq!(parse_move("1", 4), None);
        assert_eq!(parse_move("1 2 3", 4), None);
        assert_eq!(parse_move("a b", 4), None);
    }

    #[test]
    fn game_summary_reports_progress() {
        let pairs = vec![
            GamePair {
                term: "H2O".into(),
                matched: "Water".into(),
                image_url: None,
            },
            GamePair {
                term: "NaCl".into(),
                matched: "Salt".into(),
                image_url: None,
            },
        ];
        let mut game = MatchingGame::unshuffled(&pairs);
        game.select(0);
        game.select(1);
        assert_eq!(
            game_summary(&game, 2),
            "Stopped after 1 moves with 1 of 2 pairs matched"
        );
        game.select(2);
        game.select(3);
        assert_eq!(game_summary(&game, 2), "Matched all 2 pairs in 2 moves");
    }

    #[test]
    fn play_is_accepted_in_game_mode() {
        let cli = Cli::try_parse_from([
            "dreampath", "generate", "--text", "Salts.", "--mode", "game", "--play",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.play);
        assert_eq!(GenerationMode::from(args.mode), GenerationMode::Game);
    }
}
