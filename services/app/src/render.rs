//! services/app/src/render.rs
//!
//! Plain-text rendering of generated artifacts and stored records for the terminal.

use dream_path_core::{FlashCard, GamePair, GenerationResult, HistoryItem, Notebook, QuizQuestion, User};
use std::fmt::Write;

const PREVIEW_CHARS: usize = 80;

pub fn render_result(result: &GenerationResult) -> String {
    match result {
        // Lessons are markdown already.
        GenerationResult::Lesson(markdown) => markdown.clone(),
        GenerationResult::Flashcards(cards) => render_flashcards(cards),
        GenerationResult::Quiz(questions) => render_quiz(questions),
        GenerationResult::Game(pairs) => render_game(pairs),
    }
}

fn render_flashcards(cards: &[FlashCard]) -> String {
    let mut out = String::new();
    for (index, card) in cards.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, card.term);
        let _ = writeln!(out, "   {}", card.definition);
        if let Some(url) = &card.image_url {
            let _ = writeln!(out, "   image: {}", url);
        }
    }
    out
}

fn render_quiz(questions: &[QuizQuestion]) -> String {
    let mut out = String::new();
    for (index, question) in questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, question.question);
        for (letter, option) in ('a'..='z').zip(&question.options) {
            let _ = writeln!(out, "   {}) {}", letter, option);
        }
        out.push('\n');
    }
    out.push_str("Answer key:\n");
    for (index, question) in questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, question.correct_answer);
    }
    out
}

fn render_game(pairs: &[GamePair]) -> String {
    let mut out = String::new();
    for pair in pairs {
        let _ = writeln!(out, "{}  <->  {}", pair.term, pair.matched);
        if let Some(url) = &pair.image_url {
            let _ = writeln!(out, "   image: {}", url);
        }
    }
    out
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

pub fn render_notebooks(notebooks: &[Notebook]) -> String {
    if notebooks.is_empty() {
        return "No notebooks yet.".to_string();
    }
    let mut out = String::new();
    for notebook in notebooks {
        let _ = writeln!(
            out,
            "{}  {}  (updated {})",
            notebook.id,
            notebook.title,
            notebook.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

pub fn render_notebook(notebook: &Notebook) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", notebook.title);
    let _ = writeln!(out, "id: {}", notebook.id);
    if let Some(file_name) = &notebook.file_name {
        let _ = writeln!(out, "file: {}", file_name);
    }
    let _ = writeln!(out, "created: {}", notebook.created_at.to_rfc3339());
    let _ = writeln!(out, "updated: {}", notebook.updated_at.to_rfc3339());
    out.push('\n');
    out.push_str(&notebook.content);
    out
}

pub fn render_history(items: &[HistoryItem]) -> String {
    if items.is_empty() {
        return "No recent files.".to_string();
    }
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}  {}", index + 1, item.file_name, preview(&item.content));
    }
    out
}

pub fn render_user(user: &User) -> String {
    match &user.avatar_url {
        Some(avatar) => format!("{} <{}>\navatar: {}", user.name, user.email, avatar),
        None => format!("{} <{}>", user.name, user.email),
    }
}
