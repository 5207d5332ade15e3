//! Quiz command handlers

use super::loot::format_loot;
use super::{prompt, random_source, Session};
use crate::cli::QuizCommand;
use anyhow::{bail, Result};
use keepsake::{Question, QuizOutcome};

/// Handle the quiz command
pub fn handle(command: QuizCommand, session: &mut Session) -> Result<()> {
    match command {
        QuizCommand::Questions => questions(session),
        QuizCommand::Take { answers, seed } => take(session, &answers, seed),
        QuizCommand::Stats => stats(session),
    }
}

fn questions(session: &Session) -> Result<()> {
    for (i, question) in session.question_bank().questions().iter().enumerate() {
        println!("{}. {}", i + 1, format_question(question));
    }
    Ok(())
}

fn take(session: &mut Session, raw_answers: &[String], seed: Option<u64>) -> Result<()> {
    let bank = session.question_bank();
    let questions = bank.questions();

    let answers = if raw_answers.is_empty() {
        let mut answers = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            println!("\n{}. {}", i + 1, format_question(question));
            let input = prompt("> ")?;
            answers.push(parse_answer(&input, question.choices.len()));
        }
        answers
    } else {
        if raw_answers.len() > questions.len() {
            bail!(
                "Got {} answers for {} questions",
                raw_answers.len(),
                questions.len()
            );
        }
        raw_answers
            .iter()
            .zip(questions)
            .map(|(raw, q)| parse_answer(raw, q.choices.len()))
            .collect()
    };

    let engine = session.loot_engine();
    let outcome = keepsake::complete_quiz(
        session.store_mut(),
        &engine,
        &bank,
        &answers,
        random_source(seed).as_mut(),
    );
    println!("\n{}", format_outcome(&outcome));
    Ok(())
}

fn stats(session: &Session) -> Result<()> {
    let stats = keepsake::quiz_stats(session.store());
    if stats.attempts == 0 {
        println!("No attempts yet.");
        return Ok(());
    }
    println!("Best score:    {}%", stats.best_score);
    println!("Attempts:      {}", stats.attempts);
    println!("Average score: {}%", stats.average_score);
    Ok(())
}

/// Turn a 1-based choice number into an answer index; anything else skips
fn parse_answer(input: &str, choices: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    n.checked_sub(1).filter(|&i| i < choices)
}

fn format_question(question: &Question) -> String {
    let mut out = question.question.clone();
    for (i, choice) in question.choices.iter().enumerate() {
        out.push_str(&format!("\n   {}) {}", i + 1, choice));
    }
    out
}

fn format_outcome(outcome: &QuizOutcome) -> String {
    let mut out = format!("{} Score: {}%", outcome.band.icon(), outcome.score);
    match &outcome.loot {
        Some(loot) => out.push_str(&format!("\nReward: {}", format_loot(loot))),
        None => out.push_str("\nNo reward this time."),
    }
    out
}
