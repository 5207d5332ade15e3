//! Letter command handlers

use super::{prompt, Session};
use crate::cli::LetterCommand;
use anyhow::Result;

/// Handle the letter command
pub fn handle(command: LetterCommand, session: &mut Session) -> Result<()> {
    match command {
        LetterCommand::Unlock { code } => unlock(session, code),
        LetterCommand::Status => {
            println!("{}", status_line(session.store().is_letter_unlocked()));
            Ok(())
        }
    }
}

fn unlock(session: &mut Session, code: Option<String>) -> Result<()> {
    if session.store().is_letter_unlocked() {
        println!("{}", status_line(true));
        return Ok(());
    }

    let code = match code {
        Some(code) => code,
        None => prompt("Code: ")?,
    };

    let gate = session.letter_gate();
    if gate.unlock(session.store_mut(), &code) {
        println!("💌 The letter is open.");
    } else {
        println!("That's not the code. Think of a special date.");
    }
    Ok(())
}

fn status_line(unlocked: bool) -> &'static str {
    if unlocked {
        "💌 The letter is unlocked."
    } else {
        "🔒 The letter is locked."
    }
}
