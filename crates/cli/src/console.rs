//! Terminal implementation of the notification surface.

use async_trait::async_trait;
use batch::{Confirm, Notifier};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prints progress on one line and asks confirmations on stdin.
pub struct ConsoleNotifier {
    /// Answer every prompt with `Continue` without asking
    assume_yes: bool,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn loading(&self, message: &str) {
        let mut stdout = std::io::stdout();
        // \x1b[K clears what is left of a longer previous line
        let _ = write!(stdout, "\r{} {}\x1b[K", "…".cyan(), message);
        let _ = stdout.flush();
    }

    fn success(&self, message: &str) {
        println!("\r{} {}\x1b[K", "✓".green(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("\r{} {}\x1b[K", "✗".red(), message.red());
    }

    async fn confirm(&self, prompt: &str) -> Confirm {
        if self.assume_yes {
            return Confirm::Continue;
        }

        print!("\r{} {} [Y/n] ", "?".yellow(), prompt);
        let _ = std::io::stdout().flush();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        match lines.next_line().await {
            Ok(Some(answer)) => parse_answer(&answer),
            // Closed or unreadable stdin: nobody can confirm
            _ => Confirm::Stop,
        }
    }
}

fn parse_answer(answer: &str) -> Confirm {
    match answer.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => Confirm::Continue,
        _ => Confirm::Stop,
    }
}
