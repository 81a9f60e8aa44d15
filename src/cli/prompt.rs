use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented stdin shared by the shell and the one-shot commands.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Reads the next line; `None` at end of input.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }

    pub async fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        self.next_line().await
    }

    /// Asks with a default shown in brackets; an empty answer keeps it.
    pub async fn ask_with_default(
        &mut self,
        label: &str,
        default: &str,
    ) -> io::Result<Option<String>> {
        let label = if default.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{default}]: ")
        };
        Ok(self.ask(&label).await?.map(|answer| {
            let answer = answer.trim();
            if answer.is_empty() {
                default.to_string()
            } else {
                answer.to_string()
            }
        }))
    }
}
