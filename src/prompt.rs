//! Line-based prompts.
//!
//! [`TerminalPrompter`] prints a numbered candidate list and reads the
//! selection and confirmation from any `BufRead`, so the same code drives
//! stdin and tests. [`AutoPrompter`] answers for `--yes`.

use std::io::{self, BufRead, Write};

use yansi::Paint;

use crate::cleaner::{Confirmation, Prompter};
use crate::scanner::Candidate;

/// Interactive prompter over a reader/writer pair.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter on the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    /// Create a prompter reading answers from `input` and writing questions
    /// to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line. `None` at end of input.
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn select(&mut self, target: &str, candidates: &[Candidate]) -> io::Result<Vec<String>> {
        writeln!(
            self.output,
            "{}",
            format!("Select directories to remove {target} from").bold()
        )?;
        for (index, candidate) in candidates.iter().enumerate() {
            writeln!(
                self.output,
                "  {:>3}) {}  {}",
                (index + 1).cyan(),
                candidate.name.bold(),
                candidate.hint.dim()
            )?;
        }

        loop {
            write!(
                self.output,
                "Numbers or ranges (e.g. 1 3 5-7), 'all', or empty for none: "
            )?;
            self.output.flush()?;

            let Some(answer) = self.read_answer()? else {
                return Ok(Vec::new());
            };
            match parse_selection(&answer, candidates.len()) {
                Ok(indices) => {
                    return Ok(indices
                        .into_iter()
                        .map(|i| candidates[i].name.clone())
                        .collect())
                }
                Err(message) => writeln!(self.output, "{}", message.red())?,
            }
        }
    }

    fn confirm(&mut self, confirmation: &Confirmation) -> io::Result<bool> {
        loop {
            write!(self.output, "{} [Y/n] ", confirmation.message().bold())?;
            self.output.flush()?;

            let Some(answer) = self.read_answer()? else {
                return Ok(false);
            };
            match answer.to_ascii_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "{}", "Please answer y or n".red())?,
            }
        }
    }
}

/// Selects every candidate and confirms.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoPrompter;

impl Prompter for AutoPrompter {
    fn select(&mut self, _target: &str, candidates: &[Candidate]) -> io::Result<Vec<String>> {
        Ok(candidates.iter().map(|c| c.name.clone()).collect())
    }

    fn confirm(&mut self, confirmation: &Confirmation) -> io::Result<bool> {
        log::debug!("Auto-confirmed: {}", confirmation.message());
        Ok(true)
    }
}

/// Parse a selection answer into zero-based indices, in ascending order
/// without duplicates.
///
/// Accepts 1-based numbers and inclusive ranges separated by spaces or
/// commas, or `all`.
///
/// # Errors
///
/// Returns a message naming the first token that is not a number, range or
/// `all`, or that is out of range.
pub fn parse_selection(answer: &str, count: usize) -> Result<Vec<usize>, String> {
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") || answer == "*" {
        return Ok((0..count).collect());
    }

    let mut selected = vec![false; count];
    for token in answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (parse_index(start, count)?, parse_index(end, count)?),
            None => {
                let index = parse_index(token, count)?;
                (index, index)
            }
        };
        if start > end {
            return Err(format!("Invalid range: '{token}'"));
        }
        for flag in &mut selected[start..=end] {
            *flag = true;
        }
    }

    Ok(selected
        .iter()
        .enumerate()
        .filter_map(|(i, &chosen)| chosen.then_some(i))
        .collect())
}

fn parse_index(token: &str, count: usize) -> Result<usize, String> {
    let number: usize = token
        .trim()
        .parse()
        .map_err(|_| format!("Invalid selection: '{token}'"))?;
    if number == 0 || number > count {
        return Err(format!("Out of range: {number} (1-{count})"));
    }
    Ok(number - 1)
}
