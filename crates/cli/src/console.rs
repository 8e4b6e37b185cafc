//! Line-oriented prompts over any reader/writer pair.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

pub struct Console<R, W> {
    input: R,
    output: W,
    closed: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    /// `true` once the input has reached end of file.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        if self.closed {
            writeln!(self.output)?;
            return Ok(None);
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.closed = true;
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Free text, `default` when left empty.
    pub fn text_or(&mut self, prompt: &str, default: &str) -> io::Result<String> {
        Ok(self
            .ask(prompt)?
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// A number, `Ok(None)` when left empty, `Err` text when unparsable.
    pub fn number(&mut self, prompt: &str) -> io::Result<Result<Option<f64>, String>> {
        let answer = self.ask(prompt)?.unwrap_or_default();
        if answer.is_empty() {
            return Ok(Ok(None));
        }
        Ok(match answer.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(answer),
        })
    }

    /// A quantity, `default` when left empty or invalid.
    pub fn quantity_or(&mut self, prompt: &str, default: f64) -> io::Result<f64> {
        match self.number(prompt)? {
            Ok(value) => Ok(value.unwrap_or(default)),
            Err(_) => {
                self.say(format_args!(
                    "Please enter a valid number. Using default quantity of {default}."
                ))?;
                Ok(default)
            }
        }
    }

    /// Pick one of `labels` by its 1-based number.
    pub fn select(
        &mut self,
        heading: &str,
        labels: &[String],
        prompt: &str,
    ) -> io::Result<Option<usize>> {
        self.say(format_args!("\n{heading}"))?;
        for (i, label) in labels.iter().enumerate() {
            self.say(format_args!("{}. {label}", i + 1))?;
        }
        let answer = self.ask(prompt)?.unwrap_or_default();
        match answer.parse::<usize>() {
            Ok(n) if (1..=labels.len()).contains(&n) => Ok(Some(n - 1)),
            Ok(_) => {
                self.say("Invalid selection")?;
                Ok(None)
            }
            Err(_) => {
                self.say("Please enter a valid number")?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(input: &str) -> Console<&[u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn defaults_apply_to_empty_answers_and_end_of_input() {
        let mut c = console("\nDry Gin\n");
        assert_eq!(c.text_or("Name: ", "Whiskey").unwrap(), "Whiskey");
        assert_eq!(c.text_or("Name: ", "Whiskey").unwrap(), "Dry Gin");
        assert_eq!(c.text_or("Name: ", "Whiskey").unwrap(), "Whiskey");
        assert!(c.is_closed());
    }

    #[test]
    fn invalid_quantity_uses_default() {
        let mut c = console("lots\n7.5\n");
        assert_eq!(c.quantity_or("Qty: ", 10.0).unwrap(), 10.0);
        assert_eq!(c.quantity_or("Qty: ", 10.0).unwrap(), 7.5);
        let out = String::from_utf8(c.output).unwrap();
        assert!(out.contains("Using default quantity of 10."));
    }

    #[test]
    fn selection_is_one_based_and_bounded() {
        let labels = vec!["Gin".to_string(), "Rum".to_string()];
        let mut c = console("2\n3\nx\n");
        assert_eq!(c.select("Pick:", &labels, "> ").unwrap(), Some(1));
        assert_eq!(c.select("Pick:", &labels, "> ").unwrap(), None);
        assert_eq!(c.select("Pick:", &labels, "> ").unwrap(), None);
        let out = String::from_utf8(c.output).unwrap();
        assert!(out.contains("2. Rum"));
        assert!(out.contains("Invalid selection"));
        assert!(out.contains("Please enter a valid number"));
    }
}
