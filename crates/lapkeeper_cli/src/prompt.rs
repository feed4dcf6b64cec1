//! Line-based prompts for the scan's missing categories and benchmarks.

use std::io::{self, BufRead, Write};

use lapkeeper_core::benchmark::{parse_lap_time_input, BenchmarkTimes};
use lapkeeper_core::models::Category;
use lapkeeper_core::orchestrator::InputProvider;

const MAX_ATTEMPTS: usize = 3;

/// Asks on `writer` and reads answers from `reader`.
///
/// An empty answer to the category prompt accepts the suggestion. An empty
/// answer to a time prompt, `skip`, or end of input declines.
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.writer, "{question}")?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_time(&mut self, label: &str, track: &str) -> Option<f64> {
        for _ in 0..MAX_ATTEMPTS {
            let answer = self.ask(&format!("  {label} benchmark for {track} (M:SS.mmm): ")).ok()??;
            if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
                return None;
            }
            match parse_lap_time_input(&answer) {
                Some(seconds) => return Some(seconds),
                None => {
                    let _ = writeln!(self.writer, "  '{answer}' is not a lap time between 0:30 and 10:00");
                }
            }
        }
        None
    }
}

impl<R: BufRead, W: Write> InputProvider for LinePrompt<R, W> {
    fn provide_category(&mut self, car: &str, suggested: Option<Category>) -> Option<Category> {
        let choices: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        let hint = suggested.map(|c| format!(" [{c}]")).unwrap_or_default();
        for _ in 0..MAX_ATTEMPTS {
            let question = format!("Car '{car}' has no category ({}){hint}: ", choices.join("/"));
            let answer = self.ask(&question).ok()??;
            if answer.eq_ignore_ascii_case("skip") {
                return None;
            }
            if answer.is_empty() {
                if suggested.is_some() {
                    return suggested;
                }
                continue;
            }
            match answer.parse::<Category>() {
                Ok(category) => return Some(category),
                Err(message) => {
                    let _ = writeln!(self.writer, "  {message}");
                }
            }
        }
        None
    }

    fn provide_benchmark(&mut self, category: Category, track: &str) -> Option<BenchmarkTimes> {
        let _ = writeln!(self.writer, "No {} benchmark for '{track}'.", category.name());
        let dry = self.ask_time("Dry", track)?;
        let wet = self.ask_time("Wet", track)?;
        Some(BenchmarkTimes::new(dry, wet))
    }
}

/// True when `yes` is set or the operator answers `y` on stdin.
pub fn confirm(question: &str, yes: bool) -> io::Result<bool> {
    if yes {
        return Ok(true);
    }
    let stdin = io::stdin();
    let mut prompt = LinePrompt::new(stdin.lock(), io::stderr());
    let answer = prompt.ask(&format!("{question} [y/N]: "))?;
    Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "YES")))
}
