use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Answer to a question that may be asked for many files in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkChoice {
    #[default]
    Unknown,
    Yes,
    No,
    Always,
    Never,
    Abort,
}

impl BulkChoice {
    /// Always and Never answer every later question of the same kind.
    pub fn is_sticky(self) -> bool {
        matches!(self, Self::Always | Self::Never)
    }

    pub fn accepts(self) -> bool {
        matches!(self, Self::Yes | Self::Always)
    }

    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Self::Yes),
            "n" | "no" => Some(Self::No),
            "a" | "always" => Some(Self::Always),
            "v" | "never" => Some(Self::Never),
            "x" | "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionCategory {
    /// Image opened fine but EXIF has no usable timestamp.
    ExiflessImage,
    /// Video extension, but the container could not be read.
    UnreadableVideo,
}

/// The user asked to stop the whole run.
#[derive(Debug, Error)]
#[error("aborted by user")]
pub struct Aborted;

pub trait Prompt {
    fn ask(&mut self, message: &str) -> Result<BulkChoice>;
}

/// Remembered answers for one run.
#[derive(Debug, Default)]
pub struct DecisionCache {
    exifless_image: BulkChoice,
    unreadable_video: BulkChoice,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: DecisionCategory) -> BulkChoice {
        match category {
            DecisionCategory::ExiflessImage => self.exifless_image,
            DecisionCategory::UnreadableVideo => self.unreadable_video,
        }
    }

    /// Returns the sticky answer for `category`, or asks and remembers the new one.
    pub fn decide(
        &mut self,
        category: DecisionCategory,
        message: &str,
        prompt: &mut dyn Prompt,
    ) -> Result<BulkChoice> {
        let current = self.get(category);
        if current.is_sticky() {
            return Ok(current);
        }

        let choice = prompt.ask(message)?;
        match category {
            DecisionCategory::ExiflessImage => self.exifless_image = choice,
            DecisionCategory::UnreadableVideo => self.unreadable_video = choice,
        }
        Ok(choice)
    }
}

/// Line based prompt over any reader and writer.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl LinePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn ask(&mut self, message: &str) -> Result<BulkChoice> {
        loop {
            writeln!(self.output, "{message}")?;
            write!(
                self.output,
                "  [y]es / [n]o / [a]lways / ne[v]er / abort [x]: "
            )?;
            self.output.flush()?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("Failed to read answer")?;
            if read == 0 {
                writeln!(self.output)?;
                return Ok(BulkChoice::Unknown);
            }
            if let Some(choice) = BulkChoice::parse(&line) {
                return Ok(choice);
            }
            writeln!(self.output, "  Unrecognized answer: {}", line.trim())?;
        }
    }
}
