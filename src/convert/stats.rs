//! Statistics collected while converting one repository

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum number of per-file errors kept for reporting
const MAX_ERRORS: usize = 100;

/// Why a file contributed no tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Parsed, tokens extracted
    Parsed,
    /// Unknown language, binary or unreadable content
    Skipped,
    /// The parser rejected the file
    Failed,
    /// Parsing exceeded the per-file timeout
    TimedOut,
}

#[derive(Debug, Default, Clone)]
pub struct ConversionStats {
    /// Files returned by the walker
    pub files_seen: usize,

    /// Files parsed successfully
    pub files_parsed: usize,

    /// Files with an unknown language or unreadable content
    pub files_skipped: usize,

    /// Files the parser rejected
    pub files_failed: usize,

    /// Files whose parse exceeded the per-file timeout
    pub files_timed_out: usize,

    /// Files still outstanding when the repository budget ran out
    pub files_abandoned: usize,

    /// Total identifier sub-tokens extracted
    pub tokens_extracted: u64,

    /// Distinct tokens before vocabulary filtering
    pub distinct_tokens: usize,

    /// Entries in the final vector
    pub vector_entries: usize,

    /// Time elapsed during conversion
    pub elapsed: Duration,

    /// Errors encountered (limited to the first `MAX_ERRORS`)
    pub errors: Vec<(PathBuf, String)>,

    start_time: Option<Instant>,
}

impl ConversionStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    /// Count one finished file
    pub fn record(&mut self, outcome: FileOutcome, tokens: usize) {
        match outcome {
            FileOutcome::Parsed => self.files_parsed += 1,
            FileOutcome::Skipped => self.files_skipped += 1,
            FileOutcome::Failed => self.files_failed += 1,
            FileOutcome::TimedOut => self.files_timed_out += 1,
        }
        self.tokens_extracted += tokens as u64;
    }

    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push((path, error));
        }
    }

    /// Whether every seen file has been accounted for
    pub fn is_complete(&self) -> bool {
        self.files_abandoned == 0
    }

    pub fn display(&self) {
        println!("\nConversion Complete:");
        println!("  Files seen: {}", self.files_seen);
        println!("  Files parsed: {}", self.files_parsed);
        println!("  Files skipped: {}", self.files_skipped);
        println!("  Files failed: {}", self.files_failed);
        println!("  Files timed out: {}", self.files_timed_out);
        if self.files_abandoned > 0 {
            println!("  Files abandoned: {}", self.files_abandoned);
        }
        println!("  Tokens extracted: {}", self.tokens_extracted);
        println!("  Distinct tokens: {}", self.distinct_tokens);
        println!("  Vector entries: {}", self.vector_entries);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.files_parsed > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.files_parsed as f64 / self.elapsed.as_secs_f64();
            println!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.errors.is_empty() {
            println!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (path, error) in &self.errors[..5.min(self.errors.len())] {
                println!("  {}: {}", path.display(), error);
            }
            if self.errors.len() > 5 {
                println!("  ... and {} more errors", self.errors.len() - 5);
            }
        }
    }
}
