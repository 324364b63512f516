//! Repository → nBOW conversion
//!
//! Files are processed in parallel on the blocking pool, bounded by a
//! semaphore. Each file worker produces its own [`TokenCounts`]; the
//! converter folds them together as they complete, so no worker ever
//! touches shared mutable state. A file that fails or exceeds its timeout
//! simply contributes nothing.

use super::stats::{ConversionStats, FileOutcome};
use super::walker::FileWalker;
use crate::Settings;
use crate::config::ConversionConfig;
use crate::error::{ConversionError, ConversionResult, ParseError};
use crate::models::{FrequencyTable, VocabularyIndex};
use crate::nbow::{SparseVector, Weighter};
use crate::parsing::{ExtensionDetector, LanguageDetector, TreeSitterClient};
use crate::tokens::{IdentifierSplitter, SplitPolicy, TokenCounts, TokenExtractor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of processing one file
#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    outcome: FileOutcome,
    counts: TokenCounts,
    error: Option<String>,
}

impl FileReport {
    fn empty(path: PathBuf, outcome: FileOutcome, error: Option<String>) -> Self {
        Self {
            path,
            outcome,
            counts: TokenCounts::new(),
            error,
        }
    }
}

/// Converts one repository at a time into a sparse nBOW vector
///
/// The models are shared read-only; a converter can be cloned cheaply and
/// used from several tasks at once.
#[derive(Clone)]
pub struct RepoConverter {
    vocabulary: Arc<VocabularyIndex>,
    docfreq: Arc<FrequencyTable>,
    detector: Arc<dyn LanguageDetector>,
    extractor: TokenExtractor,
    walker: FileWalker,
    weighter: Weighter,
    config: Arc<ConversionConfig>,
}

impl std::fmt::Debug for RepoConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoConverter")
            .field("vocabulary", &self.vocabulary.id().short())
            .field("docfreq", &self.docfreq.id().short())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RepoConverter {
    pub fn new(
        vocabulary: Arc<VocabularyIndex>,
        docfreq: Arc<FrequencyTable>,
        detector: Arc<dyn LanguageDetector>,
        extractor: TokenExtractor,
        config: ConversionConfig,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            vocabulary,
            docfreq,
            detector,
            extractor,
            walker: FileWalker::new(config.clone()),
            weighter: Weighter::new(config.min_docfreq),
            config,
        }
    }

    /// Converter wired with the shipped collaborators: extension-based
    /// detection and tree-sitter parsing
    pub fn from_settings(
        settings: &Settings,
        vocabulary: Arc<VocabularyIndex>,
        docfreq: Arc<FrequencyTable>,
    ) -> Result<Self, regex::Error> {
        let policy = SplitPolicy::from_config(&settings.tokens)?;
        let extractor = TokenExtractor::new(
            Arc::new(TreeSitterClient::new()),
            IdentifierSplitter::new(policy),
        );

        Ok(Self::new(
            vocabulary,
            docfreq,
            Arc::new(ExtensionDetector::new(settings)),
            extractor,
            settings.conversion.clone(),
        ))
    }

    pub fn vocabulary(&self) -> &Arc<VocabularyIndex> {
        &self.vocabulary
    }

    pub fn docfreq(&self) -> &Arc<FrequencyTable> {
        &self.docfreq
    }

    /// Convert the repository rooted at `root`
    ///
    /// Fails only when the repository cannot be enumerated. An empty result
    /// is a valid outcome, not an error.
    pub async fn convert(&self, root: &Path) -> ConversionResult<SparseVector> {
        self.convert_with_stats(root)
            .await
            .map(|(vector, _)| vector)
    }

    pub async fn convert_with_stats(
        &self,
        root: &Path,
    ) -> ConversionResult<(SparseVector, ConversionStats)> {
        let (counts, mut stats) = self.count_tokens(root).await?;

        let vector = self.vectorize(&counts);
        stats.vector_entries = vector.len();
        stats.stop_timing();

        tracing::info!(
            repository = %root.display(),
            files = stats.files_seen,
            parsed = stats.files_parsed,
            failed = stats.files_failed,
            timed_out = stats.files_timed_out,
            entries = vector.len(),
            "converted repository in {:.2}s",
            stats.elapsed.as_secs_f64()
        );

        Ok((vector, stats))
    }

    /// Turn repository counts into the final vector
    ///
    /// Tokens unknown to the vocabulary are removed before weighting, so
    /// the remaining weights already have unit length.
    pub fn vectorize(&self, counts: &TokenCounts) -> SparseVector {
        let mut known = counts.clone();
        known.retain(|token| self.vocabulary.contains(token));

        let weights = self.weighter.weight(&known, &self.docfreq);
        SparseVector::from_weights(&weights, &self.vocabulary)
    }

    /// Enumerate, parse and count every file of the repository
    pub async fn count_tokens(
        &self,
        root: &Path,
    ) -> ConversionResult<(TokenCounts, ConversionStats)> {
        let mut stats = ConversionStats::new();

        let walker = self.walker.clone();
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || walker.walk(&walk_root))
            .await
            .map_err(|_| ConversionError::Cancelled)??;
        stats.files_seen = files.len();

        tracing::debug!(
            repository = %root.display(),
            files = files.len(),
            "enumerated repository"
        );

        let file_timeout = self.config.file_timeout();
        let semaphore = Arc::new(Semaphore::new(self.config.file_threads.max(1)));
        let mut workers = JoinSet::new();

        for path in files {
            let semaphore = semaphore.clone();
            let detector = self.detector.clone();
            let extractor = self.extractor.clone();

            workers.spawn(async move {
                // The permit lives in the async wrapper, so a hung parse
                // frees its slot as soon as the timeout fires
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return FileReport::empty(path, FileOutcome::Skipped, None),
                };
                process_file(path, detector, extractor, file_timeout).await
            });
        }

        let deadline = self
            .config
            .repository_timeout()
            .map(|budget| tokio::time::Instant::now() + budget);

        let mut counts = TokenCounts::new();
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, workers.join_next()).await
                {
                    Ok(next) => next,
                    Err(_) => {
                        stats.files_abandoned = workers.len();
                        tracing::warn!(
                            repository = %root.display(),
                            abandoned = stats.files_abandoned,
                            "repository time budget exhausted, continuing with partial counts"
                        );
                        workers.abort_all();
                        break;
                    }
                },
                None => workers.join_next().await,
            };

            let Some(joined) = next else { break };
            match joined {
                Ok(report) => {
                    let tokens = report.counts.total() as usize;
                    stats.record(report.outcome, tokens);
                    if let Some(error) = report.error {
                        stats.add_error(report.path, error);
                    }
                    counts.merge(report.counts);
                }
                Err(e) => {
                    tracing::warn!(repository = %root.display(), "file worker failed: {e}");
                    stats.record(FileOutcome::Failed, 0);
                }
            }
        }

        stats.distinct_tokens = counts.len();
        Ok((counts, stats))
    }
}

/// Read, detect and extract one file on the blocking pool under a hard timeout
async fn process_file(
    path: PathBuf,
    detector: Arc<dyn LanguageDetector>,
    extractor: TokenExtractor,
    timeout: Duration,
) -> FileReport {
    let worker_path = path.clone();
    let handle =
        tokio::task::spawn_blocking(move || extract_file(worker_path, &*detector, &extractor, timeout));

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            tracing::debug!(file = %path.display(), "parse worker panicked: {e}");
            FileReport::empty(path, FileOutcome::Failed, Some(e.to_string()))
        }
        Err(_) => {
            // The blocking thread is abandoned; its result is never read
            tracing::debug!(file = %path.display(), ?timeout, "parse timed out");
            FileReport::empty(
                path,
                FileOutcome::TimedOut,
                Some(format!("parse exceeded {timeout:?}")),
            )
        }
    }
}

fn extract_file(
    path: PathBuf,
    detector: &dyn LanguageDetector,
    extractor: &TokenExtractor,
    timeout: Duration,
) -> FileReport {
    let content = match std::fs::read(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(file = %path.display(), "unreadable file: {e}");
            return FileReport::empty(path, FileOutcome::Skipped, None);
        }
    };

    let Some(language) = detector.detect(&path, &content) else {
        return FileReport::empty(path, FileOutcome::Skipped, None);
    };

    let Ok(text) = std::str::from_utf8(&content) else {
        tracing::debug!(file = %path.display(), "{}", ParseError::InvalidUtf8);
        return FileReport::empty(path, FileOutcome::Skipped, None);
    };

    match extractor.try_extract(text, language, timeout) {
        Ok(tokens) => FileReport {
            counts: tokens.into_iter().collect(),
            path,
            outcome: FileOutcome::Parsed,
            error: None,
        },
        Err(e) => {
            tracing::debug!(file = %path.display(), %language, "parse failed: {e}");
            let outcome = if e.is_timeout() {
                FileOutcome::TimedOut
            } else {
                FileOutcome::Failed
            };
            FileReport::empty(path, outcome, Some(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseResult;
    use crate::parsing::{Language, ParsedTree, TreeParsingClient};
    use std::fs;
    use tempfile::TempDir;

    /// Treats every whitespace-separated word as an identifier
    struct WordClient;

    impl TreeParsingClient for WordClient {
        fn parse(
            &self,
            content: &str,
            language: Language,
            timeout: Duration,
        ) -> ParseResult<ParsedTree> {
            if content.contains("FAIL") {
                return Err(ParseError::Failure {
                    language,
                    reason: "scripted failure".to_string(),
                });
            }
            if content.contains("SLOW") {
                std::thread::sleep(timeout * 3);
            }
            let mut tree = ParsedTree::new(language, "module");
            for word in content.split_whitespace() {
                tree.push_identifier(ParsedTree::ROOT, "identifier", word);
            }
            Ok(tree)
        }
    }

    fn converter(configure: impl FnOnce(&mut ConversionConfig)) -> RepoConverter {
        let vocabulary = VocabularyIndex::from_tokens(["test", "user", "name"]).unwrap();
        let docfreq =
            FrequencyTable::from_counts(100, [("test", 10), ("user", 5), ("name", 20)]).unwrap();
        let mut config = ConversionConfig {
            file_timeout_ms: 200,
            ..ConversionConfig::default()
        };
        configure(&mut config);

        RepoConverter::new(
            Arc::new(vocabulary),
            Arc::new(docfreq),
            Arc::new(ExtensionDetector::default()),
            TokenExtractor::new(Arc::new(WordClient), IdentifierSplitter::default()),
            config,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_token_repository() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("main.py"), "test test").unwrap();

        let vector = converter(|_| {}).convert(temp_dir.path()).await.unwrap();
        assert_eq!(vector.len(), 1);
        assert_eq!(vector.get(0), Some(1.0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failures_are_absorbed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("good.py"), "user name").unwrap();
        fs::write(temp_dir.path().join("bad.py"), "FAIL test").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "test").unwrap();

        let (vector, stats) = converter(|_| {})
            .convert_with_stats(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(stats.files_seen, 3);
        assert_eq!(stats.files_parsed, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(vector.len(), 2);
        assert_eq!(vector.get(0), None);
        assert!((vector.norm() - 1.0).abs() < 1e-6);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_file_times_out_alone() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("slow.py"), "SLOW test").unwrap();
        fs::write(temp_dir.path().join("fast.py"), "user").unwrap();

        let (counts, stats) = converter(|c| c.file_timeout_ms = 50)
            .count_tokens(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(stats.files_timed_out, 1);
        assert_eq!(stats.files_parsed, 1);
        assert_eq!(counts.get("user"), 1);
        assert_eq!(counts.get("test"), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        let (vector, stats) = converter(|_| {})
            .convert_with_stats(temp_dir.path())
            .await
            .unwrap();
        assert!(vector.is_empty());
        assert_eq!(stats.files_seen, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_repository_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = converter(|_| {})
            .convert(&temp_dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Enumeration { .. }));
    }

    #[test]
    fn test_vectorize_drops_unknown_tokens() {
        let counts: TokenCounts = ["test", "unknown", "unknown"].into_iter().collect();
        let vector = converter(|_| {}).vectorize(&counts);
        assert_eq!(vector.len(), 1);
        assert_eq!(vector.get(0), Some(1.0));
    }
}
