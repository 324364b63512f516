#![allow(dead_code)]

use repo2nbow::config::ConversionConfig;
use repo2nbow::error::{ParseError, ParseResult, PersistenceError, PersistenceResult};
use repo2nbow::parsing::{ExtensionDetector, Language, ParsedTree, TreeParsingClient};
use repo2nbow::storage::{LocalBucket, ObjectStore};
use repo2nbow::tokens::{IdentifierSplitter, TokenExtractor};
use repo2nbow::{FrequencyTable, RepoConverter, VocabularyIndex};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Repository on disk that disappears with the test
pub struct TestRepo {
    pub dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Word-per-identifier parser double
///
/// Every whitespace-separated word becomes an identifier node. Content is
/// scripted with markers:
/// - `FAIL` makes the parse fail
/// - `SLOW` sleeps for three times the timeout before answering
/// - `DELAY<ms>` sleeps for the given number of milliseconds first
#[derive(Debug, Default)]
pub struct ScriptedClient {
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TreeParsingClient for ScriptedClient {
    fn parse(&self, content: &str, language: Language, timeout: Duration) -> ParseResult<ParsedTree> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut tree = ParsedTree::new(language, "module");
        for word in content.split_whitespace() {
            match word {
                "FAIL" => {
                    return Err(ParseError::Failure {
                        language,
                        reason: "scripted failure".to_string(),
                    });
                }
                "SLOW" => std::thread::sleep(timeout * 3),
                _ => {
                    if let Some(ms) = word.strip_prefix("DELAY").and_then(|ms| ms.parse().ok()) {
                        std::thread::sleep(Duration::from_millis(ms));
                    } else {
                        tree.push_identifier(ParsedTree::ROOT, "identifier", word);
                    }
                }
            }
        }
        Ok(tree)
    }
}

pub const VOCABULARY: &[&str] = &["test", "user", "name", "load", "model", "path", "repo"];

/// Vocabulary whose index 0 is "test"
pub fn vocabulary() -> Arc<VocabularyIndex> {
    Arc::new(VocabularyIndex::from_tokens(VOCABULARY.iter().copied()).expect("valid vocabulary"))
}

/// 1000 documents; "test" appears in 10 of them
pub fn docfreq() -> Arc<FrequencyTable> {
    Arc::new(
        FrequencyTable::from_counts(
            1000,
            [
                ("test", 10),
                ("user", 40),
                ("name", 200),
                ("load", 25),
                ("model", 60),
                ("path", 300),
                ("repo", 15),
                ("unknown", 5),
            ],
        )
        .expect("valid docfreq"),
    )
}

pub fn test_config() -> ConversionConfig {
    ConversionConfig {
        file_threads: 4,
        file_timeout_ms: 500,
        ..ConversionConfig::default()
    }
}

pub fn scripted_converter(
    client: Arc<ScriptedClient>,
    configure: impl FnOnce(&mut ConversionConfig),
) -> RepoConverter {
    let mut config = test_config();
    configure(&mut config);
    RepoConverter::new(
        vocabulary(),
        docfreq(),
        Arc::new(ExtensionDetector::default()),
        TokenExtractor::new(client, IdentifierSplitter::default()),
        config,
    )
}

/// Write both models to `dir` in their on-disk formats
pub fn write_models(dir: &Path) -> (PathBuf, PathBuf) {
    let vocabulary = dir.join("vocabulary.txt");
    let docfreq = dir.join("docfreq.json");
    fs::write(&vocabulary, VOCABULARY.join("\n")).expect("write vocabulary");
    fs::write(
        &docfreq,
        r#"{"docs": 1000, "df": {"test": 10, "user": 40, "name": 200, "load": 25, "model": 60, "path": 300, "repo": 15}}"#,
    )
    .expect("write docfreq");
    (vocabulary, docfreq)
}

/// Local bucket whose uploads can be made to fail per key
#[derive(Debug)]
pub struct FlakyBucket {
    inner: LocalBucket,
    failing: Mutex<HashSet<String>>,
}

impl FlakyBucket {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalBucket::new(root),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every upload of `key` fail until [`FlakyBucket::heal`]
    pub fn fail(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

impl ObjectStore for FlakyBucket {
    fn uri(&self) -> &str {
        self.inner.uri()
    }

    fn exists(&self, key: &str) -> PersistenceResult<bool> {
        self.inner.exists(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> PersistenceResult<()> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(PersistenceError::Upload {
                bucket: self.uri().to_string(),
                key: key.to_string(),
                reason: "bucket unavailable".to_string(),
            });
        }
        self.inner.put(key, bytes)
    }

    fn get(&self, key: &str) -> PersistenceResult<Vec<u8>> {
        self.inner.get(key)
    }
}
