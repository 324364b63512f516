//! Batch conversion of many repositories
//!
//! Repositories run concurrently up to `repository_threads`; each one uses
//! the converter's own file-level pool. A failing repository is logged and
//! reported, never fatal to the batch.

use super::source::RepositoryLocation;
use super::stats::{BatchStats, RepositoryOutcome, RepositoryReport};
use crate::config::BatchConfig;
use crate::convert::RepoConverter;
use crate::error::{BatchError, ConversionError};
use crate::nbow::NbowDocument;
use crate::storage::{ObjectStore, write_atomic};
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct BatchTransformer {
    converter: RepoConverter,
    config: BatchConfig,
    bucket: Option<Arc<dyn ObjectStore>>,
    progress: Option<ProgressBar>,
}

impl std::fmt::Debug for BatchTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTransformer")
            .field("converter", &self.converter)
            .field("config", &self.config)
            .field("bucket", &self.bucket.as_ref().map(|b| b.uri().to_string()))
            .finish_non_exhaustive()
    }
}

impl BatchTransformer {
    pub fn new(converter: RepoConverter, config: BatchConfig) -> Self {
        Self {
            converter,
            config,
            bucket: None,
            progress: None,
        }
    }

    /// Mirror every written result to `bucket`
    ///
    /// The bucket then decides whether a result already exists.
    pub fn with_bucket(mut self, bucket: Arc<dyn ObjectStore>) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Advance `progress` once per finished repository
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Output path of `location` inside `output`: `nbow_<name>.json`
    pub fn prepare_filename(location: &RepositoryLocation, output: &Path) -> PathBuf {
        output.join(format!("nbow_{}.json", location.name()))
    }

    /// Convert every repository and persist the non-empty results
    ///
    /// Only problems with the output directory abort the batch; everything
    /// else ends up in the returned statistics.
    pub async fn transform(
        &self,
        repositories: Vec<RepositoryLocation>,
        output: &Path,
    ) -> Result<BatchStats, BatchError> {
        let start = Instant::now();
        std::fs::create_dir_all(output).map_err(|source| BatchError::OutputDir {
            path: output.to_path_buf(),
            source,
        })?;

        tracing::info!(
            repositories = repositories.len(),
            output = %output.display(),
            threads = self.config.repository_threads,
            "starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.repository_threads.max(1)));
        let mut tasks = JoinSet::new();
        let mut reports = Vec::new();
        let mut claimed: HashMap<PathBuf, RepositoryLocation> = HashMap::new();

        for (position, location) in repositories.into_iter().enumerate() {
            // Two inputs must never share an output file
            let target = Self::prepare_filename(&location, output);
            if let Some(first) = claimed.get(&target) {
                reports.push((position, Self::duplicate_report(&location, first, target)));
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
                continue;
            }
            claimed.insert(target, location.clone());

            let semaphore = semaphore.clone();
            let transformer = self.clone();
            let output = output.to_path_buf();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let report = transformer.process_repository(&location, &output).await;
                if let Some(progress) = &transformer.progress {
                    progress.inc(1);
                }
                (position, report)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => reports.push(entry),
                Err(e) => tracing::error!("repository task failed: {e}"),
            }
        }
        reports.sort_by_key(|(position, _)| *position);

        let mut stats = BatchStats::default();
        for (_, report) in reports {
            stats.record(report);
        }
        stats.elapsed = start.elapsed();

        tracing::info!(
            written = stats.written,
            skipped = stats.skipped_existing,
            empty = stats.empty,
            failed = stats.failed,
            "batch finished in {:.2}s",
            stats.elapsed.as_secs_f64()
        );

        Ok(stats)
    }

    /// Report for an input whose output file is already taken by `first`
    fn duplicate_report(
        location: &RepositoryLocation,
        first: &RepositoryLocation,
        path: PathBuf,
    ) -> RepositoryReport {
        let outcome = if location.identifier() == first.identifier() {
            tracing::info!(repository = %location, "repository listed twice, skipping");
            RepositoryOutcome::SkippedExisting { path }
        } else {
            let reason = format!(
                "output {} is already produced by {first}",
                path.display()
            );
            tracing::error!(repository = %location, "skipping repository: {reason}");
            RepositoryOutcome::Failed { reason }
        };

        RepositoryReport {
            repository: location.to_string(),
            outcome,
            files: 0,
            elapsed: Duration::ZERO,
        }
    }

    async fn process_repository(
        &self,
        location: &RepositoryLocation,
        output: &Path,
    ) -> RepositoryReport {
        let start = Instant::now();
        let mut files = 0;
        let outcome = match self.convert_repository(location, output, &mut files).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::error!(repository = %location, "skipping repository: {reason}");
                RepositoryOutcome::Failed { reason }
            }
        };

        RepositoryReport {
            repository: location.to_string(),
            outcome,
            files,
            elapsed: start.elapsed(),
        }
    }

    async fn convert_repository(
        &self,
        location: &RepositoryLocation,
        output: &Path,
        files: &mut usize,
    ) -> Result<RepositoryOutcome, String> {
        let path = Self::prepare_filename(location, output);
        let key = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !self.config.overwrite && self.already_exists(&path, &key) {
            tracing::info!(repository = %location, output = %path.display(), "result exists, skipping");
            return Ok(RepositoryOutcome::SkippedExisting { path });
        }

        let to_checkout = location.clone();
        let checkout = tokio::task::spawn_blocking(move || to_checkout.checkout())
            .await
            .map_err(|_| ConversionError::Cancelled.to_string())?
            .map_err(|e| e.to_string())?;

        let (vector, stats) = self
            .converter
            .convert_with_stats(checkout.path())
            .await
            .map_err(|e| e.to_string())?;
        *files = stats.files_seen;

        if vector.is_empty() {
            tracing::warn!(repository = %location, "no usable tokens, nothing written");
            return Ok(RepositoryOutcome::Empty);
        }

        let entries = vector.len();
        let document = NbowDocument::new(
            location.identifier(),
            self.converter.vocabulary().id(),
            self.converter.docfreq().id(),
            vector,
        );

        let bucket = self.bucket.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = document.to_bytes(&target)?;
            write_atomic(&target, &bytes)?;
            if let Some(bucket) = bucket {
                bucket.put(&key, &bytes)?;
            }
            Ok::<_, crate::error::PersistenceError>(())
        })
        .await
        .map_err(|_| ConversionError::Cancelled.to_string())?
        .map_err(|e| e.to_string())?;

        tracing::debug!(repository = %location, output = %path.display(), entries, "wrote result");
        Ok(RepositoryOutcome::Written { path, entries })
    }

    /// Whether the result is already where it has to end up
    ///
    /// With a bucket configured only the bucket copy counts, so a result
    /// whose upload failed is produced again on the next run.
    fn already_exists(&self, path: &Path, key: &str) -> bool {
        match &self.bucket {
            Some(bucket) => bucket.exists(key).unwrap_or_else(|e| {
                tracing::warn!(key, "cannot check bucket: {e}");
                false
            }),
            None => path.is_file(),
        }
    }
}
