//! CLI entry point for repository → nBOW conversion.
//!
//! Commands: transform (batch), convert (single repository), inspect,
//! config and init.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use repo2nbow::batch::{BatchTransformer, RepositoryLocation, expand_inputs};
use repo2nbow::display::{
    create_batch_progress, create_batch_table, create_document_table, with_spinner,
};
use repo2nbow::error::{ConversionError, ModelError};
use repo2nbow::io::{ExitCode, OutputFormat};
use repo2nbow::logging::{self, Verbosity};
use repo2nbow::storage::{open_bucket, write_atomic};
use repo2nbow::{FrequencyTable, NbowDocument, RepoConverter, Settings, VocabularyIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Repository to nBOW converter
#[derive(Parser)]
#[command(
    name = "repo2nbow",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert source repositories into normalized bag-of-words vectors",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Model and conversion overrides shared by `convert` and `transform`
#[derive(clap::Args)]
struct ConversionArgs {
    /// Vocabulary model (path or file:// URI)
    #[arg(long)]
    vocabulary: Option<String>,

    /// Document frequency model (path or file:// URI)
    #[arg(long)]
    docfreq: Option<String>,

    /// Files parsed concurrently per repository
    #[arg(long)]
    file_threads: Option<usize>,

    /// Per-file parse timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Time budget for one repository in seconds
    #[arg(long)]
    repository_timeout: Option<u64>,
}

impl ConversionArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(vocabulary) = &self.vocabulary {
            settings.models.vocabulary = Some(vocabulary.clone());
        }
        if let Some(docfreq) = &self.docfreq {
            settings.models.docfreq = Some(docfreq.clone());
        }
        if let Some(threads) = self.file_threads {
            settings.conversion.file_threads = threads;
        }
        if let Some(timeout) = self.timeout_ms {
            settings.conversion.file_timeout_ms = timeout;
        }
        if let Some(budget) = self.repository_timeout {
            settings.conversion.repository_timeout_secs = Some(budget);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Set up .repo2nbow directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Convert many repositories into one result file each
    #[command(
        after_help = "Inputs:\n  a directory           one repository (or each subdirectory with --nested)\n  a file                one repository location per line, # for comments\n  a URL                 cloned shallowly before conversion\n\nExamples:\n  repo2nbow transform ./repos --nested -o out\n  repo2nbow transform repos.txt -o out --threads 4 --progress"
    )]
    Transform {
        /// Repository directories, URLs or list files
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Repositories converted concurrently
        #[arg(short, long)]
        threads: Option<usize>,

        /// Regenerate results that already exist
        #[arg(long)]
        overwrite: bool,

        /// Treat each subdirectory of an input directory as a repository
        #[arg(long)]
        nested: bool,

        /// Also upload results to this bucket (file:// URI or directory)
        #[arg(long)]
        bucket: Option<String>,

        /// Show a progress bar
        #[arg(short, long)]
        progress: bool,

        #[command(flatten)]
        conversion: ConversionArgs,
    },

    /// Convert a single repository
    Convert {
        /// Repository directory or URL
        repository: String,

        /// Output directory (the file is named after the repository)
        #[arg(short, long, default_value = ".", conflicts_with = "file")]
        output: PathBuf,

        /// Exact output file path
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print the document to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        /// Print conversion statistics
        #[arg(long)]
        stats: bool,

        #[command(flatten)]
        conversion: ConversionArgs,
    },

    /// Show the metadata and heaviest entries of a result file
    Inspect {
        /// Result file written by convert or transform
        file: PathBuf,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 20)]
        top: usize,

        /// Vocabulary used to resolve indices to tokens
        #[arg(long)]
        vocabulary: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// How long exit waits for parse threads abandoned after a timeout
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::ConfigError.into();
        }
    };

    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet), settings.debug);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            return ExitCode::GeneralError.into();
        }
    };

    let result = runtime.block_on(run(cli, settings));
    // Dropping the runtime would wait for every abandoned blocking parse
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            for suggestion in suggestions(&e) {
                eprintln!("  - {suggestion}");
            }
            ExitCode::from_error(&e).into()
        }
    }
}

async fn run(cli: Cli, mut settings: Settings) -> anyhow::Result<ExitCode> {
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Init { force } => {
            let root = std::env::current_dir().context("cannot determine current directory")?;
            match Settings::init_config_file(&root, force) {
                Ok(path) => {
                    println!("Created configuration file at: {}", path.display());
                    println!("Edit this file to point [models] at your vocabulary and docfreq.");
                    Ok(ExitCode::Success)
                }
                Err(e) => {
                    eprintln!("{e}");
                    Ok(ExitCode::ConfigError)
                }
            }
        }

        Commands::Config => {
            let toml = toml::to_string_pretty(&settings).context("cannot render settings")?;
            println!("{toml}");
            Ok(ExitCode::Success)
        }

        Commands::Transform {
            inputs,
            output,
            threads,
            overwrite,
            nested,
            bucket,
            progress,
            conversion,
        } => {
            conversion.apply(&mut settings);
            if let Some(threads) = threads {
                settings.batch.repository_threads = threads;
            }
            settings.batch.overwrite |= overwrite;
            settings.batch.nested |= nested;
            if bucket.is_some() {
                settings.storage.bucket = bucket;
            }

            let converter = build_converter(&settings, show_progress)?;
            let repositories = expand_inputs(&inputs, settings.batch.nested)?;
            if repositories.is_empty() {
                tracing::warn!("no repositories to convert");
                return Ok(ExitCode::Success);
            }

            let mut transformer = BatchTransformer::new(converter, settings.batch.clone());
            if let Some(uri) = &settings.storage.bucket {
                transformer = transformer.with_bucket(open_bucket(uri)?);
            }
            let bar = (progress && show_progress)
                .then(|| create_batch_progress(repositories.len() as u64));
            if let Some(bar) = &bar {
                transformer = transformer.with_progress(bar.clone());
            }

            let stats = transformer.transform(repositories, &output).await?;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            if !cli.quiet {
                println!("{}", create_batch_table(&stats));
            }
            Ok(ExitCode::from_batch(&stats))
        }

        Commands::Convert {
            repository,
            output,
            file,
            stdout,
            stats: show_stats,
            conversion,
        } => {
            conversion.apply(&mut settings);
            let converter = build_converter(&settings, show_progress)?;
            let location = RepositoryLocation::parse(&repository);

            let to_checkout = location.clone();
            let checkout = tokio::task::spawn_blocking(move || to_checkout.checkout())
                .await
                .map_err(|_| ConversionError::Cancelled)??;

            let (vector, stats) = converter.convert_with_stats(checkout.path()).await?;
            if show_stats {
                stats.display();
            }

            if vector.is_empty() {
                eprintln!("No usable tokens in {location}; nothing written");
                return Ok(ExitCode::EmptyRepository);
            }

            let document = NbowDocument::new(
                location.identifier(),
                converter.vocabulary().id(),
                converter.docfreq().id(),
                vector,
            );

            if stdout {
                println!("{}", serde_json::to_string_pretty(&document)?);
                return Ok(ExitCode::Success);
            }

            let path =
                file.unwrap_or_else(|| BatchTransformer::prepare_filename(&location, &output));
            let bytes = document.to_bytes(&path)?;
            write_atomic(&path, &bytes)?;
            if let Some(uri) = &settings.storage.bucket {
                let key = file_key(&path);
                open_bucket(uri)?.put(&key, &bytes)?;
            }

            if !cli.quiet {
                println!(
                    "Wrote {} ({} entries)",
                    path.display(),
                    document.nbow.len()
                );
            }
            Ok(ExitCode::Success)
        }

        Commands::Inspect {
            file,
            top,
            vocabulary,
            json,
        } => {
            let document = NbowDocument::load(&file)?;

            if OutputFormat::from_json_flag(json).is_json() {
                println!("{}", serde_json::to_string_pretty(&document)?);
                return Ok(ExitCode::Success);
            }

            let source = vocabulary.or(settings.models.vocabulary);
            let vocabulary = source.and_then(|source| match VocabularyIndex::load(&source) {
                Ok(vocabulary) => Some(vocabulary),
                Err(e) => {
                    tracing::warn!("cannot resolve tokens: {e}");
                    None
                }
            });

            println!(
                "{}",
                create_document_table(&document, vocabulary.as_ref(), top)
            );
            Ok(ExitCode::Success)
        }
    }
}

/// Load both models and wire a converter from the settings
fn build_converter(settings: &Settings, show_progress: bool) -> anyhow::Result<RepoConverter> {
    let vocabulary_source = settings
        .models
        .vocabulary
        .as_deref()
        .ok_or(ModelError::Missing {
            model: "vocabulary",
        })?;
    let docfreq_source = settings
        .models
        .docfreq
        .as_deref()
        .ok_or(ModelError::Missing { model: "docfreq" })?;

    let (vocabulary, docfreq) = with_spinner(show_progress, "Loading models", || {
        Ok::<_, ModelError>((
            VocabularyIndex::load(vocabulary_source)?,
            FrequencyTable::load(docfreq_source)?,
        ))
    })?;

    tracing::info!(
        vocabulary = %vocabulary.id().short(),
        tokens = vocabulary.len(),
        docfreq = %docfreq.id().short(),
        docs = docfreq.docs(),
        "models loaded"
    );

    RepoConverter::from_settings(settings, Arc::new(vocabulary), Arc::new(docfreq))
        .context("invalid [tokens] delimiter")
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn suggestions(error: &anyhow::Error) -> Vec<&'static str> {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<ConversionError>() {
            return e.recovery_suggestions();
        }
        if let Some(e) = cause.downcast_ref::<ModelError>() {
            return e.recovery_suggestions();
        }
    }
    Vec::new()
}
