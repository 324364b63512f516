//! Conversion pipeline benchmarks
//!
//! Measures the three hot stages separately:
//! 1. Identifier splitting
//! 2. tf-idf weighting and vocabulary projection
//! 3. End-to-end conversion of a generated repository with real grammars

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use repo2nbow::{
    FrequencyTable, IdentifierSplitter, RepoConverter, Settings, SparseVector, TokenCounts,
    VocabularyIndex, Weighter,
};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "user", "name", "load", "model", "path", "repo", "parse", "token", "vector", "index", "file",
    "read", "write", "config", "error", "count", "weight", "split", "tree", "node",
];

fn identifiers(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let a = WORDS[i % WORDS.len()];
            let b = WORDS[(i * 7 + 3) % WORDS.len()];
            match i % 3 {
                0 => format!("{a}_{b}"),
                1 => format!("{a}{}", capitalize(b)),
                _ => format!("HTTP{}{}", capitalize(a), capitalize(b)),
            }
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn models() -> (Arc<VocabularyIndex>, Arc<FrequencyTable>) {
    let vocabulary = VocabularyIndex::from_tokens(WORDS.iter().copied()).unwrap();
    let docfreq = FrequencyTable::from_counts(
        100_000,
        WORDS
            .iter()
            .enumerate()
            .map(|(i, word)| (*word, (i as u64 + 1) * 500)),
    )
    .unwrap();
    (Arc::new(vocabulary), Arc::new(docfreq))
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let splitter = IdentifierSplitter::default();

    for size in [100, 1_000, 10_000] {
        let input = identifiers(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("identifiers", size), &input, |b, input| {
            b.iter(|| {
                for identifier in input {
                    black_box(splitter.split(identifier));
                }
            })
        });
    }
    group.finish();
}

fn bench_weight(c: &mut Criterion) {
    let mut group = c.benchmark_group("weight");
    let (vocabulary, docfreq) = models();
    let weighter = Weighter::default();
    let splitter = IdentifierSplitter::default();

    for size in [1_000, 50_000] {
        let counts: TokenCounts = identifiers(size)
            .iter()
            .flat_map(|identifier| splitter.split(identifier))
            .collect();
        group.bench_with_input(BenchmarkId::new("tfidf", size), &counts, |b, counts| {
            b.iter(|| {
                let weights = weighter.weight(black_box(counts), &docfreq);
                black_box(SparseVector::from_weights(&weights, &vocabulary))
            })
        });
    }
    group.finish();
}

fn generated_repository(files: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let names = identifiers(files * 4);
    for (i, chunk) in names.chunks(4).enumerate() {
        let body = chunk
            .iter()
            .map(|name| format!("def {name}(path, user_name):\n    return load_model(path)\n"))
            .collect::<String>();
        std::fs::write(dir.path().join(format!("module_{i}.py")), body).unwrap();
    }
    dir
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    group.sample_size(10);
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (vocabulary, docfreq) = models();
    let converter = RepoConverter::from_settings(&Settings::default(), vocabulary, docfreq).unwrap();

    for files in [10, 100] {
        let repo = generated_repository(files);
        group.throughput(Throughput::Elements(files as u64));
        group.bench_with_input(BenchmarkId::new("python_files", files), &repo, |b, repo| {
            b.iter(|| black_box(runtime.block_on(converter.convert(repo.path())).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_split, bench_weight, bench_convert);
criterion_main!(benches);
