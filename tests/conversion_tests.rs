//! End-to-end conversion of single repositories

mod common;

use common::{ScriptedClient, TestRepo, docfreq, scripted_converter, vocabulary};
use repo2nbow::{RepoConverter, Settings};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn test_single_identifier_repository_is_unit_vector() {
    let repo = TestRepo::new();
    repo.add_file("main.py", "test\ntest\n");

    // Real tree-sitter parsing end to end
    let converter =
        RepoConverter::from_settings(&Settings::default(), vocabulary(), docfreq()).unwrap();
    let vector = converter.convert(repo.path()).await.unwrap();

    assert_eq!(vector.len(), 1);
    assert_eq!(vector.get(0), Some(1.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_conversion_is_deterministic() {
    let repo = TestRepo::new();
    repo.add_file("a.py", "test user name DELAY20");
    repo.add_file("b.py", "load model model");
    repo.add_file("src/c.py", "path repo test DELAY5");
    repo.add_file("src/d.py", "user user user");

    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |_| {});
    let first = converter.convert(repo.path()).await.unwrap();
    let second = converter.convert(repo.path()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_order_does_not_matter() {
    let contents = [
        "test user DELAY40",
        "name name DELAY1",
        "load model DELAY25",
        "repo DELAY10",
        "path test",
    ];

    // Same files under names that sort in opposite orders
    let forward = TestRepo::new();
    let backward = TestRepo::new();
    for (i, content) in contents.iter().enumerate() {
        forward.add_file(&format!("f{i}.py"), content);
        backward.add_file(&format!("f{}.py", contents.len() - i), content);
    }

    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |_| {});
    let (forward_counts, _) = converter.count_tokens(forward.path()).await.unwrap();
    let (backward_counts, _) = converter.count_tokens(backward.path()).await.unwrap();
    assert_eq!(forward_counts, backward_counts);

    let forward_vector = converter.convert(forward.path()).await.unwrap();
    let backward_vector = converter.convert(backward.path()).await.unwrap();
    assert_eq!(forward_vector, backward_vector);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_out_of_vocabulary_tokens_never_appear() {
    let repo = TestRepo::new();
    // "unknown" has a document frequency but no vocabulary entry
    repo.add_file("main.py", "test unknown unknown unknown zebra");

    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |_| {});
    let (counts, _) = converter.count_tokens(repo.path()).await.unwrap();
    assert_eq!(counts.get("unknown"), 3);

    let vector = converter.convert(repo.path()).await.unwrap();
    let vocab = vocabulary();
    assert_eq!(vector.len(), 1);
    assert!(
        vector
            .iter()
            .all(|(index, _)| (index as usize) < vocab.len())
    );
    assert_eq!(vector.get(0), Some(1.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vector_has_unit_norm() {
    let repo = TestRepo::new();
    repo.add_file("a.py", "test user name load model path repo");
    repo.add_file("b.js", "user user model");
    repo.add_file("c.rs", "repo repo repo test");

    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |_| {});
    let vector = converter.convert(repo.path()).await.unwrap();

    assert_eq!(vector.len(), 7);
    assert!((vector.norm() - 1.0).abs() < 1e-6);
    // Rarer token, more weight
    let test = vector.get(0).unwrap();
    let path = vector.get(5).unwrap();
    assert!(test > path);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_repositories_yield_empty_vectors() {
    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |_| {});

    let empty = TestRepo::new();
    assert!(converter.convert(empty.path()).await.unwrap().is_empty());

    let docs_only = TestRepo::new();
    docs_only.add_file("README.md", "test user");
    assert!(converter.convert(docs_only.path()).await.unwrap().is_empty());

    let all_failing = TestRepo::new();
    all_failing.add_file("a.py", "FAIL test");
    all_failing.add_file("b.py", "user FAIL");
    let (vector, stats) = converter
        .convert_with_stats(all_failing.path())
        .await
        .unwrap();
    assert!(vector.is_empty());
    assert_eq!(stats.files_failed, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_file_does_not_block_repository() {
    let repo = TestRepo::new();
    repo.add_file("a.py", "test");
    repo.add_file("hung.py", "SLOW user");
    repo.add_file("z.py", "name");

    let client = Arc::new(ScriptedClient::default());
    let converter = scripted_converter(client.clone(), |c| c.file_timeout_ms = 100);
    let (vector, stats) = converter.convert_with_stats(repo.path()).await.unwrap();

    assert_eq!(stats.files_timed_out, 1);
    assert_eq!(stats.files_parsed, 2);
    assert_eq!(client.calls(), 3);
    assert_eq!(vector.len(), 2);
    assert_eq!(vector.get(1), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repository_budget_keeps_partial_counts() {
    let repo = TestRepo::new();
    repo.add_file("a_fast.py", "test");
    repo.add_file("b_slow.py", "DELAY2500 user");
    repo.add_file("c_slow.py", "DELAY2500 name");

    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |c| {
        c.file_timeout_ms = 10_000;
        c.repository_timeout_secs = Some(1);
    });
    let (vector, stats) = converter.convert_with_stats(repo.path()).await.unwrap();

    assert_eq!(stats.files_abandoned, 2);
    assert!(!stats.is_complete());
    assert_eq!(vector.len(), 1);
    assert_eq!(vector.get(0), Some(1.0));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_real_grammars_across_languages() {
    let repo = TestRepo::new();
    repo.add_file(
        "loader.py",
        "def load_model(path):\n    return open(path)\n",
    );
    repo.add_file(
        "src/repo.rs",
        "pub struct Repo { path: String }\nfn test_repo(repo: &Repo) -> &str { &repo.path }\n",
    );
    repo.add_file("web/user.js", "function userName(user) { return user.name; }\n");
    repo.add_file("notes.txt", "test test test");

    let converter =
        RepoConverter::from_settings(&Settings::default(), vocabulary(), docfreq()).unwrap();
    let (vector, stats) = converter.convert_with_stats(repo.path()).await.unwrap();

    assert_eq!(stats.files_seen, 4);
    assert_eq!(stats.files_parsed, 3);
    assert_eq!(stats.files_skipped, 1);

    let vocab = vocabulary();
    for token in ["load", "model", "path", "repo", "user", "name", "test"] {
        let index = vocab.index_of(token).unwrap();
        assert!(vector.get(index).is_some(), "missing {token}");
    }
    assert!((vector.norm() - 1.0).abs() < 1e-6);
}

#[test]
fn test_abandoned_parse_does_not_block_shutdown() {
    let repo = TestRepo::new();
    repo.add_file("hung.py", "DELAY10000 user");
    repo.add_file("ok.py", "test");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let converter = scripted_converter(Arc::new(ScriptedClient::default()), |c| {
        c.file_timeout_ms = 100
    });

    let start = std::time::Instant::now();
    let (vector, stats) = runtime
        .block_on(converter.convert_with_stats(repo.path()))
        .unwrap();
    runtime.shutdown_timeout(std::time::Duration::from_millis(200));

    assert!(start.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(stats.files_timed_out, 1);
    assert_eq!(vector.get(0), Some(1.0));
}
