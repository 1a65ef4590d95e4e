//! End-to-end pipeline tests against MockToolClient: state machine edges,
//! log ordering, dedup, and the all-or-nothing failure policy.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use dossier_agent::testing::{finding, hit, MockToolClient};
use dossier_agent::{PipelineRunner, TaskScheduler, TaskStore};
use dossier_common::{QueryPayload, TaskRecord, TaskState};

fn payload_with_keyword(keyword: &str) -> QueryPayload {
    QueryPayload {
        keyword: Some(keyword.to_string()),
        ..Default::default()
    }
}

async fn run_pipeline(tools: MockToolClient, payload: QueryPayload) -> (TaskStore, TaskRecord) {
    let store = TaskStore::new();
    let task_id = Uuid::new_v4();
    store.create(task_id).unwrap();

    let runner = PipelineRunner::new(store.clone(), Arc::new(tools));
    runner.run(task_id, payload).await;

    let record = store.get(task_id).unwrap();
    (store, record)
}

fn log_messages(record: &TaskRecord) -> Vec<&str> {
    record
        .progress_log
        .iter()
        .map(|e| e.message.as_str())
        .collect()
}

#[tokio::test]
async fn successful_run_completes_with_deduplicated_findings() {
    let head = "x".repeat(80);
    let tools = MockToolClient::new()
        .on_search(vec![hit("https://a.example/p"), hit("https://b.example/q")])
        .on_page("https://a.example/p", "page a text")
        .on_page("https://b.example/q", "page b text")
        .on_extract(
            "https://a.example/p",
            vec![
                finding("a.example", "https://a.example/p", &format!("{head} first wording")),
                finding("a.example", "https://a.example/p", &format!("{head} second wording")),
            ],
        )
        .on_extract(
            "https://b.example/q",
            vec![finding("b.example", "https://b.example/q", "distinct fact")],
        );

    let (_, record) = run_pipeline(tools, payload_with_keyword("malware")).await;

    assert_eq!(record.state, TaskState::Completed);
    assert!(record.error_message.is_none());
    // Two a.example findings share a dedup key; one survives, order kept
    assert_eq!(record.findings.len(), 2);
    assert_eq!(record.findings[0].source_name, "a.example");
    assert_eq!(record.findings[1].source_name, "b.example");
}

#[tokio::test]
async fn progress_log_reflects_execution_order() {
    let tools = MockToolClient::new()
        .on_search(vec![hit("https://a.example/p")])
        .on_page("https://a.example/p", "text");

    let (_, record) = run_pipeline(tools, payload_with_keyword("breach")).await;

    let messages = log_messages(&record);
    assert_eq!(messages[0], "Preparing query from input fields.");
    assert_eq!(messages[1], "Query constructed: \"breach\"");
    assert_eq!(messages[2], "Contacting search tool.");
    assert_eq!(messages[3], "Search returned 1 candidate results.");
    assert_eq!(messages[4], "[1/1] Scraping https://a.example/p");
    assert_eq!(messages[5], "[1/1] Extracting relevant info from scraped text.");
    assert_eq!(messages[6], "Deduplicated to 0 unique findings.");

    assert!(record
        .progress_log
        .windows(2)
        .all(|pair| pair[0].at <= pair[1].at));
}

#[tokio::test]
async fn zero_search_results_still_completes() {
    let tools = MockToolClient::new().on_search(Vec::new());

    let (_, record) = run_pipeline(tools, payload_with_keyword("nothing")).await;

    assert_eq!(record.state, TaskState::Completed);
    assert!(record.findings.is_empty());
    assert!(record.error_message.is_none());
}

#[tokio::test]
async fn scrape_failure_aborts_the_whole_task() {
    // Result 1 extracts fine; result 2 of 3 fails to scrape
    let tools = MockToolClient::new()
        .on_search(vec![
            hit("https://a.example/1"),
            hit("https://b.example/2"),
            hit("https://c.example/3"),
        ])
        .on_page("https://a.example/1", "text one")
        .on_extract(
            "https://a.example/1",
            vec![finding("a.example", "https://a.example/1", "kept nowhere")],
        )
        .failing_scrape("https://b.example/2", "connection reset");

    let (_, record) = run_pipeline(tools, payload_with_keyword("cve")).await;

    assert_eq!(record.state, TaskState::Failed);
    // All-or-nothing: result 1's finding does not survive into the record
    assert!(record.findings.is_empty());
    let error = record.error_message.as_deref().unwrap();
    assert!(error.contains("connection reset"), "got: {error}");

    // Log up to the failure point is preserved; nothing past it
    let messages = log_messages(&record);
    assert!(messages.contains(&"[2/3] Scraping https://b.example/2"));
    assert!(!messages.iter().any(|m| m.starts_with("Deduplicated")));
}

#[tokio::test]
async fn search_failure_fails_the_task() {
    let tools = MockToolClient::new().failing_search("search provider unreachable");

    let (_, record) = run_pipeline(tools, payload_with_keyword("anything")).await;

    assert_eq!(record.state, TaskState::Failed);
    assert!(record
        .error_message
        .as_deref()
        .unwrap()
        .contains("search provider unreachable"));
}

#[tokio::test]
async fn extract_failure_fails_the_task() {
    let tools = MockToolClient::new()
        .on_search(vec![hit("https://a.example/p")])
        .on_page("https://a.example/p", "text")
        .failing_extract("https://a.example/p", "model returned garbage");

    let (_, record) = run_pipeline(tools, payload_with_keyword("cve")).await;

    assert_eq!(record.state, TaskState::Failed);
    assert!(record
        .error_message
        .as_deref()
        .unwrap()
        .contains("model returned garbage"));
}

#[tokio::test]
async fn empty_payload_searches_with_the_fallback_query() {
    let tools = Arc::new(MockToolClient::new().on_search(Vec::new()));
    let store = TaskStore::new();
    let task_id = Uuid::new_v4();
    store.create(task_id).unwrap();

    let runner = PipelineRunner::new(store.clone(), tools.clone());
    runner.run(task_id, QueryPayload::default()).await;

    let queries = tools.seen_queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["cybersecurity osint".to_string()]);
}

#[tokio::test]
async fn terminal_record_is_stable_across_polls() {
    let tools = MockToolClient::new()
        .on_search(vec![hit("https://a.example/p")])
        .on_page("https://a.example/p", "text")
        .on_extract(
            "https://a.example/p",
            vec![finding("a.example", "https://a.example/p", "a fact")],
        );

    let (store, first) = run_pipeline(tools, payload_with_keyword("osint")).await;

    let second = store.get(first.task_id).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn scheduler_makes_the_record_visible_before_the_run_finishes() {
    let tools = Arc::new(
        MockToolClient::new()
            .on_search(vec![hit("https://a.example/p")])
            .on_page("https://a.example/p", "text")
            .gated(),
    );
    let store = TaskStore::new();
    let scheduler = TaskScheduler::new(store.clone(), tools.clone());

    let task_id = scheduler.start(payload_with_keyword("slow")).unwrap();

    // The pipeline is parked inside its search call; the record must
    // already be pollable and non-terminal.
    let record = store.get(task_id).unwrap();
    assert!(matches!(
        record.state,
        TaskState::Pending | TaskState::Running
    ));

    tools.release_gate();

    let record = wait_terminal(&store, task_id).await;
    assert_eq!(record.state, TaskState::Completed);
}

#[tokio::test]
async fn concurrent_investigations_do_not_interfere() {
    let tools = Arc::new(
        MockToolClient::new()
            .on_search(vec![hit("https://a.example/p")])
            .on_page("https://a.example/p", "text")
            .on_extract(
                "https://a.example/p",
                vec![finding("a.example", "https://a.example/p", "shared fact")],
            ),
    );
    let store = TaskStore::new();
    let scheduler = TaskScheduler::new(store.clone(), tools);

    let ids: Vec<_> = (0..4)
        .map(|i| scheduler.start(payload_with_keyword(&format!("q{i}"))).unwrap())
        .collect();

    for id in ids {
        let record = wait_terminal(&store, id).await;
        assert_eq!(record.state, TaskState::Completed);
        assert_eq!(record.findings.len(), 1);
    }
}

async fn wait_terminal(store: &TaskStore, task_id: Uuid) -> TaskRecord {
    for _ in 0..500 {
        let record = store.get(task_id).unwrap();
        if record.state.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} did not reach a terminal state");
}
