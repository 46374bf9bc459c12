//! End-to-end scenarios: files in, analyzed tasks out.

mod common;

use std::collections::HashSet;

use serde_json::json;

use chrono::{DateTime, Utc};

use common::{csv_file, json_file, scheduler_config, text_file, QueueHarness, ScriptedAnalyzer};
use evidence_queue::config::IngestConfig;
use evidence_queue::identity::{self, is_task_id, IdMinter};
use evidence_queue::{to_csv, DiagnosticLog, Ingestor, Snapshot, TaskStatus, TaskStore};

#[tokio::test]
async fn test_json_batch_to_completed_tasks() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new(), scheduler_config(2));
    let records = vec![
        json!({"date": "1880-03-15", "source": "LAC RG10 vol. 3", "excerpt": "Survey of the reserve"}),
        json!({"date": "March 1881", "excerpt": "Letter to the agent"}),
        json!({"excerpt": "Undated memo"}),
    ];

    let report = harness.ingest(vec![json_file("letters.json", &records)]);

    assert_eq!(report.tasks.len(), 3);
    assert!(report.failures.is_empty());
    let ids: HashSet<&str> = report.tasks.iter().map(|t| t.id()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| is_task_id(id)));
    assert!(report.tasks.iter().all(|t| t.status() == TaskStatus::Pending));

    assert_eq!(report.tasks[0].timestamp, "1880-03-15");
    assert_eq!(report.tasks[0].source.as_deref(), Some("LAC RG10 vol. 3"));
    assert_eq!(report.tasks[1].timestamp, "1881-03-01");
    assert_eq!(report.tasks[1].source.as_deref(), Some("Incoming Import"));
    assert_eq!(
        report.tasks[2].fingerprint(),
        identity::fingerprint(&records[2].to_string())
    );

    let summary = *harness.run().await.summary().unwrap();
    assert_eq!(summary.completed, 3);
    assert!(harness
        .store
        .snapshot()
        .iter()
        .all(|t| t.status() == TaskStatus::Completed && t.analysis().is_some()));
}

#[tokio::test]
async fn test_invalid_json_becomes_single_text_task() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new(), scheduler_config(1));

    let before = Utc::now();
    let report = harness.ingest(vec![text_file("broken.json", "not valid json")]);
    let after = Utc::now();

    assert_eq!(report.tasks.len(), 1);
    let task = &report.tasks[0];
    let stamped = DateTime::parse_from_rfc3339(&task.timestamp).unwrap();
    assert!(before.timestamp() <= stamped.timestamp());
    assert!(stamped.timestamp() <= after.timestamp());
    assert!(task.original_date.is_none());
    assert_eq!(task.content(), "not valid json");
    assert_eq!(task.payload_str("type"), Some("text"));
    assert_eq!(task.source.as_deref(), Some("Incoming Import"));
    assert!(report.notice().is_none());

    harness.run().await;
    assert_eq!(harness.statuses(), vec![TaskStatus::Completed]);
}

#[test]
fn test_single_record_keeps_parsed_payload() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new(), scheduler_config(1));

    let report = harness.ingest(vec![text_file(
        "one.json",
        r#"[{"date":"1880-03-15","excerpt":"x"}]"#,
    )]);

    assert_eq!(report.tasks.len(), 1);
    let task = &report.tasks[0];
    assert_eq!(task.payload, Some(json!({"date": "1880-03-15", "excerpt": "x"})));
    assert_eq!(task.timestamp, "1880-03-15");
    assert_eq!(task.status(), TaskStatus::Pending);
}

#[test]
fn test_later_batches_never_reuse_stored_ids() {
    let store = TaskStore::new();
    let diagnostics = DiagnosticLog::new(50);

    for name in ["first.txt", "second.txt"] {
        let mut ingestor = Ingestor::new(IngestConfig::default(), diagnostics.clone())
            .with_minter(IdMinter::with_seed(7));
        let report = ingestor.ingest_into(vec![text_file(name, name)], &store);
        assert_eq!(report.tasks.len(), 1);
    }

    assert_eq!(store.len(), 2);
    let ids: Vec<String> = store.snapshot().iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["DOC-000007", "DOC-000008"]);
}

#[tokio::test]
async fn test_failure_on_second_call() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new().fail_on(2), scheduler_config(1));
    harness.ingest(vec![json_file(
        "three.json",
        &[json!({"n": 1}), json!({"n": 2}), json!({"n": 3})],
    )]);

    harness.run().await;

    assert_eq!(
        harness.statuses(),
        vec![TaskStatus::Completed, TaskStatus::Flagged, TaskStatus::Completed]
    );
}

#[tokio::test]
async fn test_mixed_batch_isolates_bad_files() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new(), scheduler_config(1));

    let report = harness.ingest(vec![
        csv_file(
            "ledger.csv",
            &["date", "archive", "entry"],
            &[
                vec!["1880-01-05", "HBC Archives", "Flour, 2 sacks"],
                vec!["05/02/1880", "", "Tea \"good\" quality"],
            ],
        ),
        evidence_queue::UploadedFile::new("scan.tiff", vec![0x49, 0x49, 0x2a, 0x00]),
        text_file("notes.md", "# Field notes\nMet with the band council."),
    ]);

    assert_eq!(report.tasks.len(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file_name, "scan.tiff");
    assert_eq!(report.tasks[0].source.as_deref(), Some("HBC Archives"));
    assert_eq!(report.tasks[1].payload_str("entry"), Some("Tea \"good\" quality"));
    assert_eq!(report.tasks[1].timestamp, "1880-05-02");
    assert_eq!(harness.store.len(), 3);
}

#[tokio::test]
async fn test_nothing_extracted_sets_notice() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new(), scheduler_config(1));
    let report = harness.ingest(vec![evidence_queue::UploadedFile::new(
        "archive.zip",
        vec![0x50, 0x4b, 0x03, 0x04],
    )]);
    assert!(report.tasks.is_empty());
    assert!(report.notice().unwrap().contains("1 file"));
    assert_eq!(harness.run().await, evidence_queue::RunOutcome::NothingPending);
}

#[tokio::test]
async fn test_snapshot_restores_session() {
    let harness = QueueHarness::new(ScriptedAnalyzer::new().fail_on(1), scheduler_config(1));
    harness.ingest(vec![json_file("a.json", &[json!({"n": 1}), json!({"n": 2})])]);
    harness.run().await;
    assert!(harness.store.set_pinned("DOC-000002", true));

    let snapshot = Snapshot::new(harness.store.snapshot(), harness.diagnostics.entries());
    let json = snapshot.to_json().unwrap();
    let restored = Snapshot::from_json(&json).unwrap();

    let store = TaskStore::from_tasks(restored.tasks);
    assert_eq!(store.snapshot(), harness.store.snapshot());
    assert_eq!(store.counts().flagged, 1);
    assert_eq!(restored.logs.len(), harness.diagnostics.entries().len());

    let csv = to_csv(&store.snapshot());
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("id,fingerprint,file,source,date,status"));
}
