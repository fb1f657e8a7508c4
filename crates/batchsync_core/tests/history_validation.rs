use batchsync_core::{
    friendly_message, merge_history, sort_newest_first, validate_batch, validate_single,
    ApiError, HistoryItem, HistoryRow, Job, JobStatus, TranslateResult, TranslationHistory,
    UploadFile, MAX_HISTORY_ITEMS,
};

fn item(n: usize) -> HistoryItem {
    HistoryItem {
        id: format!("h{n}"),
        timestamp: format!("2026-04-01T00:{:02}:00Z", n % 60),
        target_lang: "de".to_string(),
        result: TranslateResult {
            original_image_url: "/static/in.png".to_string(),
            translated_image_url: format!("/static/out{n}.png"),
            clean_image_url: None,
            mask_url: None,
            regions: Vec::new(),
            target_lang: "de".to_string(),
            processing_time_ms: 1200,
        },
    }
}

fn png(name: &str) -> UploadFile {
    UploadFile::new(name, vec![0u8; 16])
}

#[test]
fn history_keeps_newest_fifty() {
    let mut history = TranslationHistory::new();
    for n in 0..(MAX_HISTORY_ITEMS + 5) {
        history.add(item(n));
    }
    assert_eq!(history.len(), MAX_HISTORY_ITEMS);
    assert_eq!(history.items().next().map(|h| h.id.as_str()), Some("h54"));
    assert!(history.items().all(|h| h.id != "h0"));

    let restored = TranslationHistory::from_items((0..60).map(item).collect());
    assert_eq!(restored.len(), MAX_HISTORY_ITEMS);
}

fn batch_created(id: &str, created_at: &str) -> Job {
    Job {
        id: id.to_string(),
        status: JobStatus::Done,
        total_count: 1,
        target_languages: vec!["fr".to_string()],
        completed_count: 1,
        failed_count: 0,
        pending_count: 0,
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
        items: Vec::new(),
    }
}

#[test]
fn jobs_sort_by_instant_not_by_text() {
    let mut jobs = vec![
        batch_created("whole", "2026-04-01T10:00:00Z"),
        batch_created("half", "2026-04-01T10:00:00.5Z"),
        batch_created("offset", "2026-04-01T11:30:00+02:00"),
        batch_created("garbled", "yesterday"),
    ];
    sort_newest_first(&mut jobs);
    let order: Vec<&str> = jobs.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(order, vec!["half", "whole", "offset", "garbled"]);
}

#[test]
fn merged_history_mixes_offsets_and_naive_server_stamps() {
    let mut history = TranslationHistory::new();
    let mut local = item(1);
    local.timestamp = "2026-04-01T12:00:00.250+00:00".to_string();
    history.add(local);
    let batch = batch_created("b", "2026-04-01T12:00:00");

    let rows = merge_history(&history, &[batch]);
    assert!(matches!(rows[0], HistoryRow::Single { .. }));
    assert!(matches!(rows[1], HistoryRow::Batch { .. }));
}

#[test]
fn merged_history_is_newest_first() {
    let mut history = TranslationHistory::new();
    history.add(item(10));
    let batch = Job {
        id: "b".to_string(),
        status: JobStatus::Done,
        total_count: 1,
        target_languages: vec!["fr".to_string()],
        completed_count: 1,
        failed_count: 0,
        pending_count: 0,
        created_at: "2026-04-01T00:30:00Z".to_string(),
        updated_at: "2026-04-01T00:31:00Z".to_string(),
        items: Vec::new(),
    };
    let rows = merge_history(&history, &[batch]);
    assert!(matches!(rows[0], HistoryRow::Batch { .. }));
    assert!(matches!(rows[1], HistoryRow::Single { .. }));
}

#[test]
fn empty_inputs_fail_before_network() {
    let langs = vec!["de".to_string()];
    assert!(matches!(validate_batch(&[], &langs), Err(ApiError::Validation(_))));
    assert!(matches!(
        validate_batch(&[png("a.png")], &[]),
        Err(ApiError::Validation(_))
    ));
}

#[test]
fn batch_limits_are_enforced() {
    let files: Vec<_> = (0..21).map(|n| png(&format!("{n}.png"))).collect();
    let langs = vec!["de".to_string()];
    assert!(validate_batch(&files, &langs).is_err());

    let too_many_langs: Vec<String> = ["en", "de", "fr", "es", "it", "pt"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(validate_batch(&[png("a.png")], &too_many_langs).is_err());

    assert!(validate_batch(&[png("a.PNG"), png("b.webp")], &langs).is_ok());
}

#[test]
fn bad_files_map_to_friendly_text() {
    let err = validate_single(&png("notes.txt"), "de").unwrap_err();
    assert_eq!(
        friendly_message(&err, None),
        "Unsupported file type, use JPEG, PNG, or WebP"
    );

    let err = validate_single(&png("a.png"), "xx").unwrap_err();
    assert_eq!(friendly_message(&err, None), "That language is not supported");
}
