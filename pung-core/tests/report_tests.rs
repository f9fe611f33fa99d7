// Tests for cleanup report generation

use chrono::{Local, TimeZone};

use pung_core::report::{CleanupReport, PhaseReport, generate_cleanup_report};

fn sample_report() -> CleanupReport {
    CleanupReport {
        nickname: "tester".to_string(),
        planet: "지구".to_string(),
        listed_comments: 13,
        listed_posts: 4,
        started_at: Local.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap(),
        finished_at: Local.with_ymd_and_hms(2024, 3, 1, 21, 2, 5).unwrap(),
        comment_pass: PhaseReport {
            deleted: 10,
            exploded: 2,
            failed: 1,
            skipped: 0,
            aborted: None,
        },
        article_pass: PhaseReport {
            exploded: 3,
            skipped: 1,
            ..PhaseReport::default()
        },
        sweep_pass: PhaseReport::default(),
    }
}

// ============================================================================
// Phase Report Tests
// ============================================================================

#[test]
fn test_phase_report_default_is_all_zero() {
    let phase = PhaseReport::default();

    assert_eq!(phase.deleted, 0);
    assert_eq!(phase.exploded, 0);
    assert_eq!(phase.failed, 0);
    assert_eq!(phase.skipped, 0);
    assert!(phase.aborted.is_none());
}

#[test]
fn test_phase_report_handled_sums_deleted_and_exploded() {
    let phase = PhaseReport {
        deleted: 4,
        exploded: 3,
        failed: 9,
        ..PhaseReport::default()
    };
    assert_eq!(phase.handled(), 7);
}

#[test]
fn test_phase_report_aborted_with_keeps_reason() {
    let phase = PhaseReport::aborted_with("connection reset");

    assert_eq!(phase.aborted.as_deref(), Some("connection reset"));
    assert_eq!(phase.handled(), 0);
}

// ============================================================================
// Cleanup Report Tests
// ============================================================================

#[test]
fn test_totals_sum_across_passes() {
    let report = sample_report();

    assert_eq!(report.total_handled(), 15);
    assert_eq!(report.total_failed(), 1);
}

#[test]
fn test_duration_in_seconds() {
    let report = sample_report();
    assert_eq!(report.duration_secs(), 125);
}

#[test]
fn test_fully_clean_requires_no_failures() {
    let mut report = sample_report();
    assert!(!report.fully_clean());

    report.comment_pass.failed = 0;
    assert!(report.fully_clean());
}

#[test]
fn test_fully_clean_requires_no_aborts() {
    let mut report = sample_report();
    report.comment_pass.failed = 0;
    report.sweep_pass.aborted = Some("timed out".to_string());

    assert!(!report.fully_clean());
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_report_contains_summary_fields() {
    let text = generate_cleanup_report(&sample_report());

    assert!(text.contains("# Summary:"));
    assert!(text.contains("Account: tester (지구)"));
    assert!(text.contains("Comments listed: 13"));
    assert!(text.contains("Posts listed: 4"));
    assert!(text.contains("Handled: 15"));
    assert!(text.contains("Failed: 1"));
}

#[test]
fn test_report_contains_all_phase_sections() {
    let text = generate_cleanup_report(&sample_report());

    assert!(text.contains("## Recent comments"));
    assert!(text.contains("## Articles"));
    assert!(text.contains("## Remaining comments"));
}

#[test]
fn test_report_shows_duration() {
    let text = generate_cleanup_report(&sample_report());
    assert!(text.contains("(125s)"));
}

#[test]
fn test_report_omits_abort_line_when_clean() {
    let text = generate_cleanup_report(&sample_report());
    assert!(!text.contains("Aborted:"));
}

#[test]
fn test_report_shows_abort_reason() {
    let mut report = sample_report();
    report.article_pass.aborted = Some("profile page returned 403".to_string());

    let text = generate_cleanup_report(&report);
    assert!(text.contains("Aborted: profile page returned 403"));
}
