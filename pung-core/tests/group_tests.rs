// Tests for board grouping functionality

use std::collections::BTreeSet;

use pung_core::group::group_by_board;

// ============================================================================
// Grouping Tests
// ============================================================================

#[test]
fn test_groups_pairs_by_board() {
    let pairs = [
        ("qc_qsz", "100"),
        ("qb_free", "200"),
        ("qc_qsz", "101"),
        ("qb_free", "201"),
    ];
    let groups = group_by_board(pairs);

    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups["qc_qsz"],
        BTreeSet::from(["100".to_string(), "101".to_string()])
    );
    assert_eq!(
        groups["qb_free"],
        BTreeSet::from(["200".to_string(), "201".to_string()])
    );
}

#[test]
fn test_deduplicates_article_ids_within_a_board() {
    let pairs = [("qc_qsz", "100"), ("qc_qsz", "100"), ("qc_qsz", "100")];
    let groups = group_by_board(pairs);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups["qc_qsz"].len(), 1);
}

#[test]
fn test_same_article_id_on_two_boards_stays_separate() {
    let pairs = [("qc_qsz", "100"), ("qb_free", "100")];
    let groups = group_by_board(pairs);

    assert_eq!(groups.len(), 2);
    assert!(groups["qc_qsz"].contains("100"));
    assert!(groups["qb_free"].contains("100"));
}

// ============================================================================
// Ordering Tests
// ============================================================================

#[test]
fn test_iterates_boards_in_sorted_order() {
    let pairs = [("zzz", "1"), ("aaa", "2"), ("mmm", "3")];
    let groups = group_by_board(pairs);

    let boards: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(boards, vec!["aaa", "mmm", "zzz"]);
}

#[test]
fn test_article_ids_iterate_in_sorted_order() {
    let pairs = [("qc_qsz", "300"), ("qc_qsz", "100"), ("qc_qsz", "200")];
    let groups = group_by_board(pairs);

    let ids: Vec<&str> = groups["qc_qsz"].iter().map(String::as_str).collect();
    assert_eq!(ids, vec!["100", "200", "300"]);
}

#[test]
fn test_empty_input_yields_no_groups() {
    let groups = group_by_board([]);
    assert!(groups.is_empty());
}
