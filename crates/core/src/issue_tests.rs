// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn base_issue() -> Issue {
    Issue {
        id: IssueId::new(),
        title: "fix the thing".into(),
        description: None,
        design: None,
        acceptance_criteria: None,
        notes: None,
        issue_type: IssueType::Task,
        status: Status::Open,
        priority: 3,
        assignee: None,
        created_at: 0,
        updated_at: 0,
        closed_at: None,
        close_reason: None,
        closed_by_session: None,
        spec_id: None,
        external_ref: None,
        source_system: None,
        estimated_minutes: 0,
        pinned: false,
        is_template: false,
        ephemeral: false,
        quality_score: None,
        due_at: None,
        defer_until: None,
        content_hash: None,
        labels: Vec::new(),
        hook_command: None,
        hook_trigger: None,
        hook_timeout_secs: None,
        hook_on_failure: None,
        extra: serde_json::Map::new(),
    }
}

#[test]
fn valid_issue_passes() {
    assert!(base_issue().validate().is_ok());
}

#[test]
fn empty_title_rejected() {
    let mut issue = base_issue();
    issue.title = String::new();
    assert!(issue.validate().is_err());
}

#[test]
fn oversized_title_rejected() {
    let mut issue = base_issue();
    issue.title = "x".repeat(TITLE_MAX_LEN + 1);
    assert!(issue.validate().is_err());
}

#[parameterized(
    zero = {0},
    six = {6},
)]
fn priority_out_of_range_rejected(priority: u8) {
    let mut issue = base_issue();
    issue.priority = priority;
    assert!(issue.validate().is_err());
}

#[parameterized(
    one = {1},
    three = {3},
    five = {5},
)]
fn priority_in_range_accepted(priority: u8) {
    let mut issue = base_issue();
    issue.priority = priority;
    assert!(issue.validate().is_ok());
}

#[test]
fn closed_status_without_closed_at_rejected() {
    let mut issue = base_issue();
    issue.status = Status::Closed;
    issue.closed_at = None;
    assert!(issue.validate().is_err());
}

#[test]
fn open_status_with_closed_at_rejected() {
    let mut issue = base_issue();
    issue.status = Status::Open;
    issue.closed_at = Some(123);
    assert!(issue.validate().is_err());
}

#[test]
fn closed_status_with_closed_at_accepted() {
    let mut issue = base_issue();
    issue.status = Status::Closed;
    issue.closed_at = Some(123);
    assert!(issue.validate().is_ok());
}

#[test]
fn hook_timeout_over_max_rejected() {
    let mut issue = base_issue();
    issue.issue_type = IssueType::Advice;
    issue.hook_timeout_secs = Some(HOOK_TIMEOUT_MAX_SECS + 1);
    assert!(issue.validate().is_err());
}

#[test]
fn hook_timeout_at_max_accepted() {
    let mut issue = base_issue();
    issue.issue_type = IssueType::Advice;
    issue.hook_timeout_secs = Some(HOOK_TIMEOUT_MAX_SECS);
    assert!(issue.validate().is_ok());
}

#[test]
fn unknown_snapshot_fields_round_trip() {
    let mut issue = base_issue();
    issue.extra.insert("future_field".into(), serde_json::json!("kept"));
    let json = serde_json::to_value(&issue).unwrap();
    let back: Issue = serde_json::from_value(json).unwrap();
    assert_eq!(back.extra.get("future_field"), Some(&serde_json::json!("kept")));
}

#[test]
fn status_serializes_as_snake_case_tag() {
    let json = serde_json::to_value(Status::InProgress).unwrap();
    assert_eq!(json, serde_json::json!("in_progress"));
}

#[test]
fn hook_trigger_serializes_as_kebab_case_tag() {
    let json = serde_json::to_value(AdviceHookTrigger::BeforeCommit).unwrap();
    assert_eq!(json, serde_json::json!("before-commit"));
}
