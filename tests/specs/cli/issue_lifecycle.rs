//! `bd` end-to-end specs against a real `beadsd`: create, show, close,
//! reopen, and ready-work dependency filtering.

use crate::prelude::*;

#[test]
fn create_then_show_round_trips_the_title() {
    let daemon = Daemon::start();

    let created = daemon.bd().args(&["create", "write the docs", "--priority", "2"]).passes().json();
    let id = created["issue"]["id"].as_str().expect("issue id").to_string();
    assert_eq!(created["issue"]["title"], "write the docs");
    assert_eq!(created["issue"]["status"], "open");

    let shown = daemon.bd().args(&["show", &id]).passes().json();
    assert_eq!(shown["issue"]["id"], id);
    assert_eq!(shown["issue"]["title"], "write the docs");
}

#[test]
fn closing_then_reopening_clears_closed_at() {
    let daemon = Daemon::start();

    let created = daemon.bd().args(&["create", "fix the bug"]).passes().json();
    let id = created["issue"]["id"].as_str().unwrap().to_string();

    let closed = daemon.bd().args(&["close", &id, "--reason", "done"]).passes().json();
    assert_eq!(closed["issue"]["status"], "closed");
    assert!(!closed["issue"]["closed_at"].is_null());

    let reopened = daemon.bd().args(&["reopen", &id]).passes().json();
    assert_eq!(reopened["issue"]["status"], "open");
    assert!(reopened["issue"]["closed_at"].is_null());
}

#[test]
fn ready_work_excludes_issues_with_an_open_blocker() {
    let daemon = Daemon::start();

    let blocker = daemon.bd().args(&["create", "blocker"]).passes().json();
    let blocker_id = blocker["issue"]["id"].as_str().unwrap().to_string();
    let blocked = daemon.bd().args(&["create", "blocked"]).passes().json();
    let blocked_id = blocked["issue"]["id"].as_str().unwrap().to_string();

    daemon.bd().args(&["add-dependency", &blocked_id, &blocker_id, "--type", "blocks"]).passes();

    let ready = daemon.bd().args(&["ready-work"]).passes().json();
    let ready_ids: Vec<&str> = ready["issues"].as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&blocker_id.as_str()));
    assert!(!ready_ids.contains(&blocked_id.as_str()));

    daemon.bd().args(&["close", &blocker_id]).passes();
    let ready = daemon.bd().args(&["ready-work"]).passes().json();
    let ready_ids: Vec<&str> = ready["issues"].as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert!(ready_ids.contains(&blocked_id.as_str()));
}

#[test]
fn unambiguous_prefix_resolves_to_the_full_id() {
    let daemon = Daemon::start();
    let created = daemon.bd().args(&["create", "resolvable"]).passes().json();
    let id = created["issue"]["id"].as_str().unwrap().to_string();
    let prefix = &id[..id.len() - 2];

    let resolved = daemon.bd().args(&["resolve-id", prefix]).passes().json();
    assert_eq!(resolved["id"], id);
}
