#![allow(unused)]
//! Session integration harness.
//!
//! # What this covers
//!
//! The session owns the tree, the member caches and the recipient selection.
//! These tests drive it the way the TUI and CLI do, against an in-memory
//! directory and a recording compose surface.
//!
//! - **Initialize**: counts in the summary, fatal group listing failures,
//!   non-fatal user listing failures, outline mode without a group listing.
//! - **Selection**: add, duplicate, no-email, remove by index, and the
//!   no-duplicates property over random add/remove sequences.
//! - **Commit**: success clears the selection; a rejected hand-off keeps it.
//! - **Re-initialize** rebuilds the tree but keeps the selection.
//! - **Header sink** output for a committed selection.
//!
//! # What this does NOT cover
//!
//! - Keyword matching (see search_harness)
//! - Key handling in the TUI (unit tests in orgbook-tui)
//!
//! # Running
//!
//! ```sh
//! cargo test --test session_harness
//! ```

mod common;
use common::*;

use orgbook_core::{
    AddOutcome, DirectoryError, DirectorySource, HostError, MatchPolicy, Member, MemberRequest,
    RecipientKind, Session,
};
use orgbook_sources::HeaderSink;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

fn kcis_source() -> MemorySource {
    MemorySource::builder()
        .groups(kcis_groups())
        .members("g-qs-teaching", teaching_members())
        .members("g-qs-academic", academic_members())
        .user(user("u-keyu", "Keyu Chen", "keyu.chen@kcis.test", "KCQS101001.教學組"))
        .user(user("u-ext", "Oliver Tsai", "oliver@partner.test", "EXTERNAL"))
        .build()
}

fn session() -> Session {
    Session::new(inferred_settings(MatchPolicy::Strict))
}

// ---------------------------------------------------------------------------
// Initialize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_reports_counts() {
    let source = kcis_source();
    let mut session = session();
    let summary = session.initialize(&source, true).await.unwrap();

    assert_eq!(summary.groups, 9);
    assert_eq!(summary.dropped, 3);
    assert_eq!(summary.users, 2);
    assert_eq!(summary.unplaced, 1);
    assert_eq!(summary.nodes, session.tree().len() - 1);
    assert_eq!(session.unplaced()[0].name, "Oliver Tsai");
    assert_eq!(source.total_member_calls(), 0, "members load lazily");
}

#[tokio::test]
async fn group_listing_failure_is_fatal() {
    let source = MemorySource::builder()
        .groups_error(DirectoryError::AuthRequired("token expired".into()))
        .build();
    let mut session = session();

    let err = session.initialize(&source, true).await.unwrap_err();
    assert!(err.is_auth_required());
}

#[tokio::test]
async fn user_listing_failure_only_limits_search() {
    let source = MemorySource::builder()
        .groups(kcis_groups())
        .users_error(DirectoryError::upstream("users", "403 Forbidden"))
        .build();
    let mut session = session();

    let summary = session.initialize(&source, true).await.unwrap();
    assert_eq!(summary.users, 0);
    assert!(session.tree().find_by_code("KCQS101001").is_some());
}

#[tokio::test]
async fn outline_mode_skips_group_listing() {
    let source = kcis_source();
    let mut session = Session::new(outline_settings());

    let summary = session.initialize(&source, false).await.unwrap();
    assert_eq!(source.group_calls(), 0);
    assert_eq!(summary.groups, 0);
    assert!(session.dropped().is_empty());
    assert!(session.tree().find_by_code("KCQS101001").is_some());
}

#[tokio::test]
async fn open_node_then_complete_fetch() {
    let source = kcis_source();
    let mut session = session();
    session.initialize(&source, false).await.unwrap();
    let team = session.tree().find_by_code("KCQS101001").unwrap();

    let MemberRequest::Fetch(group) = session.open_node(team) else {
        panic!("expected fetch");
    };
    assert!(matches!(session.open_node(team), MemberRequest::InFlight));
    let outcome = source.list_group_members(&group).await;
    let members = session.complete_fetch(&group, outcome).unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(session.members_of(team).len(), 3);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selection_add_duplicate_and_remove() {
    let mut session = session();
    let [keyu, amy, mei] = <[Member; 3]>::try_from(teaching_members()).unwrap();

    assert_eq!(session.add_member(&keyu), AddOutcome::Added);
    assert_eq!(session.add_member(&amy), AddOutcome::Added);
    assert_eq!(session.add_member(&keyu), AddOutcome::Duplicate);
    assert_eq!(
        session.add_member(&member("u-x", "Shared Mailbox", "")),
        AddOutcome::NoEmail
    );
    assert_eq!(session.selection().len(), 2);

    let removed = session.remove_recipient(0).unwrap();
    assert_eq!(removed.email, "keyu.chen@kcis.test");
    assert!(session.remove_recipient(7).is_none());

    session.add_member(&mei);
    let emails: Vec<&str> = session
        .selection()
        .recipients()
        .iter()
        .map(|r| r.email.as_str())
        .collect();
    assert_eq!(emails, vec!["amy.lin@kcis.test", "mei.wang@kcis.test"]);

    session.clear_selection();
    assert!(session.selection().is_empty());
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![(0usize..6).prop_map(Op::Add), (0usize..8).prop_map(Op::Remove)]
}

proptest! {
    #[test]
    fn selection_never_holds_duplicate_emails(ops in prop::collection::vec(op(), 0..40)) {
        let people: Vec<Member> = (0..6)
            .map(|n| member(&format!("u{n}"), &format!("Person {n}"), &format!("P{n}@kcis.test")))
            .collect();
        let mut session = session();
        let mut expected = 0usize;

        for op in ops {
            match op {
                Op::Add(n) => {
                    if session.add_member(&people[n]) == AddOutcome::Added {
                        expected += 1;
                    }
                }
                Op::Remove(i) => {
                    if session.remove_recipient(i).is_some() {
                        expected -= 1;
                    }
                }
            }
        }

        prop_assert_eq!(session.selection().len(), expected);
        let unique: HashSet<String> = session
            .selection()
            .recipients()
            .iter()
            .map(|r| r.email.to_lowercase())
            .collect();
        prop_assert_eq!(unique.len(), expected);
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commit_hands_off_and_clears() {
    let sink = RecordingSink::default();
    let mut session = session();
    for m in teaching_members() {
        session.add_member(&m);
    }

    let count = session.commit(RecipientKind::Bcc, &sink).await.unwrap();
    assert_eq!(count, 3);
    assert!(session.selection().is_empty());
    assert_eq!(
        sink.emails(),
        vec![(
            RecipientKind::Bcc,
            vec![
                "keyu.chen@kcis.test".to_string(),
                "amy.lin@kcis.test".to_string(),
                "mei.wang@kcis.test".to_string(),
            ]
        )]
    );
}

#[tokio::test]
async fn rejected_commit_keeps_selection() {
    let sink = RecordingSink::rejecting();
    let mut session = session();
    for m in teaching_members() {
        session.add_member(&m);
    }

    let err = session.commit(RecipientKind::To, &sink).await.unwrap_err();
    assert!(matches!(err, HostError::Rejected(_)));
    assert_eq!(session.selection().len(), 3);
}

#[tokio::test]
async fn empty_commit_is_a_no_op() {
    let sink = RecordingSink::default();
    let mut session = session();
    assert_eq!(session.commit(RecipientKind::To, &sink).await.unwrap(), 0);
    assert!(sink.emails().is_empty());
}

#[tokio::test]
async fn reinitialize_keeps_selection() {
    let source = kcis_source();
    let mut session = session();
    session.initialize(&source, true).await.unwrap();
    let team = session.tree().find_by_code("KCQS101001").unwrap();
    session.load_node(team, &source).await.unwrap();
    let keyu = session.members_of(team)[0].clone();
    session.add_member(&keyu);

    session.initialize(&source, true).await.unwrap();

    let team = session.tree().find_by_code("KCQS101001").unwrap();
    assert!(!session.tree().node(team).status.is_loaded());
    assert_eq!(session.selection().len(), 1);
    assert!(session.selection().contains_email("KEYU.CHEN@kcis.test"));
}

#[tokio::test]
async fn header_sink_writes_draft_lines() {
    let sink = HeaderSink::new(Vec::new());
    let mut session = session();
    let [keyu, amy, _] = <[Member; 3]>::try_from(teaching_members()).unwrap();

    session.add_member(&keyu);
    session.commit(RecipientKind::To, &sink).await.unwrap();
    session.add_member(&amy);
    session.commit(RecipientKind::Cc, &sink).await.unwrap();

    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        out,
        "To: \"Keyu Chen\" <keyu.chen@kcis.test>\nCc: \"Amy Lin\" <amy.lin@kcis.test>\n"
    );
}
