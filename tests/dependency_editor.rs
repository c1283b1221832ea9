//! Dependency editor against an in-memory backend.
//!
//! Covers server-side rejections (self, cross-project, cycle), the
//! refetch-after-every-mutation behavior, and confirm/alert handling.

mod support;

use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;
use support::{MemoryBackend, ScriptedSurface};
use workly::api::{ApiClient, Method};
use workly::model::{DependencyKind, DependencyPatch};
use workly::ops::classify::DependencyRejection;
use workly::ops::dep_editor::{DependencyEditor, EdgeInput, EditorError, EditorState, RemoveOutcome};

/// Two projects: Apollo with Design, Build and Test, Gemini with Other.
struct Fixture {
    backend: Rc<MemoryBackend>,
    client: ApiClient,
    design: u64,
    build: u64,
    test: u64,
    other: u64,
}

fn fixture() -> Fixture {
    let backend = MemoryBackend::new();
    let apollo = backend.add_project("Apollo");
    let gemini = backend.add_project("Gemini");
    let design = backend.add_task(apollo, "Design");
    let build = backend.add_task(apollo, "Build");
    let test = backend.add_task(apollo, "Test");
    let other = backend.add_task(gemini, "Other");
    let client = backend.client();
    Fixture {
        backend,
        client,
        design,
        build,
        test,
        other,
    }
}

fn edge(predecessor: u64) -> EdgeInput {
    EdgeInput {
        predecessor,
        ..EdgeInput::default()
    }
}

fn predecessors(editor: &DependencyEditor) -> Vec<u64> {
    editor
        .rows()
        .iter()
        .map(|r| r.dependency.predecessor.id)
        .collect()
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn test_open_shows_incoming_edges_only() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.build);
    f.backend.add_dependency(f.build, f.test);

    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    assert_eq!(editor.state(), &EditorState::Loaded);
    assert_eq!(predecessors(&editor), vec![f.build]);
    assert_eq!(editor.rows()[0].predecessor_label, "Build");
    assert!(!editor.rows()[0].placeholder);
    assert_eq!(
        editor.candidates().iter().map(|(id, t)| (*id, t.as_str())).collect::<Vec<_>>(),
        vec![(f.design, "Design")]
    );
}

#[test]
fn test_listing_is_idempotent() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.test);

    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();
    let first = editor.rows().to_vec();
    editor.reload(&f.client).unwrap();
    editor.reload(&f.client).unwrap();

    assert_eq!(editor.rows(), first.as_slice());
    assert!(f.backend.mutations().is_empty());
}

#[test]
fn test_deleted_predecessor_gets_placeholder() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.test);
    f.backend.forget_task(f.design);

    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let row = &editor.rows()[0];
    assert!(row.placeholder);
    assert_eq!(row.predecessor_label, format!("Task #{}", f.design));
}

#[test]
fn test_failed_reload_clears_rows() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();
    assert_eq!(editor.rows().len(), 1);

    f.backend
        .fail_once(Method::Get, "/dependencies/", 500, json!({"detail": "Błąd serwera"}));
    let err = editor.reload(&f.client).unwrap_err();

    assert!(matches!(err, EditorError::Api(_)));
    assert!(editor.rows().is_empty());
    assert!(editor.candidates().is_empty());
    assert_eq!(editor.state(), &EditorState::Error("Błąd serwera".to_string()));
}

#[test]
fn test_not_modified_is_retried_once() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.test);
    f.backend.answer_not_modified(1);

    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let requests = f.backend.requests();
    assert_eq!(requests[0].url, requests[1].url);
    assert_eq!(
        requests[1].header("Cache-Control"),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(requests[1].header("X-CSRFToken"), Some("tok"));
    assert_eq!(predecessors(&editor), vec![f.design]);
}

// ---------------------------------------------------------------------------
// Adding
// ---------------------------------------------------------------------------

#[test]
fn test_add_blank_lag_becomes_zero() {
    let f = fixture();
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let dep = editor
        .add(
            &f.client,
            &EdgeInput {
                predecessor: f.design,
                kind: DependencyKind::StartToStart,
                lag: "  ".to_string(),
            },
        )
        .unwrap();

    assert_eq!(dep.lag_days, 0);
    assert_eq!(dep.kind, DependencyKind::StartToStart);
    let post = &f.backend.mutations()[0];
    let body: serde_json::Value = serde_json::from_str(post.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({"predecessor": f.design, "successor": f.test, "type": "SS", "lag_days": 0})
    );
    // The row comes from the refetch, not from the POST response
    assert_eq!(predecessors(&editor), vec![f.design]);
    assert!(!editor.candidates().contains_key(&f.design));
    assert_eq!(editor.notice(), None);
}

#[test]
fn test_self_dependency_rejected() {
    let f = fixture();
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.build).unwrap();

    let err = editor.add(&f.client, &edge(f.build)).unwrap_err();

    assert!(matches!(err, EditorError::Rejected(DependencyRejection::SelfReference)));
    assert_eq!(
        editor.notice(),
        Some("cannot add dependency: a task cannot depend on itself")
    );
    assert_eq!(f.backend.dependency_count(), 0);
    assert!(editor.rows().is_empty());
}

#[test]
fn test_cross_project_rejected() {
    let f = fixture();
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let err = editor.add(&f.client, &edge(f.other)).unwrap_err();

    assert!(matches!(err, EditorError::Rejected(DependencyRejection::CrossProject)));
    assert_eq!(f.backend.dependency_count(), 0);
    // Candidates only ever come from the open task's project
    assert!(!editor.candidates().contains_key(&f.other));
}

#[test]
fn test_cycle_rejected_and_graph_unchanged() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.build);
    f.backend.add_dependency(f.build, f.test);

    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.design).unwrap();
    let err = editor.add(&f.client, &edge(f.test)).unwrap_err();

    assert!(matches!(err, EditorError::Rejected(DependencyRejection::Cycle)));
    assert_eq!(err.to_string(), "cannot add dependency: it would create a cycle between tasks");
    assert_eq!(f.backend.dependency_count(), 2);
    assert!(editor.rows().is_empty());
    assert_eq!(editor.state(), &EditorState::Loaded);
}

#[test]
fn test_unrecognized_rejection_passes_message_through() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let err = editor.add(&f.client, &edge(f.design)).unwrap_err();

    let raw = "The fields predecessor, successor must make a unique set.";
    assert!(matches!(&err, EditorError::Rejected(DependencyRejection::Other(m)) if m == raw));
    assert_eq!(editor.notice(), Some(raw));
}

#[test]
fn test_next_attempt_clears_notice() {
    let f = fixture();
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    editor.add(&f.client, &edge(f.test)).unwrap_err();
    assert!(editor.notice().is_some());
    editor.add(&f.client, &edge(f.build)).unwrap();
    assert_eq!(editor.notice(), None);
}

#[test]
fn test_add_then_failed_refetch_clears_rows() {
    let f = fixture();
    f.backend.add_dependency(f.build, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();
    assert_eq!(editor.rows().len(), 1);

    f.backend
        .fail_once(Method::Get, "/dependencies/", 500, json!({"detail": "Błąd serwera"}));
    let err = editor.add(&f.client, &edge(f.design)).unwrap_err();

    // The edge was created, but nothing stale is left on screen
    assert!(matches!(err, EditorError::Api(_)));
    assert_eq!(f.backend.dependency_count(), 2);
    assert!(editor.rows().is_empty());
    assert!(editor.candidates().is_empty());
    assert_eq!(editor.state(), &EditorState::Error("Błąd serwera".to_string()));
    assert_eq!(editor.notice(), None);
}

#[test]
fn test_rejection_wins_over_failed_refetch() {
    let f = fixture();
    f.backend.add_dependency(f.design, f.build);
    f.backend.add_dependency(f.build, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.design).unwrap();

    f.backend
        .fail_once(Method::Get, "/dependencies/", 500, json!({"detail": "Błąd serwera"}));
    let err = editor.add(&f.client, &edge(f.test)).unwrap_err();

    assert!(matches!(err, EditorError::Rejected(DependencyRejection::Cycle)));
    assert_eq!(f.backend.dependency_count(), 2);
    assert_eq!(editor.notice(), None);
    assert!(editor.rows().is_empty());
    assert_eq!(editor.state(), &EditorState::Error("Błąd serwera".to_string()));
}

// ---------------------------------------------------------------------------
// Updating and removing
// ---------------------------------------------------------------------------

#[test]
fn test_update_changes_type_and_lag() {
    let f = fixture();
    let id = f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    editor
        .update(
            &f.client,
            id,
            &DependencyPatch {
                kind: Some(DependencyKind::FinishToFinish),
                lag_days: Some(-2),
            },
        )
        .unwrap();

    let row = &editor.rows()[0].dependency;
    assert_eq!(row.kind, DependencyKind::FinishToFinish);
    assert_eq!(row.lag_days, -2);
}

#[test]
fn test_remove_confirmed() {
    let f = fixture();
    let id = f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let mut surface = ScriptedSurface::answering(&[true]);
    let outcome = editor.remove(&f.client, id, &mut surface).unwrap();

    assert_eq!(outcome, RemoveOutcome::Removed);
    assert_eq!(surface.prompts, vec!["Remove dependency on Design?".to_string()]);
    assert!(editor.rows().is_empty());
    assert!(editor.candidates().contains_key(&f.design));
    assert_eq!(f.backend.dependency_count(), 0);
}

#[test]
fn test_remove_cancelled_sends_nothing() {
    let f = fixture();
    let id = f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    let mut surface = ScriptedSurface::answering(&[false]);
    let outcome = editor.remove(&f.client, id, &mut surface).unwrap();

    assert_eq!(outcome, RemoveOutcome::Cancelled);
    assert!(f.backend.mutations().is_empty());
    assert_eq!(editor.rows().len(), 1);
}

#[test]
fn test_remove_failure_alerts_and_keeps_row() {
    let f = fixture();
    let id = f.backend.add_dependency(f.design, f.test);
    let mut editor = DependencyEditor::new();
    editor.open(&f.client, f.test).unwrap();

    f.backend.fail_once(
        Method::Delete,
        "/dependencies/",
        403,
        json!({"detail": "Nie masz uprawnień do wykonania tej akcji."}),
    );
    let mut surface = ScriptedSurface::answering(&[true]);
    let outcome = editor.remove(&f.client, id, &mut surface).unwrap();

    let message = "Nie masz uprawnień do wykonania tej akcji.".to_string();
    assert_eq!(outcome, RemoveOutcome::Rejected(message.clone()));
    assert_eq!(surface.alerts, vec![message.clone()]);
    assert_eq!(editor.notice(), Some(message.as_str()));
    assert_eq!(predecessors(&editor), vec![f.design]);
}
