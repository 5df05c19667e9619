/// Set proxy tests
///
/// Lazy initialization, the mutation dispatch policy and the existence probe.
/// Run with: cargo test --test set_proxy_tests

use lazycoll::{
    BasicElementType, CollectionMapping, CollectionRole, ContainerShape, DataType, LoadState,
    MemorySession, OwnerKey, Presence, ProxyError, SetAlgebra, SetProxy, Value,
};
use std::collections::HashSet;
use std::sync::Arc;

fn owner() -> OwnerKey {
    OwnerKey::new("Order", Value::Integer(1))
}

fn role() -> CollectionRole {
    CollectionRole::new("Order.tags")
}

fn text_mapping() -> CollectionMapping {
    CollectionMapping::new(
        "Order.tags",
        ContainerShape::Set,
        "all",
        Arc::new(BasicElementType::new(DataType::Text)),
    )
    .unwrap()
}

fn session_with(values: &[&str]) -> MemorySession {
    let mut session = MemorySession::new();
    session.seed_rows(
        &owner(),
        &role(),
        values.iter().map(|v| vec![Value::from(*v)]).collect(),
    );
    session
}

#[test]
fn test_first_read_triggers_exactly_one_load() {
    let session = session_with(&["red", "blue"]);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert_eq!(tags.base().state(), LoadState::Uninitialized);
    assert_eq!(tags.len(&session).unwrap(), 2);
    assert!(tags.contains(&Value::from("red"), &session).unwrap());
    assert_eq!(tags.len(&session).unwrap(), 2);
    assert_eq!(session.load_count(), 1);
}

#[test]
fn test_add_with_unknown_probe_forces_initialize() {
    // queueing is allowed but nothing can answer the probe, so the add
    // has to load first
    let session = session_with(&[]).with_queueing(true);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert!(tags.add(Value::from("x"), &session).unwrap());

    assert_eq!(tags.base().state(), LoadState::Initialized);
    assert_eq!(tags.elements(&session).unwrap(), vec![Value::from("x")]);
    assert!(tags.base().is_dirty());
    assert_eq!(session.load_count(), 1);
}

#[test]
fn test_probe_never_loads_when_session_can_answer() {
    // a known-absent probe lets the add queue without initializing
    let mut session = session_with(&["red"]).with_queueing(true);
    session.script_presence(&owner(), &role(), Value::from("x"), false);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert_eq!(tags.contains_probe(&Value::from("x"), &session), Presence::Absent);
    assert!(tags.add(Value::from("x"), &session).unwrap());

    assert_eq!(tags.base().state(), LoadState::Uninitialized);
    assert!(tags.base().has_queued_operations());
    assert_eq!(session.load_count(), 0);
}

#[test]
fn test_add_of_known_present_element_is_a_noop() {
    let mut session = session_with(&["red"]).with_queueing(true);
    session.script_presence(&owner(), &role(), Value::from("red"), true);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert!(!tags.add(Value::from("red"), &session).unwrap());
    assert!(!tags.base().has_queued_operations());
    assert_eq!(session.load_count(), 0);
}

#[test]
fn test_remove_queues_only_when_known_present() {
    let mut session = session_with(&["red", "blue"]).with_queueing(true);
    session.script_presence(&owner(), &role(), Value::from("red"), true);
    session.script_presence(&owner(), &role(), Value::from("green"), false);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert!(tags.remove(&Value::from("red"), &session).unwrap());
    assert!(!tags.remove(&Value::from("green"), &session).unwrap());
    assert_eq!(tags.base().state(), LoadState::Uninitialized);

    // the queued removal is applied on load
    assert_eq!(tags.len(&session).unwrap(), 1);
    assert!(!tags.contains(&Value::from("red"), &session).unwrap());
}

#[test]
fn test_queueing_disabled_forces_load_on_mutation() {
    let session = session_with(&["red"]);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert!(tags.add(Value::from("blue"), &session).unwrap());
    assert_eq!(tags.base().state(), LoadState::Initialized);
    assert_eq!(session.load_count(), 1);
    assert!(tags.base().is_dirty());
}

#[test]
fn test_remove_all_and_retain_all_never_queue() {
    let session = session_with(&["a", "b", "c"]).with_queueing(true);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    assert!(tags.remove_all(&[Value::from("a")], &session).unwrap());
    assert_eq!(session.load_count(), 1);
    assert!(!tags.base().has_queued_operations());

    let retained: HashSet<Value> = [Value::from("b")].into_iter().collect();
    assert!(tags.retain_all(&retained, &session).unwrap());
    assert_eq!(tags.elements(&session).unwrap(), vec![Value::from("b")]);
}

#[test]
fn test_clear_queues_without_probe() {
    let session = session_with(&["a", "b"]).with_queueing(true);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    tags.clear(&session).unwrap();
    assert_eq!(tags.base().state(), LoadState::Uninitialized);
    assert_eq!(session.load_count(), 0);

    assert_eq!(tags.len(&session).unwrap(), 0);
}

#[test]
fn test_set_algebra_forces_initialization() {
    let session = session_with(&["a", "b"]);
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    let other: HashSet<Value> = [Value::from("b"), Value::from("c")].into_iter().collect();
    let union = tags.union_with(&other, &session).unwrap();
    let intersection = tags.intersection_with(&other, &session).unwrap();

    assert_eq!(union.len(), 3);
    assert_eq!(intersection, [Value::from("b")].into_iter().collect());
    assert_eq!(session.load_count(), 1);
}

#[test]
fn test_load_failure_leaves_proxy_unusable() {
    let mut session = session_with(&[]);
    session.fail_load(&owner(), &role(), "storage offline");
    let mut tags = SetProxy::new(owner(), text_mapping()).unwrap();

    let err = tags.len(&session).unwrap_err();
    assert!(matches!(err, ProxyError::LoadFailure { .. }));

    // further access fails fast instead of retrying
    assert!(matches!(
        tags.len(&session).unwrap_err(),
        ProxyError::ReentrantInitialization { .. }
    ));
}

#[test]
fn test_set_proxy_rejects_wrong_shape() {
    let mapping = CollectionMapping::new(
        "Order.lines",
        ContainerShape::List,
        "all",
        Arc::new(BasicElementType::new(DataType::Text)),
    )
    .unwrap();
    assert!(matches!(
        SetProxy::new(owner(), mapping),
        Err(ProxyError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_directly_accessible_set_skips_loading() {
    let session = session_with(&["seed-should-not-load"]);
    let values: HashSet<Value> = [Value::from("a")].into_iter().collect();
    let mut tags = SetProxy::from_existing(owner(), text_mapping(), values).unwrap();

    assert!(tags.base().is_directly_accessible());
    assert_eq!(tags.len(&session).unwrap(), 1);
    assert_eq!(session.load_count(), 0);
}
