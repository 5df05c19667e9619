/// Dirty checking tests
///
/// Snapshot diffing: EqualsSnapshot, GetDeletes, NeedsInserting, GetOrphans,
/// and the delete-old/insert-new treatment of changed entity elements.
/// Run with: cargo test --test dirty_checking_tests

use lazycoll::{
    BasicElementType, CollectionMapping, CollectionProxy, CollectionRole, ContainerShape,
    DataType, EntityElementType, MemorySession, OwnerKey, SetProxy, Value,
};
use std::collections::HashSet;
use std::sync::Arc;

fn owner() -> OwnerKey {
    OwnerKey::new("Order", Value::Integer(1))
}

fn int_mapping(role: &str) -> CollectionMapping {
    CollectionMapping::new(
        role,
        ContainerShape::Set,
        "all-delete-orphan",
        Arc::new(BasicElementType::new(DataType::Integer)),
    )
    .unwrap()
}

fn line_mapping(role: &str) -> CollectionMapping {
    CollectionMapping::new(
        role,
        ContainerShape::Set,
        "all-delete-orphan",
        Arc::new(EntityElementType::new("Line")),
    )
    .unwrap()
}

fn loaded_ints(role: &str, values: &[i64]) -> (SetProxy, MemorySession) {
    let mut session = MemorySession::new();
    session.seed_rows(
        &owner(),
        &CollectionRole::new(role),
        values.iter().map(|v| vec![Value::Integer(*v)]).collect(),
    );
    let mut set = SetProxy::new(owner(), int_mapping(role)).unwrap();
    set.base_mut().initialize(false, &session).unwrap();
    (set, session)
}

#[test]
fn test_clean_after_initialization() {
    let (mut set, _session) = loaded_ints("Order.codes", &[1, 2, 3]);
    assert!(set.base_mut().equals_snapshot().unwrap());
    assert!(!set.base().is_dirty());
    assert!(set.base().get_deletes(false).unwrap().is_empty());
}

#[test]
fn test_membership_change_breaks_snapshot_equality() {
    let (mut set, session) = loaded_ints("Order.codes", &[1, 2, 3]);

    set.remove(&Value::Integer(2), &session).unwrap();
    assert!(!set.base_mut().equals_snapshot().unwrap());
    assert!(set.base().is_dirty());

    let (mut other, session) = loaded_ints("Order.codes", &[1, 2]);
    other.add(Value::Integer(9), &session).unwrap();
    assert!(!other.base_mut().equals_snapshot().unwrap());
}

#[test]
fn test_removed_element_shows_up_in_deletes() {
    let (mut set, session) = loaded_ints("Order.codes", &[1, 2, 3]);

    set.remove(&Value::Integer(2), &session).unwrap();

    assert_eq!(set.base().get_deletes(false).unwrap(), vec![Value::Integer(2)]);
    assert!(!set.base_mut().equals_snapshot().unwrap());
}

#[test]
fn test_snapshot_is_structurally_stable_across_reads() {
    // non-mutating operations leave the snapshot untouched
    let (mut set, session) = loaded_ints("Order.codes", &[1, 2]);

    let first = set.base().get_snapshot().unwrap().clone();
    let _ = set.contains(&Value::Integer(1), &session).unwrap();
    let _ = set.elements(&session).unwrap();
    let second = set.base().get_snapshot().unwrap().clone();

    assert_eq!(first, second);
}

#[test]
fn test_new_element_needs_inserting() {
    let (mut set, session) = loaded_ints("Order.codes", &[1]);

    set.add(Value::Integer(2), &session).unwrap();
    assert!(set.base().needs_inserting(&Value::Integer(2)).unwrap());
    assert!(!set.base().needs_inserting(&Value::Integer(1)).unwrap());
}

#[test]
fn test_dirty_entity_is_deleted_and_reinserted() {
    let mut session = MemorySession::new();
    session.seed_rows(
        &owner(),
        &CollectionRole::new("Order.lines"),
        vec![
            vec![Value::Integer(1), Value::Text("sku-a".into()), Value::Integer(2)],
            vec![Value::Integer(2), Value::Text("sku-b".into()), Value::Integer(5)],
        ],
    );
    let mut lines = SetProxy::new(owner(), line_mapping("Order.lines")).unwrap();
    lines.base_mut().initialize(false, &session).unwrap();
    assert!(lines.base_mut().equals_snapshot().unwrap());

    // edit line 1 in place: same identity, changed state
    let edited = Value::entity(
        "Line",
        Value::Integer(1),
        vec![Value::Text("sku-a".into()), Value::Integer(7)],
    );
    lines.remove(&edited, &session).unwrap();
    lines.add(edited.clone(), &session).unwrap();

    assert!(!lines.base_mut().equals_snapshot().unwrap());

    // changed element is modeled as replacement: delete old value...
    let deletes = lines.base().get_deletes(false).unwrap();
    assert_eq!(deletes.len(), 1);
    let old = deletes[0].as_entity().unwrap();
    assert_eq!(*old.id, Value::Integer(1));
    assert_eq!(old.state, vec![Value::Text("sku-a".into()), Value::Integer(2)]);

    // ...and re-insert the new one
    assert!(lines.base().needs_inserting(&edited).unwrap());
    let untouched = Value::entity(
        "Line",
        Value::Integer(2),
        vec![Value::Text("sku-b".into()), Value::Integer(5)],
    );
    assert!(!lines.base().needs_inserting(&untouched).unwrap());
}

#[test]
fn test_deletes_and_inserts_reconstruct_live_contents() {
    // replaying deletes then inserts against the snapshot yields the
    // live container
    let (mut set, session) = loaded_ints("Order.codes", &[1, 2, 3, 4]);

    set.remove(&Value::Integer(1), &session).unwrap();
    set.remove(&Value::Integer(3), &session).unwrap();
    set.add(Value::Integer(7), &session).unwrap();
    set.add(Value::Integer(8), &session).unwrap();

    let mut reconstructed: HashSet<Value> =
        set.base().get_snapshot().unwrap().iter().cloned().collect();
    for delete in set.base().get_deletes(false).unwrap() {
        reconstructed.remove(&delete);
    }
    let live: HashSet<Value> = set.elements(&session).unwrap().into_iter().collect();
    for element in &live {
        if set.base().needs_inserting(element).unwrap() {
            reconstructed.insert(element.clone());
        }
    }

    assert_eq!(reconstructed, live);
}

#[test]
fn test_orphans_for_delete_orphan_cascade() {
    let (mut set, session) = loaded_ints("Order.codes", &[1, 2, 3]);
    assert!(set.base().mapping().delete_orphan_enabled());

    set.remove(&Value::Integer(1), &session).unwrap();
    set.remove(&Value::Integer(3), &session).unwrap();
    set.add(Value::Integer(9), &session).unwrap();

    let mut orphans = CollectionProxy::get_orphans(
        set.base().get_snapshot().unwrap(),
        set.base().container(),
        "Order",
    );
    orphans.sort_by_key(|v| match v {
        Value::Integer(i) => *i,
        _ => 0,
    });
    assert_eq!(orphans, vec![Value::Integer(1), Value::Integer(3)]);
}

#[test]
fn test_diffing_before_initialization_is_rejected() {
    let set = SetProxy::new(owner(), int_mapping("Order.codes")).unwrap();
    assert!(set.base().get_deletes(false).is_err());
    assert!(set.base().needs_inserting(&Value::Integer(1)).is_err());
}
