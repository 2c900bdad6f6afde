//! Tests for the window registry, running several contexts against one
//! in-memory store.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use casement_common::{RegistrationState, RegistryError, Shape, StoreError, WindowEntry, WindowId};
use casement_store::{MemoryStore, SharedStore, StorageEvent, Subscription};
use serde_json::json;

use super::*;
use crate::shape::SharedShape;
use crate::{COUNT_KEY, WINDOWS_KEY};

type TestRegistry = WindowRegistry<MemoryStore, SharedShape>;

fn shape_at(x: f64) -> Shape {
    Shape::new(x, 0.0, 800.0, 600.0)
}

/// A new context on `root`, with a handle to move its window around.
fn context(root: &MemoryStore, x: f64) -> (TestRegistry, SharedShape) {
    let shape = SharedShape::new(shape_at(x));
    (WindowRegistry::new(root.open_handle(), shape.clone()), shape)
}

fn stored_windows(root: &MemoryStore) -> Vec<WindowEntry> {
    let raw = root.get(WINDOWS_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn stored_count(root: &MemoryStore) -> Option<String> {
    root.get(COUNT_KEY).unwrap()
}

fn ids(windows: &[WindowEntry]) -> Vec<u64> {
    windows.iter().map(|w| w.id.0).collect()
}

/// A store handle whose next `failures` writes fail.
struct FlakyStore {
    inner: MemoryStore,
    failures: Cell<u32>,
}

impl FlakyStore {
    fn new(root: &MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner: root.open_handle(),
            failures: Cell::new(0),
        })
    }

    fn fail_next(&self, failures: u32) {
        self.failures.set(failures);
    }
}

impl SharedStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let remaining = self.failures.get();
        if remaining > 0 {
            self.failures.set(remaining - 1);
            return Err(StoreError::Poisoned);
        }
        self.inner.set(key, value)
    }

    fn subscribe(&self) -> Subscription {
        self.inner.subscribe()
    }
}

// -- register --

#[test]
fn ids_are_distinct_and_increasing() {
    let root = MemoryStore::new();
    let mut assigned = Vec::new();
    for i in 0..5 {
        let (mut reg, _) = context(&root, i as f64 * 100.0);
        assigned.push(reg.register(json!(null)).unwrap().id);
    }
    assert_eq!(
        assigned,
        vec![WindowId(1), WindowId(2), WindowId(3), WindowId(4), WindowId(5)]
    );
    assert_eq!(stored_count(&root).as_deref(), Some("5"));
    assert_eq!(ids(&stored_windows(&root)), vec![1, 2, 3, 4, 5]);
}

#[test]
fn own_entry_matches_own_id_and_appears_once() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    a.register(json!({"name": "a"})).unwrap();
    let entry = b.register(json!({"name": "b"})).unwrap();

    assert_eq!(b.state(), RegistrationState::Registered);
    assert_eq!(b.own_id(), Some(entry.id));
    assert_eq!(b.own_entry().map(|e| e.id), b.own_id());
    assert_eq!(b.windows().iter().filter(|w| w.id == entry.id).count(), 1);
    assert_eq!(b.own_entry().unwrap().meta_data, json!({"name": "b"}));
    assert_eq!(b.own_entry().unwrap().shape, shape_at(100.0));
}

#[test]
fn register_writes_count_then_windows() {
    let root = MemoryStore::new();
    let observer = root.open_handle();
    let mut sub = observer.subscribe();
    let (mut a, _) = context(&root, 0.0);

    a.register(json!(null)).unwrap();

    assert_eq!(sub.try_next().unwrap().unwrap().key, COUNT_KEY);
    assert_eq!(sub.try_next().unwrap().unwrap().key, WINDOWS_KEY);
    assert!(sub.try_next().unwrap().is_none());
    assert_eq!(root.write_count(), 2);
}

#[test]
fn register_twice_fails_without_writing() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();
    let writes = root.write_count();

    let err = a.register(json!(null)).unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRegistered));
    assert_eq!(root.write_count(), writes);
    assert_eq!(stored_count(&root).as_deref(), Some("1"));
}

#[test]
fn register_keeps_metadata_verbatim() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let meta = json!({"color": [1, 2, 3], "nested": {"deep": true}});
    a.register(meta.clone()).unwrap();
    assert_eq!(stored_windows(&root)[0].meta_data, meta);
}

#[test]
fn register_treats_corrupt_values_as_defaults() {
    let root = MemoryStore::new();
    root.set(COUNT_KEY, "not a number").unwrap();
    root.set(WINDOWS_KEY, "{{{").unwrap();
    let (mut a, _) = context(&root, 0.0);

    let entry = a.register(json!(null)).unwrap();
    assert_eq!(entry.id, WindowId(1));
    assert_eq!(ids(&stored_windows(&root)), vec![1]);
}

#[test]
fn register_treats_null_windows_as_empty() {
    let root = MemoryStore::new();
    root.set(WINDOWS_KEY, "null").unwrap();
    root.set(COUNT_KEY, "41").unwrap();
    let (mut a, _) = context(&root, 0.0);

    let entry = a.register(json!(null)).unwrap();
    assert_eq!(entry.id, WindowId(42));
    assert_eq!(a.windows().len(), 1);
}

// -- operations outside the registered state --

#[test]
fn operations_before_register_fail_loudly() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);

    assert!(matches!(
        a.poll_shape_change().unwrap_err(),
        RegistryError::NotRegistered
    ));
    assert!(matches!(
        a.deregister().unwrap_err(),
        RegistryError::NotRegistered
    ));
    assert_eq!(root.write_count(), 0);
    assert_eq!(a.state(), RegistrationState::Unregistered);
    assert!(a.own_id().is_none());
}

#[test]
fn operations_after_deregister_fail_loudly() {
    let root = MemoryStore::new();
    let (mut a, shape) = context(&root, 0.0);
    a.register(json!(null)).unwrap();
    a.deregister().unwrap();
    let writes = root.write_count();

    shape.move_by(5.0, 0.0);
    assert!(matches!(
        a.poll_shape_change().unwrap_err(),
        RegistryError::Deregistered
    ));
    assert!(matches!(a.deregister().unwrap_err(), RegistryError::Deregistered));
    assert!(matches!(
        a.register(json!(null)).unwrap_err(),
        RegistryError::AlreadyRegistered
    ));
    assert_eq!(root.write_count(), writes);
    // The last own entry stays readable
    assert_eq!(a.own_id(), Some(WindowId(1)));
}

// -- poll_shape_change --

#[test]
fn unchanged_shape_writes_nothing_and_skips_callback() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_shape_changed_callback(move |_| counter.set(counter.get() + 1));

    let writes = root.write_count();
    for _ in 0..3 {
        assert!(!a.poll_shape_change().unwrap());
    }
    assert_eq!(root.write_count(), writes);
    assert_eq!(calls.get(), 0);
}

#[test]
fn changed_shape_updates_only_own_entry() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, b_shape) = context(&root, 100.0);
    let (mut c, _) = context(&root, 200.0);
    a.register(json!("a")).unwrap();
    b.register(json!("b")).unwrap();
    c.register(json!("c")).unwrap();
    b.pump_events().unwrap();

    let before = stored_windows(&root);
    b_shape.set(Shape::new(150.0, 30.0, 1024.0, 768.0));
    assert!(b.poll_shape_change().unwrap());

    let after = stored_windows(&root);
    assert_eq!(ids(&after), vec![1, 2, 3]);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].shape, Shape::new(150.0, 30.0, 1024.0, 768.0));
    assert_eq!(after[1].meta_data, json!("b"));
    assert_eq!(b.own_entry().unwrap().shape, after[1].shape);

    // Polling again with the same geometry is a no-op
    assert!(!b.poll_shape_change().unwrap());
}

#[test]
fn shape_callback_runs_before_the_write() {
    let root = MemoryStore::new();
    let (mut a, shape) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    let peek = root.open_handle();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    a.set_shape_changed_callback(move |entry| {
        let stored: Vec<WindowEntry> =
            serde_json::from_str(&peek.get(WINDOWS_KEY).unwrap().unwrap()).unwrap();
        log.borrow_mut().push((entry.shape, stored[0].shape));
    });

    shape.move_by(10.0, 20.0);
    assert!(a.poll_shape_change().unwrap());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    let (new_shape, stored_shape) = seen[0];
    assert_eq!(new_shape, Shape::new(10.0, 20.0, 800.0, 600.0));
    assert_eq!(stored_shape, shape_at(0.0));
    assert_eq!(stored_windows(&root)[0].shape, new_shape);
}

#[test]
fn peers_see_shape_change_without_peer_list_callback() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, b_shape) = context(&root, 100.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();
    a.pump_events().unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_peer_list_changed_callback(move |_| counter.set(counter.get() + 1));

    b_shape.resize(300.0, 200.0);
    b.poll_shape_change().unwrap();
    a.pump_events().unwrap();

    assert_eq!(calls.get(), 0);
    assert_eq!(a.windows()[1].shape.width, 300.0);
}

#[test]
fn poll_restores_own_entry_dropped_by_a_peer() {
    let root = MemoryStore::new();
    let (mut a, a_shape) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();

    // A stale write from elsewhere that only knows about b
    let stale = serde_json::to_string(&[b.own_entry().unwrap()]).unwrap();
    a.handle_external_change(Some(&stale));
    assert!(a.window_index(WindowId(1)).is_none());

    a_shape.move_by(1.0, 0.0);
    assert!(a.poll_shape_change().unwrap());
    assert_eq!(ids(&stored_windows(&root)), vec![2, 1]);
}

#[test]
fn non_finite_shape_is_refused_and_peers_are_kept() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    let (mut c, c_shape) = context(&root, 200.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();
    c.register(json!(null)).unwrap();
    a.pump_events().unwrap();
    let writes = root.write_count();

    c_shape.set(Shape::new(f64::NAN, 0.0, 800.0, 600.0));
    assert!(matches!(
        c.poll_shape_change().unwrap_err(),
        RegistryError::InvalidShape(_)
    ));
    assert!(matches!(
        c.poll_shape_change().unwrap_err(),
        RegistryError::InvalidShape(_)
    ));
    assert_eq!(root.write_count(), writes);
    assert!(c.own_entry().unwrap().shape.is_finite());

    a.pump_events().unwrap();
    assert_eq!(ids(a.windows()), vec![1, 2, 3]);
    a.poll_shape_change().unwrap();
    assert_eq!(ids(&stored_windows(&root)), vec![1, 2, 3]);

    // Back to a finite shape, c publishes again
    c_shape.set(shape_at(250.0));
    assert!(c.poll_shape_change().unwrap());
    assert_eq!(stored_windows(&root)[2].shape, shape_at(250.0));
}

#[test]
fn register_refuses_non_finite_shape() {
    let root = MemoryStore::new();
    let shape = SharedShape::new(Shape::new(0.0, f64::INFINITY, 800.0, 600.0));
    let mut a = WindowRegistry::new(root.open_handle(), shape.clone());

    assert!(matches!(
        a.register(json!(null)).unwrap_err(),
        RegistryError::InvalidShape(_)
    ));
    assert_eq!(root.write_count(), 0);
    assert_eq!(a.state(), RegistrationState::Unregistered);

    shape.set(shape_at(0.0));
    assert_eq!(a.register(json!(null)).unwrap().id, WindowId(1));
}

#[test]
fn failed_shape_write_is_retried_on_next_poll() {
    let root = MemoryStore::new();
    let store = FlakyStore::new(&root);
    let shape = SharedShape::new(shape_at(0.0));
    let mut a = WindowRegistry::new(Arc::clone(&store), shape.clone());
    a.register(json!(null)).unwrap();

    shape.move_by(5.0, 0.0);
    store.fail_next(1);
    assert!(matches!(
        a.poll_shape_change().unwrap_err(),
        RegistryError::Store(StoreError::Poisoned)
    ));
    assert_eq!(a.own_entry().unwrap().shape, shape_at(0.0));

    assert!(a.poll_shape_change().unwrap());
    assert_eq!(stored_windows(&root)[0].shape, Shape::new(5.0, 0.0, 800.0, 600.0));
}

// -- deregister --

#[test]
fn failed_deregister_can_be_retried() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let store = FlakyStore::new(&root);
    let mut b = WindowRegistry::new(Arc::clone(&store), SharedShape::new(shape_at(100.0)));
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();

    store.fail_next(1);
    assert!(matches!(
        b.deregister().unwrap_err(),
        RegistryError::Store(StoreError::Poisoned)
    ));
    assert_eq!(b.state(), RegistrationState::Registered);
    assert_eq!(ids(b.windows()), vec![1, 2]);
    assert_eq!(ids(&stored_windows(&root)), vec![1, 2]);

    assert!(b.deregister().unwrap());
    assert_eq!(b.state(), RegistrationState::Deregistered);
    assert_eq!(ids(&stored_windows(&root)), vec![1]);
}

#[test]
fn deregister_removes_exactly_own_entry_and_keeps_count() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    let (mut c, _) = context(&root, 200.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();
    c.register(json!(null)).unwrap();
    b.pump_events().unwrap();

    assert!(b.deregister().unwrap());

    assert_eq!(ids(&stored_windows(&root)), vec![1, 3]);
    assert_eq!(stored_count(&root).as_deref(), Some("3"));
    assert_eq!(b.state(), RegistrationState::Deregistered);
}

#[test]
fn deregister_when_entry_already_gone_is_a_noop() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();
    a.handle_external_change(Some("[]"));
    let writes = root.write_count();

    assert!(!a.deregister().unwrap());
    assert_eq!(root.write_count(), writes);
}

#[test]
fn ids_are_not_reused_after_deregister() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();
    a.deregister().unwrap();

    let (mut b, _) = context(&root, 0.0);
    assert_eq!(b.register(json!(null)).unwrap().id, WindowId(2));
}

#[test]
fn deregister_does_not_notify_self() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_peer_list_changed_callback(move |_| counter.set(counter.get() + 1));

    a.deregister().unwrap();
    assert_eq!(a.pump_events().unwrap(), 0);
    assert_eq!(calls.get(), 0);
}

// -- external changes --

#[test]
fn different_length_always_triggers_callback() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    let lengths = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&lengths);
    a.set_peer_list_changed_callback(move |windows| log.borrow_mut().push(windows.len()));

    let one = a.own_entry().unwrap().clone();
    let mut two = one.clone();
    two.id = WindowId(9);

    let longer = serde_json::to_string(&[one.clone(), two]).unwrap();
    assert!(a.handle_external_change(Some(&longer)));
    assert!(a.handle_external_change(Some("[]")));
    assert_eq!(*lengths.borrow(), vec![2, 0]);
}

#[test]
fn same_ids_same_order_never_trigger_callback() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();
    a.pump_events().unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_peer_list_changed_callback(move |_| counter.set(counter.get() + 1));

    let mut moved: Vec<WindowEntry> = a.windows().to_vec();
    moved[1].shape = Shape::new(9.0, 9.0, 9.0, 9.0);
    moved[1].meta_data = json!("renamed");
    let raw = serde_json::to_string(&moved).unwrap();

    assert!(!a.handle_external_change(Some(&raw)));
    assert_eq!(calls.get(), 0);
    // The mirror still follows the store
    assert_eq!(a.windows()[1].meta_data, json!("renamed"));
}

#[test]
fn reordered_ids_count_as_a_change() {
    let a = WindowEntry::new(WindowId(1), shape_at(0.0), json!(null));
    let b = WindowEntry::new(WindowId(2), shape_at(1.0), json!(null));
    assert!(did_windows_change(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
    assert!(!did_windows_change(&[a.clone(), b.clone()], &[a, b]));
    assert!(!did_windows_change(&[], &[]));
}

#[test]
fn unparsable_external_value_reads_as_empty() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    assert!(a.handle_external_change(Some("definitely not json")));
    assert!(a.windows().is_empty());
    assert!(!a.handle_external_change(None));
}

#[test]
fn external_changes_are_handled_before_register() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    b.register(json!(null)).unwrap();

    assert_eq!(a.pump_events().unwrap(), 2);
    assert_eq!(ids(a.windows()), vec![1]);
}

#[test]
fn non_window_keys_are_ignored() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_peer_list_changed_callback(move |_| counter.set(counter.get() + 1));

    let event = StorageEvent::new(COUNT_KEY, None, Some("[1,2,3]".into()));
    assert!(!a.handle_storage_event(&event));
    assert_eq!(calls.get(), 0);
    assert!(a.windows().is_empty());
}

#[test]
fn lagged_subscription_resyncs_from_store() {
    let root = MemoryStore::with_capacity(2);
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    let (mut c, _) = context(&root, 200.0);
    a.register(json!(null)).unwrap();
    b.register(json!(null)).unwrap();
    c.register(json!(null)).unwrap();

    let lengths = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&lengths);
    a.set_peer_list_changed_callback(move |windows| log.borrow_mut().push(windows.len()));

    assert_eq!(a.pump_events().unwrap(), 1);
    assert_eq!(ids(a.windows()), vec![1, 2, 3]);
    assert_eq!(*lengths.borrow(), vec![3]);
}

// -- callbacks --

#[test]
fn registering_a_callback_replaces_the_previous_one() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);
    a.register(json!(null)).unwrap();

    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));
    let f = Rc::clone(&first);
    let s = Rc::clone(&second);
    a.set_peer_list_changed_callback(move |_| f.set(f.get() + 1));
    a.set_peer_list_changed_callback(move |_| s.set(s.get() + 1));

    b.register(json!(null)).unwrap();
    a.pump_events().unwrap();

    assert_eq!(first.get(), 0);
    assert_eq!(second.get(), 1);
}

#[test]
fn cleared_callbacks_are_not_called() {
    let root = MemoryStore::new();
    let (mut a, shape) = context(&root, 0.0);
    a.register(json!(null)).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    a.set_shape_changed_callback(move |_| counter.set(counter.get() + 1));
    a.clear_shape_changed_callback();

    shape.move_by(1.0, 1.0);
    assert!(a.poll_shape_change().unwrap());
    assert_eq!(calls.get(), 0);
}

// -- end to end --

#[test]
fn two_contexts_observe_each_other() {
    let root = MemoryStore::new();
    let (mut a, _) = context(&root, 0.0);
    let (mut b, _) = context(&root, 100.0);

    let seen = Rc::new(RefCell::new(Vec::<Vec<u64>>::new()));
    let log = Rc::clone(&seen);
    a.set_peer_list_changed_callback(move |windows| log.borrow_mut().push(ids(windows)));

    assert_eq!(a.register(json!(null)).unwrap().id, WindowId(1));
    assert_eq!(b.register(json!(null)).unwrap().id, WindowId(2));

    a.pump_events().unwrap();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(a.windows().len(), 2);

    b.deregister().unwrap();
    a.pump_events().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(a.windows().len(), 1);
    assert!(a.window_index(WindowId(2)).is_none());
    assert_eq!(seen[1], vec![1]);
}
