use std::cell::RefCell;

use assert_call::{call, CallRecorder};
use rstest::rstest;

use super::*;
use crate::{Change, ChangeKind, PropertyError};

type Record<T> = (usize, Vec<T>, Vec<T>);

fn record<T: Clone + 'static>(list: &ListProperty<T>) -> Rc<RefCell<Vec<Record<T>>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    list.add_listener(move |c: &ListChange<T>| {
        sink.borrow_mut().push((
            c.start_index(),
            c.old_values().to_vec(),
            c.new_values().to_vec(),
        ))
    });
    changes
}

fn grouped(values: Vec<i32>, grouping: RemovalGrouping) -> ListProperty<i32> {
    ListProperty::with_config(values, PropertyConfig::new().with_removal_grouping(grouping))
}

#[test]
fn add_appends_at_end() {
    let list = ListProperty::new();
    let changes = record(&list);
    for v in [1, 3, 2, 3, 2] {
        list.add(v);
    }
    assert_eq!(
        *changes.borrow(),
        vec![
            (0, vec![], vec![1]),
            (1, vec![], vec![3]),
            (2, vec![], vec![2]),
            (3, vec![], vec![3]),
            (4, vec![], vec![2]),
        ]
    );
    assert_eq!(list.to_vec(), vec![1, 3, 2, 3, 2]);
}

#[test]
fn insert_checks_index() {
    let list = ListProperty::from_vec(vec![1, 2]);
    let changes = record(&list);
    list.insert(1, 5).unwrap();
    assert_eq!(list.to_vec(), vec![1, 5, 2]);
    assert_eq!(
        list.insert(4, 9),
        Err(PropertyError::IndexOutOfBounds { index: 4, len: 3 })
    );
    assert_eq!(*changes.borrow(), vec![(1, vec![], vec![5])]);
}

#[test]
fn add_all_at_inserts_block() {
    let list = ListProperty::from_vec(vec![1, 4]);
    let changes = record(&list);
    list.add_all_at(1, [2, 3]).unwrap();
    list.add_all([5, 6]);
    assert_eq!(list.to_vec(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(
        *changes.borrow(),
        vec![(1, vec![], vec![2, 3]), (4, vec![], vec![5, 6])]
    );
}

#[test]
fn add_all_empty_is_silent() {
    let list = ListProperty::from_vec(vec![1]);
    let changes = record(&list);
    list.add_all(Vec::new());
    list.add_all_at(0, Vec::new()).unwrap();
    assert!(changes.borrow().is_empty());
    assert!(list.add_all_at(3, Vec::new()).is_err());
}

#[test]
fn remove_first_occurrence() {
    let list = ListProperty::from_vec(vec![1, 2, 3, 2]);
    let changes = record(&list);
    assert!(list.remove(&2));
    assert!(!list.remove(&7));
    assert_eq!(list.to_vec(), vec![1, 3, 2]);
    assert_eq!(*changes.borrow(), vec![(1, vec![2], vec![])]);
}

#[test]
fn remove_at_out_of_bounds_leaves_store() {
    let list = ListProperty::from_vec(vec![1, 2, 3]);
    let changes = record(&list);
    assert_eq!(list.remove_at(1), Ok(2));
    assert_eq!(
        list.remove_at(2),
        Err(PropertyError::IndexOutOfBounds { index: 2, len: 2 })
    );
    assert_eq!(list.to_vec(), vec![1, 3]);
    assert_eq!(*changes.borrow(), vec![(1, vec![2], vec![])]);
}

#[test]
fn set_replaces_and_skips_equal() {
    let list = ListProperty::from_vec(vec![1.0, f64::NAN]);
    let changes = record(&list);
    assert_eq!(list.set(0, 2.0), Ok(1.0));
    assert!(list.set(1, f64::NAN).unwrap().is_nan());
    assert_eq!(changes.borrow().len(), 1);
    assert_eq!(changes.borrow()[0], (0, vec![1.0], vec![2.0]));
    assert!(list.set(2, 0.0).is_err());
}

#[test]
fn remove_all_per_element() {
    let list = ListProperty::from_vec(vec![1, 2, 3]);
    let changes = record(&list);
    assert!(list.remove_all(&[2, 3, 1]));
    assert!(list.is_empty());
    assert_eq!(
        *changes.borrow(),
        vec![(0, vec![1], vec![]), (0, vec![2], vec![]), (0, vec![3], vec![])]
    );
}

#[test]
fn remove_all_shifts_indices() {
    let list = ListProperty::from_vec(vec![0, 1, 2, 3, 4, 5]);
    let changes = record(&list);
    list.remove_all(&[1, 4]);
    assert_eq!(list.to_vec(), vec![0, 2, 3, 5]);
    assert_eq!(
        *changes.borrow(),
        vec![(1, vec![1], vec![]), (3, vec![4], vec![])]
    );
}

#[test]
fn remove_all_contiguous_runs() {
    let list = grouped(vec![1, 2, 3, 4, 5, 6], RemovalGrouping::ContiguousRuns);
    let changes = record(&list);
    list.remove_all(&[2, 3, 5, 6]);
    assert_eq!(list.to_vec(), vec![1, 4]);
    assert_eq!(
        *changes.borrow(),
        vec![(1, vec![2, 3], vec![]), (2, vec![5, 6], vec![])]
    );
}

#[rstest]
fn bulk_removal_replays(
    #[values(RemovalGrouping::PerElement, RemovalGrouping::ContiguousRuns)] grouping: RemovalGrouping,
) {
    let before = vec![5, 1, 1, 7, 2, 1, 9, 9, 1];
    let list = grouped(before.clone(), grouping);
    let mirror = Rc::new(RefCell::new(before));
    let m = mirror.clone();
    list.add_listener(move |c| c.apply_to(&mut m.borrow_mut()).unwrap());

    assert!(list.retain_all(&[1, 9]));
    assert_eq!(*mirror.borrow(), list.to_vec());
    assert!(list.remove_all(&[9]));
    assert_eq!(*mirror.borrow(), list.to_vec());
    assert_eq!(list.to_vec(), vec![1, 1, 1, 1]);
}

#[test]
fn bulk_removal_without_match_is_silent() {
    let list = ListProperty::from_vec(vec![1, 2]);
    let changes = record(&list);
    assert!(!list.remove_all(&[3]));
    assert!(!list.retain_all(&[1, 2]));
    assert!(!list.retain(|_| true));
    assert!(changes.borrow().is_empty());
}

#[test]
fn clear_emits_single_change() {
    let list = ListProperty::from_vec(vec![1, 2, 3]);
    let changes = record(&list);
    list.clear();
    list.clear();
    assert!(list.is_empty());
    assert_eq!(*changes.borrow(), vec![(0, vec![1, 2, 3], vec![])]);
}

#[test]
fn change_kind_is_exclusive() {
    let list = ListProperty::from_vec(vec![1]);
    let kinds = Rc::new(RefCell::new(Vec::new()));
    let k = kinds.clone();
    list.add_listener(move |c| {
        let flags = [c.values_added(), c.values_replaced(), c.values_removed()];
        assert_eq!(flags.iter().filter(|x| **x).count(), 1);
        k.borrow_mut().push(c.kind());
    });
    list.add(2);
    list.set(0, 5).unwrap();
    list.remove_at(0).unwrap();
    assert_eq!(
        *kinds.borrow(),
        vec![ChangeKind::Added, ChangeKind::Replaced, ChangeKind::Removed]
    );
}

#[test]
fn view_is_live() {
    let list = ListProperty::from_vec(vec![1]);
    let view = list.view();
    list.add(2);
    assert_eq!(view.to_vec(), vec![1, 2]);
    list.remove_at(0).unwrap();
    assert_eq!(&*view.borrow(), &[2]);
    assert_eq!(view.get(0), Some(2));
    assert!(view.contains(&2));
    assert!(view.is_view_of(&list));
}

#[test]
fn change_holds_source() {
    let list = ListProperty::with_config(vec![], PropertyConfig::new().named("items"));
    let other = list.clone();
    list.add_listener(move |c: &ListChange<i32>| {
        assert!(c.source().ptr_eq(&other));
        assert_eq!(c.source().name(), Some("items"));
    });
    list.add(1);
}

#[test]
fn listeners_run_in_registration_order() {
    let mut cr = CallRecorder::new();
    let list = ListProperty::new();
    list.add_listener(|c: &ListChange<i32>| call!("a {}", c.new_values()[0]));
    let key = list.add_listener(|c: &ListChange<i32>| call!("b {}", c.new_values()[0]));
    list.add_listener(|c: &ListChange<i32>| call!("c {}", c.new_values()[0]));
    list.add(1);
    cr.verify(["a 1", "b 1", "c 1"]);

    assert!(list.remove_listener(key));
    assert!(!list.remove_listener(key));
    list.add(2);
    cr.verify(["a 2", "c 2"]);
}

#[test]
fn subscription_unregisters_on_drop() {
    let mut cr = CallRecorder::new();
    let list = ListProperty::new();
    let s = list.subscribe(|_: &ListChange<i32>| call!("changed"));
    list.add(1);
    cr.verify("changed");
    drop(s);
    assert_eq!(list.listener_count(), 0);
    list.add(2);
    cr.verify(());
}

#[test]
fn dispose_keeps_contents() {
    let mut cr = CallRecorder::new();
    let list = ListProperty::from_vec(vec![1]);
    list.add_listener(|_: &ListChange<i32>| call!("changed"));
    list.dispose();
    list.dispose();
    list.add(2);
    cr.verify(());
    assert_eq!(list.to_vec(), vec![1, 2]);
}

#[test]
fn nested_mutation_from_listener() {
    let list = ListProperty::new();
    let changes = record(&list);
    let this = list.clone();
    list.add_listener(move |c: &ListChange<i32>| {
        if c.new_values() == [1] {
            this.add(2);
        }
    });
    list.add(1);
    assert_eq!(list.to_vec(), vec![1, 2]);
    assert_eq!(
        *changes.borrow(),
        vec![(0, vec![], vec![1]), (1, vec![], vec![2])]
    );
}

#[test]
fn listener_added_during_dispatch_waits_for_next_change() {
    let mut cr = CallRecorder::new();
    let list = ListProperty::new();
    let this = list.clone();
    list.add_listener(move |c: &ListChange<i32>| {
        call!("outer {}", c.new_values()[0]);
        if this.listener_count() == 1 {
            this.add_listener(|c: &ListChange<i32>| call!("inner {}", c.new_values()[0]));
        }
    });
    list.add(1);
    cr.verify("outer 1");
    list.add(2);
    cr.verify(["outer 2", "inner 2"]);
}

#[rstest]
fn listener_mutation_during_bulk_removal_replays(
    #[values(RemovalGrouping::PerElement, RemovalGrouping::ContiguousRuns)] grouping: RemovalGrouping,
) {
    let list = grouped(vec![10, 0, 20, 0], grouping);
    let mirror = Rc::new(RefCell::new(list.to_vec()));
    let m = mirror.clone();
    list.add_listener(move |c| c.apply_to(&mut m.borrow_mut()).unwrap());
    let this = list.clone();
    list.add_listener(move |c: &ListChange<i32>| {
        if c.start_index() == 1 && c.values_removed() {
            this.add(30);
        }
    });
    let changes = record(&list);

    assert!(list.remove_all(&[0]));
    assert_eq!(list.to_vec(), vec![10, 20, 30]);
    assert_eq!(*mirror.borrow(), list.to_vec());
    assert_eq!(
        *changes.borrow(),
        vec![
            (3, vec![], vec![30]),
            (1, vec![0], vec![]),
            (2, vec![0], vec![]),
        ]
    );
}

#[test]
fn listener_removal_during_retain_all_is_seen() {
    let list = grouped(vec![1, 2, 3, 4, 5], RemovalGrouping::ContiguousRuns);
    let mirror = Rc::new(RefCell::new(list.to_vec()));
    let m = mirror.clone();
    list.add_listener(move |c| c.apply_to(&mut m.borrow_mut()).unwrap());
    let this = list.clone();
    list.add_listener(move |c: &ListChange<i32>| {
        if c.old_values() == [2] {
            this.remove(&4);
        }
    });

    assert!(list.retain_all(&[1, 3, 5]));
    assert_eq!(list.to_vec(), vec![1, 3, 5]);
    assert_eq!(*mirror.borrow(), list.to_vec());
}

#[test]
fn add_all_reads_list_while_iterating() {
    let list = ListProperty::from_vec(vec![1, 2]);
    let changes = record(&list);
    list.add_all((0..2).map(|_| list.len() as i32));
    assert_eq!(list.to_vec(), vec![1, 2, 2, 2]);
    assert_eq!(*changes.borrow(), vec![(2, vec![], vec![2, 2])]);
}
