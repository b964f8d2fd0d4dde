//! Replaying the emitted changes on a copy of the previous contents must reproduce
//! the new contents, for arbitrary sequences of operations.

use std::{cell::RefCell, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use obsprop::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum ListOp {
    Add(u8),
    Insert(usize, u8),
    AddAll(Vec<u8>),
    AddAllAt(usize, Vec<u8>),
    Set(usize, u8),
    Remove(u8),
    RemoveAt(usize),
    RemoveAll(Vec<u8>),
    RetainAll(Vec<u8>),
    Clear,
}

fn small_vec() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..8, 0..5)
}

fn list_op() -> impl Strategy<Value = ListOp> {
    prop_oneof![
        (0u8..8).prop_map(ListOp::Add),
        (0usize..10, 0u8..8).prop_map(|(i, v)| ListOp::Insert(i, v)),
        small_vec().prop_map(ListOp::AddAll),
        (0usize..10, small_vec()).prop_map(|(i, v)| ListOp::AddAllAt(i, v)),
        (0usize..10, 0u8..8).prop_map(|(i, v)| ListOp::Set(i, v)),
        (0u8..8).prop_map(ListOp::Remove),
        (0usize..10).prop_map(ListOp::RemoveAt),
        small_vec().prop_map(ListOp::RemoveAll),
        small_vec().prop_map(ListOp::RetainAll),
        Just(ListOp::Clear),
    ]
}

fn apply_list_op(list: &ListProperty<u8>, op: &ListOp) {
    match op {
        ListOp::Add(v) => list.add(*v),
        ListOp::Insert(i, v) => {
            let _ = list.insert(*i, *v);
        }
        ListOp::AddAll(vs) => list.add_all(vs.iter().copied()),
        ListOp::AddAllAt(i, vs) => {
            let _ = list.add_all_at(*i, vs.iter().copied());
        }
        ListOp::Set(i, v) => {
            let _ = list.set(*i, *v);
        }
        ListOp::Remove(v) => {
            list.remove(v);
        }
        ListOp::RemoveAt(i) => {
            let _ = list.remove_at(*i);
        }
        ListOp::RemoveAll(vs) => {
            list.remove_all(vs);
        }
        ListOp::RetainAll(vs) => {
            list.retain_all(vs);
        }
        ListOp::Clear => list.clear(),
    }
}

fn grouping() -> impl Strategy<Value = RemovalGrouping> {
    prop_oneof![
        Just(RemovalGrouping::PerElement),
        Just(RemovalGrouping::ContiguousRuns),
    ]
}

#[derive(Debug, Clone)]
enum SetOp {
    Add(u8),
    AddAll(Vec<u8>),
    Remove(u8),
    RemoveAll(Vec<u8>),
    RetainAll(Vec<u8>),
    Clear,
}

fn set_op() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        (0u8..8).prop_map(SetOp::Add),
        small_vec().prop_map(SetOp::AddAll),
        (0u8..8).prop_map(SetOp::Remove),
        small_vec().prop_map(SetOp::RemoveAll),
        small_vec().prop_map(SetOp::RetainAll),
        Just(SetOp::Clear),
    ]
}

#[derive(Debug, Clone)]
enum MapOp {
    Put(u8, u8),
    PutAll(Vec<(u8, u8)>),
    Remove(u8),
    Clear,
}

fn map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (0u8..6, 0u8..4).prop_map(|(k, v)| MapOp::Put(k, v)),
        prop::collection::vec((0u8..6, 0u8..4), 0..5).prop_map(MapOp::PutAll),
        (0u8..6).prop_map(MapOp::Remove),
        Just(MapOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn list_changes_replay(
        initial in small_vec(),
        ops in prop::collection::vec(list_op(), 1..20),
        grouping in grouping(),
    ) {
        let list = ListProperty::with_config(
            initial.clone(),
            PropertyConfig::new().with_removal_grouping(grouping),
        );
        let mirror = Rc::new(RefCell::new(initial));
        let failures = Rc::new(RefCell::new(Vec::new()));
        let (m, f) = (mirror.clone(), failures.clone());
        list.add_listener(move |c: &ListChange<u8>| {
            let kinds = [c.values_added(), c.values_replaced(), c.values_removed()];
            if kinds.iter().filter(|k| **k).count() != 1 {
                f.borrow_mut().push(format!("{c:?}"));
            }
            if let Err(e) = c.apply_to(&mut m.borrow_mut()) {
                f.borrow_mut().push(e.to_string());
            }
        });
        for op in &ops {
            apply_list_op(&list, op);
            prop_assert_eq!(&*mirror.borrow(), &list.to_vec(), "after {:?}", op);
        }
        prop_assert!(failures.borrow().is_empty(), "{:?}", failures.borrow());
    }

    #[test]
    fn set_changes_replay(
        initial in small_vec(),
        ops in prop::collection::vec(set_op(), 1..20),
    ) {
        let set: SetProperty<u8> = initial.into_iter().collect();
        let mirror = Rc::new(RefCell::new(set.to_set()));
        let failures = Rc::new(RefCell::new(Vec::new()));
        let (m, f) = (mirror.clone(), failures.clone());
        set.add_listener(move |c: &SetChange<u8>| {
            let (old, new) = (c.old_values(), c.new_values());
            if old.is_empty() == new.is_empty() || old.iter().any(|v| new.contains(v)) {
                f.borrow_mut().push(format!("{c:?}"));
            }
            c.apply_to(&mut m.borrow_mut());
        });
        for op in &ops {
            match op {
                SetOp::Add(v) => { set.add(*v); }
                SetOp::AddAll(vs) => { set.add_all(vs.iter().copied()); }
                SetOp::Remove(v) => { set.remove(v); }
                SetOp::RemoveAll(vs) => { set.remove_all(vs); }
                SetOp::RetainAll(vs) => { set.retain_all(vs); }
                SetOp::Clear => set.clear(),
            }
            let expected: IndexSet<u8> = set.to_set();
            prop_assert!(mirror.borrow().len() == expected.len()
                && expected.iter().all(|v| mirror.borrow().contains(v)), "after {:?}", op);
        }
        prop_assert!(failures.borrow().is_empty(), "{:?}", failures.borrow());
    }

    #[test]
    fn map_changes_replay(
        ops in prop::collection::vec(map_op(), 1..20),
    ) {
        let map = MapProperty::<u8, u8>::new();
        let mirror = Rc::new(RefCell::new(IndexMap::new()));
        let failures = Rc::new(RefCell::new(Vec::new()));
        let (m, f) = (mirror.clone(), failures.clone());
        map.add_listener(move |c: &MapChange<u8, u8>| {
            let kinds = [c.values_added(), c.values_replaced(), c.values_removed()];
            if kinds.iter().filter(|k| **k).count() != 1 {
                f.borrow_mut().push(format!("{c:?}"));
            }
            if c.values_replaced()
                && (c.old_values().len() != c.new_values().len()
                    || c.old_values().iter().any(|(k, v)| c.new_values().get(k) == Some(v)))
            {
                f.borrow_mut().push(format!("{c:?}"));
            }
            c.apply_to(&mut m.borrow_mut());
        });
        for op in &ops {
            match op {
                MapOp::Put(k, v) => { map.put(*k, *v); }
                MapOp::PutAll(entries) => map.put_all(entries.iter().copied()),
                MapOp::Remove(k) => { map.remove(k); }
                MapOp::Clear => map.clear(),
            }
            let expected = map.to_map();
            prop_assert!(mirror.borrow().len() == expected.len()
                && expected.iter().all(|(k, v)| mirror.borrow().get(k) == Some(v)), "after {:?}", op);
        }
        prop_assert!(failures.borrow().is_empty(), "{:?}", failures.borrow());
    }
}
