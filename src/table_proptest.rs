#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can
// call the internal invariant checker after every operation.

use crate::table::ChainedHashTable;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertAt(usize, i32),
    Erase(usize),
    EraseAt(usize),
    Get(usize),
    GetOrDefault(usize),
    Contains(String),
    Iterate,
    Rehash(usize),
    SetMaxLoadFactor(f64),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let pool: Vec<String> = pool.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertAt(i, v)),
            idx.clone().prop_map(Op::Erase),
            idx.clone().prop_map(Op::EraseAt),
            idx.clone().prop_map(Op::Get),
            idx.clone().prop_map(Op::GetOrDefault),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            Just(Op::Iterate),
            (0usize..600).prop_map(Op::Rehash),
            (0.2f64..4.0).prop_map(Op::SetMaxLoadFactor),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_scenario<S>(table: ChainedHashTable<String, i32, S>, pool: Vec<String>, ops: Vec<Op>) -> std::result::Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut sut = table;
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let inserted = sut.insert(k.clone(), v).expect("sizes inexhaustible here");
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.insert(k, v);
            }
            Op::InsertAt(i, v) => {
                let k = pool[i].clone();
                let loc = sut.find(k.as_str());
                prop_assert_eq!(loc.is_found(), model.contains_key(&k));
                let inserted = sut.insert_at(loc, k.clone(), v).expect("sizes inexhaustible here");
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.insert(k, v);
            }
            Op::Erase(i) => {
                let k = &pool[i];
                let erased = sut.erase(k.as_str());
                prop_assert_eq!(erased, model.remove(k).is_some());
            }
            Op::EraseAt(i) => {
                let k = &pool[i];
                let loc = sut.find(k.as_str());
                let succ = sut.erase_at(loc);
                if model.remove(k).is_some() {
                    // The successor, when found, must reference some
                    // entry that is still live in the model.
                    if let Some(sk) = succ.key(&sut) {
                        prop_assert!(model.contains_key(sk));
                    }
                } else {
                    prop_assert_eq!(succ, loc);
                }
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k.as_str()), model.get(k));
            }
            Op::GetOrDefault(i) => {
                let k = pool[i].clone();
                let v = sut.get_or_default(k.clone()).expect("sizes inexhaustible here");
                let mv = model.entry(k).or_default();
                prop_assert_eq!(*v, *mv);
                *v += 1;
                *mv += 1;
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains_key(&s));
            }
            Op::Iterate => {
                let got: HashMap<String, i32> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(got.len(), sut.len(), "iteration revisited an entry");
                prop_assert_eq!(&got, &model);
            }
            Op::Rehash(min) => {
                let before = sut.bucket_count();
                sut.rehash(min).expect("sizes inexhaustible here");
                prop_assert!(sut.bucket_count() >= before.min(min));
            }
            Op::SetMaxLoadFactor(f) => {
                sut.set_max_load_factor(f).expect("factor in valid range");
                prop_assert_eq!(sut.max_load_factor(), f);
            }
        }

        // Post-conditions after each op.
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
    }

    // Final sweep: the table and the model agree entry for entry.
    let got: HashMap<String, i32> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(got, model);
    Ok(())
}

// Property: state-machine equivalence against std HashMap, with the
// internal invariant checker run after every step. Covers insert /
// insert_at / erase / erase_at / get / get_or_default / contains /
// iterate / rehash / set_max_load_factor interleavings.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashTable::new(), pool, ops)?;
    }
}

// Collision variant: a constant hasher drives every key into one chain,
// stressing predecessor tracking and unlink paths.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashTable::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}

// Property: after any insert-only sequence, the load factor respects the
// cap and every inserted key resolves to its latest value.
proptest! {
    #[test]
    fn prop_insert_only_load_cap(entries in proptest::collection::vec(("[a-z]{0,6}", any::<i32>()), 0..200)) {
        let mut sut: ChainedHashTable<String, i32> = ChainedHashTable::new();
        let mut model: HashMap<String, i32> = HashMap::new();
        for (k, v) in entries {
            sut.insert(k.clone(), v).expect("sizes inexhaustible here");
            model.insert(k, v);
            prop_assert!(sut.load_factor() <= sut.max_load_factor());
        }
        sut.assert_invariants();
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k.as_str()), Some(v));
        }
        prop_assert_eq!(sut.len(), model.len());
    }
}

// Property: clones are observationally identical to the original and
// fully isolated from later mutation on either side.
proptest! {
    #[test]
    fn prop_clone_isolation(entries in proptest::collection::vec(("[a-z]{0,4}", any::<i32>()), 0..60)) {
        let mut original: ChainedHashTable<String, i32> = ChainedHashTable::new();
        for (k, v) in &entries {
            original.insert(k.clone(), *v).expect("sizes inexhaustible here");
        }
        let snapshot: HashMap<String, i32> =
            original.iter().map(|(k, v)| (k.clone(), *v)).collect();

        let mut copy = original.clone();
        copy.assert_invariants();
        for (k, _) in &entries {
            copy.erase(k.as_str());
        }
        copy.insert("fresh".to_string(), -1).expect("sizes inexhaustible here");
        copy.assert_invariants();
        original.assert_invariants();

        let after: HashMap<String, i32> =
            original.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(&after, &snapshot);
        prop_assert!(!original.contains("fresh") || snapshot.contains_key("fresh"));
    }
}
