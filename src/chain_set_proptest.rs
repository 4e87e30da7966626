#![cfg(test)]

// Property tests for ChainSet kept inside the crate so they can check the
// bucket/chain invariants after every operation.

use crate::chain_set::ChainSet;
use crate::cursor::Cursor;
use crate::error::CursorError;
use crate::policy::ResizePolicy;
use hashbrown::HashSet;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    InsertAll(Vec<usize>),
    Erase(usize),
    Take(usize),
    Find(usize),
    Contains(String),
    Clear,
    CloneAndMutate(usize),
    Rehash(usize),
    Iterate,
    Walk,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => idx.clone().prop_map(Op::Insert),
            1 => proptest::collection::vec(idx.clone(), 0..12).prop_map(Op::InsertAll),
            3 => idx.clone().prop_map(Op::Erase),
            1 => idx.clone().prop_map(Op::Take),
            2 => idx.clone().prop_map(Op::Find),
            1 => "[a-z]{0,4}".prop_map(Op::Contains),
            1 => Just(Op::Clear),
            1 => idx.clone().prop_map(Op::CloneAndMutate),
            1 => (0usize..64).prop_map(Op::Rehash),
            1 => Just(Op::Iterate),
            1 => Just(Op::Walk),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Aggressive thresholds so short scenarios cross grow and shrink often.
fn tight_policy() -> ResizePolicy {
    ResizePolicy::default()
        .with_chain_trigger(1)
        .with_max_load_factor(0.75)
        .with_growth_factor(2.0)
        .with_shrink_load_factor(0.4)
}

fn run<S>(mut sut: ChainSet<Key, S>, pool: &[String], ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: BuildHasher + Clone,
{
    let mut model: HashSet<Key> = HashSet::new();
    let mut cursors: Vec<(Cursor, Key)> = Vec::new();

    for op in ops {
        let len_before = sut.len();
        let buckets_before = sut.buckets();
        let cleared = matches!(op, Op::Clear);
        match op {
            Op::Insert(i) => {
                let k = key_from(pool, i);
                let (c, inserted) = sut.insert(k.clone());
                prop_assert_eq!(inserted, model.insert(k.clone()));
                prop_assert_eq!(sut.get(&c), Ok(&k));
            }
            Op::InsertAll(is) => {
                let keys: Vec<Key> = is.iter().map(|&i| key_from(pool, i)).collect();
                let expected = keys.iter().filter(|k| model.insert((*k).clone())).count();
                prop_assert_eq!(sut.insert_all(keys), expected);
            }
            Op::Erase(i) => {
                let k = key_from(pool, i);
                let removed = sut.erase(&k);
                prop_assert_eq!(removed, usize::from(model.remove(&k)));
                prop_assert_eq!(sut.count(&k), 0);
            }
            Op::Take(i) => {
                let k = key_from(pool, i);
                let taken = sut.take(k.0.as_str());
                prop_assert_eq!(taken.is_some(), model.remove(&k));
                if let Some(t) = taken {
                    prop_assert_eq!(t, k);
                }
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(!c.is_end(), model.contains(&k));
                prop_assert_eq!(sut.count(&k), usize::from(model.contains(&k)));
                if !c.is_end() {
                    cursors.push((c, k));
                }
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains(s.as_str()));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
            Op::CloneAndMutate(i) => {
                let k = key_from(pool, i);
                let mut copy = sut.clone();
                prop_assert!(copy == sut);
                if copy.erase(&k) == 0 {
                    copy.insert(k.clone());
                }
                prop_assert!(copy != sut);
                prop_assert_eq!(sut.contains(&k), model.contains(&k));
                copy.assert_consistent();
            }
            Op::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.buckets() >= n);
                let by_load = (sut.len() as f64 / sut.policy().max_load_factor) as usize;
                prop_assert!(sut.buckets() >= by_load);
            }
            Op::Iterate => {
                let seen: Vec<&Key> = sut.iter().collect();
                let uniq: BTreeSet<&Key> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), uniq.len(), "iteration repeated a key");
                let expected: BTreeSet<&Key> = model.iter().collect();
                prop_assert_eq!(uniq, expected);
            }
            Op::Walk => {
                let mut walked = Vec::new();
                let mut c = sut.begin();
                while !c.is_end() {
                    walked.push(sut.get(&c).map_err(|e| TestCaseError::fail(e.to_string()))?);
                    sut.advance(&mut c).map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
                let iterated: Vec<&Key> = sut.iter().collect();
                prop_assert_eq!(walked, iterated);
            }
        }

        sut.assert_consistent();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.buckets() >= sut.policy().min_buckets);

        // Cursors survive exactly until the next structural change.
        let structural = cleared || sut.len() != len_before || sut.buckets() != buckets_before;
        if structural {
            for (c, _) in cursors.drain(..) {
                prop_assert_eq!(sut.get(&c), Err(CursorError::Stale));
            }
        } else {
            for (c, k) in &cursors {
                prop_assert_eq!(sut.get(c), Ok(k));
            }
        }
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashSet.
// Invariants exercised across random operation sequences:
// - Duplicate inserts are reported and never change `len`.
// - `erase`/`take`/`count`/`contains`/`find` agree with the model.
// - Iteration and cursor walks yield each stored key exactly once, in the same order.
// - Every key sits in bucket `hash mod buckets`; chain lengths sum to `len`.
// - Clones are equal to, and independent from, their source.
// - Cursors go stale on structural change and only then.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(ChainSet::new(), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_tight_policy((pool, ops) in arb_scenario()) {
        let sut = ChainSet::with_policy(tight_policy()).unwrap();
        run(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares one chain.
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
        let sut = ChainSet::with_policy_and_hasher(tight_policy(), ConstBuildHasher).unwrap();
        run(sut, &pool, ops)?;
    }
}
