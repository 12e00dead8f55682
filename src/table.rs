//! ChainedHashTable: separate chaining over an arena of index-linked nodes.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TableError};
use crate::sizes;

/// Load cap applied by `ChainedHashTable::new`.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

/// Floor below which `set_max_load_factor` rejects the factor outright;
/// anything smaller would demand absurd bucket counts for tiny tables.
const MIN_MAX_LOAD_FACTOR: f64 = 1e-9;

new_key_type! {
    /// Arena key of one chain node.
    struct NodeId;
}

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    next: Option<NodeId>, // singly linked, index-based
}

/// Position returned by [`ChainedHashTable::find`].
///
/// A found locator records the entry's bucket and its *predecessor*
/// within the chain (`None` meaning "before the head"), which is what
/// makes [`ChainedHashTable::erase_at`] O(1) on a singly linked chain. A
/// not-found locator still records the bucket the key hashes to, so
/// [`ChainedHashTable::insert_at`] can insert without hashing again.
///
/// A locator is only meaningful against the table that produced it and
/// only until that table's next structural mutation (an insert that
/// grows, an erase, or a rehash). Using a stale locator is a contract
/// violation; it will not corrupt memory (the arena's generational keys
/// turn dangling positions into misses) but the result is unspecified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    bucket: usize,
    pred: Option<NodeId>,
    found: bool,
}

impl Locator {
    fn missing(bucket: usize) -> Self {
        Locator {
            bucket,
            pred: None,
            found: false,
        }
    }

    /// Whether this locator references a live entry.
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Key of the referenced entry, if any.
    pub fn key<'a, K, V, S>(&self, table: &'a ChainedHashTable<K, V, S>) -> Option<&'a K>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        let id = table.entry_at(*self)?;
        Some(&table.nodes[id].key)
    }

    /// Value of the referenced entry, if any.
    pub fn value<'a, K, V, S>(&self, table: &'a ChainedHashTable<K, V, S>) -> Option<&'a V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        let id = table.entry_at(*self)?;
        Some(&table.nodes[id].value)
    }

    /// Mutable value of the referenced entry, if any. Overwriting through
    /// this reference is a non-structural mutation and invalidates
    /// nothing.
    pub fn value_mut<'a, K, V, S>(
        &self,
        table: &'a mut ChainedHashTable<K, V, S>,
    ) -> Option<&'a mut V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        let id = table.entry_at(*self)?;
        Some(&mut table.nodes[id].value)
    }
}

/// A hash table using separate chaining, an externally fixed ladder of
/// admissible (prime) bucket counts, and a cached first-occupied bucket
/// for O(1) iteration start.
///
/// Growth is automatic (an insert that pushes `load_factor` past
/// `max_load_factor` rehashes); shrinking never is. Erase leaves the
/// bucket count alone by design.
///
/// All mutation goes through `&mut self`, so the borrow checker rules
/// out concurrent mutation and mutation-during-iteration; sharing a
/// table across threads requires external synchronization like any other
/// `&mut`-based container.
#[derive(Clone)]
pub struct ChainedHashTable<K, V, S = RandomState> {
    buckets: Vec<Option<NodeId>>, // chain heads; length is always admissible
    nodes: SlotMap<NodeId, Node<K, V>>,
    first_occupied: Option<usize>, // first non-empty bucket, None iff empty
    len: usize,
    max_load_factor: f64,
    hasher: S,
}

impl<K, V> ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    /// Empty table with the default bucket count (5) and the default
    /// max load factor (0.5).
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Empty table with at least `min_buckets` buckets, rounded up to
    /// the smallest admissible count.
    pub fn with_buckets(min_buckets: usize) -> Result<Self> {
        Self::with_buckets_and_hasher(min_buckets, Default::default())
    }
}

impl<K, V> Default for ChainedHashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            buckets: vec![None; sizes::DEFAULT_BUCKET_COUNT],
            nodes: SlotMap::with_key(),
            first_occupied: None,
            len: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hasher,
        }
    }

    pub fn with_buckets_and_hasher(min_buckets: usize, hasher: S) -> Result<Self> {
        let count = sizes::next_size(min_buckets).ok_or(TableError::SizesExhausted {
            required: min_buckets,
        })?;
        let mut table = Self::with_hasher(hasher);
        table.buckets = vec![None; count];
        Ok(table)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets; always one of the admissible sizes.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// `len / bucket_count`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    /// Node referenced by a found locator: the one after its predecessor,
    /// or the bucket head when the predecessor is "before the head".
    fn entry_at(&self, loc: Locator) -> Option<NodeId> {
        if !loc.found {
            return None;
        }
        match loc.pred {
            None => self.buckets[loc.bucket],
            Some(pred) => self.nodes.get(pred).and_then(|n| n.next),
        }
    }

    /// Locate `key`: a found locator carrying (bucket, predecessor), or a
    /// not-found locator that still carries the key's target bucket.
    /// O(chain length) after hashing; amortized O(1) under the load cap.
    pub fn find<Q>(&self, key: &Q) -> Locator
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = self.bucket_index(key);
        let mut pred = None;
        let mut cursor = self.buckets[bucket];
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.key.borrow() == key {
                return Locator {
                    bucket,
                    pred,
                    found: true,
                };
            }
            pred = Some(id);
            cursor = node.next;
        }
        Locator::missing(bucket)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).found
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.entry_at(self.find(key))?;
        Some(&self.nodes[id].value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.entry_at(self.find(key))?;
        Some(&mut self.nodes[id].value)
    }

    /// Insert or overwrite. Returns `Ok(true)` when the key was newly
    /// inserted, `Ok(false)` when an existing entry's value was
    /// overwritten in place (the key itself is never replaced).
    pub fn insert(&mut self, key: K, value: V) -> Result<bool> {
        let loc = self.find(&key);
        self.insert_at(loc, key, value)
    }

    /// Insert using a locator obtained from [`find`](Self::find) for the
    /// same key on this table, with no mutation in between; see
    /// [`Locator`] for the staleness contract. Skips the redundant
    /// lookup that [`insert`](Self::insert) performs.
    ///
    /// A not-found locator prepends at the head of the target bucket and
    /// grows the table if the load cap is now exceeded; a found locator
    /// overwrites the value with no structural change.
    pub fn insert_at(&mut self, loc: Locator, key: K, value: V) -> Result<bool> {
        if loc.found {
            if let Some(id) = self.entry_at(loc) {
                self.nodes[id].value = value;
            }
            return Ok(false);
        }
        self.insert_new(loc.bucket, key, value)?;
        Ok(true)
    }

    /// Prepend a fresh entry and apply the growth policy. Returns the
    /// node id, which stays valid across the rehash (relinking does not
    /// reallocate nodes).
    fn insert_new(&mut self, bucket: usize, key: K, value: V) -> Result<NodeId> {
        let id = self.nodes.insert(Node {
            key,
            value,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(id);
        self.len += 1;
        if self.first_occupied.map_or(true, |first| bucket < first) {
            self.first_occupied = Some(bucket);
        }
        if self.load_factor() > self.max_load_factor {
            self.rehash(self.bucket_count() * 2)?;
        }
        Ok(id)
    }

    /// Remove `key` if present. Returns whether it was present. Never
    /// rehashes: shrinking is not automatic.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let loc = self.find(key);
        if !loc.found {
            return false;
        }
        self.erase_at(loc);
        true
    }

    /// Remove the entry a found locator references, in O(1) thanks to
    /// the stored predecessor. Returns a locator for the logical
    /// successor (next entry in the chain, else the first entry of the
    /// next non-empty bucket, else a not-found locator), which supports
    /// erase-while-traversing loops. A not-found locator is returned
    /// unchanged with no effect.
    pub fn erase_at(&mut self, loc: Locator) -> Locator {
        let Some(id) = self.entry_at(loc) else {
            return loc;
        };
        let next = self.nodes[id].next;
        match loc.pred {
            None => self.buckets[loc.bucket] = next,
            Some(pred) => self.nodes[pred].next = next,
        }
        self.nodes.remove(id);
        self.len -= 1;

        // Removing an entry strictly after the first occupied bucket
        // cannot change which bucket is first; otherwise rescan forward
        // from the erased bucket.
        match self.first_occupied {
            Some(first) if first < loc.bucket => {}
            _ => {
                self.first_occupied = self.buckets[loc.bucket..]
                    .iter()
                    .position(|head| head.is_some())
                    .map(|offset| loc.bucket + offset);
            }
        }

        if next.is_some() {
            // The erased entry's successor now sits right after the same
            // predecessor.
            Locator {
                bucket: loc.bucket,
                pred: loc.pred,
                found: true,
            }
        } else {
            self.buckets[loc.bucket + 1..]
                .iter()
                .position(|head| head.is_some())
                .map(|offset| Locator {
                    bucket: loc.bucket + 1 + offset,
                    pred: None,
                    found: true,
                })
                .unwrap_or(Locator::missing(self.buckets.len()))
        }
    }

    /// Mutable reference to the value for `key`, inserting
    /// `V::default()` first when absent (with the usual growth policy).
    /// The `operator[]` of this table.
    pub fn get_or_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        let loc = self.find(&key);
        let id = match self.entry_at(loc) {
            Some(id) => id,
            None => self.insert_new(loc.bucket, key, V::default())?,
        };
        Ok(&mut self.nodes[id].value)
    }

    /// Smallest admissible bucket count that keeps the current entries
    /// under the load cap. Pure: reads `len` and `max_load_factor`,
    /// mutates nothing, so a sizing failure leaves the table untouched.
    ///
    /// When the table is already at or over the cap, the load-driven
    /// minimum supersedes the caller's hint; this is what lets a
    /// doubling hint from the insert path still land on the next
    /// admissible size past `len / max_load_factor` rather than past
    /// twice the bucket count.
    fn choose_bucket_count(&self, lower_bound: usize) -> Result<usize> {
        // Strictly greater than floor(len / cap): any count at or below
        // it could leave the rebuilt table over the cap.
        let required =
            ((self.len as f64 / self.max_load_factor).floor() as usize).saturating_add(1);
        let bound = if self.load_factor() >= self.max_load_factor {
            required
        } else {
            lower_bound.max(required)
        };
        sizes::next_size(bound).ok_or(TableError::SizesExhausted { required: bound })
    }

    /// Rebuild with at least `min_buckets` buckets (rounded up to an
    /// admissible count; a no-op when the target equals the current
    /// count). Every entry is relinked into the bucket it hashes to
    /// under the new count and the first-occupied cursor is rebuilt.
    /// O(len * key cost). Invalidates all locators.
    pub fn rehash(&mut self, min_buckets: usize) -> Result<()> {
        let target = self.choose_bucket_count(min_buckets)?;
        if target == self.buckets.len() {
            return Ok(());
        }

        let ids: Vec<NodeId> = self.nodes.keys().collect();
        self.buckets.clear();
        self.buckets.resize(target, None);
        self.first_occupied = None;
        for id in ids {
            let bucket = self.bucket_index(&self.nodes[id].key);
            self.nodes[id].next = self.buckets[bucket];
            self.buckets[bucket] = Some(id);
            if self.first_occupied.map_or(true, |first| bucket < first) {
                self.first_occupied = Some(bucket);
            }
        }
        Ok(())
    }

    /// Update the load cap and immediately re-validate the table against
    /// it, growing if the current load now exceeds the cap. Rejects caps
    /// at or below 1e-9 (and NaN).
    pub fn set_max_load_factor(&mut self, factor: f64) -> Result<()> {
        if factor.is_nan() || factor <= MIN_MAX_LOAD_FACTOR {
            return Err(TableError::InvalidLoadFactor { factor });
        }
        self.max_load_factor = factor;
        self.rehash(self.buckets.len())
    }

    /// Iterate all entries in bucket order. Starts at the cached
    /// first-occupied bucket in O(1); a full traversal visits each entry
    /// exactly once at amortized O(1) per step.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            table: self,
            cursor: self
                .first_occupied
                .and_then(|bucket| self.buckets[bucket].map(|id| (bucket, id))),
        }
    }

    /// Mutable pass over all values, in arena order. Value overwrites
    /// are non-structural, so nothing is invalidated.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.nodes.values_mut().map(|node| &mut node.value)
    }

    /// Test-only consistency check: recomputes everything the struct
    /// caches (len, node reachability, per-bucket placement, and the
    /// first-occupied cursor) from the chains alone.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut seen = std::collections::HashSet::new();
        let mut first = None;
        for (bucket, head) in self.buckets.iter().enumerate() {
            if head.is_some() && first.is_none() {
                first = Some(bucket);
            }
            let mut cursor = *head;
            while let Some(id) = cursor {
                assert!(seen.insert(id), "node linked from two positions");
                let node = &self.nodes[id];
                assert_eq!(
                    self.bucket_index(&node.key),
                    bucket,
                    "entry linked into the wrong bucket"
                );
                cursor = node.next;
            }
        }
        assert_eq!(seen.len(), self.len, "len out of sync with chains");
        assert_eq!(seen.len(), self.nodes.len(), "unreachable nodes in arena");
        assert_eq!(self.first_occupied, first, "first-occupied cursor stale");
        assert!(
            sizes::next_size(self.buckets.len()) == Some(self.buckets.len()),
            "bucket count {} is not admissible",
            self.buckets.len()
        );
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bucket-order iterator over `(&K, &V)`.
pub struct Iter<'a, K, V, S> {
    table: &'a ChainedHashTable<K, V, S>,
    cursor: Option<(usize, NodeId)>,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (bucket, id) = self.cursor?;
        let node = self.table.nodes.get(id)?;
        self.cursor = match node.next {
            Some(next) => Some((bucket, next)),
            None => self.table.buckets[bucket + 1..]
                .iter()
                .position(|head| head.is_some())
                .and_then(|offset| {
                    let next_bucket = bucket + 1 + offset;
                    self.table.buckets[next_bucket].map(|head| (next_bucket, head))
                }),
        };
        Some((&node.key, &node.value))
    }
}
