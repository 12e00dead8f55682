//! chained-hashtable: a resizable associative container built on
//! separate chaining, with prime bucket sizing and O(1) erase through
//! predecessor locators.
//!
//! Internal design:
//!
//! Summary
//! - Goal: a small, fully-checkable chained hash table in safe Rust,
//!   where every cached piece of state is an invariant that tests can
//!   recompute from scratch.
//! - Layout:
//!   - `sizes`: the external collaborator, a fixed ascending ladder of
//!     admissible (prime) bucket counts with a lower-bound query. The
//!     table never adopts a count outside the ladder.
//!   - `table::ChainedHashTable<K, V, S>`: buckets of singly linked
//!     chains. Chain nodes live in a `slotmap` arena and link to each
//!     other by arena key (the arena+index pattern), so there are no
//!     owned pointers between entries and no unsafe code anywhere.
//!   - `table::Locator`: a `Copy` position holding (bucket index,
//!     predecessor node). Keeping the *predecessor* rather than the
//!     entry itself is what makes erase O(1) on a singly linked chain;
//!     a not-found locator still records the key's target bucket so a
//!     follow-up insert skips re-hashing.
//!
//! Policies
//! - Insertion prepends at the chain head: O(1) with no tail pointer,
//!   and duplicate keys cannot coexist because `find` always returns
//!   the first match and insert-on-found overwrites in place.
//! - Growth only: an insert that pushes `load_factor` past the cap
//!   rehashes to the next admissible count past `len / max_load_factor`;
//!   erase never resizes. Sizing is computed before any storage is
//!   touched, so a failed rehash leaves the table unchanged.
//! - A cached first-occupied bucket index makes iteration start O(1).
//!   It is re-established at the end of every mutating operation and
//!   recomputed from the chains in the test-only invariant checker.
//!
//! Constraints
//! - Single-threaded use: all mutation takes `&mut self`, so the borrow
//!   checker rules out concurrent mutation and mutation-during-iteration;
//!   multi-threaded sharing needs external locking.
//! - References from `get`/`get_mut`/`get_or_default` are borrows and
//!   cannot outlive a structural mutation. `Locator`s can: using one
//!   after an insert-that-grew, an erase, or a rehash is a documented
//!   contract violation. It is never memory-unsafe (the arena's
//!   generational keys turn dangling positions into misses) but the
//!   result is unspecified.
//! - Two error conditions, both surfaced as [`TableError`]: the size
//!   ladder is exhausted, or a proposed max load factor is too small.
//!
//! Notes and non-goals
//! - No open addressing, no shrink-on-erase, no serialization, no
//!   internal synchronization.
//! - Cloning deep-copies the arena and bucket array; slotmap clones
//!   preserve keys, so chain links and the cursor stay valid against
//!   the clone's own storage.

mod error;
mod sizes;
mod table;
mod table_proptest;

// Public surface
pub use error::{Result, TableError};
pub use sizes::{next_size, ADMISSIBLE_SIZES, DEFAULT_BUCKET_COUNT};
pub use table::{ChainedHashTable, Iter, Locator, DEFAULT_MAX_LOAD_FACTOR};
