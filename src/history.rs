//! Fixed-capacity history ring.
//!
//! Soil history, the decision timeline and the diagnostic log are all
//! "most recent N" sequences.  [`BoundedHistory`] wraps a
//! `heapless::Deque` so the bound is part of the type: pushing into a
//! full history evicts the oldest entry, and the length can never exceed
//! `N`.
//!
//! ```text
//!  oldest                         newest
//!  ┌────┬────┬────┬─────┬────┐
//!  │ e0 │ e1 │ e2 │ ... │ eN │ ◀── push (evicts e0 when full)
//!  └────┴────┴────┴─────┴────┘
//! ```

use core::fmt;
use core::marker::PhantomData;

use heapless::Deque;
use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Most-recent-`N` FIFO.  Iterates oldest → newest.
pub struct BoundedHistory<T, const N: usize> {
    items: Deque<T, N>,
}

impl<T, const N: usize> BoundedHistory<T, N> {
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Append `item`, returning the evicted oldest entry if the ring was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        // Only fails for N == 0, where nothing is ever retained.
        let _ = self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Entry `k` steps back from the newest (`0` = newest).
    pub fn nth_from_latest(&self, k: usize) -> Option<&T> {
        self.items.iter().rev().nth(k)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone, const N: usize> BoundedHistory<T, N> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<T, const N: usize> Default for BoundedHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize> Clone for BoundedHistory<T, N> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        for item in self.items.iter() {
            out.push(item.clone());
        }
        out
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for BoundedHistory<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<T: PartialEq, const N: usize> PartialEq for BoundedHistory<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.items.iter().eq(other.items.iter())
    }
}

impl<T, const N: usize> FromIterator<T> for BoundedHistory<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut out = Self::new();
        for item in iter {
            out.push(item);
        }
        out
    }
}

// ── Serde: a plain JSON array, oldest first ───────────────────

impl<T: Serialize, const N: usize> Serialize for BoundedHistory<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter())
    }
}

impl<'de, T: Deserialize<'de>, const N: usize> Deserialize<'de> for BoundedHistory<T, N> {
    /// Longer arrays keep only their newest `N` entries.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HistoryVisitor<T, const N: usize>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>, const N: usize> Visitor<'de> for HistoryVisitor<T, N> {
            type Value = BoundedHistory<T, N>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a sequence of at most {N} retained entries")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = BoundedHistory::new();
                while let Some(item) = seq.next_element()? {
                    out.push(item);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_seq(HistoryVisitor::<T, N>(PhantomData))
    }
}
