use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A lightweight typed handle into an [`IndexedStore`].
pub trait IndexRef: Copy + Eq {
    fn index(&self) -> usize;
    fn new(input: usize) -> Self;
}

/// Implements [`IndexRef`] for a newtype wrapping an unsigned integer. By
/// default the backing type is a `u32`; a different backing type can be
/// given as the second argument.
#[macro_export]
macro_rules! impl_index {
    ($struct_name: ident) => {
        impl_index!($struct_name, u32);
    };

    ($struct_name: ident, $backing_ty: ty) => {
        impl $crate::IndexRef for $struct_name {
            fn index(&self) -> usize {
                self.0 as usize
            }

            fn new(input: usize) -> Self {
                Self(input as $backing_ty)
            }
        }

        impl From<usize> for $struct_name {
            fn from(input: usize) -> Self {
                $crate::IndexRef::new(input)
            }
        }

        impl std::fmt::Debug for $struct_name {
            fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($struct_name), self.0)
            }
        }
    };
}

/// An arena keyed by an [`IndexRef`] handle. Removal leaves a tombstone so
/// handles stay stable; iteration skips removed slots.
#[derive(Debug, Clone)]
pub struct IndexedStore<K, V>
where
    K: IndexRef,
{
    data: Vec<Option<V>>,
    live: usize,
    phantom: PhantomData<K>,
}

impl<K, V> Default for IndexedStore<K, V>
where
    K: IndexRef,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> IndexedStore<K, V>
where
    K: IndexRef,
{
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            live: 0,
            phantom: PhantomData,
        }
    }

    pub fn push(&mut self, value: V) -> K {
        let key = K::new(self.data.len());
        self.data.push(Some(value));
        self.live += 1;
        key
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.data.get(key.index()).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.data
            .get_mut(key.index())
            .and_then(|slot| slot.as_mut())
    }

    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value under `key`, leaving a tombstone. Returns the value
    /// if the slot was live.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let out = self.data.get_mut(key.index()).and_then(|slot| slot.take());
        if out.is_some() {
            self.live -= 1;
        }
        out
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total number of slots handed out, including tombstones.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::new(i), v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.data
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (K::new(i), v)))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| K::new(i)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.data.iter().filter_map(|slot| slot.as_ref())
    }
}

impl<K, V> Index<K> for IndexedStore<K, V>
where
    K: IndexRef,
{
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key).expect("indexed a removed or absent entry")
    }
}

impl<K, V> IndexMut<K> for IndexedStore<K, V>
where
    K: IndexRef,
{
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key).expect("indexed a removed or absent entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq)]
    struct TestIdx(u32);
    impl_index!(TestIdx);

    #[test]
    fn push_get_remove() {
        let mut store: IndexedStore<TestIdx, &str> = IndexedStore::new();
        let a = store.push("a");
        let b = store.push("b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(a), Some(&"a"));
        assert_eq!(store.remove(a), Some("a"));
        assert_eq!(store.remove(a), None);
        assert_eq!(store.len(), 1);
        // handles remain stable across removal
        assert_eq!(store.get(b), Some(&"b"));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec![b]);
    }
}
