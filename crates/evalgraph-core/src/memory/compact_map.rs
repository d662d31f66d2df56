use hashbrown::{HashMap as HbHashMap, HashSet as HbHashSet};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::hash::Hash;

type FxBuild = BuildHasherDefault<FxHasher>;

/// A drop-in HashMap replacement using hashbrown + Fx hasher.
/// Keys in the graph tables are small integers and short strings, where Fx
/// hashing beats SipHash by a wide margin.
#[derive(Debug, Clone)]
pub struct CompactHashMap<K, V>(HbHashMap<K, V, FxBuild>);

impl<K: Eq + Hash, V> Default for CompactHashMap<K, V> {
    fn default() -> Self {
        Self(HbHashMap::with_hasher(FxBuild::default()))
    }
}

impl<K: Eq + Hash, V> CompactHashMap<K, V> {
    pub fn with_capacity(n: usize) -> Self {
        Self(HbHashMap::with_capacity_and_hasher(n, FxBuild::default()))
    }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn clear(&mut self) { self.0.clear() }
    pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    { self.0.get(k) }
    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    { self.0.contains_key(k) }
    pub fn insert(&mut self, k: K, v: V) -> Option<V> { self.0.insert(k, v) }
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> { self.0.iter() }
    pub fn values(&self) -> impl Iterator<Item = &V> { self.0.values() }
}

/// Set counterpart of [`CompactHashMap`].
#[derive(Debug, Clone)]
pub struct CompactHashSet<T>(HbHashSet<T, FxBuild>);

impl<T: Eq + Hash> Default for CompactHashSet<T> {
    fn default() -> Self {
        Self(HbHashSet::with_hasher(FxBuild::default()))
    }
}

impl<T: Eq + Hash> CompactHashSet<T> {
    pub fn with_capacity(n: usize) -> Self {
        Self(HbHashSet::with_capacity_and_hasher(n, FxBuild::default()))
    }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn clear(&mut self) { self.0.clear() }
    pub fn contains<Q: ?Sized>(&self, v: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    { self.0.contains(v) }
    /// Returns `true` when the value was not present yet.
    pub fn insert(&mut self, v: T) -> bool { self.0.insert(v) }
    pub fn remove<Q: ?Sized>(&mut self, v: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    { self.0.remove(v) }
    pub fn iter(&self) -> impl Iterator<Item = &T> { self.0.iter() }
}

impl<T: Eq + Hash> FromIterator<T> for CompactHashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        for v in iter {
            set.insert(v);
        }
        set
    }
}
