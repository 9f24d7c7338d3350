//! Bucketed map for parallel accumulation.
//!
//! Keys are spread over a fixed number of buckets by `key % bucket_count`; each
//! bucket has its own lock, so writers touching different buckets never wait on
//! each other. Used as scratch space by the parallel ranking path.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Integer keys that can be assigned to a bucket.
pub trait BucketKey: Copy + Ord {
    fn bucket_index(self, bucket_count: usize) -> usize;
}

macro_rules! impl_bucket_key {
    ($($t:ty),*) => {
        $(impl BucketKey for $t {
            #[inline]
            fn bucket_index(self, bucket_count: usize) -> usize {
                (self as u64 % bucket_count as u64) as usize
            }
        })*
    };
}

impl_bucket_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

struct Bucket<K, V> {
    map: Mutex<BTreeMap<K, V>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self { map: Mutex::new(BTreeMap::new()) }
    }
}

/// Locked handle to one value; the bucket stays locked until it is dropped.
pub struct Access<'a, V> {
    value: MappedMutexGuard<'a, V>,
}

impl<V> Deref for Access<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<V> DerefMut for Access<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.value
    }
}

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Bucket<K, V>>,
}

impl<K: BucketKey, V> ConcurrentMap<K, V> {
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "ConcurrentMap needs at least one bucket");
        Self { buckets: (0..bucket_count).map(|_| Bucket::default()).collect() }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, key: K) -> &Bucket<K, V> {
        &self.buckets[key.bucket_index(self.buckets.len())]
    }

    /// Lock the key's bucket and return its value, inserting `V::default()` first
    /// if the key is absent.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        let guard = self.bucket(key).map.lock();
        Access { value: MutexGuard::map(guard, |map| map.entry(key).or_default()) }
    }

    /// Remove `key`; returns whether it was present.
    pub fn erase(&self, key: K) -> bool {
        self.bucket(key).map.lock().remove(&key).is_some()
    }

    /// Copy every bucket into one ordered map, locking buckets one at a time.
    ///
    /// Not atomic across buckets: only meaningful once all writers have finished.
    pub fn snapshot_merged(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let mut result = BTreeMap::new();
        for bucket in &self.buckets {
            let map = bucket.map.lock();
            result.extend(map.iter().map(|(k, v)| (*k, v.clone())));
        }
        result
    }

    /// Merge all buckets by move.
    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for bucket in self.buckets {
            result.append(&mut bucket.map.into_inner());
        }
        result
    }
}
