use core::fmt;
use core::hash::{BuildHasher, Hasher};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::error::{AhtableError, Result};

mod bucket;
mod raw;
mod slot;

use self::raw::{RawTable, INITIAL_BUCKETS};

pub use self::slot::{Value, MAX_KEY_LEN};

// Set FxHash to default as most keys tend to be small
pub type DefaultHashBuilder = fxhash::FxBuildHasher;

#[inline]
pub(crate) fn make_hash<S: BuildHasher>(hash_builder: &S, key: &[u8]) -> u64 {
    let mut state = hash_builder.build_hasher();
    state.write(key);
    state.finish()
}

#[inline]
fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(AhtableError::EmptyKey);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(AhtableError::OversizeKey(key.len()));
    }
    Ok(())
}

/// A byte-string keyed map with slot-packed buckets.
///
/// Keys are arbitrary byte strings of 1 to [`MAX_KEY_LEN`] bytes; embedded
/// zero bytes are fine. Values are fixed-width unsigned integers and start
/// at zero on first insertion. Records are packed back to back in a single
/// buffer per bucket, which trades pointer chasing for linear scans over a
/// few cache lines and sustains load factors well past one.
pub struct ArrayHash<V, S = DefaultHashBuilder>
where
    V: Value,
{
    pub(crate) hash_builder: S,
    pub(crate) table: RawTable<V>,
    /// Scratch byte for the embedder; the table itself never reads it.
    pub flag: u8,
    /// First embedder context byte.
    pub c0: u8,
    /// Second embedder context byte.
    pub c1: u8,
}

impl<V> ArrayHash<V>
where
    V: Value,
{
    #[inline]
    pub fn new() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }

    /// Creates an empty table with `n` buckets.
    #[inline]
    pub fn with_buckets(n: usize) -> Self {
        Self::with_buckets_and_hasher(n, DefaultHashBuilder::default())
    }
}

impl<V, S> ArrayHash<V, S>
where
    V: Value,
    S: BuildHasher,
{
    #[inline]
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_buckets_and_hasher(INITIAL_BUCKETS, hash_builder)
    }

    #[inline]
    pub fn with_buckets_and_hasher(n: usize, hash_builder: S) -> Self {
        Self {
            hash_builder,
            table: RawTable::with_buckets(n),
            flag: 0,
            c0: 0,
            c1: 0,
        }
    }

    /// Looks up `key`, inserting it with a zero value if absent.
    ///
    /// When the table is at its load cap this expands it first, so the
    /// handle always points into a bucket that will not move before the
    /// next `&mut self` call.
    #[inline]
    pub fn get(&mut self, key: &[u8]) -> Result<ValueHandle<'_, V>> {
        check_key(key)?;
        let hash = make_hash(&self.hash_builder, key);
        let hash_builder = &self.hash_builder;
        let value = self
            .table
            .find_or_insert(hash, key, |k| make_hash(hash_builder, k));
        Ok(ValueHandle {
            ptr: value,
            marker: PhantomData,
        })
    }

    /// Looks up `key` and copies its value out. Never mutates the table.
    #[inline]
    pub fn try_get(&self, key: &[u8]) -> Result<Option<V>> {
        check_key(key)?;
        let hash = make_hash(&self.hash_builder, key);
        Ok(self
            .table
            .find(hash, key)
            .map(|value| unsafe { slot::read_value::<V>(value.as_ptr()) }))
    }

    /// Looks up `key` for in-place update, without inserting on a miss.
    #[inline]
    pub fn try_get_mut(&mut self, key: &[u8]) -> Result<Option<ValueHandle<'_, V>>> {
        check_key(key)?;
        let hash = make_hash(&self.hash_builder, key);
        Ok(self.table.find(hash, key).map(|value| ValueHandle {
            ptr: value,
            marker: PhantomData,
        }))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn buckets(&self) -> usize {
        self.table.buckets()
    }

    /// Frees every bucket and resets the table to its initial geometry.
    /// The embedder bytes are left untouched.
    #[inline]
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Iterates the stored pairs, buckets in index order and records in
    /// insertion order within each bucket.
    #[inline]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.table.records(),
            items: self.table.len(),
        }
    }
}

impl<V> Default for ArrayHash<V>
where
    V: Value,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V, S> Clone for ArrayHash<V, S>
where
    V: Value,
    S: Clone,
{
    /// Deep-copies every bucket; the clone owns its own buffers.
    fn clone(&self) -> Self {
        Self {
            hash_builder: self.hash_builder.clone(),
            table: self.table.clone(),
            flag: self.flag,
            c0: self.c0,
            c1: self.c1,
        }
    }
}

impl<'a, V, S> IntoIterator for &'a ArrayHash<V, S>
where
    V: Value,
    S: BuildHasher,
{
    type Item = (&'a [u8], V);
    type IntoIter = Iter<'a, V>;

    #[inline]
    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// A borrowed handle to the value field of one record.
///
/// Reads and writes go straight into the bucket. The handle borrows its
/// table mutably, so it cannot outlive the next mutation.
pub struct ValueHandle<'a, V>
where
    V: Value,
{
    ptr: NonNull<u8>,
    marker: PhantomData<&'a mut V>,
}

impl<'a, V> ValueHandle<'a, V>
where
    V: Value,
{
    /// Copies the value out.
    #[inline]
    pub fn get(&self) -> V {
        unsafe { slot::read_value::<V>(self.ptr.as_ptr()) }
    }

    /// Overwrites the value in place.
    #[inline]
    pub fn set(&mut self, value: V) {
        unsafe { slot::write_value::<V>(self.ptr.as_ptr(), value) }
    }

    /// Address of the value field inside its bucket.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }
}

impl<'a, V> fmt::Debug for ValueHandle<'a, V>
where
    V: Value,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ValueHandle").field(&self.ptr).finish()
    }
}

/// Iterator over the `(key, value)` pairs of a table.
pub struct Iter<'a, V>
where
    V: Value,
{
    inner: raw::RawIter<'a, V>,
    items: usize,
}

impl<'a, V> Iterator for Iter<'a, V>
where
    V: Value,
{
    type Item = (&'a [u8], V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let record = self.inner.next()?;
        self.items -= 1;
        unsafe {
            Some((
                record.key_bytes(),
                slot::read_value::<V>(record.value.as_ptr()),
            ))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.items, Some(self.items))
    }
}

impl<'a, V> ExactSizeIterator for Iter<'a, V> where V: Value {}
impl<'a, V> FusedIterator for Iter<'a, V> where V: Value {}
