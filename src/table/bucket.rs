use core::ptr::{self, NonNull};
use std::alloc::{alloc, dealloc, handle_alloc_error, realloc, Layout};

use super::slot::{self, Records, Value, TERMINATOR};

/// Outcome of scanning a bucket for a key.
pub(crate) enum Scan {
    /// The key is present; pointer to its value field.
    Hit(NonNull<u8>),
    /// The key is absent; byte offset of the bucket's terminator.
    Miss { end: usize },
}

#[inline]
fn layout(size: usize) -> Layout {
    // Bucket buffers are never empty: the terminator byte is always there.
    debug_assert!(size > 0);
    unsafe { Layout::from_size_align_unchecked(size, 1) }
}

/// Allocates `size` bytes of bucket storage. Aborts on allocation failure.
#[inline]
pub(crate) fn alloc_bucket(size: usize) -> NonNull<u8> {
    let layout = layout(size);
    NonNull::new(unsafe { alloc(layout) }).unwrap_or_else(|| handle_alloc_error(layout))
}

/// Scans `bucket` for `key`, in insertion order.
pub(crate) unsafe fn scan<V: Value>(bucket: *mut u8, key: &[u8]) -> Scan {
    let mut records = Records::<V>::new(bucket);
    while let Some(record) = records.next() {
        if record.len == key.len() && record.key_bytes() == key {
            return Scan::Hit(record.value);
        }
    }
    Scan::Miss { end: records.pos() }
}

/// Allocates a fresh bucket holding a single zero-valued record for `key`.
/// Returns the bucket and the value pointer.
pub(crate) unsafe fn create<V: Value>(key: &[u8]) -> (NonNull<u8>, NonNull<u8>) {
    let size = slot::record_len::<V>(key.len()) + 1;
    let bucket = alloc_bucket(size);
    let value = slot::write_record::<V>(bucket.as_ptr(), key);
    *bucket.as_ptr().add(size - 1) = TERMINATOR;
    (bucket, value)
}

/// Grows `bucket` by one zero-valued record for `key`. `end` is the current
/// terminator offset; the old terminator is overwritten by the new record
/// and re-emitted at the new end of the buffer.
///
/// Returns the (possibly moved) bucket and the new value pointer.
pub(crate) unsafe fn append<V: Value>(
    bucket: *mut u8,
    end: usize,
    key: &[u8],
) -> (NonNull<u8>, NonNull<u8>) {
    let old_size = end + 1;
    let new_size = old_size + slot::record_len::<V>(key.len());
    let grown = NonNull::new(realloc(bucket, layout(old_size), new_size))
        .unwrap_or_else(|| handle_alloc_error(layout(new_size)));
    let value = slot::write_record::<V>(grown.as_ptr().add(end), key);
    *grown.as_ptr().add(new_size - 1) = TERMINATOR;
    (grown, value)
}

/// Byte length of `bucket`, terminator included.
///
/// Buckets are allocated to exactly this length, so it doubles as the
/// allocation size when freeing.
pub(crate) unsafe fn byte_len<V: Value>(bucket: *const u8) -> usize {
    let mut records = Records::<V>::new(bucket);
    while records.next().is_some() {}
    records.pos() + 1
}

/// Copies `bucket` into a fresh allocation of its own.
pub(crate) unsafe fn duplicate<V: Value>(bucket: *const u8) -> NonNull<u8> {
    let size = byte_len::<V>(bucket);
    let copy = alloc_bucket(size);
    ptr::copy_nonoverlapping(bucket, copy.as_ptr(), size);
    copy
}

/// Frees `bucket`.
pub(crate) unsafe fn free<V: Value>(bucket: *mut u8) {
    dealloc(bucket, layout(byte_len::<V>(bucket)));
}
