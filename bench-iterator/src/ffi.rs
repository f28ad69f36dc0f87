//! C ABI over the registry, for callers that bind symbols directly
//! (the JVM's Foreign Function & Memory API, or plain C).
//!
//! Handles are plain 64-bit values; `0` is never a live handle. Nothing
//! here unwinds into the caller: panics are caught, logged and reported
//! through the same return codes as any other failure.

use std::os::raw::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use iter_error::{IteratorError, Result};

use crate::random_sequence::RandomBufferSequence;
use crate::registry::{self, Handle};

/// `iterator_next` found no element left to read.
pub const ITERATOR_EXHAUSTED: c_int = -1;
/// The handle was never issued or has already been disposed.
pub const ITERATOR_INVALID_HANDLE: c_int = -2;
/// `dest_len` was negative, or `dest` was null with a non-zero length.
pub const ITERATOR_INVALID_ARGUMENT: c_int = -3;

pub type IteratorHandle = u64;

fn guard<R>(symbol: &str, fallback: R, body: impl FnOnce() -> R) -> R {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        log::error!("{}: caught panic at the C boundary", symbol);
        fallback
    })
}

fn create(num_elements: c_int, element_size: usize) -> Result<Handle> {
    let count = usize::try_from(num_elements)?;
    Ok(registry::register(RandomBufferSequence::new(
        count,
        element_size,
    )))
}

/// Copy the next buffer into `dest`, truncating to `capacity` bytes.
///
/// # Safety
/// `dest` must be valid for writes of `capacity` bytes.
unsafe fn next_into(
    handle: Handle,
    dest: *mut u8,
    capacity: usize,
) -> Result<usize> {
    registry::with_sequence(handle, |sequence| {
        let buffer = sequence.next_buffer()?;
        let copied = buffer.len().min(capacity);
        if copied > 0 {
            unsafe { ptr::copy_nonoverlapping(buffer.as_ptr(), dest, copied) };
        }
        Ok(copied)
    })?
}

fn status_code(err: &IteratorError) -> c_int {
    match err {
        IteratorError::Exhausted => ITERATOR_EXHAUSTED,
        IteratorError::StaleHandle(_) => ITERATOR_INVALID_HANDLE,
        IteratorError::InvalidArgument(_) | IteratorError::Other(_) => {
            ITERATOR_INVALID_ARGUMENT
        }
    }
}

/// Create a sequence of `num_elements` random buffers of `element_size`
/// bytes. Returns `0` if `num_elements` is negative.
#[no_mangle]
pub extern "C" fn iterator_create(
    num_elements: c_int,
    element_size: usize,
) -> IteratorHandle {
    guard("iterator_create", Handle::NULL, || {
        match create(num_elements, element_size) {
            Ok(handle) => handle.into_raw(),
            Err(err) => {
                log::warn!(
                    "iterator_create({}, {}): {}",
                    num_elements,
                    element_size,
                    err
                );
                Handle::NULL
            }
        }
    })
}

/// `1` while unread buffers remain, otherwise `0`. A stale handle reads
/// as exhausted.
#[no_mangle]
pub extern "C" fn iterator_has_next(handle: IteratorHandle) -> c_int {
    guard("iterator_has_next", 0, || {
        match registry::with_sequence(Handle::from_raw(handle), |sequence| {
            sequence.has_more()
        }) {
            Ok(has_more) => c_int::from(has_more),
            Err(err) => {
                log::warn!("iterator_has_next: {}", err);
                0
            }
        }
    })
}

/// Copy the next buffer into `dest` and return the number of bytes
/// written, which is `min(element_size, dest_len)`. Returns one of the
/// negative `ITERATOR_*` codes on failure; the iterator only advances when
/// the return value is non-negative.
///
/// # Safety
/// `dest` must be valid for writes of `dest_len` bytes. It may be null
/// when `dest_len` is `0`.
#[no_mangle]
pub unsafe extern "C" fn iterator_next(
    handle: IteratorHandle,
    dest: *mut u8,
    dest_len: c_int,
) -> c_int {
    guard("iterator_next", ITERATOR_INVALID_ARGUMENT, || {
        let capacity = match usize::try_from(dest_len) {
            Ok(capacity) if capacity == 0 || !dest.is_null() => capacity,
            _ => {
                log::warn!(
                    "iterator_next: rejected destination {:p} of {} bytes",
                    dest,
                    dest_len
                );
                return ITERATOR_INVALID_ARGUMENT;
            }
        };

        match unsafe { next_into(Handle::from_raw(handle), dest, capacity) } {
            // `copied` never exceeds `dest_len`, so it fits.
            Ok(copied) => copied as c_int,
            Err(err) => {
                if !err.is_exhausted() {
                    log::warn!("iterator_next: {}", err);
                }
                status_code(&err)
            }
        }
    })
}

/// Destroy the sequence behind `handle`. Disposing a stale handle is
/// logged and otherwise ignored.
#[no_mangle]
pub extern "C" fn iterator_dispose(handle: IteratorHandle) {
    guard("iterator_dispose", (), || {
        if let Err(err) = registry::release(Handle::from_raw(handle)) {
            log::warn!("iterator_dispose: {}", err);
        }
    })
}
