use bench_iterator::ffi::{
    iterator_create, iterator_dispose, iterator_has_next, iterator_next,
    ITERATOR_EXHAUSTED, ITERATOR_INVALID_HANDLE,
};
use bench_iterator::registry;
use bench_iterator::Handle;
use iter_error::IteratorError;

fn drain(handle: u64, element_size: usize) -> Vec<Vec<u8>> {
    let mut drained = Vec::new();
    let mut dest = vec![0u8; element_size];
    while iterator_has_next(handle) == 1 {
        let written = unsafe {
            iterator_next(handle, dest.as_mut_ptr(), dest.len() as i32)
        };
        assert!(written >= 0, "iterator_next failed with {}", written);
        drained.push(dest[..written as usize].to_vec());
    }
    drained
}

#[test_log::test]
fn three_reads_then_exhausted() {
    let handle = iterator_create(3, 4);
    assert_ne!(handle, Handle::NULL);

    let mut dest = [0u8; 4];
    for _ in 0..3 {
        assert_eq!(iterator_has_next(handle), 1);
        assert_eq!(unsafe { iterator_next(handle, dest.as_mut_ptr(), 4) }, 4);
    }
    assert_eq!(iterator_has_next(handle), 0);
    for _ in 0..3 {
        assert_eq!(
            unsafe { iterator_next(handle, dest.as_mut_ptr(), 4) },
            ITERATOR_EXHAUSTED
        );
    }

    iterator_dispose(handle);
}

#[test_log::test]
fn empty_iterator_has_nothing() {
    let handle = iterator_create(0, 64);
    assert_eq!(iterator_has_next(handle), 0);
    let mut dest = [0u8; 64];
    assert_eq!(
        unsafe { iterator_next(handle, dest.as_mut_ptr(), 64) },
        ITERATOR_EXHAUSTED
    );
    iterator_dispose(handle);
}

#[test_log::test]
fn second_drain_is_empty() {
    let handle = iterator_create(10, 16);

    let first = drain(handle, 16);
    assert_eq!(first.len(), 10);
    assert!(first.iter().all(|buffer| buffer.len() == 16));
    assert!(drain(handle, 16).is_empty());

    iterator_dispose(handle);
}

#[test_log::test]
fn disposed_handle_is_rejected_everywhere() {
    let handle = iterator_create(2, 8);
    iterator_dispose(handle);

    let mut dest = [0u8; 8];
    assert_eq!(iterator_has_next(handle), 0);
    assert_eq!(
        unsafe { iterator_next(handle, dest.as_mut_ptr(), 8) },
        ITERATOR_INVALID_HANDLE
    );
    assert!(matches!(
        registry::release(Handle::from_raw(handle)),
        Err(IteratorError::StaleHandle(raw)) if raw == handle
    ));

    // A second dispose is logged and ignored.
    iterator_dispose(handle);
}

#[test_log::test]
fn null_handle_is_rejected() {
    let mut dest = [0u8; 1];
    assert_eq!(iterator_has_next(Handle::NULL), 0);
    assert_eq!(
        unsafe { iterator_next(Handle::NULL, dest.as_mut_ptr(), 1) },
        ITERATOR_INVALID_HANDLE
    );
}

#[test_log::test]
fn handles_are_independent() {
    let a = iterator_create(1, 4);
    let b = iterator_create(1, 4);
    assert_ne!(a, b);
    assert!(registry::live_count() >= 2);

    iterator_dispose(a);
    assert_eq!(iterator_has_next(b), 1);
    assert_eq!(drain(b, 4).len(), 1);

    iterator_dispose(b);
}
