use std::panic::{self, AssertUnwindSafe};
use std::ptr;

// The interface to the JVM that all of the calls below go through.
use jni::JNIEnv;

// The receiver of every native method on `NativeIterator`. Carries a
// lifetime so it cannot escape the call.
use jni::objects::JObject;

// Raw JNI types. The return values have to be these because the lifetime
// checker won't let a local reference outlive the call.
use jni::sys::{jboolean, jbyteArray, jint, jlong, JNI_FALSE, JNI_TRUE};

use iter_error::{IteratorError, Result};

use crate::random_sequence::RandomBufferSequence;
use crate::registry::{self, Handle};

const NO_SUCH_ELEMENT: &str = "java/util/NoSuchElementException";
const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";
const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";
const RUNTIME: &str = "java/lang/RuntimeException";

fn exception_class(err: &IteratorError) -> &'static str {
    match err {
        IteratorError::Exhausted => NO_SUCH_ELEMENT,
        IteratorError::StaleHandle(_) => ILLEGAL_STATE,
        IteratorError::InvalidArgument(_) => ILLEGAL_ARGUMENT,
        IteratorError::Other(_) => RUNTIME,
    }
}

/// Raise `err` in the JVM unless an exception is already pending there.
fn throw(env: &mut JNIEnv, err: &IteratorError) {
    if env.exception_check().unwrap_or(false) {
        return;
    }
    if let Err(jni_err) = env.throw_new(exception_class(err), err.to_string())
    {
        log::error!("failed to raise {}: {}", exception_class(err), jni_err);
    }
}

/// Run `body`, turning both an `Err` and a panic into a Java exception and
/// returning `fallback` in their place.
fn guard<'local, R>(
    env: &mut JNIEnv<'local>,
    method: &str,
    fallback: R,
    body: impl FnOnce(&mut JNIEnv<'local>) -> Result<R>,
) -> R {
    match panic::catch_unwind(AssertUnwindSafe(|| body(env))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            if !err.is_exhausted() {
                log::warn!("NativeIterator.{}: {}", method, err);
            }
            throw(env, &err);
            fallback
        }
        Err(_) => {
            log::error!("NativeIterator.{}: caught panic", method);
            let err = IteratorError::Other(anyhow::anyhow!(
                "panic in native NativeIterator.{}",
                method
            ));
            throw(env, &err);
            fallback
        }
    }
}

fn handle_from_jlong(value: jlong) -> Handle {
    Handle::from_raw(value as u64)
}

#[no_mangle]
pub extern "system" fn Java_com_evolvedbinary_jnibench_common_iterators_NativeIterator_createIterator(
    mut env: JNIEnv<'_>,
    _this: JObject<'_>,
    num_elements: jint,
    element_size: jlong,
) -> jlong {
    guard(&mut env, "createIterator", Handle::NULL as jlong, |_| {
        let count = usize::try_from(num_elements)?;
        let buffer_size = usize::try_from(element_size)?;
        let handle =
            registry::register(RandomBufferSequence::new(count, buffer_size));
        Ok(handle.into_raw() as jlong)
    })
}

#[no_mangle]
pub extern "system" fn Java_com_evolvedbinary_jnibench_common_iterators_NativeIterator_hasNext(
    mut env: JNIEnv<'_>,
    _this: JObject<'_>,
    handle: jlong,
) -> jboolean {
    guard(&mut env, "hasNext", JNI_FALSE, |_| {
        let has_more =
            registry::with_sequence(handle_from_jlong(handle), |sequence| {
                sequence.has_more()
            })?;
        Ok(if has_more { JNI_TRUE } else { JNI_FALSE })
    })
}

/// Copies the next buffer into a new `byte[]`. Exhaustion surfaces as
/// `NoSuchElementException`, like `java.util.Iterator#next`.
#[no_mangle]
pub extern "system" fn Java_com_evolvedbinary_jnibench_common_iterators_NativeIterator_next(
    mut env: JNIEnv<'_>,
    _this: JObject<'_>,
    handle: jlong,
) -> jbyteArray {
    guard(&mut env, "next", ptr::null_mut(), |env| {
        registry::with_sequence(handle_from_jlong(handle), |sequence| {
            let buffer = sequence.next_buffer()?;
            let array = env.byte_array_from_slice(buffer).map_err(|err| {
                IteratorError::Other(anyhow::anyhow!(
                    "could not allocate byte[{}]: {}",
                    buffer.len(),
                    err
                ))
            })?;
            Ok(array.into_raw())
        })?
    })
}

#[no_mangle]
pub extern "system" fn Java_com_evolvedbinary_jnibench_common_iterators_NativeIterator_disposeInternal(
    mut env: JNIEnv<'_>,
    _this: JObject<'_>,
    handle: jlong,
) {
    guard(&mut env, "disposeInternal", (), |_| {
        registry::release(handle_from_jlong(handle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_java_exceptions() {
        assert_eq!(
            exception_class(&IteratorError::Exhausted),
            "java/util/NoSuchElementException"
        );
        assert_eq!(
            exception_class(&IteratorError::StaleHandle(1)),
            "java/lang/IllegalStateException"
        );
        assert_eq!(
            exception_class(&IteratorError::InvalidArgument("n".into())),
            "java/lang/IllegalArgumentException"
        );
        assert_eq!(
            exception_class(&IteratorError::Other(anyhow::anyhow!("x"))),
            "java/lang/RuntimeException"
        );
    }

    #[test]
    fn jlong_handles_keep_every_bit() {
        let raw = 0xffff_fffe_0000_0001u64;
        let as_java = raw as jlong;
        assert!(as_java < 0);
        assert_eq!(handle_from_jlong(as_java).into_raw(), raw);
    }
}
