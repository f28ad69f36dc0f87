//! # Bench Iterator
//!
//! Pre-generated random byte buffers for benchmarking native boundaries.
//!
//! A [`RandomBufferSequence`] draws all of its buffers up front, so a
//! benchmark that walks it through JNI or a C call measures the crossing
//! and the copy, not the random number generator. Sequences created from
//! outside Rust live in a [`registry`] and are addressed by [`Handle`]s.
//!
//! ## Features
//!
//! - `jni-bindings`: exports the native methods of
//!   `com.evolvedbinary.jnibench.common.iterators.NativeIterator`.
//! - `c-bindings`: exports the `iterator_*` C functions.
//!
//! Both are enabled by default.

#[macro_use]
extern crate lazy_static;

pub mod random_sequence;
pub mod registry;

#[cfg(feature = "c-bindings")]
pub mod ffi;

#[cfg(feature = "jni-bindings")]
pub mod jni;

pub use random_sequence::RandomBufferSequence;
pub use registry::Handle;
