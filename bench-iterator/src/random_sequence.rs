use iter_error::{IteratorError, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// A fixed set of random byte buffers, read once, front to back.
///
/// Every buffer is generated when the sequence is constructed so that
/// iterating it costs nothing but the read itself. Contents never change
/// afterwards and the cursor never moves backwards.
pub struct RandomBufferSequence {
    buffers: Vec<Vec<u8>>,
    buffer_size: usize,
    cursor: usize,
}

impl RandomBufferSequence {
    /// Generate `count` buffers of `buffer_size` bytes each from a
    /// generator seeded by the operating system.
    pub fn new(count: usize, buffer_size: usize) -> Self {
        Self::with_rng(count, buffer_size, &mut StdRng::from_entropy())
    }

    /// Generate the buffers from the given source instead of a freshly
    /// seeded one.
    pub fn with_rng<R: RngCore>(
        count: usize,
        buffer_size: usize,
        rng: &mut R,
    ) -> Self {
        let buffers = (0..count)
            .map(|_| {
                let mut buffer = vec![0u8; buffer_size];
                rng.fill_bytes(&mut buffer);
                buffer
            })
            .collect();

        Self {
            buffers,
            buffer_size,
            cursor: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.buffers.len()
    }

    /// Borrow the next unread buffer and advance past it.
    ///
    /// Fails with [`IteratorError::Exhausted`] once every buffer has been
    /// read, and keeps failing on every later call.
    pub fn next_buffer(&mut self) -> Result<&[u8]> {
        let buffer = self
            .buffers
            .get(self.cursor)
            .ok_or(IteratorError::Exhausted)?;
        self.cursor += 1;
        Ok(buffer.as_slice())
    }

    pub fn count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn remaining(&self) -> usize {
        self.buffers.len() - self.cursor
    }
}
