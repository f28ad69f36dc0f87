use std::sync::{Mutex, MutexGuard, PoisonError};

use iter_error::{IteratorError, Result};

use crate::random_sequence::RandomBufferSequence;

lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::default());
}

/// Opaque token handed across the boundary in place of a pointer.
///
/// The low 32 bits index a slot, the high 32 bits carry the slot's
/// generation at the time the handle was issued. Generation 0 is never
/// issued, so a raw value of 0 never names a live sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub const NULL: u64 = 0;

    pub fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }

    pub fn into_raw(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

#[derive(Default)]
struct Slot {
    generation: u32,
    sequence: Option<RandomBufferSequence>,
}

/// Slot table owning every sequence created through a boundary.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Registry {
    pub fn insert(&mut self, sequence: RandomBufferSequence) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 1,
                    sequence: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.sequence = Some(sequence);
        Handle {
            index,
            generation: slot.generation,
        }
    }

    pub fn get_mut(
        &mut self,
        handle: Handle,
    ) -> Result<&mut RandomBufferSequence> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.sequence.as_mut())
            .ok_or(IteratorError::StaleHandle(handle.into_raw()))
    }

    /// Take the sequence out of its slot. Every copy of `handle` is stale
    /// afterwards, even once the slot is reused.
    pub fn remove(&mut self, handle: Handle) -> Result<RandomBufferSequence> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(IteratorError::StaleHandle(handle.into_raw()))?;
        let sequence = slot
            .sequence
            .take()
            .ok_or(IteratorError::StaleHandle(handle.into_raw()))?;

        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.free.push(handle.index);
        Ok(sequence)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock() -> MutexGuard<'static, Registry> {
    // Every mutation completes before the guard is released, so a poisoned
    // table is still consistent.
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hand `sequence` over to the process-wide registry.
pub fn register(sequence: RandomBufferSequence) -> Handle {
    let count = sequence.count();
    let buffer_size = sequence.buffer_size();
    let handle = lock().insert(sequence);
    log::debug!(
        "iterator/{:#x}: registered {} buffers of {} bytes",
        handle.into_raw(),
        count,
        buffer_size
    );
    handle
}

/// Run `f` against the sequence behind `handle` while the registry is held.
pub fn with_sequence<R>(
    handle: Handle,
    f: impl FnOnce(&mut RandomBufferSequence) -> R,
) -> Result<R> {
    let mut registry = lock();
    let sequence = registry.get_mut(handle)?;
    Ok(f(sequence))
}

/// Drop the sequence behind `handle`.
pub fn release(handle: Handle) -> Result<()> {
    let sequence = lock().remove(handle)?;
    log::debug!(
        "iterator/{:#x}: released with {} of {} buffers unread",
        handle.into_raw(),
        sequence.remaining(),
        sequence.count()
    );
    Ok(())
}

/// Number of sequences currently registered.
pub fn live_count() -> usize {
    lock().len()
}
