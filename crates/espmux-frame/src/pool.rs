use crate::buffer::RingBuffer;
use crate::channel::{is_valid, ChannelId, CHANNEL_COUNT, DEFAULT_CHANNEL};

/// Per-channel receive buffers.
///
/// The default channel's buffer exists from construction; multiplexed
/// channels get theirs the first time they are addressed.
#[derive(Debug, Clone)]
pub struct ChannelPool {
    slots: [Option<RingBuffer>; CHANNEL_COUNT],
    capacity: usize,
}

impl ChannelPool {
    /// Create a pool whose buffers each hold `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let slots = std::array::from_fn(|id| {
            (id == DEFAULT_CHANNEL as usize).then(|| RingBuffer::with_capacity(capacity))
        });
        Self { slots, capacity }
    }

    /// Capacity of each channel buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffer for `id`, allocating it on first use.
    ///
    /// Returns `None` for ids outside 0-5. The scanner never produces such
    /// ids, so reaching that case is a logic error.
    pub fn get_or_create(&mut self, id: ChannelId) -> Option<&mut RingBuffer> {
        debug_assert!(is_valid(id), "channel id {id} out of range");
        let capacity = self.capacity;
        let slot = self.slots.get_mut(id as usize)?;
        Some(slot.get_or_insert_with(|| RingBuffer::with_capacity(capacity)))
    }

    /// Buffer for `id` if it has been allocated.
    pub fn get(&self, id: ChannelId) -> Option<&RingBuffer> {
        self.slots.get(id as usize)?.as_ref()
    }

    /// Mutable buffer for `id` if it has been allocated.
    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut RingBuffer> {
        self.slots.get_mut(id as usize)?.as_mut()
    }

    pub fn is_allocated(&self, id: ChannelId) -> bool {
        self.get(id).is_some()
    }

    /// Bytes queued for `id`; zero for unallocated or invalid ids.
    pub fn buffered(&self, id: ChannelId) -> usize {
        self.get(id).map_or(0, RingBuffer::size)
    }

    /// Move up to `out.len()` queued bytes for `id` into `out`, oldest first.
    pub fn read_into(&mut self, id: ChannelId, out: &mut [u8]) -> usize {
        let Some(buffer) = self.get_mut(id) else {
            return 0;
        };
        let mut copied = 0;
        while copied < out.len() {
            match buffer.poll() {
                Some(byte) => {
                    out[copied] = byte;
                    copied += 1;
                }
                None => break,
            }
        }
        copied
    }

    /// Lowest channel id with queued bytes.
    pub fn first_pending(&self) -> Option<ChannelId> {
        (0..CHANNEL_COUNT as ChannelId).find(|&id| self.buffered(id) > 0)
    }

    /// Drop the queued bytes of every channel. Allocations are kept.
    pub fn clear(&mut self) {
        for buffer in self.slots.iter_mut().flatten() {
            buffer.clear();
        }
    }
}
