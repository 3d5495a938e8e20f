//! Single-producer, single-consumer relay of fixed-size audio blocks.
//!
//! The producer side is meant to be called from the real-time audio callback: pushing never
//! allocates, never locks and completes in a bounded number of steps, whatever the consumer is
//! doing. When the relay is full, the configured [`OverflowPolicy`] decides whether the oldest
//! unread block is overwritten or the new one is discarded; either way the producer moves on.
//!
//! Each slot is guarded by a sequence number (a seqlock): the producer marks the slot as being
//! written, stores the samples and marks it as complete, while the consumer copies the samples
//! out and checks that the sequence number did not move in the meantime. A block overwritten
//! during the copy is counted as lost instead of being returned torn.
use std::ops::Deref;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;

use portable_atomic::AtomicF32;
use serde::{Deserialize, Serialize};

use crate::queue::OverflowPolicy;
use crate::Error;

/// Relay configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Number of samples per block
    pub block_size: usize,
    /// Number of blocks held by the relay
    pub capacity: usize,
    /// What happens when the producer outruns the consumer
    pub overflow: OverflowPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        // About 100 ms at 48 kHz
        Self {
            block_size: 512,
            capacity: 10,
            overflow: OverflowPolicy::DropOldest,
        }
    }
}

impl RelayConfig {
    /// Check that a relay can be built from this configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.block_size == 0 {
            return Err(Error::ZeroBlockSize);
        }
        if self.capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(())
    }
}

/// Owned copy of one audio block, as handed out by [`RelayConsumer::pop`].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock(Box<[f32]>);

impl AudioBlock {
    /// Samples of the block.
    pub fn samples(&self) -> &[f32] {
        &self.0
    }
}

impl Deref for AudioBlock {
    type Target = [f32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct Slot {
    seq: AtomicU64,
    samples: Box<[AtomicF32]>,
}

struct Shared {
    slots: Box<[Slot]>,
    block_size: usize,
    policy: OverflowPolicy,
    write_pos: AtomicU64,
    read_pos: AtomicU64,
    rejected: AtomicU64,
}

impl Shared {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    fn slot(&self, pos: u64) -> &Slot {
        &self.slots[(pos % self.capacity()) as usize]
    }
}

/// Sequence number of a slot holding the completely written block `pos`.
fn complete(pos: u64) -> u64 {
    2 * pos + 2
}

/// Real-time side of the relay.
pub struct RelayProducer {
    shared: Arc<Shared>,
    write_pos: u64,
}

impl RelayProducer {
    /// Create a new relay from its configuration, returning both of its ends.
    pub fn new(config: &RelayConfig) -> Result<(RelayProducer, RelayConsumer), Error> {
        config.validate()?;
        let slots = (0..config.capacity)
            .map(|_| Slot {
                seq: AtomicU64::new(0),
                samples: (0..config.block_size).map(|_| AtomicF32::new(0.0)).collect(),
            })
            .collect();
        let shared = Arc::new(Shared {
            slots,
            block_size: config.block_size,
            policy: config.overflow,
            write_pos: AtomicU64::new(0),
            read_pos: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        });
        let producer = Self {
            shared: shared.clone(),
            write_pos: 0,
        };
        let consumer = RelayConsumer {
            shared,
            read_pos: 0,
            skipped: 0,
        };
        Ok((producer, consumer))
    }

    /// Number of samples per block.
    pub fn block_size(&self) -> usize {
        self.shared.block_size
    }

    /// Push a copy of `block` into the relay.
    ///
    /// Blocks shorter than the configured block size are padded with zeros, longer ones are
    /// truncated. Returns false when the block was discarded because the relay was full and the
    /// policy is [`OverflowPolicy::RejectNewest`].
    pub fn push(&mut self, block: &[f32]) -> bool {
        let shared = &*self.shared;
        let w = self.write_pos;
        if shared.policy == OverflowPolicy::RejectNewest {
            let r = shared.read_pos.load(Ordering::Acquire);
            if w - r >= shared.capacity() {
                shared.rejected.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }

        let slot = shared.slot(w);
        slot.seq.store(complete(w) - 1, Ordering::Relaxed);
        fence(Ordering::Release);
        let incoming = block.iter().copied().chain(std::iter::repeat(0.0));
        for (dst, src) in slot.samples.iter().zip(incoming) {
            dst.store(src, Ordering::Relaxed);
        }
        slot.seq.store(complete(w), Ordering::Release);

        self.write_pos = w + 1;
        shared.write_pos.store(self.write_pos, Ordering::Release);
        true
    }
}

/// Analysis side of the relay.
pub struct RelayConsumer {
    shared: Arc<Shared>,
    read_pos: u64,
    skipped: u64,
}

impl RelayConsumer {
    /// Number of samples per block.
    pub fn block_size(&self) -> usize {
        self.shared.block_size
    }

    /// Maximum number of blocks the relay holds.
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of complete blocks ready to be popped.
    pub fn available(&self) -> usize {
        let w = self.shared.write_pos.load(Ordering::Acquire);
        (w - self.read_pos).min(self.shared.capacity()) as usize
    }

    /// Total number of blocks lost so far, either overwritten before being read or rejected on a
    /// full relay.
    pub fn lost_blocks(&self) -> u64 {
        self.skipped + self.shared.rejected.load(Ordering::Relaxed)
    }

    /// Pop the oldest available block, copying it into `out`. Returns false when no block is
    /// available, leaving `out` untouched.
    ///
    /// `out` should be [`Self::block_size`] long; extra samples are left untouched and missing
    /// ones are not copied.
    pub fn pop_into(&mut self, out: &mut [f32]) -> bool {
        let shared = &*self.shared;
        loop {
            let w = shared.write_pos.load(Ordering::Acquire);
            let mut r = self.read_pos;
            if w == r {
                return false;
            }
            if w - r > shared.capacity() {
                self.skipped += w - r - shared.capacity();
                r = w - shared.capacity();
            }

            let slot = shared.slot(r);
            let before = slot.seq.load(Ordering::Acquire);
            if before != complete(r) {
                // Already being overwritten by a newer block
                self.skipped += 1;
                self.read_pos = r + 1;
                shared.read_pos.store(self.read_pos, Ordering::Release);
                continue;
            }
            for (dst, src) in out.iter_mut().zip(slot.samples.iter()) {
                *dst = src.load(Ordering::Relaxed);
            }
            fence(Ordering::Acquire);
            let after = slot.seq.load(Ordering::Relaxed);
            self.read_pos = r + 1;
            shared.read_pos.store(self.read_pos, Ordering::Release);
            if after == before {
                return true;
            }
            self.skipped += 1;
        }
    }

    /// Pop the oldest available block into a newly allocated [`AudioBlock`].
    pub fn pop(&mut self) -> Option<AudioBlock> {
        let mut samples = vec![0.0; self.block_size()].into_boxed_slice();
        self.pop_into(&mut samples).then(|| AudioBlock(samples))
    }

    /// Drop every available block without reading it. Returns the number of dropped blocks.
    pub fn skip_all(&mut self) -> usize {
        let w = self.shared.write_pos.load(Ordering::Acquire);
        let skipped = (w - self.read_pos).min(self.shared.capacity());
        self.skipped += (w - self.read_pos) - skipped;
        self.read_pos = w;
        self.shared.read_pos.store(w, Ordering::Release);
        skipped as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;

    fn relay(
        block_size: usize,
        capacity: usize,
        overflow: OverflowPolicy,
    ) -> (RelayProducer, RelayConsumer) {
        RelayProducer::new(&RelayConfig {
            block_size,
            capacity,
            overflow,
        })
        .unwrap()
    }

    fn drain(consumer: &mut RelayConsumer) -> Vec<f32> {
        std::iter::from_fn(|| consumer.pop()).map(|b| b[0]).collect()
    }

    #[rstest]
    #[case(0, 4, Error::ZeroBlockSize)]
    #[case(64, 0, Error::ZeroCapacity)]
    fn test_invalid_config(
        #[case] block_size: usize,
        #[case] capacity: usize,
        #[case] expected: Error,
    ) {
        let result = RelayProducer::new(&RelayConfig {
            block_size,
            capacity,
            ..Default::default()
        });
        assert_eq!(Some(expected), result.err());
    }

    #[test]
    fn test_empty_pop_is_not_available() {
        let (_, mut consumer) = relay(8, 4, OverflowPolicy::DropOldest);
        let mut out = [42.0; 8];
        assert_eq!(0, consumer.available());
        assert!(!consumer.pop_into(&mut out));
        assert_eq!([42.0; 8], out);
        assert!(consumer.pop().is_none());
    }

    #[rstest]
    fn test_keeps_most_recent_blocks(
        #[values(1, 3, 8)] capacity: usize,
        #[values(0, 1, 5, 20)] pushed: usize,
    ) {
        let (mut producer, mut consumer) = relay(4, capacity, OverflowPolicy::DropOldest);
        for i in 0..pushed {
            assert!(producer.push(&[i as f32; 4]));
        }
        assert_eq!(pushed.min(capacity), consumer.available());
        let expected = (pushed.saturating_sub(capacity)..pushed)
            .map(|i| i as f32)
            .collect::<Vec<_>>();
        assert_eq!(expected, drain(&mut consumer));
        assert_eq!(pushed.saturating_sub(capacity) as u64, consumer.lost_blocks());
    }

    #[test]
    fn test_reject_newest_keeps_oldest_blocks() {
        let (mut producer, mut consumer) = relay(4, 3, OverflowPolicy::RejectNewest);
        let accepted = (0..6).map(|i| producer.push(&[i as f32; 4])).collect::<Vec<_>>();
        assert_eq!(vec![true, true, true, false, false, false], accepted);
        assert_eq!(vec![0.0, 1.0, 2.0], drain(&mut consumer));
        assert_eq!(3, consumer.lost_blocks());
        assert!(producer.push(&[6.0; 4]));
        assert_eq!(vec![6.0], drain(&mut consumer));
    }

    #[test]
    fn test_block_length_mismatch() {
        let (mut producer, mut consumer) = relay(4, 2, OverflowPolicy::DropOldest);
        producer.push(&[1.0, 2.0]);
        producer.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(&[1.0, 2.0, 0.0, 0.0], consumer.pop().unwrap().samples());
        assert_eq!(&[1.0, 2.0, 3.0, 4.0], consumer.pop().unwrap().samples());
    }

    #[test]
    fn test_skip_all() {
        let (mut producer, mut consumer) = relay(2, 4, OverflowPolicy::DropOldest);
        for i in 0..6 {
            producer.push(&[i as f32; 2]);
        }
        assert_eq!(4, consumer.skip_all());
        assert_eq!(2, consumer.lost_blocks());
        assert_eq!(0, consumer.available());
        producer.push(&[9.0; 2]);
        assert_eq!(vec![9.0], drain(&mut consumer));
    }

    #[test]
    fn test_cross_thread_blocks_are_never_torn() {
        const BLOCKS: usize = 20_000;
        let (mut producer, mut consumer) = relay(64, 4, OverflowPolicy::DropOldest);
        let handle = thread::spawn(move || {
            for i in 0..BLOCKS {
                producer.push(&[i as f32; 64]);
            }
        });

        let mut out = [0.0; 64];
        let mut last = -1.0;
        let mut received = 0;
        loop {
            let finished = handle.is_finished();
            while consumer.pop_into(&mut out) {
                assert!(out.iter().all(|&x| x == out[0]), "torn block: {out:?}");
                assert!(out[0] > last, "out of order: {} after {last}", out[0]);
                last = out[0];
                received += 1;
            }
            if finished {
                break;
            }
        }
        handle.join().unwrap();
        assert_eq!((BLOCKS - 1) as f32, last);
        assert_eq!(BLOCKS as u64, received + consumer.lost_blocks());
    }
}
