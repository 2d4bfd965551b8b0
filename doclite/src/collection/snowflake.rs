use crate::common::get_current_time_or_zero;
use log::{info, warn};
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::atomic::AtomicU64;
use std::sync::Mutex;

pub struct SnowflakeIdGenerator {
    node_id: u64,
    sequence: AtomicU64,
    last_timestamp: AtomicU64,
    sequence_bits: u64,
    timestamp_left_shift: u64,
    epoch: u64,
    mutex: Mutex<()>,
}

impl SnowflakeIdGenerator {
    pub fn new() -> Self {
        let node_id_bits = 10;
        let sequence_bits = 12;
        let max_node_id = (1u64 << node_id_bits) - 1;
        let timestamp_left_shift = sequence_bits + node_id_bits;
        let epoch = 1288834974657;

        let node_id = OsRng.gen_range(1..=max_node_id);
        info!("Initialized with node id: {}", node_id);

        SnowflakeIdGenerator {
            node_id,
            sequence: AtomicU64::new(0),
            last_timestamp: AtomicU64::new(0),
            sequence_bits,
            timestamp_left_shift,
            epoch,
            mutex: Mutex::new(()),
        }
    }

    pub fn get_id(&self) -> u64 {
        // Acquire the lock with poison recovery
        let _lock = match self.mutex.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("Snowflake lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        let current_time = get_current_time_or_zero() as u64;
        let mut timestamp = current_time;
        let last_timestamp = self.last_timestamp.load(std::sync::atomic::Ordering::Relaxed);
        let sequence = self.sequence.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // Handle clock moving backwards
        if timestamp <= last_timestamp {
            timestamp = last_timestamp;
            let sleep_duration = timestamp.saturating_sub(current_time);
            if sleep_duration > 0 {
                std::thread::sleep(std::time::Duration::from_millis(sleep_duration));
            }
        }

        self.last_timestamp
            .store(timestamp, std::sync::atomic::Ordering::Relaxed);
        drop(_lock);

        ((timestamp - self.epoch) << self.timestamp_left_shift)
            | (self.node_id << self.sequence_bits)
            | (sequence & ((1 << self.sequence_bits) - 1))
    }
}

impl Default for SnowflakeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
