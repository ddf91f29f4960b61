//! Maps sparse 64-bit OSM ids to a consecutive range of 32-bit indices.

/// Value returned by [`DenseIdMap::get`] for keys that were never inserted.
/// Reserved: it can not be stored.
pub const ABSENT: u32 = u32::MAX;

/// Open-addressed hash table from i64 keys to u32 values.
///
/// This table dominates the peak memory of a build, so it is flat and sized
/// once from a capacity hint at a load factor of at most 0.75. Slots with an
/// `ABSENT` value are empty. Linear probing; no deletion. Growth (doubling
/// plus rehash) only kicks in when the hint turns out too low.
pub struct DenseIdMap {
    keys: Vec<i64>,
    values: Vec<u32>,
    mask: usize,
    len: usize,
    limit: usize,
}

/// splitmix64 finalizer. OSM ids are quasi-sequential, so the low bits of
/// the raw key would cluster probes without this avalanche step.
fn mix(key: i64) -> u64 {
    let mut x = key as u64;
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

impl DenseIdMap {
    /// Constructs a table able to hold `capacity_hint` entries without
    /// rehashing.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        let slots = (capacity_hint + capacity_hint / 3 + 1)
            .next_power_of_two()
            .max(16);
        Self {
            keys: vec![0; slots],
            values: vec![ABSENT; slots],
            mask: slots - 1,
            len: 0,
            limit: slots / 4 * 3,
        }
    }

    /// Inserts or overwrites. `value` must not be `ABSENT`.
    pub fn put(&mut self, key: i64, value: u32) {
        debug_assert_ne!(value, ABSENT);
        if self.len >= self.limit {
            self.grow();
        }
        self.insert_slot(key, value);
    }

    /// Returns the stored value, or `ABSENT`.
    pub fn get(&self, key: i64) -> u32 {
        let mut slot = (mix(key) as usize) & self.mask;
        loop {
            if self.values[slot] == ABSENT {
                return ABSENT;
            }
            if self.keys[slot] == key {
                return self.values[slot];
            }
            slot = (slot + 1) & self.mask;
        }
    }

    pub fn contains(&self, key: i64) -> bool {
        self.get(key) != ABSENT
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over all entries, in table (not insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.keys
            .iter()
            .zip(&self.values)
            .filter(|(_, &value)| value != ABSENT)
            .map(|(&key, &value)| (key, value))
    }

    fn insert_slot(&mut self, key: i64, value: u32) {
        let mut slot = (mix(key) as usize) & self.mask;
        loop {
            if self.values[slot] == ABSENT {
                self.keys[slot] = key;
                self.values[slot] = value;
                self.len += 1;
                return;
            }
            if self.keys[slot] == key {
                self.values[slot] = value;
                return;
            }
            slot = (slot + 1) & self.mask;
        }
    }

    fn grow(&mut self) {
        let slots = self.keys.len() * 2;
        let old_keys = std::mem::replace(&mut self.keys, vec![0; slots]);
        let old_values = std::mem::replace(&mut self.values, vec![ABSENT; slots]);
        self.mask = slots - 1;
        self.limit = slots / 4 * 3;
        self.len = 0;
        for (key, value) in old_keys.into_iter().zip(old_values) {
            if value != ABSENT {
                self.insert_slot(key, value);
            }
        }
    }
}
