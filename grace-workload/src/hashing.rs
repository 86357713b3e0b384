use std::hash::{BuildHasher, Hasher};

/// Hash of the decimal digits of `key`, least significant first, seeded
/// with 7 and folded with 31.
pub fn digit_hash(key: i64) -> u64 {
    let mut rest = key;
    let mut hash: i64 = 7;

    while rest != 0 {
        hash = hash.wrapping_mul(31).wrapping_add(rest % 10);
        rest /= 10;
    }

    hash.unsigned_abs()
}

/// Picks stripes with [`digit_hash`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitHash;

impl BuildHasher for DigitHash {
    type Hasher = DigitHasher;

    fn build_hasher(&self) -> DigitHasher {
        DigitHasher { state: 0 }
    }
}

#[derive(Debug)]
pub struct DigitHasher {
    state: u64,
}

impl Hasher for DigitHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state = self.state.wrapping_mul(31).wrapping_add(u64::from(*byte));
        }
    }

    fn write_i64(&mut self, key: i64) {
        self.state = digit_hash(key);
    }
}
