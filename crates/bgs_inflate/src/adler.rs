//! Rolling Adler-32 checksum used by the zlib trailer.

const MOD_ADLER: u32 = 65521;

/// Adler-32 state
///
/// Both sums are accumulated lazily and only reduced modulo 65521 once the second sum gets close
/// to overflowing a `u32`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Adler32 {
    /// Checksum of the empty input
    pub const fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// Feed `data` into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        let (mut s1, mut s2) = (self.s1, self.s2);
        for &b in data {
            s1 += u32::from(b);
            s2 += s1;
            if s2 & 0x8000_0000 != 0 {
                s1 %= MOD_ADLER;
                s2 %= MOD_ADLER;
            }
        }
        self.s1 = s1;
        self.s2 = s2;
    }

    /// The checksum of everything fed so far, as stored in the zlib trailer.
    pub fn finish(&self) -> u32 {
        ((self.s2 % MOD_ADLER) << 16) | (self.s1 % MOD_ADLER)
    }
}
