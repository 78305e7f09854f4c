/*!
 * Internet Checksum
 *
 * 16-bit one's-complement sum over host-order words (RFC 1071). Summing in
 * host order and storing the result back in host order yields the same
 * bytes on either endianness, so no swapping is needed.
 */

/// Fold the carries of a 32-bit running sum into 16 bits
#[inline]
#[must_use]
pub fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    sum as u16
}

/// One's-complement addition of two folded partial sums
#[inline]
#[must_use]
pub fn combine(a: u16, b: u16) -> u16 {
    fold(u32::from(a) + u32::from(b))
}

/// Folded one's-complement sum of `bytes`, not yet complemented
///
/// A trailing odd byte is treated as the first byte of a word whose second
/// byte is zero.
#[must_use]
pub fn accumulate(bytes: &[u8]) -> u16 {
    let mut sum = Checksum::new();
    sum.update(bytes);
    sum.sum()
}

/// Internet checksum of `bytes`
#[inline]
#[must_use]
pub fn checksum(bytes: &[u8]) -> u16 {
    !accumulate(bytes)
}

/// Incremental checksum over discontiguous fragments
///
/// Fragments after the first must start on an even offset of the logical
/// byte stream for the result to equal a one-shot checksum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u32,
}

impl Checksum {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { sum: 0 }
    }

    /// Add a fragment to the running sum
    pub fn update(&mut self, bytes: &[u8]) {
        let mut words = bytes.chunks_exact(2);
        for word in &mut words {
            self.add_word(u16::from_ne_bytes([word[0], word[1]]));
        }
        if let [last] = words.remainder() {
            self.add_word(u16::from_ne_bytes([*last, 0]));
        }
    }

    /// Add an already folded partial sum
    pub fn add_partial(&mut self, partial: u16) {
        self.add_word(partial);
    }

    #[inline]
    fn add_word(&mut self, word: u16) {
        // Keep the accumulator bounded so long inputs cannot overflow u32
        self.sum = u32::from(fold(self.sum + u32::from(word)));
    }

    /// Folded sum so far
    #[inline]
    #[must_use]
    pub fn sum(&self) -> u16 {
        fold(self.sum)
    }

    /// Complemented checksum of everything added so far
    #[inline]
    #[must_use]
    pub fn finish(&self) -> u16 {
        !self.sum()
    }
}
