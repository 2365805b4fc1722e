//! Bit-level primitives: the prefix-mask popcount and the packed occupancy
//! vector carried by finest-resolution tree nodes.

use smallvec::{smallvec, SmallVec};

const WORD_BITS: u32 = 64;

/// Number of set bits in a prefix mask, i.e. how many merge levels already
/// hold a folded row.
pub fn num_ones(mask: u32) -> u32 {
    mask.count_ones()
}

/// Whether bit `bit` of `mask` is set. Bits at position 32 and beyond read as
/// zero.
pub(crate) fn bit_at(mask: u32, bit: u32) -> bool {
    bit < 32 && (mask >> bit) & 1 == 1
}

/// Fixed-width bit vector. Word storage is inline for the widths
/// `bits_compress` realistically takes, so packing a node does not allocate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitVec {
    n_bits: u32,
    words: SmallVec<[u64; 2]>,
}

impl BitVec {
    pub fn new(n_bits: u32) -> Self {
        let n_words = n_bits.div_ceil(WORD_BITS) as usize;
        BitVec {
            n_bits,
            words: smallvec![0; n_words],
        }
    }

    /// Width in bits, set and unset alike.
    pub fn len(&self) -> u32 {
        self.n_bits
    }

    pub fn is_empty(&self) -> bool {
        self.n_bits == 0
    }

    pub fn set(&mut self, pos: u32) {
        assert!(pos < self.n_bits, "bit {pos} out of range for width {}", self.n_bits);
        self.words[(pos / WORD_BITS) as usize] |= 1u64 << (pos % WORD_BITS);
    }

    pub fn clear(&mut self, pos: u32) {
        assert!(pos < self.n_bits, "bit {pos} out of range for width {}", self.n_bits);
        self.words[(pos / WORD_BITS) as usize] &= !(1u64 << (pos % WORD_BITS));
    }

    pub fn get(&self, pos: u32) -> bool {
        assert!(pos < self.n_bits, "bit {pos} out of range for width {}", self.n_bits);
        self.words[(pos / WORD_BITS) as usize] >> (pos % WORD_BITS) & 1 == 1
    }

    /// Returns a copy shifted toward higher positions by `n`; bits shifted
    /// past the width are dropped.
    pub fn left_shift(&self, n: u32) -> BitVec {
        let mut out = BitVec::new(self.n_bits);
        let word_shift = (n / WORD_BITS) as usize;
        let bit_shift = n % WORD_BITS;
        let mut carry = 0u64;
        for i in word_shift..self.words.len() {
            let word = self.words[i - word_shift];
            let top = if bit_shift == 0 { 0 } else { word >> (WORD_BITS - bit_shift) };
            out.words[i] = (word << bit_shift) | carry;
            carry = top;
        }
        out.mask_tail();
        out
    }

    /// Bitwise or of two equal-width vectors.
    pub fn or(&self, other: &BitVec) -> BitVec {
        assert_eq!(self.n_bits, other.n_bits, "or over mismatched widths");
        let mut out = BitVec::new(self.n_bits);
        for (slot, (a, b)) in out.words.iter_mut().zip(self.words.iter().zip(&other.words)) {
            *slot = a | b;
        }
        out
    }

    fn mask_tail(&mut self) {
        let rem = self.n_bits % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}
