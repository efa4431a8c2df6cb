use std::ops::{BitAnd, BitAndAssign};

/// Fixed-size bit set addressed by transaction id
/// stored as 512bit blocks
#[derive(Clone, Debug)]
pub struct BitMap {
    blocks: Vec<L1Bits>,
    size: usize,
}

/// 8 x 64 = 512bits bucket
#[derive(Clone, Copy, Debug, Default)]
#[repr(align(64))]
pub struct L1Bits {
    bucket: [u64; 8],
}

const L1_BITS: usize = 512;

impl L1Bits {
    #[inline]
    fn count_ones(&self) -> u64 {
        self.bucket.iter().map(|w| w.count_ones() as u64).sum()
    }
}

impl BitAnd for &L1Bits {
    type Output = L1Bits;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut result = L1Bits::default();
        for i in 0..8 {
            result.bucket[i] = self.bucket[i] & rhs.bucket[i];
        }
        result
    }
}

impl BitAndAssign<&L1Bits> for L1Bits {
    fn bitand_assign(&mut self, rhs: &L1Bits) {
        for i in 0..8 {
            self.bucket[i] &= rhs.bucket[i];
        }
    }
}

impl BitMap {
    /// all-zero bitmap able to hold `size` bits
    pub fn new(size: usize) -> Self {
        Self {
            blocks: vec![L1Bits::default(); size.div_ceil(L1_BITS)],
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// set bit `idx`
    /// out of range is ignored
    #[inline]
    pub fn set(&mut self, idx: usize) {
        if idx >= self.size {
            return;
        }
        let block = &mut self.blocks[idx / L1_BITS];
        let bit = idx % L1_BITS;
        block.bucket[bit / 64] |= 1u64 << (bit % 64);
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.size {
            return false;
        }
        let bit = idx % L1_BITS;
        self.blocks[idx / L1_BITS].bucket[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// number of set bits
    pub fn count_ones(&self) -> u64 {
        self.blocks.iter().map(L1Bits::count_ones).sum()
    }

    /// self &= other
    /// both maps must share the same size
    pub fn and_assign(&mut self, other: &BitMap) {
        debug_assert_eq!(self.size, other.size);
        for (a, b) in self.blocks.iter_mut().zip(other.blocks.iter()) {
            *a &= b;
        }
    }

    /// popcount of (self & other) without allocating
    pub fn and_count(&self, other: &BitMap) -> u64 {
        self.blocks
            .iter()
            .zip(other.blocks.iter())
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }
}
