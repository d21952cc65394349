//! Population-count kernels.
//!
//! Three tiers, fastest first:
//! - chunk: 64 bytes (16 × u32) per step, SWAR popcount that LLVM turns into
//!   vector code,
//! - word: one u32 at a time,
//! - byte: whatever is left over.
//!
//! [`count_bits`] accepts any byte slice and routes each part of it to the
//! widest tier it can use (see [`super::split`]).

use super::count::Count;
use super::split::{CHUNK_BYTES, WORD_BYTES, split_for_alignment};

/// Number of u32 words in one bulk chunk.
pub const CHUNK_WORDS: usize = CHUNK_BYTES / WORD_BYTES;

/// One bulk chunk viewed as words.
pub type Chunk = [u32; CHUNK_WORDS];

/// Generate a SWAR ("SIMD within a register") popcount for one integer width.
///
/// The word is treated as a vector of 2-bit lanes:
/// 1. per-lane popcount: `a - ((a >> 1) & 0b0101…)`,
/// 2. add adjacent 2-bit lanes into 4-bit lanes, then 4-bit into 8-bit lanes,
/// 3. multiply by `0x0101…`, which accumulates every byte lane into the top
///    byte (a horizontal prefix sum), and shift that byte down.
///
/// Each byte lane holds at most 8 and the whole sum at most `BITS`, so no
/// lane ever carries into its neighbour.
macro_rules! swar_popcount {
    ($name:ident, $t:ty) => {
        #[inline(always)]
        pub const fn $name(n: $t) -> u32 {
            /// `byte` replicated into every byte lane of the word.
            const fn rep(byte: u8) -> $t {
                <$t>::MAX / 0xFF * byte as $t
            }

            let a = n;
            let c = a - ((a >> 1) & rep(0b0101_0101));

            let f = ((c >> 2) & rep(0b0011_0011)) + (c & rep(0b0011_0011));
            let g = (f + (f >> 4)) & rep(0b0000_1111);

            let h = g.wrapping_mul(rep(0b0000_0001));
            (h >> (<$t>::BITS - 8)) as u32
        }
    };
}

swar_popcount!(popcount_swar_32, u32);
swar_popcount!(popcount_swar_64, u64);

/// Popcount of one u32, hardware instruction variant.
#[cfg(feature = "builtin-popcount")]
#[inline(always)]
pub fn popcount_32(n: u32) -> u32 {
    n.count_ones()
}

/// Popcount of one u32, software variant.
#[cfg(not(feature = "builtin-popcount"))]
#[inline(always)]
pub fn popcount_32(n: u32) -> u32 {
    popcount_swar_32(n)
}

/// Popcount of one 64-byte chunk.
///
/// Always SWAR: compilers vectorize this loop but not a loop over the
/// scalar popcount instruction.
#[inline(always)]
pub fn popcount_chunk(chunk: &Chunk) -> u64 {
    let mut sum = 0u64;
    for &w in chunk {
        sum += popcount_swar_32(w) as u64;
    }
    sum
}

/// Set bits in a run of whole chunks.
pub fn ones_in_chunks(chunks: &[Chunk]) -> u64 {
    chunks.iter().map(popcount_chunk).sum()
}

/// Set bits in a run of u32 words.
pub fn ones_in_words(words: &[u32]) -> u64 {
    words.iter().map(|&w| popcount_32(w) as u64).sum()
}

/// Set bits in loose bytes.
pub fn ones_in_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().map(|&b| popcount_32(b as u32) as u64).sum()
}

/// Count bits one at a time. Slow, but obviously correct.
pub fn count_bits_naive(data: &[u8]) -> Count {
    let mut ones = 0u64;
    for &b in data {
        for bit in 0..8 {
            ones += ((b >> bit) & 1) as u64;
        }
    }
    Count::from_ones(ones, data.len() as u64)
}

/// Count the set and clear bits of an arbitrary byte slice.
///
/// Total: every input is valid, and an empty slice gives `{0, 0}`.
pub fn count_bits(data: &[u8]) -> Count {
    let regions = split_for_alignment(data, WORD_BYTES, CHUNK_BYTES);
    Count::from_ones(regions.ones(), data.len() as u64)
}

/// Count a buffer that the caller guarantees starts on a chunk boundary
/// (mapped files and the streaming scratch buffer).
///
/// # Panics
/// If `data` is not aligned to [`CHUNK_BYTES`]; that is a caller bug.
pub fn count_bits_aligned(data: &[u8]) -> Count {
    assert!(
        data.as_ptr() as usize % CHUNK_BYTES == 0,
        "buffer at {:p} is not aligned to {} bytes",
        data.as_ptr(),
        CHUNK_BYTES
    );
    count_bits(data)
}
