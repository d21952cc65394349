use super::kernel::{Chunk, ones_in_bytes, ones_in_chunks, ones_in_words};

/// Alignment and size of one bulk chunk. Matches a cache line and the widest
/// common vector register; it is a tuning value, not a hardware requirement.
pub const CHUNK_BYTES: usize = 64;

/// Size of the word the middle tier works on.
pub const WORD_BYTES: usize = std::mem::size_of::<u32>();

/// A byte slice cut into parts that can each use the widest kernel tier.
///
/// Concatenating `head`, `bulk`, `words` and `tail` gives back the original
/// slice. `head` is the prefix before the first chunk boundary and is empty
/// for chunk-aligned input; `bulk` starts on a chunk boundary and is a whole
/// number of chunks; `words` starts on a word boundary and is a whole number
/// of words; `tail` is shorter than one word.
#[derive(Debug, Clone, Copy)]
pub struct Regions<'a> {
    pub head: &'a [u8],
    pub bulk: &'a [u8],
    pub words: &'a [u8],
    pub tail: &'a [u8],
}

/// Split `data` on `chunk_size` and `word_size` boundaries.
///
/// Both sizes must be powers of two with `word_size <= chunk_size`. Only
/// multiples of [`WORD_BYTES`] and [`CHUNK_BYTES`] can be counted with
/// [`Regions::ones`].
pub fn split_for_alignment(data: &[u8], word_size: usize, chunk_size: usize) -> Regions<'_> {
    assert!(word_size.is_power_of_two() && chunk_size.is_power_of_two());
    assert!(word_size <= chunk_size);

    let head_len = data.as_ptr().align_offset(chunk_size).min(data.len());
    let (head, rest) = data.split_at(head_len);

    let bulk_len = rest.len() / chunk_size * chunk_size;
    let (bulk, rest) = rest.split_at(bulk_len);

    // `rest` now starts on a chunk boundary, or is empty when `data` ends
    // before reaching one.
    let words_len = rest.len() / word_size * word_size;
    let (words, tail) = rest.split_at(words_len);

    Regions {
        head,
        bulk,
        words,
        tail,
    }
}

impl Regions<'_> {
    /// Set bits across all four parts, each with its own tier.
    ///
    /// # Panics
    /// If `bulk` is not a whole number of [`CHUNK_BYTES`] chunks or `words`
    /// not a whole number of u32s, i.e. the regions came from a geometry
    /// smaller than the default one.
    pub fn ones(&self) -> u64 {
        assert!(
            self.bulk.len() % CHUNK_BYTES == 0 && self.words.len() % WORD_BYTES == 0,
            "regions of {} bulk and {} word bytes do not fit {}-byte chunks and {}-byte words",
            self.bulk.len(),
            self.words.len(),
            CHUNK_BYTES,
            WORD_BYTES
        );
        let mut ones = ones_unaligned(self.head) + ones_in_bytes(self.tail);
        // An empty part may sit at an unaligned address past the head, which
        // the checked casts reject.
        if !self.bulk.is_empty() {
            ones += ones_in_chunks(bytemuck::cast_slice::<u8, Chunk>(self.bulk));
        }
        if !self.words.is_empty() {
            ones += ones_in_words(as_words(self.words));
        }
        ones
    }

    pub fn len(&self) -> usize {
        self.head.len() + self.bulk.len() + self.words.len() + self.tail.len()
    }
}

/// View bytes as native-endian u32 words.
///
/// # Panics
/// If `bytes` is not 4-byte aligned or its length is not a multiple of 4.
/// Either is a caller bug, not an input condition.
#[inline]
pub fn as_words(bytes: &[u8]) -> &[u32] {
    bytemuck::cast_slice(bytes)
}

/// Count a prefix with no alignment guarantee: loose bytes up to the first
/// word boundary, whole words, then the loose remainder.
fn ones_unaligned(bytes: &[u8]) -> u64 {
    let (pre, words, post) = bytemuck::pod_align_to::<u8, u32>(bytes);
    ones_in_bytes(pre) + ones_in_words(words) + ones_in_bytes(post)
}
