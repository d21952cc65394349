mod buffer;
mod count;
pub mod kernel;
mod parallel;
mod report;
mod source;
pub mod split;


pub use self::buffer::AlignedBuffer;
pub use self::count::Count;
pub use self::kernel::{count_bits, count_bits_aligned, count_bits_naive};
pub use self::parallel::{SourceReport, build_pool, count_input, count_inputs, grand_total};
pub use self::report::{TOTAL_NAME, format_count, human_size, write_count};
pub use self::source::{
    BitCounter, CountError, CounterConfig, DEFAULT_CHUNK_PAGES, STDIN_NAME, Source, Strategy,
};
pub use self::split::{CHUNK_BYTES, Regions, WORD_BYTES, split_for_alignment};
