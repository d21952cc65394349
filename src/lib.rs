#![allow(clippy::len_without_is_empty)]

/// Use mimalloc as the global allocator for all binaries.
/// 2-3x faster than glibc malloc for small allocations,
/// better thread-local caching, and reduced fragmentation.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod bitcnt;
pub mod common;
