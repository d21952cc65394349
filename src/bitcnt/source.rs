use std::fs::File;
use std::io::{self, Read};
#[cfg(unix)]
use std::mem::ManuallyDrop;
#[cfg(unix)]
use std::os::unix::io::FromRawFd;
use std::path::Path;

use log::{debug, trace};
use thiserror::Error;

use super::buffer::AlignedBuffer;
use super::count::Count;
use super::kernel::count_bits_aligned;
use crate::common::io::{FileKind, Stat, map_readonly, open_noatime, read_retry, stat};
use crate::common::{escape, io_error_msg};

/// Streaming chunk size in pages when nothing else is configured.
pub const DEFAULT_CHUNK_PAGES: usize = 4;

/// Name standard input is reported under.
pub const STDIN_NAME: &str = "<stdin>";

/// Failure to count one source. Names are already escaped for display.
#[derive(Debug, Error)]
pub enum CountError {
    #[error("could not open file {name}: {}", io_error_msg(.source))]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("error reading file {name}: {}", io_error_msg(.source))]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("could not mmap file {name}: {}", io_error_msg(.source))]
    Map {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl CountError {
    /// Underlying OS error code, if the failure came from a syscall.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.io_error().raw_os_error()
    }

    pub fn io_error(&self) -> &io::Error {
        match self {
            CountError::Open { source, .. }
            | CountError::Read { source, .. }
            | CountError::Map { source, .. } => source,
        }
    }
}

enum Handle {
    File(File),
    /// fd 0 borrowed as a File so it can be stat-ed and mapped; never closed.
    #[cfg(unix)]
    Stdin(ManuallyDrop<File>),
    #[cfg(not(unix))]
    Stdin(io::Stdin),
}

/// One input being counted: its open handle plus the names used to report it.
///
/// Owned by exactly one worker; the handle is closed when the source is
/// dropped (standard input is left open).
pub struct Source {
    name: String,
    escaped: String,
    handle: Handle,
}

impl Source {
    /// Open `path` read-only.
    pub fn open(path: &Path) -> Result<Source, CountError> {
        let escaped = escape(path.as_os_str().as_encoded_bytes());
        let file = open_noatime(path).map_err(|source| CountError::Open {
            name: escaped.clone(),
            source,
        })?;
        Ok(Source {
            name: path.to_string_lossy().into_owned(),
            escaped,
            handle: Handle::File(file),
        })
    }

    /// Wrap an already open file.
    pub fn from_file(file: File, name: &str) -> Source {
        Source {
            name: name.to_string(),
            escaped: escape(name.as_bytes()),
            handle: Handle::File(file),
        }
    }

    /// Standard input, reported as `<stdin>`.
    pub fn stdin() -> Source {
        #[cfg(unix)]
        // SAFETY: fd 0 stays open for the life of the process and
        // ManuallyDrop keeps this File from closing it.
        let handle = Handle::Stdin(ManuallyDrop::new(unsafe { File::from_raw_fd(0) }));
        #[cfg(not(unix))]
        let handle = Handle::Stdin(io::stdin());

        Source {
            name: STDIN_NAME.to_string(),
            escaped: STDIN_NAME.to_string(),
            handle,
        }
    }

    /// Name for report lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name for diagnostics.
    pub fn escaped_name(&self) -> &str {
        &self.escaped
    }

    /// The file behind this source, when there is one to stat or map.
    pub fn file(&self) -> Option<&File> {
        match &self.handle {
            Handle::File(f) => Some(f),
            #[cfg(unix)]
            Handle::Stdin(f) => Some(&**f),
            #[cfg(not(unix))]
            Handle::Stdin(_) => None,
        }
    }

    /// Size and type, or None when they cannot be queried.
    pub fn stat(&self) -> Option<Stat> {
        let file = self.file()?;
        match stat(file) {
            Ok(st) => Some(st),
            Err(e) => {
                debug!("{}: stat failed: {}", self.escaped, io_error_msg(&e));
                None
            }
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.handle {
            Handle::File(f) => f.read(buf),
            #[cfg(unix)]
            Handle::Stdin(f) => f.read(buf),
            #[cfg(not(unix))]
            Handle::Stdin(s) => s.read(buf),
        }
    }
}

/// How one source is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Map this many bytes in one go.
    Map(usize),
    /// Read chunk by chunk into the scratch buffer.
    Stream,
}

/// Tunables for [`BitCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterConfig {
    /// Bytes per streaming read; also the smallest size worth mapping.
    pub chunk_size: usize,
    /// Whether mapping may be attempted at all.
    pub allow_mmap: bool,
}

impl CounterConfig {
    /// `chunk_pages` pages per chunk, mapping allowed.
    /// Returns None if the chunk size would be zero or overflow.
    pub fn from_page_size(page_size: usize, chunk_pages: usize) -> Option<CounterConfig> {
        let chunk_size = page_size.checked_mul(chunk_pages)?;
        if chunk_size == 0 {
            return None;
        }
        Some(CounterConfig {
            chunk_size,
            allow_mmap: true,
        })
    }
}

/// Counts bits of whole sources, choosing between mapping and streaming.
#[derive(Debug, Clone)]
pub struct BitCounter {
    config: CounterConfig,
}

impl BitCounter {
    pub fn new(config: CounterConfig) -> BitCounter {
        assert!(config.chunk_size > 0, "chunk size must be non-zero");
        BitCounter { config }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Open `path`, count it, close it.
    pub fn count_path(&self, path: &Path) -> Result<Count, CountError> {
        let mut source = Source::open(path)?;
        self.count_source(&mut source)
    }

    /// Count the contents of `source`.
    ///
    /// Streamed sources are counted from their current read position. A
    /// mapped source is counted from offset 0 to its size, even when it is
    /// standard input redirected from a file that was already partly read.
    ///
    /// Mapping failures are not errors: they are logged and the source is
    /// streamed instead.
    pub fn count_source(&self, source: &mut Source) -> Result<Count, CountError> {
        self.count_source_with(source, map_count)
    }

    /// [`count_source`](Self::count_source) with the mapping step supplied
    /// by the caller.
    pub(super) fn count_source_with<M>(
        &self,
        source: &mut Source,
        map: M,
    ) -> Result<Count, CountError>
    where
        M: FnOnce(&File, usize, &str) -> Result<Count, CountError>,
    {
        let strategy = self.choose_strategy(source.stat());
        trace!("{}: strategy {:?}", source.escaped_name(), strategy);

        if let (Strategy::Map(len), Some(file)) = (strategy, source.file()) {
            match map(file, len, source.escaped_name()) {
                Ok(count) => return Ok(count),
                Err(e) => debug!("{}; streaming instead", e),
            }
        }

        let name = source.escaped_name().to_string();
        self.stream_count(source, &name)
    }

    /// Pick the input strategy from (possibly missing) metadata.
    pub fn choose_strategy(&self, stat: Option<Stat>) -> Strategy {
        if !self.config.allow_mmap {
            return Strategy::Stream;
        }
        let Some(stat) = stat else {
            return Strategy::Stream;
        };
        // Pipes, character devices and sockets report sizes that cannot be
        // trusted; directories cannot be read at all.
        if !matches!(stat.kind, FileKind::Regular | FileKind::Block) {
            return Strategy::Stream;
        }
        if stat.size < self.config.chunk_size as u64 {
            return Strategy::Stream;
        }
        match usize::try_from(stat.size) {
            Ok(len) => Strategy::Map(len),
            Err(_) => Strategy::Stream,
        }
    }

    /// Read `reader` to the end one chunk at a time, counting each chunk.
    ///
    /// Interrupted reads are retried; any other read error fails the whole
    /// source and the partial count is dropped.
    pub fn stream_count(&self, reader: &mut impl Read, name: &str) -> Result<Count, CountError> {
        let mut buffer = AlignedBuffer::allocate(self.config.chunk_size);
        let mut total = Count::default();

        loop {
            let n = read_retry(reader, &mut buffer).map_err(|source| CountError::Read {
                name: name.to_string(),
                source,
            })?;
            if n == 0 {
                break;
            }
            total += count_bits_aligned(&buffer[..n]);
        }

        Ok(total)
    }
}

/// Map `len` bytes of `file` and count them in one pass.
/// The mapping is released before returning.
fn map_count(file: &File, len: usize, name: &str) -> Result<Count, CountError> {
    let mmap = map_readonly(file, len).map_err(|source| CountError::Map {
        name: name.to_string(),
        source,
    })?;
    Ok(count_bits_aligned(&mmap))
}
