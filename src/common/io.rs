use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

#[cfg(target_os = "linux")]
use std::sync::atomic::{AtomicBool, Ordering};

use memmap2::{Mmap, MmapOptions};

/// Page size assumed where the platform offers no way to ask.
#[cfg(not(unix))]
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Coarse file type, as far as the input strategy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    Regular,
    Block,
    /// Pipes, character devices, sockets and anything else whose reported
    /// size cannot be trusted.
    Other,
}

/// Size and type of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub kind: FileKind,
    pub size: u64,
}

/// Track whether O_NOATIME is supported to avoid repeated failed open() attempts.
/// After the first EPERM, we never try O_NOATIME again (saves one syscall per file).
#[cfg(target_os = "linux")]
static NOATIME_SUPPORTED: AtomicBool = AtomicBool::new(true);

/// Open a file read-only with O_NOATIME on Linux to avoid atime inode writes.
/// Caches whether O_NOATIME works to avoid double-open on every file.
#[cfg(target_os = "linux")]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    if NOATIME_SUPPORTED.load(Ordering::Relaxed) {
        match fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOATIME)
            .open(path)
        {
            Ok(f) => return Ok(f),
            Err(ref e) if e.raw_os_error() == Some(libc::EPERM) => {
                // O_NOATIME requires file ownership or CAP_FOWNER — disable globally
                NOATIME_SUPPORTED.store(false, Ordering::Relaxed);
            }
            Err(e) => return Err(e),
        }
    }
    File::open(path)
}

#[cfg(not(target_os = "linux"))]
pub fn open_noatime(path: &Path) -> io::Result<File> {
    File::open(path)
}

/// fstat an open file and classify it.
pub fn stat(file: &File) -> io::Result<Stat> {
    let metadata = file.metadata()?;
    let ft = metadata.file_type();

    let kind = if ft.is_dir() {
        FileKind::Directory
    } else if ft.is_file() {
        FileKind::Regular
    } else if is_block_device(&ft) {
        FileKind::Block
    } else {
        FileKind::Other
    };

    Ok(Stat {
        kind,
        size: metadata.len(),
    })
}

#[cfg(unix)]
#[inline]
fn is_block_device(ft: &fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    ft.is_block_device()
}

#[cfg(not(unix))]
#[inline]
fn is_block_device(_ft: &fs::FileType) -> bool {
    false
}

/// Single read() that is retried transparently when interrupted by a signal.
/// Returns the number of bytes read; 0 means end of input.
#[inline]
pub fn read_retry(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Map the first `len` bytes of `file` read-only.
///
/// The returned `Mmap` owns the mapping; dropping it unmaps on every path.
pub fn map_readonly(file: &File, len: usize) -> io::Result<Mmap> {
    // SAFETY: Read-only private mapping. The file may be modified by another
    // process while mapped; counts are then as racy as a read() would be.
    let mmap = unsafe { MmapOptions::new().len(len).map(file)? };

    #[cfg(target_os = "linux")]
    {
        // HUGEPAGE first: it must be set before any page faults occur.
        if len >= 2 * 1024 * 1024 {
            let _ = mmap.advise(memmap2::Advice::HugePage);
        }
        let _ = mmap.advise(memmap2::Advice::Sequential);
        let _ = mmap.advise(memmap2::Advice::WillNeed);
    }

    Ok(mmap)
}

/// System memory page size.
#[cfg(unix)]
pub fn page_size() -> io::Result<usize> {
    let sz = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if sz <= 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(sz as usize)
}

#[cfg(not(unix))]
pub fn page_size() -> io::Result<usize> {
    Ok(FALLBACK_PAGE_SIZE)
}
