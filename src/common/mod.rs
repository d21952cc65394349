pub mod io;
pub mod logger;


/// Get the short tool name by stripping the 'f' prefix.
/// e.g., "fbitcnt" -> "bitcnt"
#[inline]
pub fn gnu_name(binary_name: &str) -> &str {
    binary_name.strip_prefix('f').unwrap_or(binary_name)
}

/// Reset SIGPIPE to default behavior (SIG_DFL).
/// Rust sets SIGPIPE to SIG_IGN by default, so `fbitcnt big.bin | head -1`
/// would otherwise report a broken pipe instead of exiting quietly.
/// This must be called at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Format an IO error message without the "(os error N)" suffix.
/// Prints e.g. "No such file or directory" where Rust's Display impl
/// adds " (os error 2)".
pub fn io_error_msg(e: &std::io::Error) -> String {
    if let Some(raw) = e.raw_os_error() {
        let os_err = std::io::Error::from_raw_os_error(raw);
        let msg = format!("{}", os_err);
        msg.replace(&format!(" (os error {})", raw), "")
    } else {
        format!("{}", e)
    }
}

/// Escape a source name for diagnostics.
///
/// Backslash, tab, newline and double quote get C-style escapes; any other
/// byte outside printable ASCII is written as `\xHH`. File names are not
/// guaranteed to be UTF-8, so this works on raw bytes.
pub fn escape(name: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut out = String::with_capacity(name.len());
    for &b in name {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'"' => out.push_str("\\\""),
            0x20..=0x7e => out.push(b as char),
            _ => {
                out.push_str("\\x");
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0xF) as usize] as char);
            }
        }
    }
    out
}
