// ThreatLog - platform/fs.rs
//
// Filesystem access for log input and report output.
//
// Log files are decoded lossily: invalid UTF-8 becomes U+FFFD rather than
// aborting the run, since auth logs routinely carry stray bytes.

use crate::util::constants;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Retry delays for transient read errors (milliseconds).
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Read a log file as text.
///
/// Files above `LARGE_FILE_THRESHOLD` are memory-mapped; smaller files are
/// read into a buffer with retries on transient errors.
pub fn read_log_lossy(path: &Path) -> io::Result<String> {
    let size = std::fs::metadata(path)?.len();
    let is_large = size > constants::LARGE_FILE_THRESHOLD;

    tracing::debug!(
        file = %path.display(),
        size,
        mmap = is_large,
        "Reading log file"
    );

    let content = if is_large {
        read_mapped(path)?
    } else {
        let bytes = read_with_retry(path)?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(content)
}

/// Decode a memory-mapped file without first copying the raw bytes.
fn read_mapped(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    // SAFETY: the map is read-only and dropped before returning. A log being
    // truncated underneath us can fault; that risk is accepted for files that
    // are normally already rotated or append-only.
    let mmap = unsafe { memmap2::Mmap::map(&file)? };
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}

fn read_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    let mut last_err: Option<io::Error> = None;

    for (attempt, delay) in RETRY_DELAYS_MS.iter().enumerate() {
        match std::fs::read(path) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(*delay));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Create (or truncate) an output file wrapped in a buffered writer.
pub fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new)
}

/// Write a rendered document to `path` in one go.
pub fn write_text(path: &Path, content: &str) -> io::Result<()> {
    let mut writer = create_output(path)?;
    writer.write_all(content.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_log_lossy_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, b"ok line\nbad \xff byte\n").unwrap();

        let content = read_log_lossy(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "ok line");
        assert!(lines[1].contains('\u{fffd}'));
    }

    #[test]
    fn test_read_mapped_matches_buffered_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, "Feb  6 08:11:01 h sshd[1]: x\n").unwrap();
        assert_eq!(read_mapped(&path).unwrap(), read_log_lossy(&path).unwrap());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_log_lossy(Path::new("/nonexistent/auth.log")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_write_text_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        write_text(&path, "<p>hi</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }
}
