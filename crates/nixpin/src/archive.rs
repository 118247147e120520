//! Source archive inspection
//!
//! Reads a single member out of a `.tar.gz` stream without unpacking the
//! archive to disk.

use flate2::read::GzDecoder;
use std::io::Read;
use tar::Archive;
use thiserror::Error;

/// Maximum size of an extracted member (1 MB)
pub const MAX_MEMBER_SIZE: u64 = 1024 * 1024;

/// Errors that can occur while inspecting an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The gzip or tar framing is invalid, or the stream failed mid-read
    #[error("Corrupt archive stream: {0}")]
    StreamCorrupt(#[from] std::io::Error),

    /// The archive was read to the end without a matching member
    #[error("No member matching {0:?} in archive")]
    MemberNotFound(String),

    /// The matching member exceeds the size limit
    #[error("Archive member {path} too large: {size} bytes (max: {max})")]
    MemberTooLarge { path: String, size: u64, max: u64 },
}

/// Whether a tar entry path names `file_name`, either bare or below an
/// arbitrary top-level directory (`pkg-1.0/pyproject.toml`)
fn matches_member(path: &str, file_name: &str) -> bool {
    path == file_name
        || path
            .strip_suffix(file_name)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

/// Extract the first member whose path ends with `member_suffix`
///
/// `member_suffix` may be given as `pyproject.toml` or `/pyproject.toml`.
/// The scan stops at the first match; nested copies later in the archive
/// are never looked at.
pub fn extract_member<R: Read>(
    reader: R,
    member_suffix: &str,
    max_size: u64,
) -> Result<Vec<u8>, ArchiveError> {
    let file_name = member_suffix.trim_start_matches('/');
    let mut archive = Archive::new(GzDecoder::new(reader));

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.to_string_lossy().into_owned();
        if !matches_member(&path, file_name) {
            continue;
        }

        let size = entry.size();
        if size > max_size {
            return Err(ArchiveError::MemberTooLarge {
                path,
                size,
                max: max_size,
            });
        }

        let mut content = Vec::with_capacity(size as usize);
        entry.take(max_size).read_to_end(&mut content)?;
        return Ok(content);
    }

    Err(ArchiveError::MemberNotFound(file_name.to_string()))
}
