//! Detection of the blank line that separates the header block from the body.

use memchr::memmem;

pub const MARKER: &[u8; 4] = b"\r\n\r\n";

/// Looks for [`MARKER`] in the part of `buf` that can contain a new match.
///
/// `read_offset` is the length `buf` had before the most recent read. Bytes
/// before that were already scanned, so the window starts three bytes earlier
/// to catch a marker split across two reads. Returns the offset just past the
/// marker, which is where the body begins.
///
/// The window is searched front to back, so the first marker in it wins even
/// when the body read along with the head contains a blank line of its own.
pub fn scan(buf: &[u8], read_offset: usize) -> Option<usize> {
    let start = read_offset.min(buf.len()).saturating_sub(MARKER.len() - 1);
    memmem::find(&buf[start..], MARKER).map(|pos| start + pos + MARKER.len())
}
