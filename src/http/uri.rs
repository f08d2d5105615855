//! Request-target helpers: path/query split, percent-decoding, query parameters.

use crate::buffer::Token;
use crate::error::Error;
use crate::table::FieldTable;

/// Splits a request target into its path and query, dropping any fragment.
pub fn split(uri: &[u8]) -> (&[u8], Option<&[u8]>) {
    let uri = match memchr::memchr(b'#', uri) {
        Some(pos) => &uri[..pos],
        None => uri,
    };
    match memchr::memchr(b'?', uri) {
        Some(pos) => (&uri[..pos], Some(&uri[pos + 1..])),
        None => (uri, None),
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decodes `%XX` escapes. Returns `None` on a truncated or non-hex escape.
///
/// ```
/// # use forkhttp::http::uri::percent_decode;
/// assert_eq!(percent_decode(b"/a%20b").unwrap(), b"/a b");
/// assert_eq!(percent_decode(b"/100%"), None);
/// ```
pub fn percent_decode(input: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.iter();

    while let Some(&b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hi = hex_value(*bytes.next()?)?;
        let lo = hex_value(*bytes.next()?)?;
        out.push(hi << 4 | lo);
    }
    Some(out)
}

/// Parses an `application/x-www-form-urlencoded` query into a field table.
pub fn query_params(query: &[u8]) -> Result<FieldTable, Error> {
    let mut table = FieldTable::new()?;
    for (key, value) in url::form_urlencoded::parse(query) {
        let key = Token::copy_from(key.as_bytes())?;
        let value = Token::copy_from(value.as_bytes())?;
        table.add(key, value);
    }
    Ok(table)
}
