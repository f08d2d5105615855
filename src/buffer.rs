//! Growable byte accumulation for request tokens, raw request bytes and bodies.
//!
//! A [`ByteBuffer`] is filled through fallible appends and then consumed by
//! [`ByteBuffer::finalize`], which produces an immutable [`Token`]. Finalizing
//! takes the buffer by value, so a fresh buffer has to be created for the
//! next token.

use std::ffi::CStr;
use std::fmt;
use std::str::Utf8Error;

use bytes::Bytes;

use crate::error::Error;

/// Initial capacity of a new buffer, and the granularity of bulk growth.
pub const DEFAULT_CAPACITY: usize = 32;

/// Append-only byte sequence with explicit, fallible growth.
///
/// `capacity` tracks the logical capacity: it doubles when a single-byte
/// append overflows and jumps straight to the required size on bulk appends.
pub struct ByteBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl ByteBuffer {
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)?;
        Ok(Self { data, capacity })
    }

    /// Creates a buffer already holding `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let mut buf = Self::new()?;
        buf.append_slice(bytes)?;
        Ok(buf)
    }

    /// Appends one byte, doubling the capacity when the buffer is full.
    pub fn append(&mut self, byte: u8) -> Result<(), Error> {
        if self.data.len() == self.capacity {
            self.grow_to((self.capacity * 2).max(1))?;
        }
        self.data.push(byte);
        Ok(())
    }

    /// Appends `bytes`, growing at most once.
    pub fn append_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let required = self.data.len() + bytes.len();
        if required > self.capacity {
            let target = (self.capacity * 2).max(required);
            self.grow_to(target.next_multiple_of(DEFAULT_CAPACITY))?;
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn grow_to(&mut self, capacity: usize) -> Result<(), Error> {
        self.data.try_reserve_exact(capacity - self.data.len())?;
        self.capacity = capacity;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Shortens the buffer to `len` bytes. Has no effect if `len` is not smaller.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Appends the NUL terminator and hands the contents over as a [`Token`].
    pub fn finalize(mut self) -> Result<Token, Error> {
        self.append(0)?;
        Ok(Token(Bytes::from(self.data)))
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Owned, immutable, NUL-terminated byte string produced by a finalized buffer.
///
/// Cloning is cheap: clones share the same allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(Bytes);

impl Token {
    /// Builds a token directly from `bytes`.
    pub fn copy_from(bytes: &[u8]) -> Result<Self, Error> {
        ByteBuffer::from_slice(bytes)?.finalize()
    }

    /// Contents without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..self.0.len() - 1]
    }

    /// Contents including the trailing NUL.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.0
    }

    /// Borrows the token as a C string. `None` if it contains an interior NUL.
    pub fn as_c_str(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(&self.0).ok()
    }

    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq<[u8]> for Token {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}
