//! Fixed-capacity output buffer for rendered payloads.
//!
//! Every request renders into its own `RenderBuffer`. A write that does not
//! fit is rejected as a whole, so the buffer never holds a half-written token.

use std::{fmt, io};

use thiserror::Error;

/// Capacity of a page render in bytes.
pub const PAGE_BUFFER_SIZE: usize = 12000;

/// Errors that can occur while rendering a payload.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The rendered output does not fit the buffer.
    #[error("Rendered payload exceeds buffer capacity of {capacity} bytes")]
    BufferOverflow { capacity: usize },

    /// JSON serialization failed.
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Raw bytes written through `io::Write` were not UTF-8.
    #[error("Rendered payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Bounded byte buffer implementing both `io::Write` and `fmt::Write`.
#[derive(Debug)]
pub struct RenderBuffer {
    data: Vec<u8>,
    capacity: usize,
    overflowed: bool,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(PAGE_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.min(PAGE_BUFFER_SIZE)),
            capacity,
            overflowed: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// True once any write has been rejected.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Append `bytes` if they fit entirely.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
        if self.overflowed || bytes.len() > self.remaining() {
            self.overflowed = true;
            return Err(self.overflow());
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn push_str(&mut self, text: &str) -> Result<(), RenderError> {
        self.push_bytes(text.as_bytes())
    }

    /// Finish the render, handing back the text.
    pub fn into_string(self) -> Result<String, RenderError> {
        if self.overflowed {
            return Err(self.overflow());
        }
        Ok(String::from_utf8(self.data)?)
    }

    fn overflow(&self) -> RenderError {
        RenderError::BufferOverflow {
            capacity: self.capacity,
        }
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for RenderBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push_bytes(buf)
            .map(|()| buf.len())
            .map_err(|e| io::Error::new(io::ErrorKind::WriteZero, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for RenderBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s).map_err(|_| fmt::Error)
    }
}

/// Serialize `value` as JSON into a fresh buffer of `capacity` bytes.
pub fn render_json<T: serde::Serialize + ?Sized>(
    value: &T,
    capacity: usize,
) -> Result<String, RenderError> {
    let mut buffer = RenderBuffer::with_capacity(capacity);
    match serde_json::to_writer(&mut buffer, value) {
        Ok(()) => buffer.into_string(),
        Err(_) if buffer.overflowed() => Err(buffer.overflow()),
        Err(e) => Err(RenderError::Serialize(e)),
    }
}
