//! Handler output values and the response sinks they are written to.
//!
//! After a handler returns successfully its [`Output`] is written with the
//! following precedence:
//!
//! 1. [`Output::Empty`] writes nothing
//! 2. if the sink offers a [`DataWriter`], the output is handed to it
//! 3. [`Output::Bytes`] is written verbatim
//! 4. [`Output::Text`] is written as UTF-8
//! 5. [`Output::Json`] is formatted as JSON text and written

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::error::{RouteError, RouteResult};

/// Value produced by a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Output {
    /// Nothing to write
    #[default]
    Empty,
    /// Raw bytes
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Structured value
    Json(serde_json::Value),
}

impl Output {
    /// Serialize any value into [`Output::Json`].
    pub fn json(value: impl Serialize) -> RouteResult<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Returns true if nothing would be written.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Byte form written to a sink without a [`DataWriter`].
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Empty => Vec::new(),
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }
}

impl From<()> for Output {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Output {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Output {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<serde_json::Value> for Output {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<Output>> From<Option<T>> for Output {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Typed-data capability of a response sink.
///
/// A sink exposing this capability receives every non-empty output as is,
/// instead of its byte form.
pub trait DataWriter {
    /// Write one output value, returning the number of bytes produced.
    fn write_data(&mut self, output: &Output) -> RouteResult<usize>;
}

/// Destination of handler output for one request.
pub trait ResponseWriter {
    /// Write raw bytes.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Typed-data capability, if the sink has one.
    fn data_writer(&mut self) -> Option<&mut dyn DataWriter> {
        None
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn data_writer(&mut self) -> Option<&mut dyn DataWriter> {
        (**self).data_writer()
    }
}

impl ResponseWriter for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Discards everything written to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl ResponseWriter for Discard {
    fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }
}

/// Shared in-memory byte sink.
///
/// Clones share the same buffer, so a caller can keep one handle while the
/// dispatch owns the other.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the bytes written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Bytes written so far, lossily decoded as UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A poisoned buffer still holds every completed write.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResponseWriter for ResponseBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.lock().extend_from_slice(bytes);
        Ok(())
    }
}

/// Sink that writes every output as one JSON document per line.
///
/// Text becomes a JSON string, bytes become an array of numbers and JSON
/// values are written unchanged.
#[derive(Debug, Clone, Default)]
pub struct JsonResponse {
    buffer: ResponseBuffer,
}

impl JsonResponse {
    /// Create a JSON sink writing into `buffer`.
    pub fn new(buffer: ResponseBuffer) -> Self {
        Self { buffer }
    }

    /// Handle to the underlying buffer.
    pub fn buffer(&self) -> &ResponseBuffer {
        &self.buffer
    }

    /// Parse every document written so far.
    pub fn documents(&self) -> RouteResult<Vec<serde_json::Value>> {
        self.buffer
            .text()
            .lines()
            .map(|line| serde_json::from_str(line).map_err(RouteError::from))
            .collect()
    }
}

impl ResponseWriter for JsonResponse {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buffer.write(bytes)
    }

    fn data_writer(&mut self) -> Option<&mut dyn DataWriter> {
        Some(self)
    }
}

impl DataWriter for JsonResponse {
    fn write_data(&mut self, output: &Output) -> RouteResult<usize> {
        let mut document = match output {
            Output::Empty => return Ok(0),
            Output::Bytes(bytes) => serde_json::to_vec(bytes)?,
            Output::Text(text) => serde_json::to_vec(text)?,
            Output::Json(value) => serde_json::to_vec(value)?,
        };
        document.push(b'\n');
        self.buffer.write(&document)?;
        Ok(document.len())
    }
}
