//! Byte-based progress tracking for the scan pass.
//!
//! The scanner consumes an opaque `Read`, so progress is measured by wrapping
//! the raw file handle before any decompression. Positions then line up with
//! the on-disk file size even for compressed dumps.

use std::io::Read;

/// A reader wrapper that reports cumulative bytes read to a callback.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: Box<dyn Fn(u64)>,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    /// Wrap `reader`; `callback` receives the running byte total after
    /// each successful read.
    pub fn new<F>(reader: R, callback: F) -> Self
    where
        F: Fn(u64) + 'static,
    {
        Self {
            reader,
            callback: Box::new(callback),
            bytes_read: 0,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}
