//! Statement scanner: splits raw SQL input into statement spans.
//!
//! A span is either a single `--` comment line or everything up to and
//! including the next `;` that sits outside single-quoted strings and
//! parentheses. The scanner works on raw bytes through a fixed-size read
//! buffer, so arbitrarily large dumps stream without rebuffering.

use std::io::{BufRead, BufReader, Read};
use thiserror::Error;

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

/// Pick a read buffer size from the input file size
pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unterminated string literal at end of input")]
    UnterminatedString,
    #[error("unterminated statement at end of input")]
    UnterminatedStatement,
}

pub struct Scanner<R: Read> {
    reader: BufReader<R>,
    span_buffer: Vec<u8>,
}

impl<R: Read> Scanner<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            span_buffer: Vec::with_capacity(32 * 1024),
        }
    }

    /// Read the next statement span, or None at clean end of input.
    ///
    /// Leading whitespace is dropped. A span beginning with `--` runs to
    /// the end of its line (the newline is consumed but not included);
    /// any other span runs through its terminating `;`. An input that
    /// ends mid-statement or mid-string is a hard error, never a
    /// truncated span.
    pub fn read_span(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        self.span_buffer.clear();

        let mut started = false;
        let mut dash_pending = false;
        let mut in_comment = false;
        let mut in_string = false;
        let mut depth = 0usize;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if !started {
                    return Ok(None);
                }
                if in_comment {
                    // A trailing comment line needs no newline
                    let span = std::mem::take(&mut self.span_buffer);
                    return Ok(Some(span));
                }
                if in_string {
                    return Err(ScanError::UnterminatedString);
                }
                return Err(ScanError::UnterminatedStatement);
            }

            let mut copy_from = 0;
            let mut end = None;

            for (i, &b) in buf.iter().enumerate() {
                if !started {
                    if b.is_ascii_whitespace() {
                        copy_from = i + 1;
                        continue;
                    }
                    started = true;
                    if b == b'-' {
                        dash_pending = true;
                        continue;
                    }
                } else if dash_pending {
                    // A lone leading dash turned out not to open a comment;
                    // reprocess this byte as ordinary statement content.
                    dash_pending = false;
                    if b == b'-' {
                        in_comment = true;
                        continue;
                    }
                }

                if in_comment {
                    if b == b'\n' {
                        self.span_buffer.extend_from_slice(&buf[copy_from..i]);
                        end = Some(i + 1);
                        break;
                    }
                    continue;
                }

                if in_string {
                    if b == b'\'' {
                        in_string = false;
                    }
                    continue;
                }

                match b {
                    b'\'' => in_string = true,
                    b'(' => depth += 1,
                    b')' => depth = depth.saturating_sub(1),
                    b';' if depth == 0 => {
                        self.span_buffer.extend_from_slice(&buf[copy_from..=i]);
                        end = Some(i + 1);
                        break;
                    }
                    _ => {}
                }
            }

            if let Some(consumed) = end {
                self.reader.consume(consumed);
                let span = std::mem::take(&mut self.span_buffer);
                return Ok(Some(span));
            }

            self.span_buffer.extend_from_slice(&buf[copy_from..]);
            let len = buf.len();
            self.reader.consume(len);
        }
    }
}
