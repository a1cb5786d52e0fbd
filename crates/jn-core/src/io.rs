//! Streaming I/O substrate (§4.A). A line reader and a record writer, both
//! unbuffered beyond their own internal buffer — back-pressure comes from
//! the OS pipe (§5), not from anything in this module.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use crate::error::CoreError;
use crate::value::Record;

pub const DEFAULT_INPUT_BUFFER: usize = 64 * 1024;
pub const DEFAULT_OUTPUT_BUFFER: usize = 8 * 1024;

/// Buffered, line-oriented reader over NDJSON (or raw bytes, for
/// protocol/compression stages that don't care about line boundaries).
pub struct LineReader<R> {
    inner: BufReader<R>,
    /// Scratch buffer reused across calls so steady-state allocation is
    /// bounded by the largest single line seen so far, not by the stream
    /// length. This is the per-record "arena" of §3/§9: a bump region that
    /// is reset, not freed, between records.
    scratch: Vec<u8>,
    pub malformed_lines: u64,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_INPUT_BUFFER)
    }

    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        LineReader {
            inner: BufReader::with_capacity(capacity, inner),
            scratch: Vec::new(),
            malformed_lines: 0,
        }
    }

    /// Read one line (without its trailing `\n`), or `None` at EOF.
    pub fn read_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.scratch.clear();
        let n = self.inner.read_until(b'\n', &mut self.scratch)?;
        if n == 0 {
            return Ok(None);
        }
        if self.scratch.last() == Some(&b'\n') {
            self.scratch.pop();
            if self.scratch.last() == Some(&b'\r') {
                self.scratch.pop();
            }
        }
        Ok(Some(&self.scratch))
    }

    /// Read and parse one NDJSON record. Malformed lines are skipped and
    /// counted unless `strict`, in which case the first malformed line is
    /// fatal (§4.A failure semantics).
    pub fn read_record(&mut self, strict: bool) -> Result<Option<Record>, CoreError> {
        loop {
            let line = match self.read_line()? {
                Some(l) => l,
                None => return Ok(None),
            };
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            match serde_json::from_slice::<Record>(line) {
                Ok(v) => return Ok(Some(v)),
                Err(e) => {
                    if strict {
                        return Err(CoreError::Format(format!(
                            "malformed NDJSON line: {e}"
                        )));
                    }
                    self.malformed_lines += 1;
                    continue;
                }
            }
        }
    }
}

/// Buffered NDJSON writer. Flushes explicitly at clean exit points rather
/// than per record, so a large run amortizes the syscall cost; a
/// broken-pipe write error is not retried.
pub struct RecordWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, DEFAULT_OUTPUT_BUFFER)
    }

    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        RecordWriter {
            inner: BufWriter::with_capacity(capacity, inner),
        }
    }

    /// Serialize `record` as one compact JSON value terminated by `\n`.
    pub fn write_record(&mut self, record: &Record) -> Result<(), CoreError> {
        serde_json::to_writer(&mut self.inner, record)
            .map_err(|e| CoreError::Format(e.to_string()))?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CoreError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Exit code used when a write fails because the reader downstream has
/// gone away (§4.A, §5, §7). Matches the conventional
/// killed-by-SIGPIPE status on Unix-like systems.
pub const SIGPIPE_EXIT_CODE: i32 = 141;
