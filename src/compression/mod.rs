// taffy: Streaming, merging and random access for MAF/TAF multiple alignments.
//
// Copyright 2025 The taffy developers.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Line oriented input and output over plain, gzip and BGZF streams.
//!
//! [LineReader] detects the compression of its input from the leading magic
//! bytes and exposes the stream as lines with one line of lookahead. Plain
//! and BGZF input support random access: [tell](LineReader::tell) returns a
//! byte offset (plain) or a BGZF virtual position (compressed) that can be
//! passed back to [seek](LineReader::seek). Plain gzip input can only be
//! read forward.
//!
//! [LineWriter] writes plain text or BGZF compressed output.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::compression::{LineReader, LineWriter};
//! use std::io::{Cursor, Write};
//!
//! let mut writer = LineWriter::new(Vec::new(), true);
//! writer.write_all(b"#taf version:1\nACGT ;\n").unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = LineReader::new(Cursor::new(bytes)).unwrap();
//! assert!(reader.is_indexable());
//! assert_eq!(reader.next_line().unwrap().unwrap(), "#taf version:1");
//!
//! let offset = reader.tell();
//! assert_eq!(reader.next_line().unwrap().unwrap(), "ACGT ;");
//! reader.seek(offset).unwrap();
//! assert_eq!(reader.peek_line().unwrap().unwrap(), "ACGT ;");
//! ```
//!
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

use flate2::read::MultiGzDecoder;
use noodles_bgzf::VirtualPosition;

/// Compression of an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bgzf,
}

/// Guess the compression from the first bytes of a stream.
///
/// BGZF is gzip with a `BC` extra subfield in the member header.
pub fn guess_compression(
    bytes: &[u8],
) -> Compression {
    if bytes.len() < 3 || bytes[0] != 0x1f || bytes[1] != 0x8b || bytes[2] != 0x08 {
        return Compression::None
    }
    let has_extra = bytes.len() >= 4 && bytes[3] & 0x04 != 0;
    if has_extra && bytes.len() >= 14 {
        let xlen = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
        if xlen >= 6 && bytes[12] == b'B' && bytes[13] == b'C' {
            return Compression::Bgzf
        }
    }
    Compression::Gzip
}

enum Stream<R: Read> {
    Plain(BufReader<R>),
    Gzip(BufReader<MultiGzDecoder<BufReader<R>>>),
    Bgzf(noodles_bgzf::Reader<BufReader<R>>),
}

/// Reads lines with one line of lookahead.
pub struct LineReader<R: Read> {
    stream: Stream<R>,
    // Uncompressed bytes consumed so far, unused for BGZF
    offset: u64,
    // Peeked line and the position of its first byte
    peeked: Option<(u64, String)>,
    buf: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    /// Wraps `conn`, detecting gzip or BGZF compression.
    pub fn new(
        conn: R,
    ) -> std::io::Result<Self> {
        let mut inner = BufReader::new(conn);
        let compression = guess_compression(inner.fill_buf()?);
        let stream = match compression {
            Compression::None => Stream::Plain(inner),
            Compression::Gzip => Stream::Gzip(BufReader::new(MultiGzDecoder::new(inner))),
            Compression::Bgzf => Stream::Bgzf(noodles_bgzf::Reader::new(inner)),
        };
        Ok(LineReader { stream, offset: 0, peeked: None, buf: Vec::new() })
    }

    pub fn compression(&self) -> Compression {
        match self.stream {
            Stream::Plain(_) => Compression::None,
            Stream::Gzip(_) => Compression::Gzip,
            Stream::Bgzf(_) => Compression::Bgzf,
        }
    }

    /// True if positions from [tell](Self::tell) can be used to seek.
    pub fn is_indexable(&self) -> bool {
        self.compression() != Compression::Gzip
    }

    fn stream_position(&self) -> u64 {
        match &self.stream {
            Stream::Bgzf(reader) => u64::from(reader.virtual_position()),
            _ => self.offset,
        }
    }

    fn read_line(&mut self) -> std::io::Result<Option<(u64, String)>> {
        let position = self.stream_position();
        self.buf.clear();
        let n = match &mut self.stream {
            Stream::Plain(reader) => reader.read_until(b'\n', &mut self.buf)?,
            Stream::Gzip(reader) => reader.read_until(b'\n', &mut self.buf)?,
            Stream::Bgzf(reader) => reader.read_until(b'\n', &mut self.buf)?,
        };
        if n == 0 {
            return Ok(None)
        }
        self.offset += n as u64;

        while self.buf.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
            self.buf.pop();
        }
        let line = std::str::from_utf8(&self.buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Some((position, line.to_string())))
    }

    /// Returns the next line without consuming it.
    pub fn peek_line(&mut self) -> std::io::Result<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.read_line()?;
        }
        Ok(self.peeked.as_ref().map(|(_, line)| line.as_str()))
    }

    /// Consumes and returns the next line, without the line terminator.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self.peeked.take() {
            Some((_, line)) => Ok(Some(line)),
            None => Ok(self.read_line()?.map(|(_, line)| line)),
        }
    }

    /// Position of the first byte of the next unconsumed line.
    pub fn tell(&self) -> u64 {
        match &self.peeked {
            Some((position, _)) => *position,
            None => self.stream_position(),
        }
    }
}

impl<R: Read + Seek> LineReader<R> {
    /// Moves to a position previously returned by [tell](Self::tell).
    pub fn seek(
        &mut self,
        position: u64,
    ) -> std::io::Result<()> {
        self.peeked = None;
        match &mut self.stream {
            Stream::Plain(reader) => {
                reader.seek(SeekFrom::Start(position))?;
                self.offset = position;
            },
            Stream::Bgzf(reader) => {
                reader.seek(VirtualPosition::from(position))?;
            },
            Stream::Gzip(_) => {
                return Err(std::io::Error::new(std::io::ErrorKind::Unsupported,
                                               "cannot seek in gzip compressed input, use bgzip"))
            },
        }
        Ok(())
    }
}

/// Writes plain or BGZF compressed output.
pub enum LineWriter<W: Write> {
    Plain(BufWriter<W>),
    Bgzf(noodles_bgzf::Writer<W>),
}

impl<W: Write> LineWriter<W> {
    pub fn new(
        conn: W,
        compress: bool,
    ) -> Self {
        if compress {
            LineWriter::Bgzf(noodles_bgzf::Writer::new(conn))
        } else {
            LineWriter::Plain(BufWriter::new(conn))
        }
    }

    /// Flushes remaining data, writes the BGZF end-of-file marker if
    /// compressing, and returns the inner writer.
    pub fn finish(self) -> std::io::Result<W> {
        match self {
            LineWriter::Plain(writer) => writer.into_inner().map_err(|e| e.into_error()),
            LineWriter::Bgzf(writer) => writer.finish(),
        }
    }
}

impl<W: Write> Write for LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            LineWriter::Plain(writer) => writer.write(buf),
            LineWriter::Bgzf(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            LineWriter::Plain(writer) => writer.flush(),
            LineWriter::Bgzf(writer) => writer.flush(),
        }
    }
}
