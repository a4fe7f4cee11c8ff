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

//! Block index for random access to MAF and TAF files.
//!
//! A [Tai] index records the file offset of alignment blocks every
//! `index_block_size` bases along each reference contig. For TAF only lines
//! that give coordinates for every row can be indexed, since decoding has to
//! resume there without the previous block. Offsets are byte offsets into
//! plain text or BGZF virtual positions, so gzip compressed files can not be
//! indexed.
//!
//! The index is stored next to the alignment (see [tai_path]) as text with
//! one `contig<TAB>position<TAB>offset` line per entry. Repeated contigs are
//! written relative to the previous entry as `*<TAB>position<TAB>offset`.
//!
//! Queries with [Tai::query] return the blocks overlapping a [Region],
//! with the first and last block clipped to the region on the reference row.
//!
//! ## Usage
//!
//! ```rust
//! use taffy::index::{parse_region, Tai};
//! use taffy::parser::AlignmentReader;
//! use std::io::Cursor;
//!
//! let data = b"#taf version:1\nAC ; i 0 hg38.chr1 0 + 100 i 1 mm10.chr1 5 + 50\nGG\nTT ;\n".to_vec();
//! let mut reader = AlignmentReader::new(Cursor::new(data)).unwrap();
//! let tai = Tai::build(&mut reader, 10_000).unwrap();
//!
//! let region = parse_region("hg38.chr1:1-3").unwrap();
//! let blocks: Vec<_> = tai.query(&mut reader, &region).unwrap().map(|block| block.unwrap()).collect();
//!
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(blocks[0].rows[0].start, 1);
//! assert_eq!(blocks[0].rows[0].bases, "G");
//! assert_eq!(blocks[0].rows[1].start, 6);
//! assert_eq!(blocks[1].rows[0].bases, "T");
//! ```
//!
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use indexmap::IndexMap;

use crate::Format;
use crate::alignment::{count_bases, Alignment};
use crate::error::{Result, TafError};
use crate::parser::AlignmentReader;
use crate::parser::taf::parse_column_line;

/// Default distance in reference bases between index entries.
pub const DEFAULT_INDEX_BLOCK_SIZE: i64 = 10_000;

/// Position of an indexed block on its reference contig and its offset in
/// the alignment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaiEntry {
    pub position: i64,
    pub offset: u64,
}

/// Path of the index belonging to the alignment at `path`.
pub fn tai_path<P: AsRef<Path>>(
    path: P,
) -> PathBuf {
    let mut path = path.as_ref().as_os_str().to_owned();
    path.push(".tai");
    PathBuf::from(path)
}

/// A half open interval `[start, start + length)` on a reference contig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub sequence_name: String,
    pub start: i64,
    // None extends the region to the end of the contig
    pub length: Option<i64>,
}

impl Region {
    pub fn new(
        sequence_name: &str,
        start: i64,
        length: Option<i64>,
    ) -> Self {
        Region { sequence_name: sequence_name.to_string(), start, length }
    }

    pub fn end(&self) -> i64 {
        self.length.map_or(i64::MAX, |length| self.start.saturating_add(length))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.length {
            Some(length) => write!(f, "{}:{}-{}", self.sequence_name, self.start, self.start + length),
            None => write!(f, "{}", self.sequence_name),
        }
    }
}

fn parse_position(
    token: &str,
) -> Option<i64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None
    }
    token.parse::<i64>().ok()
}

/// Parses `contig`, `contig:start` or `contig:start-end`.
///
/// A bare contig covers the whole contig and `contig:start` covers a single
/// base. Positions that are not numbers give a parse error and an end that
/// is not after start gives a range error.
pub fn parse_region(
    region: &str,
) -> Result<Region> {
    let Some((name, range)) = region.rsplit_once(':') else {
        return Ok(Region::new(region, 0, None))
    };
    let invalid = || TafError::Parse(format!("invalid region '{}'", region));
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start, end),
        None => (range, ""),
    };
    let start = parse_position(start).ok_or_else(invalid)?;
    let length = if end.is_empty() {
        1
    } else {
        let end = parse_position(end).ok_or_else(invalid)?;
        if end <= start {
            return Err(TafError::Range(format!("region '{}' ends at or before its start", region)))
        }
        end - start
    };
    Ok(Region::new(name, start, Some(length)))
}

/// In-memory `.tai` index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tai {
    index_block_size: i64,
    // Entries of each contig sorted by position
    contigs: IndexMap<String, Vec<TaiEntry>>,
}

impl Default for Tai {
    fn default() -> Self {
        Tai { index_block_size: DEFAULT_INDEX_BLOCK_SIZE, contigs: IndexMap::new() }
    }
}

impl Tai {
    pub fn new(
        index_block_size: i64,
    ) -> Self {
        Tai { index_block_size, contigs: IndexMap::new() }
    }

    /// Indexes the blocks remaining in `reader`.
    ///
    /// `reader` should be freshly opened; it is consumed to the end.
    pub fn build<R: Read>(
        reader: &mut AlignmentReader<R>,
        index_block_size: i64,
    ) -> Result<Tai> {
        if !reader.is_indexable() {
            return Err(TafError::Precondition("gzip compressed input can not be indexed, compress with bgzip instead".to_string()))
        }
        let started = Instant::now();
        let mut tai = Tai::new(index_block_size);
        let mut last: Option<(String, i64)> = None;

        match reader.format() {
            Format::Taf => {
                let run_length_encode_bases = reader.run_length_encode_bases();
                let lines = reader.lines();
                loop {
                    let offset = lines.tell();
                    let Some(line) = lines.next_line()? else { break };
                    if !line.contains(';') || line.trim_start().starts_with('#') {
                        continue
                    }
                    let column = parse_column_line(&line, run_length_encode_bases)?;
                    if let Some(anchor) = column.anchor() {
                        tai.record(&mut last, &anchor.sequence_name, anchor.start, anchor.strand, offset)?;
                    }
                }
            },
            Format::Maf => {
                loop {
                    let offset = reader.tell();
                    let Some(block) = reader.read_block()? else { break };
                    if let Some(row) = block.reference_row() {
                        tai.record(&mut last, &row.sequence_name, row.start, row.strand, offset)?;
                    }
                }
            },
        }

        log::info!("Indexed {} blocks on {} contigs in {:.2?}", tai.len(), tai.contigs.len(), started.elapsed());
        Ok(tai)
    }

    fn record(
        &mut self,
        last: &mut Option<(String, i64)>,
        sequence_name: &str,
        position: i64,
        strand: bool,
        offset: u64,
    ) -> Result<()> {
        if !strand {
            return Err(TafError::Precondition(format!(
                "reference row {}:{} is on the negative strand", sequence_name, position)))
        }
        let is_new = match last {
            Some((name, previous)) => name != sequence_name || position - *previous >= self.index_block_size,
            None => true,
        };
        if is_new {
            self.insert(sequence_name, TaiEntry { position, offset });
            *last = Some((sequence_name.to_string(), position));
        }
        Ok(())
    }

    fn insert(
        &mut self,
        sequence_name: &str,
        entry: TaiEntry,
    ) {
        let entries = self.contigs.entry(sequence_name.to_string()).or_default();
        let idx = entries.partition_point(|x| x.position <= entry.position);
        entries.insert(idx, entry);
    }

    pub fn index_block_size(&self) -> i64 {
        self.index_block_size
    }

    /// Indexed contigs in the order they were first seen.
    pub fn contigs(&self) -> impl Iterator<Item = &str> {
        self.contigs.keys().map(|name| name.as_str())
    }

    pub fn entries(
        &self,
        sequence_name: &str,
    ) -> Option<&[TaiEntry]> {
        self.contigs.get(sequence_name).map(|entries| entries.as_slice())
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.contigs.values().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the index in `.tai` format.
    pub fn write<W: Write>(
        &self,
        conn: &mut W,
    ) -> Result<()> {
        writeln!(conn, "#index_block_size {}", self.index_block_size)?;
        for (name, entries) in self.contigs.iter() {
            let mut previous: Option<&TaiEntry> = None;
            for entry in entries.iter() {
                match previous {
                    Some(previous) => writeln!(conn, "*\t{}\t{}",
                                               entry.position - previous.position,
                                               entry.offset as i64 - previous.offset as i64)?,
                    None => writeln!(conn, "{}\t{}\t{}", name, entry.position, entry.offset)?,
                }
                previous = Some(entry);
            }
        }
        Ok(())
    }

    /// Reads an index written by [write](Self::write).
    ///
    /// Lines without three columns are skipped with a warning.
    pub fn read<R: BufRead>(
        conn: R,
    ) -> Result<Tai> {
        let mut tai = Tai::default();
        let mut last: Option<(String, TaiEntry)> = None;
        for line in conn.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue
            }
            if let Some(comment) = line.strip_prefix('#') {
                let mut tokens = comment.split_whitespace();
                if tokens.next() == Some("index_block_size") {
                    tai.index_block_size = parse_index_field(tokens.next(), &line)?;
                }
                continue
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                log::warn!("Skipping .tai line '{}' that does not have 3 columns", line);
                continue
            }
            let position = parse_index_field(Some(fields[1]), &line)?;
            let offset = parse_index_field(Some(fields[2]), &line)?;
            let (name, entry) = if fields[0] == "*" {
                let (name, previous) = last.as_ref().ok_or_else(|| {
                    TafError::Parse(format!(".tai line '{}' is relative to a missing previous line", line))
                })?;
                (name.clone(), TaiEntry { position: previous.position + position, offset: (previous.offset as i64 + offset) as u64 })
            } else {
                (fields[0].to_string(), TaiEntry { position, offset: offset as u64 })
            };
            tai.insert(&name, entry);
            last = Some((name, entry));
        }
        Ok(tai)
    }

    /// Offset to start scanning from for `region`, and the offset from
    /// which no block can overlap it.
    fn locate(
        &self,
        region: &Region,
    ) -> Option<(u64, Option<u64>)> {
        let entries = self.contigs.get(&region.sequence_name)?;
        let idx = entries.partition_point(|entry| entry.position <= region.start);
        let first = entries.get(idx.saturating_sub(1))?;
        let end = region.end();
        let bound = entries.iter().find(|entry| entry.position >= end).map(|entry| entry.offset);
        Some((first.offset, bound))
    }

    /// Blocks overlapping `region`, clipped to it.
    ///
    /// A contig missing from the index gives no blocks.
    pub fn query<'a, R: Read + Seek>(
        &self,
        reader: &'a mut AlignmentReader<R>,
        region: &Region,
    ) -> Result<TaiIterator<'a, R>> {
        let query = Query::start(self, reader, region.clone())?;
        Ok(TaiIterator { reader, query })
    }

    /// Blocks overlapping each of `regions` in turn.
    pub fn query_regions<'a, R: Read + Seek>(
        &'a self,
        reader: &'a mut AlignmentReader<R>,
        regions: Vec<Region>,
    ) -> RegionIterator<'a, R> {
        RegionIterator { tai: self, reader, regions: regions.into_iter(), query: None, failed: false }
    }

    /// Lengths of the indexed contigs, read from their first block.
    pub fn sequence_lengths<R: Read + Seek>(
        &self,
        reader: &mut AlignmentReader<R>,
    ) -> Result<IndexMap<String, i64>> {
        let mut lengths: IndexMap<String, i64> = IndexMap::new();
        for (name, entries) in self.contigs.iter() {
            let Some(entry) = entries.first() else { continue };
            reader.seek(entry.offset)?;
            let block = reader.read_block()?.ok_or_else(|| {
                TafError::Range(format!("index entry of '{}' points past the end of the input", name))
            })?;
            let row = block.reference_row().filter(|row| row.sequence_name == *name).ok_or_else(|| {
                TafError::Parse(format!("index entry of '{}' does not point to a block on it", name))
            })?;
            lengths.insert(name.clone(), row.sequence_length);
        }
        Ok(lengths)
    }
}

fn parse_index_field(
    token: Option<&str>,
    line: &str,
) -> Result<i64> {
    token.and_then(|x| x.trim().parse::<i64>().ok())
         .ok_or_else(|| TafError::Parse(format!("invalid number in .tai line '{}'", line)))
}

/// Column after the `n`th non-gap base.
fn column_after_bases(
    bases: &[u8],
    n: i64,
) -> usize {
    let mut seen = 0;
    for (idx, base) in bases.iter().enumerate() {
        if *base != b'-' {
            seen += 1;
            if seen == n {
                return idx + 1
            }
        }
    }
    bases.len()
}

/// Column of the `n`th non-gap base counted from the end.
fn column_of_last_bases(
    bases: &[u8],
    n: i64,
) -> usize {
    let mut seen = 0;
    for (idx, base) in bases.iter().enumerate().rev() {
        if *base != b'-' {
            seen += 1;
            if seen == n {
                return idx
            }
        }
    }
    0
}

/// Clips `block` to `[start, end)` on its reference row.
///
/// Returns true if columns were removed from the right end.
fn clip_block(
    block: &mut Alignment,
    start: i64,
    end: i64,
) -> bool {
    let Some(reference) = block.reference_row() else { return false };

    let left_trim = start - reference.start;
    if left_trim > 0 {
        let cut = column_after_bases(reference.bases.as_bytes(), left_trim);
        for row in block.rows.iter_mut() {
            let removed = count_bases(&row.bases[..cut]);
            row.start += removed;
            row.length -= removed;
            row.bases.replace_range(..cut, "");
        }
        let n_tags = cut.min(block.column_tags.len());
        block.column_tags.drain(..n_tags);
        block.column_number -= cut;
    }

    let right_trim = block.rows[0].end() - end;
    if right_trim <= 0 {
        return false
    }
    let keep = column_of_last_bases(block.rows[0].bases.as_bytes(), right_trim);
    for row in block.rows.iter_mut() {
        row.length -= count_bases(&row.bases[keep..]);
        row.bases.truncate(keep);
    }
    block.column_tags.truncate(keep);
    block.column_number = keep;
    true
}

/// Clips `block` and drops the rows left without bases.
///
/// Returns the map from the old row indices to the kept ones.
fn clip_and_prune(
    block: &mut Alignment,
    start: i64,
    end: i64,
) -> (bool, Vec<Option<usize>>) {
    let had_bases: Vec<bool> = block.rows.iter().map(|row| row.length > 0).collect();
    let clipped_right = clip_block(block, start, end);
    let keep: Vec<bool> = block.rows.iter().zip(had_bases).map(|(row, had_bases)| !had_bases || row.length > 0).collect();
    (clipped_right, block.retain_rows(&keep))
}

// Scan state of one region
struct Query {
    region: Region,
    pending: Option<Alignment>,
    row_map: Option<Vec<Option<usize>>>,
    done: bool,
}

impl Query {
    fn start<R: Read + Seek>(
        tai: &Tai,
        reader: &mut AlignmentReader<R>,
        region: Region,
    ) -> Result<Query> {
        let mut query = Query { region, pending: None, row_map: None, done: true };
        if query.region.end() <= query.region.start {
            log::warn!("Region {} is empty", query.region);
            return Ok(query)
        }
        let Some((offset, bound)) = tai.locate(&query.region) else {
            log::warn!("Region {} is not in the index", query.region);
            return Ok(query)
        };

        let started = Instant::now();
        reader.seek(offset)?;
        let mut scanned = 0;
        // Without an end there is no bound and a region past the last block
        // of its contig is scanned to the end of the input
        loop {
            if bound.is_some_and(|bound| reader.tell() >= bound) {
                break
            }
            let Some(mut block) = reader.read_block()? else { break };
            scanned += 1;
            if query.overlaps(&block) {
                block.rows.iter_mut().for_each(|row| row.left_row = None);
                query.pending = Some(block);
                query.done = false;
                break
            }
        }
        log::info!("Scanned {} blocks to find the start of {} in {:.2?}", scanned, query.region, started.elapsed());
        Ok(query)
    }

    fn overlaps(
        &self,
        block: &Alignment,
    ) -> bool {
        block.reference_row().is_some_and(|row| {
            row.sequence_name == self.region.sequence_name
                && row.start < self.region.end()
                && row.end() > self.region.start
        })
    }

    fn continues(
        &self,
        block: &Alignment,
    ) -> bool {
        block.reference_row().is_some_and(|row| {
            row.sequence_name == self.region.sequence_name && row.start < self.region.end()
        })
    }

    fn next_block<R: Read>(
        &mut self,
        reader: &mut AlignmentReader<R>,
    ) -> Result<Option<Alignment>> {
        if self.done {
            return Ok(None)
        }
        let mut block = match self.pending.take() {
            Some(block) => block,
            None => match reader.read_block()? {
                Some(block) if self.continues(&block) => block,
                _ => {
                    self.done = true;
                    return Ok(None)
                },
            },
        };
        if let Some(row_map) = self.row_map.as_ref() {
            block.remap_left_rows(row_map);
        }
        let (clipped_right, row_map) = clip_and_prune(&mut block, self.region.start, self.region.end());
        self.row_map = Some(row_map);
        self.done = clipped_right;
        Ok(Some(block))
    }
}

/// Iterator over the blocks of one region, see [Tai::query].
pub struct TaiIterator<'a, R: Read + Seek> {
    reader: &'a mut AlignmentReader<R>,
    query: Query,
}

impl<R: Read + Seek> Iterator for TaiIterator<'_, R> {
    type Item = Result<Alignment>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment>> {
        match self.query.next_block(self.reader) {
            Ok(block) => block.map(Ok),
            Err(e) => {
                self.query.done = true;
                Some(Err(e))
            },
        }
    }
}

/// Iterator over the blocks of several regions, see [Tai::query_regions].
pub struct RegionIterator<'a, R: Read + Seek> {
    tai: &'a Tai,
    reader: &'a mut AlignmentReader<R>,
    regions: std::vec::IntoIter<Region>,
    query: Option<Query>,
    failed: bool,
}

impl<R: Read + Seek> Iterator for RegionIterator<'_, R> {
    type Item = Result<Alignment>;

    fn next(
        &mut self,
    ) -> Option<Result<Alignment>> {
        while !self.failed {
            if self.query.is_none() {
                let region = self.regions.next()?;
                match Query::start(self.tai, self.reader, region) {
                    Ok(query) => self.query = Some(query),
                    Err(e) => {
                        self.failed = true;
                        return Some(Err(e))
                    },
                }
            }
            let query = self.query.as_mut()?;
            match query.next_block(self.reader) {
                Ok(Some(block)) => return Some(Ok(block)),
                Ok(None) => self.query = None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e))
                },
            }
        }
        None
    }
}

// Tests
#[cfg(test)]
mod tests {

    // Two reference contigs, a row on every block and a row on every other block
    fn maf_text() -> String {
        let mut maf = String::from("##maf version=1\n\n");
        for i in 0..12 {
            maf += &format!("a\ns ref.chr1 {} 4 + 1000 AC-GT\ns other.chr2 {} 5 + 1000 ACTGT\n", 4 * i, 5 * i);
            if i % 2 == 0 {
                maf += &format!("s x.chr3 {} 2 - 500 A---C\n", 2 * i);
            }
            maf += "\n";
        }
        for i in 0..5 {
            maf += &format!("a\ns ref.chr2 {} 4 + 800 ACGT\ns other.chr2 {} 4 + 1000 ACGT\n\n", 4 * i, 100 + 4 * i);
        }
        maf
    }

    fn to_taf(maf: &str) -> Vec<u8> {
        use crate::Format;
        use crate::parser::AlignmentReader;
        use crate::printer::{AlignmentWriter, WriterOptions};

        let mut reader = AlignmentReader::new(maf.as_bytes()).unwrap();
        let options = WriterOptions { repeat_coordinates_every_n_columns: 20, ..Default::default() };
        let mut writer = AlignmentWriter::new(Vec::new(), Format::Taf, reader.header().clone(), options);
        while let Some(block) = reader.read_block().unwrap() {
            writer.write_block(&block).unwrap();
        }
        writer.finish().unwrap()
    }

    fn open(data: &[u8]) -> crate::parser::AlignmentReader<std::io::Cursor<Vec<u8>>> {
        crate::parser::AlignmentReader::new(std::io::Cursor::new(data.to_vec())).unwrap()
    }

    type Summary = Vec<(String, i64, i64, String)>;

    fn summarize(block: &crate::alignment::Alignment) -> Summary {
        block.rows.iter().map(|row| (row.sequence_name.clone(), row.start, row.length, row.bases.clone())).collect()
    }

    fn linear_scan(data: &[u8], region: &super::Region) -> Vec<Summary> {
        open(data).map(|block| block.unwrap())
            .filter(|block| {
                let row = &block.rows[0];
                row.sequence_name == region.sequence_name && row.start < region.end() && row.end() > region.start
            })
            .map(|mut block| {
                super::clip_and_prune(&mut block, region.start, region.end());
                summarize(&block)
            })
            .collect()
    }

    #[test]
    fn parse_region_forms() {
        use super::{parse_region, Region};

        assert_eq!(parse_region("chr1:10-13").unwrap(), Region::new("chr1", 10, Some(3)));
        assert_eq!(parse_region("chr1:10").unwrap(), Region::new("chr1", 10, Some(1)));
        assert_eq!(parse_region("chr1:10-").unwrap(), Region::new("chr1", 10, Some(1)));
        assert_eq!(parse_region("chr1").unwrap(), Region::new("chr1", 0, None));
        assert_eq!(parse_region("hg38.chr1:0-5").unwrap(), Region::new("hg38.chr1", 0, Some(5)));
        assert_eq!(parse_region("a:b:7-9").unwrap(), Region::new("a:b", 7, Some(2)));
    }

    #[test]
    fn parse_region_rejects_malformed() {
        use crate::error::TafError;
        use super::parse_region;

        assert!(matches!(parse_region("chr1:x-13"), Err(TafError::Parse(_))));
        assert!(matches!(parse_region("chr1:10-1x"), Err(TafError::Parse(_))));
        assert!(matches!(parse_region("chr1:-5"), Err(TafError::Parse(_))));
        assert!(matches!(parse_region("chr1:13-10"), Err(TafError::Range(_))));
        assert!(matches!(parse_region("ref.chr1:2-2"), Err(TafError::Range(_))));
    }

    #[test]
    fn region_end_and_display() {
        use super::Region;

        let region = Region::new("chr1", 10, Some(3));
        assert_eq!(region.end(), 13);
        assert_eq!(region.to_string(), "chr1:10-13");
        assert_eq!(Region::new("chr1", 0, None).end(), i64::MAX);
        assert_eq!(Region::new("chr1", 0, None).to_string(), "chr1");
    }

    #[test]
    fn tai_path_appends_extension() {
        use std::path::PathBuf;
        use super::tai_path;

        assert_eq!(tai_path("data/aln.taf.gz"), PathBuf::from("data/aln.taf.gz.tai"));
    }

    #[test]
    fn write_relative_lines() {
        use super::{Tai, TaiEntry};

        let text = "#index_block_size 10\nchr1\t0\t12\n*\t16\t200\nchr2\t4\t900\n";
        let tai = Tai::read(text.as_bytes()).unwrap();

        assert_eq!(tai.index_block_size(), 10);
        assert_eq!(tai.entries("chr1").unwrap(), &[TaiEntry { position: 0, offset: 12 }, TaiEntry { position: 16, offset: 212 }]);
        assert_eq!(tai.entries("chr2").unwrap(), &[TaiEntry { position: 4, offset: 900 }]);
        assert_eq!(tai.contigs().collect::<Vec<&str>>(), vec!["chr1", "chr2"]);

        let mut out: Vec<u8> = Vec::new();
        tai.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn read_without_header_skips_bad_lines() {
        use super::{Tai, DEFAULT_INDEX_BLOCK_SIZE};

        let text = "chr1\t0\t12\nnot an entry\n\n*\t5\t5\n";
        let tai = Tai::read(text.as_bytes()).unwrap();

        assert_eq!(tai.index_block_size(), DEFAULT_INDEX_BLOCK_SIZE);
        assert_eq!(tai.len(), 2);
        assert_eq!(tai.entries("chr1").unwrap()[1].offset, 17);
    }

    #[test]
    fn read_relative_line_without_previous() {
        use crate::error::TafError;
        use super::Tai;

        let got = Tai::read("*\t5\t5\n".as_bytes());

        assert!(matches!(got, Err(TafError::Parse(_))));
    }

    #[test]
    fn build_taf_uses_anchor_lines() {
        use super::Tai;

        let taf = to_taf(&maf_text());
        let tai = Tai::build(&mut open(&taf), 10).unwrap();

        let positions: Vec<i64> = tai.entries("ref.chr1").unwrap().iter().map(|entry| entry.position).collect();
        assert_eq!(positions, vec![0, 16, 32]);
        let positions: Vec<i64> = tai.entries("ref.chr2").unwrap().iter().map(|entry| entry.position).collect();
        assert_eq!(positions, vec![0]);
        assert!(tai.entries("other.chr2").is_none());
    }

    #[test]
    fn build_maf_uses_block_size() {
        use super::Tai;

        let maf = maf_text();
        let tai = Tai::build(&mut open(maf.as_bytes()), 10).unwrap();

        let positions: Vec<i64> = tai.entries("ref.chr1").unwrap().iter().map(|entry| entry.position).collect();
        assert_eq!(positions, vec![0, 12, 24, 36]);
        let positions: Vec<i64> = tai.entries("ref.chr2").unwrap().iter().map(|entry| entry.position).collect();
        assert_eq!(positions, vec![0, 12]);
    }

    #[test]
    fn build_rejects_negative_reference() {
        use crate::error::TafError;
        use super::Tai;

        let maf = b"##maf\n\na\ns r 0 2 - 10 AC\n\n";
        let got = Tai::build(&mut open(maf), 10);

        assert!(matches!(got, Err(TafError::Precondition(_))));
    }

    #[test]
    fn build_rejects_gzip() {
        use std::io::Write;
        use crate::error::TafError;
        use super::Tai;

        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(maf_text().as_bytes()).unwrap();
        let data = gz.finish().unwrap();
        let got = Tai::build(&mut open(&data), 10);

        assert!(matches!(got, Err(TafError::Precondition(_))));
    }

    #[test]
    fn query_clips_and_drops_emptied_rows() {
        use super::{parse_region, Tai};

        let taf = to_taf(&maf_text());
        let mut reader = open(&taf);
        let tai = Tai::build(&mut reader, 10).unwrap();

        let region = parse_region("ref.chr1:9-11").unwrap();
        let blocks: Vec<_> = tai.query(&mut reader, &region).unwrap().map(|block| block.unwrap()).collect();

        assert_eq!(blocks.len(), 1);
        assert_eq!(summarize(&blocks[0]), vec![
            ("ref.chr1".to_string(), 9, 2, "C-G".to_string()),
            ("other.chr2".to_string(), 11, 3, "CTG".to_string()),
        ]);
        assert_eq!(blocks[0].column_number, 3);
        assert_eq!(blocks[0].column_tags.len(), 3);
    }

    #[test]
    fn query_matches_linear_scan() {
        use super::{Region, Tai};

        let maf = maf_text();
        let taf = to_taf(&maf);
        let regions = vec![
            Region::new("ref.chr1", 0, Some(48)),
            Region::new("ref.chr1", 5, Some(2)),
            Region::new("ref.chr1", 17, Some(13)),
            Region::new("ref.chr1", 33, Some(15)),
            Region::new("ref.chr1", 40, Some(60)),
            Region::new("ref.chr2", 0, None),
            Region::new("ref.chr2", 6, Some(9)),
        ];

        for data in [maf.as_bytes(), &taf[..]] {
            let mut reader = open(data);
            let tai = Tai::build(&mut reader, 10).unwrap();
            for region in regions.iter() {
                let blocks: Vec<_> = tai.query(&mut reader, region).unwrap().map(|block| block.unwrap()).collect();
                let got: Vec<_> = blocks.iter().map(summarize).collect();
                assert_eq!(got, linear_scan(data, region), "{}", region);

                let reference: String = blocks.iter().flat_map(|block| block.rows[0].bases.chars()).filter(|c| *c != '-').collect();
                let end = region.end().min(if region.sequence_name == "ref.chr1" { 48 } else { 20 });
                let expected: String = (region.start..end).map(|p| b"ACGT"[(p % 4) as usize] as char).collect();
                assert_eq!(reference, expected, "{}", region);
            }
        }
    }

    #[test]
    fn query_links_within_region() {
        use super::{Region, Tai};

        let taf = to_taf(&maf_text());
        let mut reader = open(&taf);
        let tai = Tai::build(&mut reader, 10).unwrap();

        let region = Region::new("ref.chr1", 17, Some(13));
        let blocks: Vec<_> = tai.query(&mut reader, &region).unwrap().map(|block| block.unwrap()).collect();

        assert!(blocks[0].rows.iter().all(|row| row.left_row.is_none()));
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].rows[0].left_row, Some(0));
            for row in pair[1].rows.iter() {
                if let Some(l) = row.left_row {
                    assert!(pair[0].rows[l].is_predecessor(row));
                }
            }
        }
    }

    #[test]
    fn query_missing_contig_is_empty() {
        use super::{parse_region, Tai};

        let maf = maf_text();
        let mut reader = open(maf.as_bytes());
        let tai = Tai::build(&mut reader, 10).unwrap();

        let region = parse_region("chrZ:0-10").unwrap();
        assert_eq!(tai.query(&mut reader, &region).unwrap().count(), 0);
    }

    #[test]
    fn query_empty_region_is_empty() {
        use super::{Region, Tai};

        let taf = to_taf(&maf_text());
        let mut reader = open(&taf);
        let tai = Tai::build(&mut reader, 10).unwrap();

        let region = Region::new("ref.chr1", 2, Some(0));
        assert_eq!(tai.query(&mut reader, &region).unwrap().count(), 0);
        let region = Region::new("ref.chr1", 2, Some(1));
        let blocks: Vec<_> = tai.query(&mut reader, &region).unwrap().map(|block| block.unwrap()).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].rows[0].start, 2);
        assert_eq!(blocks[0].rows[0].length, 1);
    }

    #[test]
    fn query_past_contig_end_scans_to_end() {
        use super::{Region, Tai};

        let taf = to_taf(&maf_text());
        let mut reader = open(&taf);
        let tai = Tai::build(&mut reader, 10).unwrap();

        let region = Region::new("ref.chr1", 5000, None);
        assert_eq!(tai.query(&mut reader, &region).unwrap().count(), 0);
        assert!(reader.read_block().unwrap().is_none());
    }

    #[test]
    fn query_several_regions() {
        use super::{Region, Tai};

        let taf = to_taf(&maf_text());
        let mut reader = open(&taf);
        let tai = Tai::build(&mut reader, 10).unwrap();

        let regions = vec![Region::new("ref.chr2", 4, Some(4)), Region::new("ref.chr1", 0, Some(4))];
        let blocks: Vec<_> = tai.query_regions(&mut reader, regions).map(|block| block.unwrap()).collect();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].rows[0].sequence_name, "ref.chr2");
        assert_eq!(blocks[0].rows[0].start, 4);
        assert_eq!(blocks[1].rows[0].sequence_name, "ref.chr1");
        assert_eq!(blocks[1].rows[0].bases, "AC-GT");
        assert_eq!(blocks[1].row_number(), 3);
        assert!(blocks[1].rows.iter().all(|row| row.left_row.is_none()));
    }

    #[test]
    fn sequence_lengths_of_contigs() {
        use super::Tai;

        let maf = maf_text();
        let taf = to_taf(&maf);
        for data in [maf.as_bytes(), &taf[..]] {
            let mut reader = open(data);
            let tai = Tai::build(&mut reader, 10).unwrap();
            let lengths = tai.sequence_lengths(&mut reader).unwrap();

            assert_eq!(lengths.len(), 2);
            assert_eq!(lengths["ref.chr1"], 1000);
            assert_eq!(lengths["ref.chr2"], 800);
        }
    }
}
