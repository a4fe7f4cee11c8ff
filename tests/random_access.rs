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
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Write;

use taffy::Format;
use taffy::index::{parse_region, tai_path, Region, Tai};
use taffy::printer::WriterOptions;

// ref.chr1 covers [0, 9000) and ref.chr2 covers [0, 200)
fn maf_text() -> String {
    let mut maf = String::from("##maf version=1\n\n");
    for i in 0..3000 {
        maf += &format!("a\ns ref.chr1 {} 3 + 9000 AC-G\ns sp.chr5 {} 4 + 20000 ACTG\n", 3 * i, 1000 + 4 * i);
        if i % 7 == 0 {
            maf += &format!("s sp2.chrX {} 1 - 50000 T---\n", 10 * i);
        }
        maf += "\n";
    }
    for i in 0..50 {
        maf += &format!("a\ns ref.chr2 {} 4 + 200 ACGT\ns sp.chr5 {} 4 + 20000 ACGT\n\n", 4 * i, 15000 + 4 * i);
    }
    maf
}

fn reference_bases(region: &Region, contig_length: i64, pattern: &[u8]) -> String {
    (region.start..region.end().min(contig_length)).map(|p| pattern[(p as usize) % pattern.len()] as char).collect()
}

fn extracted_reference(maf: &str) -> String {
    maf.lines()
       .filter(|line| line.starts_with("s\tref."))
       .flat_map(|line| line.rsplit('\t').next().unwrap_or("").chars())
       .filter(|c| *c != '-')
       .collect()
}

#[test]
fn extract_from_indexed_files() {
    let maf = maf_text();
    let regions: Vec<Region> = ["ref.chr1:100-400", "ref.chr1:0-1", "ref.chr1:8880-9500", "ref.chr2:10-20", "ref.chr2"]
        .iter().map(|region| parse_region(region).unwrap()).collect();

    // Expected output from the MAF itself
    let maf_tai = taffy::index(Cursor::new(maf.clone().into_bytes()), 1000).unwrap();
    let mut expected: Vec<String> = Vec::new();
    for region in regions.iter() {
        let out = taffy::extract(Cursor::new(maf.clone().into_bytes()), &maf_tai, vec![region.clone()],
                                 Vec::new(), Format::Maf, WriterOptions::default()).unwrap();
        expected.push(String::from_utf8(out).unwrap());
    }

    let dir = tempfile::tempdir().unwrap();
    for compress in [false, true] {
        let path = dir.path().join(if compress { "aln.taf.gz" } else { "aln.taf" });
        let options = WriterOptions { repeat_coordinates_every_n_columns: 100, compress, ..Default::default() };
        taffy::convert(maf.as_bytes(), File::create(&path).unwrap(), Format::Taf, options).unwrap();

        let tai = taffy::index(File::open(&path).unwrap(), 1000).unwrap();
        assert!(tai.entries("ref.chr1").unwrap().len() > 5);
        let mut conn_out = BufWriter::new(File::create(tai_path(&path)).unwrap());
        tai.write(&mut conn_out).unwrap();
        conn_out.flush().unwrap();
        drop(conn_out);

        let tai = Tai::read(BufReader::new(File::open(tai_path(&path)).unwrap())).unwrap();
        for (region, expected) in regions.iter().zip(expected.iter()) {
            let out = taffy::extract(File::open(&path).unwrap(), &tai, vec![region.clone()],
                                     Vec::new(), Format::Maf, WriterOptions::default()).unwrap();
            let got = String::from_utf8(out).unwrap();
            assert_eq!(&got, expected, "{} compress={}", region, compress);

            let (contig_length, pattern) = if region.sequence_name == "ref.chr1" { (9000, &b"ACG"[..]) } else { (200, &b"ACGT"[..]) };
            assert_eq!(extracted_reference(&got), reference_bases(region, contig_length, pattern), "{}", region);
        }
    }
}

#[test]
fn extract_several_regions_as_taf() {
    let maf = maf_text();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aln.maf");
    std::fs::write(&path, maf.as_bytes()).unwrap();

    let tai = taffy::index(File::open(&path).unwrap(), 500).unwrap();
    let regions = vec![parse_region("ref.chr2:0-8").unwrap(), parse_region("ref.chr1:30-36").unwrap()];
    let taf = taffy::extract(File::open(&path).unwrap(), &tai, regions, Vec::new(), Format::Taf, WriterOptions::default()).unwrap();
    let back = taffy::convert(&taf[..], Vec::new(), Format::Maf, WriterOptions::default()).unwrap();
    let back = String::from_utf8(back).unwrap();

    assert_eq!(extracted_reference(&back), "ACGTACGT".to_string() + "ACGACG");
    assert!(back.contains("s\tref.chr1\t30\t3\t+\t9000\tAC-G\n"));
    assert!(back.contains("s\tsp.chr5\t15004\t4\t+\t20000\tACGT\n"));
}

#[test]
fn sequence_lengths_from_index() {
    let maf = maf_text();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aln.taf");
    let options = WriterOptions { compress: true, ..Default::default() };
    taffy::convert(maf.as_bytes(), File::create(&path).unwrap(), Format::Taf, options).unwrap();

    let tai = taffy::index(File::open(&path).unwrap(), 10_000).unwrap();
    let mut reader = taffy::parser::AlignmentReader::new(File::open(&path).unwrap()).unwrap();
    let lengths = tai.sequence_lengths(&mut reader).unwrap();

    assert_eq!(lengths.get("ref.chr1"), Some(&9000));
    assert_eq!(lengths.get("ref.chr2"), Some(&200));
}
