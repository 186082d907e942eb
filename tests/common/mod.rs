#![allow(dead_code)]
//! Fixture helpers shared by the integration tests

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bstr::BString;
use noodles::bam;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as SamWrite;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, RecordBuf, Sequence};

use addrgrs::{Compression, RunConfig, SourceSpec};

pub const REFERENCES: &str = "@SQ\tSN:chr1\tLN:1000\n@SQ\tSN:chr2\tLN:500\n";

pub fn header(sort_order: &str) -> Header {
    format!("@HD\tVN:1.6\tSO:{sort_order}\n{REFERENCES}")
        .parse()
        .unwrap()
}

/// A 4-base mapped read at 1-based `pos`
pub fn mapped(name: &str, reference: usize, pos: usize) -> RecordBuf {
    RecordBuf::builder()
        .set_name(BString::from(name))
        .set_flags(Flags::empty())
        .set_reference_sequence_id(reference)
        .set_alignment_start(Position::new(pos).unwrap())
        .set_cigar(Cigar::from(vec![Op::new(Kind::Match, 4)]))
        .set_sequence(Sequence::from(b"ACGT".to_vec()))
        .set_quality_scores(QualityScores::from(vec![30, 30, 30, 30]))
        .build()
}

pub fn unmapped(name: &str) -> RecordBuf {
    RecordBuf::builder()
        .set_name(BString::from(name))
        .set_flags(Flags::UNMAPPED)
        .set_sequence(Sequence::from(b"ACGT".to_vec()))
        .set_quality_scores(QualityScores::from(vec![30, 30, 30, 30]))
        .build()
}

pub fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut writer = bam::io::writer::Builder.build_from_path(path).unwrap();
    writer.write_header(header).unwrap();
    for record in records {
        writer.write_alignment_record(header, record).unwrap();
    }
    writer.finish(header).unwrap();
}

pub fn path_str(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

pub fn config(sources: Vec<SourceSpec>) -> RunConfig {
    RunConfig {
        sources,
        deletions: HashSet::new(),
        region: None,
        compression: Compression::Compressed,
        command_line: "addrgrs test".to_string(),
    }
}

pub fn source(filename: &str, sample: &str, read_group: &str) -> SourceSpec {
    SourceSpec {
        filename: filename.to_string(),
        sample: sample.to_string(),
        read_group: read_group.to_string(),
    }
}

/// Decode a BAM byte stream into its header and records
pub fn read_output(bytes: Vec<u8>) -> (Header, Vec<RecordBuf>) {
    let mut reader = bam::io::Reader::new(Cursor::new(bytes));
    let header = reader.read_header().unwrap();
    let records = reader
        .records()
        .map(|r| RecordBuf::try_from_alignment_record(&header, &r.unwrap()).unwrap())
        .collect();
    (header, records)
}

pub fn name(record: &RecordBuf) -> String {
    record.name().map(|n| n.to_string()).unwrap_or_default()
}

pub fn read_group(record: &RecordBuf) -> Option<String> {
    match record.data().get(&Tag::READ_GROUP) {
        Some(Value::String(s)) => Some(s.to_string()),
        _ => None,
    }
}

pub fn header_read_groups(header: &Header) -> Vec<String> {
    header.read_groups().keys().map(|k| k.to_string()).collect()
}
