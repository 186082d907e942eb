//! RG tag rewriting
//!
//! Pulls records from the merged stream, sets each record's `RG:Z` tag to the
//! read group of the file it came from, and forwards it to the writer. The
//! first failure aborts the run; nothing after the failing record is written.

use std::collections::BTreeMap;
use std::sync::Arc;

use noodles::bam;
use noodles::sam::Header;
use noodles::sam::alignment::Record;
use noodles::sam::alignment::io::Write as SamWrite;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;
use tracing::debug;

use crate::error::{AddRgError, Result};
use crate::sources::ReadGroupLookup;

const PROGRESS_INTERVAL: u64 = 1_000_000;

/// A record together with the input file it was read from
#[derive(Debug, Clone)]
pub struct SourcedRecord<R = bam::Record> {
    pub filename: Arc<str>,
    pub record: R,
}

/// Counts of records written, overall and per read group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub per_read_group: BTreeMap<String, u64>,
}

impl RunSummary {
    fn count(&mut self, read_group: &str) {
        self.records += 1;
        match self.per_read_group.get_mut(read_group) {
            Some(n) => *n += 1,
            None => {
                self.per_read_group.insert(read_group.to_string(), 1);
            }
        }
    }
}

fn record_name<R: Record + ?Sized>(record: &R) -> String {
    record
        .name()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .unwrap_or_else(|| "*".to_string())
}

/// Copy `record` with its RG tag set (or replaced) to `read_group`.
pub fn set_read_group<R: Record + ?Sized>(
    header: &Header,
    record: &R,
    read_group: &str,
) -> Result<RecordBuf> {
    let mut buf =
        RecordBuf::try_from_alignment_record(header, record).map_err(|e| AddRgError::Tag {
            name: record_name(record),
            reason: e.to_string(),
        })?;
    buf.data_mut().insert(Tag::READ_GROUP, Value::from(read_group));
    Ok(buf)
}

/// Tag and write every record of `records`.
///
/// Stops at the end of the stream or at the first read, tag or write error.
pub fn rewrite_tags<I, R, W>(
    records: I,
    header: &Header,
    lookup: &ReadGroupLookup,
    writer: &mut W,
) -> Result<RunSummary>
where
    I: IntoIterator<Item = Result<SourcedRecord<R>>>,
    R: Record,
    W: SamWrite,
{
    let mut summary = RunSummary::default();

    for result in records {
        let sourced = result?;

        let read_group =
            lookup
                .read_group_for(&sourced.filename)
                .ok_or_else(|| AddRgError::Tag {
                    name: record_name(&sourced.record),
                    reason: format!("no read group for input '{}'", sourced.filename),
                })?;

        let record = set_read_group(header, &sourced.record, read_group)?;

        writer
            .write_alignment_record(header, &record)
            .map_err(|source| AddRgError::Write {
                name: record_name(&record),
                source,
            })?;

        summary.count(read_group);
        if summary.records % PROGRESS_INTERVAL == 0 {
            debug!("tagged {} records", summary.records);
        }
    }

    Ok(summary)
}
