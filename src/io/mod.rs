//! BAM file I/O
//!
//! Opens the input BAM files as one merged record stream, builds the merged
//! header, and writes the BGZF-compressed (or level-0) BAM output.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use noodles::bam;
use noodles::bgzf;
use noodles::bgzf::io::writer::CompressionLevel;
use noodles::core::Region;
use noodles::sam::Header;
use noodles::sam::header::record::value::map::header::tag as hd_tag;
use bstr::BString;
use tracing::{debug, warn};

use crate::error::{AddRgError, Result};
use crate::tagging::SourcedRecord;

pub type BamReader = bam::io::Reader<bgzf::io::Reader<File>>;
pub type IndexedBamReader = bam::io::IndexedReader<bgzf::io::Reader<File>>;
pub type BamWriter<W> = bam::io::Writer<bgzf::io::Writer<W>>;

/// Records from one input, borrowed from its reader
pub type RecordStream<'a> = Box<dyn Iterator<Item = io::Result<bam::Record>> + 'a>;

enum BamSource {
    Sequential(BamReader),
    Indexed(IndexedBamReader),
}

/// One opened input file and its header
pub struct InputBam {
    path: Arc<str>,
    header: Header,
    source: BamSource,
}

impl InputBam {
    /// Open an input. With `indexed`, the `.bai`/`.csi` index must be found
    /// next to the file.
    pub fn open(path: &str, indexed: bool) -> Result<Self> {
        let open_err = |source| AddRgError::OpenInput {
            path: path.to_string(),
            source,
        };

        let (source, header) = if indexed {
            File::open(path).map_err(open_err)?;
            let mut reader = bam::io::indexed_reader::Builder::default()
                .build_from_path(path)
                .map_err(|source| AddRgError::IndexUnavailable {
                    path: path.to_string(),
                    source,
                })?;
            let header = reader.read_header().map_err(open_err)?;
            (BamSource::Indexed(reader), header)
        } else {
            let mut reader = bam::io::reader::Builder::default()
                .build_from_path(path)
                .map_err(open_err)?;
            let header = reader.read_header().map_err(open_err)?;
            (BamSource::Sequential(reader), header)
        };

        Ok(Self {
            path: Arc::from(path),
            header,
            source,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Start streaming records, restricted to `region` when given.
    pub fn records<'a>(&'a mut self, region: Option<&'a Region>) -> Result<SourceStream<'a>> {
        let path = Arc::clone(&self.path);
        let records: RecordStream<'a> = match (&mut self.source, region) {
            (BamSource::Sequential(reader), None) => Box::new(reader.records()),
            (BamSource::Indexed(reader), None) => Box::new(reader.records()),
            (BamSource::Indexed(reader), Some(region)) => {
                let query = reader.query(&self.header, region).map_err(|source| {
                    AddRgError::ReadRecord {
                        path: path.to_string(),
                        source,
                    }
                })?;
                Box::new(query.records())
            }
            (BamSource::Sequential(_), Some(_)) => {
                return Err(AddRgError::IndexUnavailable {
                    path: path.to_string(),
                    source: io::Error::other("input was opened without its index"),
                });
            }
        };

        Ok(SourceStream {
            filename: path,
            records,
        })
    }
}

/// Open every input, in order.
pub fn open_inputs<S: AsRef<str>>(filenames: &[S], indexed: bool) -> Result<Vec<InputBam>> {
    filenames
        .iter()
        .map(|f| InputBam::open(f.as_ref(), indexed))
        .collect()
}

fn same_references(a: &Header, b: &Header) -> bool {
    let (a, b) = (a.reference_sequences(), b.reference_sequences());
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((an, ar), (bn, br))| an == bn && ar.length() == br.length())
}

/// Merge the input headers.
///
/// The first header is the base. Every other input must have the same
/// reference sequences; its read groups and comments are appended when not
/// already present. Inputs that disagree on `@HD SO` are merged unsorted,
/// and the merged header says so.
pub fn merge_headers(inputs: &[InputBam]) -> Result<Header> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err(AddRgError::NoInputs);
    };

    let mut merged = first.header.clone();

    for input in rest {
        if !same_references(&merged, &input.header) {
            return Err(AddRgError::ReferenceMismatch {
                path: input.path.to_string(),
                first: first.path.to_string(),
            });
        }

        for (id, rg) in input.header.read_groups() {
            merged
                .read_groups_mut()
                .entry(id.clone())
                .or_insert_with(|| rg.clone());
        }

        for comment in input.header.comments() {
            if !merged.comments().contains(comment) {
                merged.comments_mut().push(comment.clone());
            }
        }
    }

    let order = SortOrder::from_header(&first.header);
    if let Some(other) = rest
        .iter()
        .find(|input| SortOrder::from_header(&input.header) != order)
    {
        warn!(
            "{} is {:?} but {} is {:?}; merging as unsorted",
            first.path,
            order,
            other.path,
            SortOrder::from_header(&other.header)
        );
        if let Some(hd) = merged.header_mut() {
            hd.other_fields_mut()
                .insert(hd_tag::SORT_ORDER, BString::from("unsorted"));
        }
    }

    Ok(merged)
}

/// Interleaving order of the merged stream, taken from `@HD SO`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Coordinate,
    QueryName,
    Unsorted,
}

impl SortOrder {
    pub fn from_header(header: &Header) -> Self {
        let so = header
            .header()
            .and_then(|hd| hd.other_fields().get(&hd_tag::SORT_ORDER))
            .map(|v| v.as_slice());
        match so {
            Some(b"coordinate") => Self::Coordinate,
            Some(b"queryname") => Self::QueryName,
            _ => Self::Unsorted,
        }
    }
}

/// The records of one input, tagged with its filename
pub struct SourceStream<'a> {
    pub filename: Arc<str>,
    pub records: RecordStream<'a>,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MergeKey {
    Coordinate { reference: usize, position: usize },
    Name(Vec<u8>),
    Arrival,
}

/// Heap entry: the next pending record of one input
struct MergeItem {
    key: MergeKey,
    tiebreak: u64,
    stream: usize,
    record: bam::Record,
}

impl PartialEq for MergeItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.tiebreak == other.tiebreak
    }
}

impl Eq for MergeItem {}

impl Ord for MergeItem {
    fn cmp(&self, other: &Self) -> Ordering {
        (&other.key, other.tiebreak).cmp(&(&self.key, self.tiebreak))
    }
}

impl PartialOrd for MergeItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// K-way merge of the input streams, holding one record per input.
///
/// Coordinate-sorted inputs are merged by (reference, position) with
/// unmapped records last, queryname-sorted inputs by read name, and anything
/// else round robin. Ties go to the earlier input.
pub struct MergedReader<'a> {
    streams: Vec<SourceStream<'a>>,
    heap: BinaryHeap<MergeItem>,
    order: SortOrder,
    arrivals: u64,
}

impl<'a> MergedReader<'a> {
    pub fn new(streams: Vec<SourceStream<'a>>, order: SortOrder) -> Result<Self> {
        let mut reader = Self {
            heap: BinaryHeap::with_capacity(streams.len()),
            streams,
            order,
            arrivals: 0,
        };
        for i in 0..reader.streams.len() {
            reader.advance(i)?;
        }
        debug!(
            "merging {} inputs in {:?} order",
            reader.streams.len(),
            reader.order
        );
        Ok(reader)
    }

    fn key_for(&self, record: &bam::Record) -> io::Result<MergeKey> {
        Ok(match self.order {
            SortOrder::Coordinate => {
                let reference = record.reference_sequence_id().transpose()?;
                let position = record.alignment_start().transpose()?;
                match (reference, position) {
                    (Some(reference), Some(position)) => MergeKey::Coordinate {
                        reference,
                        position: position.get(),
                    },
                    (Some(reference), None) => MergeKey::Coordinate {
                        reference,
                        position: 0,
                    },
                    (None, _) => MergeKey::Coordinate {
                        reference: usize::MAX,
                        position: 0,
                    },
                }
            }
            SortOrder::QueryName => {
                MergeKey::Name(record.name().map(|n| n.to_vec()).unwrap_or_default())
            }
            SortOrder::Unsorted => MergeKey::Arrival,
        })
    }

    /// Pull the next record of stream `i` into the heap.
    fn advance(&mut self, i: usize) -> Result<()> {
        let read_err = |path: &Arc<str>, source| AddRgError::ReadRecord {
            path: path.to_string(),
            source,
        };

        let Some(result) = self.streams[i].records.next() else {
            return Ok(());
        };
        let record = result.map_err(|e| read_err(&self.streams[i].filename, e))?;
        let key = self
            .key_for(&record)
            .map_err(|e| read_err(&self.streams[i].filename, e))?;

        let tiebreak = match self.order {
            SortOrder::Unsorted => {
                self.arrivals += 1;
                self.arrivals
            }
            _ => i as u64,
        };

        self.heap.push(MergeItem {
            key,
            tiebreak,
            stream: i,
            record,
        });
        Ok(())
    }
}

impl Iterator for MergedReader<'_> {
    type Item = Result<SourcedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.heap.pop()?;
        if let Err(e) = self.advance(item.stream) {
            return Some(Err(e));
        }
        Some(Ok(SourcedRecord {
            filename: Arc::clone(&self.streams[item.stream].filename),
            record: item.record,
        }))
    }
}

/// Output compression switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Compressed,
    /// BGZF blocks at level 0
    Uncompressed,
}

/// Wrap `out` in a BGZF/BAM writer and write the header.
pub fn open_writer<W: Write>(out: W, compression: Compression, header: &Header) -> Result<BamWriter<W>> {
    let level = match compression {
        Compression::Compressed => CompressionLevel::default(),
        Compression::Uncompressed => CompressionLevel::new(0).unwrap_or_default(),
    };

    let bgzf_writer = bgzf::io::writer::Builder::default()
        .set_compression_level(level)
        .build_from_writer(out);
    let mut writer = bam::io::Writer::from(bgzf_writer);
    writer.write_header(header).map_err(AddRgError::OpenOutput)?;
    Ok(writer)
}

/// Flush the writer, append the BGZF EOF block and hand back the sink.
pub fn finish_writer<W: Write>(writer: BamWriter<W>) -> Result<W> {
    let mut bgzf_writer = writer.into_inner();
    bgzf_writer.try_finish().map_err(AddRgError::Finish)?;
    let mut out = bgzf_writer.into_inner();
    out.flush().map_err(AddRgError::Finish)?;
    Ok(out)
}
