//! One merge-and-tag run, from resolved sources to finished output

use std::collections::HashSet;
use std::io::Write;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::header::{add_pg_record, header_text, merge_read_groups};
use crate::io::{self, Compression, MergedReader, SortOrder};
use crate::region::{ReferenceTable, RegionSpec};
use crate::sources::{ReadGroupLookup, SourceSpec};
use crate::tagging::{RunSummary, rewrite_tags};

/// Everything a run needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub sources: Vec<SourceSpec>,
    /// Samples whose read groups are dropped from the output header
    pub deletions: HashSet<String>,
    pub region: Option<String>,
    pub compression: Compression,
    /// Recorded in the `@PG` line
    pub command_line: String,
}

/// Merge the inputs of `config` into a BAM stream on `out`.
///
/// Returns the summary and the sink once the BGZF EOF block is written. The
/// readers and the writer are dropped on every error path.
pub fn run<W: Write>(config: &RunConfig, out: W) -> Result<(RunSummary, W)> {
    let region = config.region.as_deref().and_then(RegionSpec::parse);

    let filenames: Vec<&str> = config.sources.iter().map(|s| s.filename.as_str()).collect();
    let mut inputs = io::open_inputs(&filenames, region.is_some())?;
    for input in &inputs {
        debug!(
            "opened {} ({} read groups)",
            input.path(),
            input.header().read_groups().len()
        );
    }

    let mut header = io::merge_headers(&inputs)?;
    let entries: Vec<_> = config
        .sources
        .iter()
        .map(SourceSpec::read_group_entry)
        .collect();
    let removed = merge_read_groups(&mut header, &entries, &config.deletions)?;
    if removed > 0 {
        info!("removed {} read groups from the output header", removed);
    }
    for source in &config.sources {
        if config.deletions.contains(&source.sample) {
            warn!(
                "sample {} of {} is deleted from the header but its records keep RG:{}",
                source.sample, source.filename, source.read_group
            );
        }
    }
    add_pg_record(&mut header, env!("CARGO_PKG_VERSION"), &config.command_line)?;
    debug!("output header:\n{}", header_text(&header)?);

    let query_region = match &region {
        Some(spec) => {
            let resolved = spec.resolve(&ReferenceTable::from_header(&header))?;
            info!(
                "restricting output to {} ({}:{}..{})",
                spec, resolved.reference_name, resolved.start, resolved.stop
            );
            Some(resolved.to_query_region()?)
        }
        None => None,
    };

    let order = SortOrder::from_header(&header);
    let streams = inputs
        .iter_mut()
        .map(|input| input.records(query_region.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let reader = MergedReader::new(streams, order)?;

    let lookup = ReadGroupLookup::from_sources(&config.sources);
    let mut writer = io::open_writer(out, config.compression, &header)?;
    let summary = rewrite_tags(reader, &header, &lookup, &mut writer)?;
    let out = io::finish_writer(writer)?;

    Ok((summary, out))
}
