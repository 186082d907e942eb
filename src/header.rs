//! Header manipulation: read groups, `@PG` records and text rendering.

use std::collections::HashSet;

use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::program::tag as pg_tag;
use noodles::sam::header::record::value::map::read_group::tag as rg_tag;
use noodles::sam::header::record::value::map::{Program, ReadGroup};

use crate::error::{AddRgError, Result};
use crate::sources::ReadGroupEntry;

/// Program name used for the `@PG` record this tool appends
pub const PROGRAM_NAME: &str = "addrgrs";

/// The read-group operations the merge needs from a header
pub trait ReadGroupSet {
    /// Insert a read group, replacing any existing entry with the same id.
    fn add_read_group(&mut self, entry: &ReadGroupEntry) -> Result<()>;

    /// Remove a read group by id. Returns whether it was present.
    fn remove_read_group(&mut self, id: &str) -> bool;

    /// `(id, sample)` for every read group, in header order.
    fn read_group_samples(&self) -> Vec<(String, Option<String>)>;
}

impl ReadGroupSet for Header {
    fn add_read_group(&mut self, entry: &ReadGroupEntry) -> Result<()> {
        let read_group = Map::<ReadGroup>::builder()
            .insert(rg_tag::SAMPLE, entry.sample.clone())
            .build()
            .map_err(|e| AddRgError::Header(format!("read group '{}': {e}", entry.id)))?;
        self.read_groups_mut()
            .insert(BString::from(entry.id.as_str()), read_group);
        Ok(())
    }

    fn remove_read_group(&mut self, id: &str) -> bool {
        self.read_groups_mut().shift_remove(id.as_bytes()).is_some()
    }

    fn read_group_samples(&self) -> Vec<(String, Option<String>)> {
        self.read_groups()
            .iter()
            .map(|(id, rg)| {
                let sample = rg.other_fields().get(&rg_tag::SAMPLE).map(|s| s.to_string());
                (id.to_string(), sample)
            })
            .collect()
    }
}

/// Add one read group per entry, then drop every read group whose sample is
/// in `deletions`.
///
/// Deletion runs after all additions, so a sample that is both added and
/// deleted ends up absent. Returns the number of read groups removed.
pub fn merge_read_groups<H>(
    header: &mut H,
    entries: &[ReadGroupEntry],
    deletions: &HashSet<String>,
) -> Result<usize>
where
    H: ReadGroupSet + ?Sized,
{
    for entry in entries {
        header.add_read_group(entry)?;
    }

    if deletions.is_empty() {
        return Ok(0);
    }

    let doomed: Vec<String> = header
        .read_group_samples()
        .into_iter()
        .filter(|(_, sample)| sample.as_ref().is_some_and(|s| deletions.contains(s)))
        .map(|(id, _)| id)
        .collect();

    for id in &doomed {
        header.remove_read_group(id);
    }

    Ok(doomed.len())
}

/// Id of the last program in the `@PG` chain, i.e. the one no other program
/// names as its `PP`.
pub fn last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let program_map = programs.as_ref();

    let referenced: HashSet<&[u8]> = program_map
        .values()
        .filter_map(|pg| pg.other_fields().get(&pg_tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_ref())
        .collect();

    program_map
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| program_map.keys().next())
        .map(|id| id.to_string())
}

fn unique_program_id(header: &Header) -> String {
    let programs = header.programs();
    let program_map = programs.as_ref();

    if !program_map.contains_key(PROGRAM_NAME.as_bytes()) {
        return PROGRAM_NAME.to_string();
    }

    (1..)
        .map(|i| format!("{PROGRAM_NAME}.{i}"))
        .find(|candidate| !program_map.contains_key(candidate.as_bytes()))
        .unwrap_or_else(|| PROGRAM_NAME.to_string())
}

/// Append an `@PG` record for this run, chained to the previous program.
pub fn add_pg_record(header: &mut Header, version: &str, command_line: &str) -> Result<()> {
    let previous = last_program_id(header);
    let id = unique_program_id(header);

    let mut builder = Map::<Program>::builder()
        .insert(pg_tag::NAME, PROGRAM_NAME)
        .insert(pg_tag::VERSION, version)
        .insert(pg_tag::COMMAND_LINE, command_line);
    if let Some(pp) = previous.as_deref() {
        builder = builder.insert(pg_tag::PREVIOUS_PROGRAM_ID, pp);
    }
    let program = builder
        .build()
        .map_err(|e| AddRgError::Header(format!("@PG record: {e}")))?;

    header
        .programs_mut()
        .add(BString::from(id), program)
        .map_err(|e| AddRgError::Header(format!("@PG record: {e}")))?;

    Ok(())
}

/// Render the header as SAM text.
pub fn header_text(header: &Header) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut writer = noodles::sam::io::Writer::new(&mut buf);
        writer
            .write_header(header)
            .map_err(|e| AddRgError::Header(e.to_string()))?;
    }
    String::from_utf8(buf).map_err(|e| AddRgError::Header(e.to_string()))
}
