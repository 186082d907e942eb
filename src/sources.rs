//! Input source resolution
//!
//! Turns the ordered `-b/-s/-r` command-line tokens into one [`SourceSpec`]
//! per input file, filling in default sample names and read groups.

use std::collections::{HashMap, HashSet};

use crate::error::{AddRgError, Result};

/// One source-related command-line option, in the order it was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceToken {
    Bam(String),
    Sample(String),
    ReadGroup(String),
}

/// A fully resolved input: file, sample name and read group id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub filename: String,
    pub sample: String,
    pub read_group: String,
}

/// An `@RG` entry derived from a [`SourceSpec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroupEntry {
    pub id: String,
    pub sample: String,
}

impl SourceSpec {
    pub fn read_group_entry(&self) -> ReadGroupEntry {
        ReadGroupEntry {
            id: self.read_group.clone(),
            sample: self.sample.clone(),
        }
    }
}

/// The group currently being assembled while walking the tokens
#[derive(Debug, Default)]
struct PendingSource {
    filename: String,
    sample: String,
    read_group: String,
}

impl PendingSource {
    /// Seal the group, applying sample <- filename and read group <- sample.
    fn flush(&mut self) -> SourceSpec {
        let pending = std::mem::take(self);
        let sample = if pending.sample.is_empty() {
            pending.filename.clone()
        } else {
            pending.sample
        };
        let read_group = if pending.read_group.is_empty() {
            sample.clone()
        } else {
            pending.read_group
        };
        SourceSpec {
            filename: pending.filename,
            sample,
            read_group,
        }
    }
}

/// Resolve ordered source tokens into source specifications.
///
/// Each `Bam` token opens a new group and seals the previous one. `Sample`
/// and `ReadGroup` tokens apply to whichever group is pending, so they may
/// come before or after their `Bam` token within the group.
pub fn resolve_sources<I>(tokens: I) -> Result<Vec<SourceSpec>>
where
    I: IntoIterator<Item = SourceToken>,
{
    let mut sources = Vec::new();
    let mut pending = PendingSource::default();

    for token in tokens {
        match token {
            SourceToken::Bam(filename) => {
                if filename.is_empty() {
                    return Err(AddRgError::InvalidArgument {
                        argument: "--bam".to_string(),
                        reason: "file name must not be empty".to_string(),
                    });
                }
                if !pending.filename.is_empty() {
                    sources.push(pending.flush());
                }
                pending.filename = filename;
            }
            SourceToken::Sample(name) => pending.sample = name,
            SourceToken::ReadGroup(id) => pending.read_group = id,
        }
    }

    if !pending.filename.is_empty() {
        sources.push(pending.flush());
    }

    if sources.is_empty() {
        return Err(AddRgError::NoInputs);
    }

    let mut seen = HashSet::new();
    for source in &sources {
        if !seen.insert(source.filename.as_str()) {
            return Err(AddRgError::DuplicateInput(source.filename.clone()));
        }
    }

    Ok(sources)
}

/// Filename to read group id, built once and only read while streaming
#[derive(Debug, Clone, Default)]
pub struct ReadGroupLookup {
    by_filename: HashMap<String, String>,
}

impl ReadGroupLookup {
    pub fn from_sources(sources: &[SourceSpec]) -> Self {
        let by_filename = sources
            .iter()
            .map(|s| (s.filename.clone(), s.read_group.clone()))
            .collect();
        Self { by_filename }
    }

    #[inline]
    pub fn read_group_for(&self, filename: &str) -> Option<&str> {
        self.by_filename.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }
}
