// Command-line argument parsing
use std::collections::HashSet;
use std::ffi::OsString;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::error::Result;
use crate::io::Compression;
use crate::pipeline::RunConfig;
use crate::sources::{SourceToken, resolve_sources};

const AFTER_HELP: &str = "\
Merges the alignments in the supplied BAM files, adding a read group (RG) tag
to each alignment from the sample name and read group given for its file.

Sample names and read groups apply to the input group opened by the nearest
-b/--bam; they may be given before or after it. When no sample name is
supplied the BAM file name is used; when no read group is supplied the sample
name is used.

The merged BAM is written to standard output.";

#[derive(Parser, Debug)]
#[command(
    name = "addrgrs",
    version,
    about = "Merge BAM files and add per-file read group (RG) tags",
    after_help = AFTER_HELP
)]
pub struct Args {
    /// Use this BAM as input; starts a new input group
    #[arg(short = 'b', long = "bam", value_name = "FILE")]
    pub bam: Vec<String>,
    /// Sample name for the current input group
    #[arg(short = 's', long = "sample", value_name = "NAME")]
    pub sample: Vec<String>,
    /// Read group id for the current input group
    #[arg(short = 'r', long = "read-group", value_name = "GROUP")]
    pub read_group: Vec<String>,
    /// Remove read groups of this sample from the output header
    #[arg(short = 'd', long = "delete", value_name = "NAME")]
    pub delete: Vec<String>,
    /// Only output alignments in REGION: NAME, NAME:POS, NAME:START.. or NAME:START..STOP (0-based, end exclusive)
    #[arg(short = 'R', long = "region", value_name = "REGION")]
    pub region: Option<String>,
    /// Write uncompressed BAM
    #[arg(short = 'u', long)]
    pub uncompressed: bool,
    /// Log debugging information to standard error
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Collect `-b/-s/-r` values in the order they appeared on the command line.
pub fn source_tokens(matches: &ArgMatches) -> Vec<SourceToken> {
    let mut indexed: Vec<(usize, SourceToken)> = Vec::new();
    collect_indexed(matches, "bam", SourceToken::Bam, &mut indexed);
    collect_indexed(matches, "sample", SourceToken::Sample, &mut indexed);
    collect_indexed(matches, "read_group", SourceToken::ReadGroup, &mut indexed);
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, token)| token).collect()
}

fn collect_indexed(
    matches: &ArgMatches,
    id: &str,
    make: fn(String) -> SourceToken,
    out: &mut Vec<(usize, SourceToken)>,
) {
    if let (Some(values), Some(indices)) = (matches.get_many::<String>(id), matches.indices_of(id)) {
        out.extend(indices.zip(values).map(|(i, v)| (i, make(v.clone()))));
    }
}

impl Args {
    /// Parse arguments, keeping the relative order of the source options.
    pub fn try_parse_with_tokens<I, T>(itr: I) -> std::result::Result<(Self, Vec<SourceToken>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        let args = Self::from_arg_matches(&matches)?;
        let tokens = source_tokens(&matches);
        Ok((args, tokens))
    }

    pub fn compression(&self) -> Compression {
        if self.uncompressed {
            Compression::Uncompressed
        } else {
            Compression::Compressed
        }
    }

    /// Resolve the sources and build the run configuration.
    pub fn into_config(self, tokens: Vec<SourceToken>, command_line: String) -> Result<RunConfig> {
        let sources = resolve_sources(tokens)?;
        let deletions: HashSet<String> = self.delete.iter().cloned().collect();
        Ok(RunConfig {
            sources,
            deletions,
            compression: self.compression(),
            region: self.region,
            command_line,
        })
    }
}
