//! addrgrs - merge BAM files and tag every alignment with a read group
//!
//! Each input file becomes one read group. Records from all inputs are merged
//! into a single stream, their `RG` tag is set to the read group of the file
//! they came from, and the header gains one `@RG` line per input. Read groups
//! of unwanted samples can be dropped from the header, and the output can be
//! restricted to a region of an indexed input.
//!
//! # Example
//!
//! ```ignore
//! use addrgrs::{Args, pipeline};
//!
//! let (args, tokens) = Args::try_parse_with_tokens(["addrgrs", "-b", "a.bam", "-s", "NA12878"])?;
//! let config = args.into_config(tokens, "addrgrs -b a.bam -s NA12878".to_string())?;
//! let (summary, _) = pipeline::run(&config, std::io::stdout().lock())?;
//! ```

pub mod args;
pub mod error;
pub mod header;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod region;
pub mod sources;
pub mod tagging;

// Re-export commonly used items
pub use args::Args;
pub use error::{AddRgError, ErrorKind, Result};
pub use header::merge_read_groups;
pub use io::{Compression, MergedReader, SortOrder};
pub use pipeline::{RunConfig, run};
pub use region::{Interval, RegionSpec, ResolvedRegion};
pub use sources::{ReadGroupLookup, SourceSpec, SourceToken, resolve_sources};
pub use tagging::{RunSummary, SourcedRecord, rewrite_tags};
