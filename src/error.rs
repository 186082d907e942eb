//! Error types for the merge-and-tag run
//!
//! Every failure is fatal: the run stops at the first error and the process
//! exits with status 1. [`ErrorKind`] groups the variants the way they are
//! reported.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AddRgError>;

/// Broad classification of an [`AddRgError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad options, no inputs, or a region that cannot be honoured
    Configuration,
    /// An input or the output could not be opened or read
    Open,
    /// A record's RG tag could not be set
    Tag,
    /// The writer rejected a record
    Write,
}

#[derive(Error, Debug)]
pub enum AddRgError {
    #[error("no input files specified")]
    NoInputs,

    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("input file '{0}' was given more than once")]
    DuplicateInput(String),

    #[error("invalid region '{region}': {reason}")]
    InvalidRegion { region: String, reason: String },

    #[error("reference sequence '{0}' not found in header")]
    ReferenceNotFound(String),

    #[error("could not load index for '{path}': {source}")]
    IndexUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("could not open input BAM file '{path}': {source}")]
    OpenInput {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("reference sequences of '{path}' do not match those of '{first}'")]
    ReferenceMismatch { path: String, first: String },

    #[error("could not open BAM output stream: {0}")]
    OpenOutput(#[source] io::Error),

    #[error("failed to read alignment from '{path}': {source}")]
    ReadRecord {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid header: {0}")]
    Header(String),

    #[error("could not add or edit RG tag on alignment {name}: {reason}")]
    Tag { name: String, reason: String },

    #[error("could not write alignment {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("could not finish BAM output stream: {0}")]
    Finish(#[source] io::Error),
}

impl AddRgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoInputs
            | Self::InvalidArgument { .. }
            | Self::DuplicateInput(_)
            | Self::InvalidRegion { .. }
            | Self::ReferenceNotFound(_)
            | Self::IndexUnavailable { .. } => ErrorKind::Configuration,
            Self::OpenInput { .. }
            | Self::ReferenceMismatch { .. }
            | Self::OpenOutput(_)
            | Self::ReadRecord { .. }
            | Self::Header(_) => ErrorKind::Open,
            Self::Tag { .. } => ErrorKind::Tag,
            Self::Write { .. } | Self::Finish(_) => ErrorKind::Write,
        }
    }

    pub(crate) fn invalid_region(region: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRegion {
            region: region.to_string(),
            reason: reason.into(),
        }
    }
}
