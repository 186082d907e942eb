//! Region expressions
//!
//! Accepted forms, with 0-based coordinates and an exclusive stop:
//!
//! - `NAME` - the whole reference
//! - `NAME:POS` - the single base at `POS`
//! - `NAME:START..` - from `START` to the end of the reference
//! - `NAME:START..STOP` - `[START, STOP)`
//!
//! An expression that is exactly a reference name always means that whole
//! reference, even when the name contains `:`.

use std::collections::HashMap;

use noodles::core::{Position, Region};
use noodles::sam::Header;

use crate::error::{AddRgError, Result};

/// The `NAME[:START[..[STOP]]]` reading of a region expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub reference_name: String,
    pub start: u64,
    /// `None` means "to the end of the reference"
    pub stop: Option<u64>,
}

impl Interval {
    fn whole(reference_name: &str) -> Self {
        Self {
            reference_name: reference_name.to_string(),
            start: 0,
            stop: None,
        }
    }
}

/// A region expression, not yet checked against any header.
///
/// Reference names may themselves contain `:`, so the expression is only
/// split into name and coordinates when it is not an exact reference name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    expression: String,
    interval: std::result::Result<Interval, String>,
}

/// A region checked against the reference table, with a concrete stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub reference_index: usize,
    pub reference_name: String,
    pub start: u64,
    pub stop: u64,
}

/// Reference name -> (index, length), built once from the merged header
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    by_name: HashMap<String, (usize, u64)>,
}

impl ReferenceTable {
    pub fn from_header(header: &Header) -> Self {
        let by_name = header
            .reference_sequences()
            .iter()
            .enumerate()
            .map(|(i, (name, rs))| (name.to_string(), (i, rs.length().get() as u64)))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<(usize, u64)> {
        self.by_name.get(name).copied()
    }
}

fn parse_coordinate(text: &str) -> std::result::Result<u64, String> {
    let cleaned: String = text.chars().filter(|&c| c != ',').collect();
    cleaned
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("'{text}' is not a valid coordinate"))
}

fn split_interval(expression: &str) -> std::result::Result<Interval, String> {
    let Some((name, coords)) = expression.rsplit_once(':') else {
        return Ok(Interval::whole(expression));
    };

    if name.is_empty() {
        return Err("missing reference name".to_string());
    }
    if coords.is_empty() {
        return Err("missing position after ':'".to_string());
    }

    let (start, stop) = match coords.split_once("..") {
        None => {
            let pos = parse_coordinate(coords)?;
            (pos, Some(pos.saturating_add(1)))
        }
        Some((start, "")) => (parse_coordinate(start)?, None),
        Some((start, stop)) => (parse_coordinate(start)?, Some(parse_coordinate(stop)?)),
    };

    Ok(Interval {
        reference_name: name.to_string(),
        start,
        stop,
    })
}

impl RegionSpec {
    /// Read a region expression. An empty string means no region.
    pub fn parse(region: &str) -> Option<Self> {
        let expression = region.trim();
        if expression.is_empty() {
            return None;
        }

        Some(Self {
            expression: expression.to_string(),
            interval: split_interval(expression),
        })
    }

    /// Resolve the expression against the reference table.
    ///
    /// An exact reference name selects that whole reference. Otherwise the
    /// expression is read as `NAME:...`, and malformed coordinates are
    /// reported here. A stop past the end of the reference is clamped to
    /// its length.
    pub fn resolve(&self, references: &ReferenceTable) -> Result<ResolvedRegion> {
        let interval = if references.get(&self.expression).is_some() {
            Interval::whole(&self.expression)
        } else {
            self.interval
                .clone()
                .map_err(|reason| AddRgError::invalid_region(&self.expression, reason))?
        };

        let (reference_index, length) = references
            .get(&interval.reference_name)
            .ok_or_else(|| AddRgError::ReferenceNotFound(interval.reference_name.clone()))?;

        let stop = interval.stop.unwrap_or(length).min(length);
        if interval.start >= stop {
            return Err(AddRgError::invalid_region(
                &self.expression,
                format!("empty range [{}, {})", interval.start, stop),
            ));
        }

        Ok(ResolvedRegion {
            reference_index,
            reference_name: interval.reference_name,
            start: interval.start,
            stop,
        })
    }
}

impl std::fmt::Display for RegionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

impl ResolvedRegion {
    /// The 1-based, inclusive region used for index queries.
    pub fn to_query_region(&self) -> Result<Region> {
        let start = usize::try_from(self.start + 1)
            .ok()
            .and_then(Position::new)
            .ok_or_else(|| AddRgError::invalid_region(&self.reference_name, "start out of range"))?;
        let end = usize::try_from(self.stop)
            .ok()
            .and_then(Position::new)
            .ok_or_else(|| AddRgError::invalid_region(&self.reference_name, "stop out of range"))?;
        Ok(Region::new(self.reference_name.as_str(), start..=end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::header::record::value::Map;
    use noodles::sam::header::record::value::map::ReferenceSequence;
    use std::num::NonZeroUsize;

    fn references() -> ReferenceTable {
        let header = Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(1000).unwrap()),
            )
            .add_reference_sequence(
                "chr2",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(500).unwrap()),
            )
            .build();
        ReferenceTable::from_header(&header)
    }

    fn resolve(s: &str) -> ResolvedRegion {
        RegionSpec::parse(s).unwrap().resolve(&references()).unwrap()
    }

    fn resolve_err(s: &str) -> AddRgError {
        RegionSpec::parse(s).unwrap().resolve(&references()).unwrap_err()
    }

    fn hla_references() -> ReferenceTable {
        let header = Header::builder()
            .add_reference_sequence(
                "HLA-A*01:01:01:01",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(3000).unwrap()),
            )
            .build();
        ReferenceTable::from_header(&header)
    }

    #[test]
    fn test_empty_is_no_region() {
        assert_eq!(RegionSpec::parse(""), None);
        assert_eq!(RegionSpec::parse("   "), None);
    }

    #[test]
    fn test_name_only() {
        let r = resolve("chr1");
        assert_eq!((r.reference_index, r.start, r.stop), (0, 0, 1000));
    }

    #[test]
    fn test_single_position() {
        let r = resolve("chr1:100");
        assert_eq!((r.start, r.stop), (100, 101));
    }

    #[test]
    fn test_open_ended() {
        let r = resolve("chr2:100..");
        assert_eq!((r.reference_index, r.start, r.stop), (1, 100, 500));
    }

    #[test]
    fn test_closed_range() {
        let r = resolve("chr1:100..200");
        assert_eq!((r.start, r.stop), (100, 200));
    }

    #[test]
    fn test_thousands_separators() {
        let r = resolve("chr1:1,00..2,00");
        assert_eq!((r.start, r.stop), (100, 200));
    }

    #[test]
    fn test_stop_clamped_to_length() {
        let r = resolve("chr2:10..10000");
        assert_eq!(r.stop, 500);
    }

    #[test]
    fn test_reference_name_with_colons() {
        let references = hla_references();

        let r = RegionSpec::parse("HLA-A*01:01:01:01").unwrap().resolve(&references).unwrap();
        assert_eq!(r.reference_name, "HLA-A*01:01:01:01");
        assert_eq!((r.reference_index, r.start, r.stop), (0, 0, 3000));

        let r = RegionSpec::parse("HLA-A*01:01:01:01:100..200")
            .unwrap()
            .resolve(&references)
            .unwrap();
        assert_eq!(r.reference_name, "HLA-A*01:01:01:01");
        assert_eq!((r.start, r.stop), (100, 200));
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(matches!(resolve_err("chr1:abc"), AddRgError::InvalidRegion { .. }));
        assert!(matches!(resolve_err("chr1:10..x"), AddRgError::InvalidRegion { .. }));
    }

    #[test]
    fn test_missing_parts_rejected() {
        assert!(matches!(resolve_err(":10"), AddRgError::InvalidRegion { .. }));
        assert!(matches!(resolve_err("chr1:"), AddRgError::InvalidRegion { .. }));
    }

    #[test]
    fn test_unknown_reference() {
        assert!(matches!(resolve_err("chrZ:1..5"), AddRgError::ReferenceNotFound(ref n) if n == "chrZ"));
        assert!(matches!(resolve_err("chrZ"), AddRgError::ReferenceNotFound(ref n) if n == "chrZ"));
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(matches!(resolve_err("chr1:200..100"), AddRgError::InvalidRegion { .. }));
        assert!(matches!(resolve_err("chr2:600.."), AddRgError::InvalidRegion { .. }));
    }

    #[test]
    fn test_query_region_is_one_based_inclusive() {
        let region = resolve("chr1:100..200").to_query_region().unwrap();
        assert_eq!(region.name(), &b"chr1"[..]);
        assert_eq!(region.start(), std::ops::Bound::Included(Position::new(101).unwrap()));
        assert_eq!(region.end(), std::ops::Bound::Included(Position::new(200).unwrap()));
    }
}
