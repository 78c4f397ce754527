//! Decompression of solc's `s:l:f:j:m` source maps.
//!
//! Entries are separated by `;` and fields by `:`. A missing or empty field takes the value of
//! the same field in the previous entry.

use serde::Serialize;
use std::fmt;

/// Index of the single authored source file in scope.
pub const AUTHORED_FILE_INDEX: u32 = 0;

/// The jump annotation of a source map entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Jump {
    /// A jump into a function.
    In,
    /// A jump out of a function.
    Out,
    /// A jump within the same function, or no jump at all.
    #[default]
    Regular,
}

impl Jump {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "i" => Some(Self::In),
            "o" => Some(Self::Out),
            "-" => Some(Self::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::In => "i",
            Self::Out => "o",
            Self::Regular => "-",
        })
    }
}

/// Source range of a single instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapEntry {
    /// Byte offset into the source file.
    pub start: u32,
    /// Length of the range in bytes.
    pub length: u32,
    /// Index of the source file, `None` when solc emitted `-1`.
    pub file_index: Option<u32>,
    /// Jump annotation. Kept for callers; resolution does not interpret it.
    pub jump: Jump,
    /// Modifier depth, if emitted.
    pub modifier_depth: Option<u32>,
}

impl SourceMapEntry {
    /// Returns true if the entry points into the authored source file.
    ///
    /// Every other entry belongs to code the compiler generated on its own, such as overflow
    /// checks or ABI decoders.
    #[inline]
    pub fn is_authored(&self) -> bool {
        self.file_index == Some(AUTHORED_FILE_INDEX)
    }
}

/// Error describing the first entry that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} `{value}` in source map entry {entry}")]
pub struct SourceMapError {
    /// Position of the entry, which is also its instruction index.
    pub entry: usize,
    /// Name of the field that failed to parse.
    pub field: &'static str,
    /// The raw field value.
    pub value: String,
}

/// A decompressed source map, one entry per instruction index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
    error: Option<SourceMapError>,
}

impl SourceMap {
    /// Decompresses `s`.
    ///
    /// Decompression stops at the first malformed entry; all earlier entries are kept and the
    /// error is retained, see [`SourceMap::error`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let mut entries = Vec::new();
        if s.is_empty() {
            return Self { entries, error: None };
        }

        let mut prev = Fields { start: Some(0), length: Some(0), ..Default::default() };
        for (idx, raw) in s.split(';').enumerate() {
            match parse_entry(idx, raw, &prev) {
                Ok(fields) => {
                    entries.push(fields.entry());
                    prev = fields;
                }
                Err(err) => {
                    warn!(%err, parsed = entries.len(), "source map truncated");
                    return Self { entries, error: Some(err) };
                }
            }
        }
        trace!(entries = entries.len(), "decompressed source map");
        Self { entries, error: None }
    }

    /// Returns the entry for instruction index `ic`.
    #[inline]
    pub fn get(&self, ic: usize) -> Option<&SourceMapEntry> {
        self.entries.get(ic)
    }

    /// Returns all decompressed entries.
    pub fn entries(&self) -> &[SourceMapEntry] {
        &self.entries
    }

    /// Number of decompressed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries were decompressed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the error that ended decompression early, if any.
    pub fn error(&self) -> Option<&SourceMapError> {
        self.error.as_ref()
    }

    /// Consumes the map, returning its entries.
    pub fn into_entries(self) -> Vec<SourceMapEntry> {
        self.entries
    }
}

/// Decompresses `s` into one entry per instruction index, see [`SourceMap::parse`].
pub fn parse_source_map(s: &str) -> Vec<SourceMapEntry> {
    SourceMap::parse(s).into_entries()
}

/// Field values as written in the map, which is what later entries inherit.
#[derive(Clone, Debug, Default)]
struct Fields {
    start: Option<u32>,
    length: Option<u32>,
    file_index: Option<u32>,
    jump: Jump,
    modifier_depth: Option<u32>,
    /// Last non-negative offsets, reported for entries without a range.
    last_start: u32,
    last_length: u32,
}

impl Fields {
    fn entry(&self) -> SourceMapEntry {
        // solc writes `-1` for ranges that have no source at all
        let has_range = self.start.is_some() && self.length.is_some();
        SourceMapEntry {
            start: self.start.unwrap_or(self.last_start),
            length: self.length.unwrap_or(self.last_length),
            file_index: self.file_index.filter(|_| has_range),
            jump: self.jump,
            modifier_depth: self.modifier_depth,
        }
    }
}

fn parse_entry(idx: usize, raw: &str, prev: &Fields) -> Result<Fields, SourceMapError> {
    let mut fields = raw.split(':');
    let mut next = || fields.next().filter(|f| !f.is_empty());
    let err = |field, value: &str| SourceMapError { entry: idx, field, value: value.to_string() };

    let start = next().map(|v| parse_offset(v).ok_or_else(|| err("start", v))).transpose()?;
    let length = next().map(|v| parse_offset(v).ok_or_else(|| err("length", v))).transpose()?;
    let file_index =
        next().map(|v| parse_offset(v).ok_or_else(|| err("file index", v))).transpose()?;
    let jump = next().map(|v| Jump::parse(v).ok_or_else(|| err("jump", v))).transpose()?;
    let modifier_depth =
        next().map(|v| v.parse::<u32>().map_err(|_| err("modifier depth", v))).transpose()?;

    let start = start.unwrap_or(prev.start);
    let length = length.unwrap_or(prev.length);
    Ok(Fields {
        start,
        length,
        file_index: file_index.unwrap_or(prev.file_index),
        jump: jump.unwrap_or(prev.jump),
        modifier_depth: modifier_depth.or(prev.modifier_depth),
        last_start: start.unwrap_or(prev.last_start),
        last_length: length.unwrap_or(prev.last_length),
    })
}

/// Parses a non-negative integer or solc's `-1` marker, which becomes `Some(None)`.
fn parse_offset(s: &str) -> Option<Option<u32>> {
    if s == "-1" {
        return Some(None);
    }
    s.parse().ok().map(Some)
}
