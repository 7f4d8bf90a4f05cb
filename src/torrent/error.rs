use serde::Serialize;
use thiserror::Error;

use crate::bencode::BencodeError;
use crate::hierarchy::HierarchyError;
use crate::utils::text::as_display;

/// Fatal problems with a torrent. Any of these stops processing of that file.
#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("Missing 'info' dictionary")]
    MissingInfoDict,

    #[error("Missing 'name' in info dictionary")]
    MissingName,

    #[error("Info dictionary has neither 'files' nor 'length'")]
    AmbiguousFileLayout,

    #[error("'files' must be a list")]
    MalformedFileList,

    #[error("Malformed file entry {index}: {reason}")]
    MalformedFileEntry { index: usize, reason: MalformedFileEntry },

    #[error("File sizes add up to more than {} bytes", u64::MAX)]
    SizeOverflow,

    #[error("Bencode error: {0}")]
    Bencode(#[from] BencodeError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single entry of the `files` list couldn't be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedFileEntry {
    #[error("entry is not a dictionary")]
    NotADictionary,

    #[error("missing 'path'")]
    MissingPath,

    #[error("'path' is not a list")]
    PathNotAList,

    #[error("'path' is empty")]
    EmptyPath,

    #[error("path component {0} is not a byte string")]
    NonStringComponent(usize),

    #[error("missing or non-integer 'length'")]
    MissingLength,

    #[error("negative length {0}")]
    InvalidLength(i64),
}

/// A `files` entry that was skipped during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntryWarning {
    pub index: usize,
    #[serde(serialize_with = "as_display")]
    pub reason: MalformedFileEntry,
}

impl std::fmt::Display for FileEntryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped file entry {}: {}", self.index, self.reason)
    }
}
