use std::{fs::File, io::Read, path::Path};

use log::{debug, warn};
use serde::Serialize;

use crate::bencode::{decode_torrent, BValue, DecodeOptions};
use crate::hierarchy::{build_for, HierarchyNode};
use crate::torrent::error::{FileEntryWarning, MalformedFileEntry, TorrentError};
use crate::utils::text::{as_lossy_components, as_lossy_text, lossy};

/// Everything a .torrent file describes, decoded and cross-checked.
#[derive(Debug, Clone)]
pub struct Torrent {
    pub metadata: TorrentMetadata,  // Summary fields
    pub files: FileListing,         // Flat file list, plus skipped entries
    pub hierarchy: HierarchyNode,   // Directory tree rebuilt from `files`
}

/// Summary fields of a torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TorrentMetadata {
    #[serde(serialize_with = "as_lossy_text")]
    pub name: Vec<u8>,                      // Raw bytes of info["name"]
    pub announce_url: Option<String>,       // The tracker URL
    pub announce_list: Vec<Vec<String>>,    // Tracker tiers, if any
    pub created_by: Option<String>,
    pub creation_date: Option<i64>,         // POSIX seconds
    pub comment: Option<String>,
    pub encoding: Option<String>,
    pub is_multi_file: bool,
    pub piece_length: i64,                  // Informational only
    pub piece_count: usize,                 // SHA-1 hashes are 20 bytes each
    pub private: bool,
}

/// One file of the torrent, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    #[serde(rename = "path", serialize_with = "as_lossy_components")]
    pub path_components: Vec<Vec<u8>>,
    pub size: u64,
}

impl FileEntry {
    /// Path components joined with `/`, decoded lossily.
    pub fn joined_path(&self) -> String {
        self.path_components
            .iter()
            .map(|c| lossy(c))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// The usable file entries of a torrent and the ones that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    pub entries: Vec<FileEntry>,
    pub warnings: Vec<FileEntryWarning>,
}

impl FileListing {
    /// Sum of all entry sizes, or `None` if it does not fit in a `u64`.
    pub fn total_size(&self) -> Option<u64> {
        self.entries
            .iter()
            .try_fold(0u64, |total, e| total.checked_add(e.size))
    }
}

enum Layout<'a> {
    Multi(&'a [BValue]),
    Single(&'a BValue),
}

impl Torrent {
    /// Attempts to read a .torrent file from disk and parse its contents.
    pub fn from_file<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self, TorrentError> {
        let mut file = File::open(path)?;
        let mut buf = Vec::new();

        // Read the file as raw bytes
        file.read_to_end(&mut buf)?;

        Self::from_bytes(&buf, options)
    }

    /// Runs the whole pipeline over an in-memory .torrent buffer.
    pub fn from_bytes(buf: &[u8], options: DecodeOptions) -> Result<Self, TorrentError> {
        let root = decode_torrent(buf, options)?;
        Self::from_bvalue(&root)
    }

    /// Creates a `Torrent` from a decoded top-level dictionary.
    pub fn from_bvalue(root: &BValue) -> Result<Self, TorrentError> {
        let metadata = extract(root)?;
        let files = extract_files(root)?;
        let hierarchy = build_for(&metadata, &files.entries)?;

        Ok(Torrent {
            metadata,
            files,
            hierarchy,
        })
    }
}

/// Reads the summary fields. Optional fields of the wrong type are treated
/// as absent.
pub fn extract(root: &BValue) -> Result<TorrentMetadata, TorrentError> {
    let info = info_dict(root)?;
    let name = lookup_name(info)?;
    let is_multi_file = matches!(file_layout(info)?, Layout::Multi(_));

    let piece_count = info
        .get(b"pieces")
        .and_then(BValue::as_bytes)
        .map_or(0, |pieces| pieces.len() / 20);

    Ok(TorrentMetadata {
        name: name.to_vec(),
        announce_url: get_text(root, b"announce"),
        announce_list: get_announce_list(root),
        created_by: get_text(root, b"created by"),
        creation_date: root.get(b"creation date").and_then(BValue::as_integer),
        comment: get_text(root, b"comment"),
        encoding: get_text(root, b"encoding"),
        is_multi_file,
        piece_length: info
            .get(b"piece length")
            .and_then(BValue::as_integer)
            .unwrap_or(0),
        piece_count,
        private: info.get(b"private").and_then(BValue::as_integer) == Some(1),
    })
}

/// Lists the files of the torrent described by `root`.
pub fn extract_files(root: &BValue) -> Result<FileListing, TorrentError> {
    extract_files_from_info(info_dict(root)?)
}

/// Lists the files described by an info dictionary.
///
/// A single-file torrent yields exactly one entry named after the torrent.
/// In a multi-file torrent, malformed entries are skipped and reported as
/// warnings so the rest of the listing survives. Sizes that add up past
/// `u64::MAX` fail the whole listing.
pub fn extract_files_from_info(info: &BValue) -> Result<FileListing, TorrentError> {
    let name = lookup_name(info)?;

    let listing = match file_layout(info)? {
        Layout::Single(length) => {
            let size = entry_size(Some(length))
                .map_err(|reason| TorrentError::MalformedFileEntry { index: 0, reason })?;
            FileListing {
                entries: vec![FileEntry {
                    path_components: vec![name.to_vec()],
                    size,
                }],
                warnings: Vec::new(),
            }
        }
        Layout::Multi(items) => {
            let mut listing = FileListing::default();
            for (index, item) in items.iter().enumerate() {
                match file_entry(item) {
                    Ok(entry) => listing.entries.push(entry),
                    Err(reason) => {
                        let warning = FileEntryWarning { index, reason };
                        warn!("{}", warning);
                        listing.warnings.push(warning);
                    }
                }
            }
            if listing.total_size().is_none() {
                return Err(TorrentError::SizeOverflow);
            }
            listing
        }
    };

    debug!(
        "extracted {} file entries ({} skipped)",
        listing.entries.len(),
        listing.warnings.len()
    );
    Ok(listing)
}

fn info_dict(root: &BValue) -> Result<&BValue, TorrentError> {
    root.get(b"info")
        .filter(|info| info.as_dict().is_some())
        .ok_or(TorrentError::MissingInfoDict)
}

fn lookup_name(info: &BValue) -> Result<&[u8], TorrentError> {
    info.get(b"name")
        .and_then(BValue::as_bytes)
        .ok_or(TorrentError::MissingName)
}

/// `files` wins over `length` when both are present.
fn file_layout(info: &BValue) -> Result<Layout<'_>, TorrentError> {
    if let Some(files) = info.get(b"files") {
        return files
            .as_list()
            .map(Layout::Multi)
            .ok_or(TorrentError::MalformedFileList);
    }
    info.get(b"length")
        .map(Layout::Single)
        .ok_or(TorrentError::AmbiguousFileLayout)
}

fn file_entry(item: &BValue) -> Result<FileEntry, MalformedFileEntry> {
    if item.as_dict().is_none() {
        return Err(MalformedFileEntry::NotADictionary);
    }

    let path = item
        .get(b"path")
        .ok_or(MalformedFileEntry::MissingPath)?
        .as_list()
        .ok_or(MalformedFileEntry::PathNotAList)?;
    if path.is_empty() {
        return Err(MalformedFileEntry::EmptyPath);
    }

    let path_components = path
        .iter()
        .enumerate()
        .map(|(i, component)| {
            component
                .as_bytes()
                .map(<[u8]>::to_vec)
                .ok_or(MalformedFileEntry::NonStringComponent(i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let size = entry_size(item.get(b"length"))?;
    Ok(FileEntry {
        path_components,
        size,
    })
}

fn entry_size(length: Option<&BValue>) -> Result<u64, MalformedFileEntry> {
    let length = length
        .and_then(BValue::as_integer)
        .ok_or(MalformedFileEntry::MissingLength)?;
    u64::try_from(length).map_err(|_| MalformedFileEntry::InvalidLength(length))
}

/// Gets an optional text field. Anything but a byte string counts as absent.
fn get_text(dict: &BValue, key: &[u8]) -> Option<String> {
    dict.get(key).and_then(BValue::as_bytes).map(lossy)
}

fn get_announce_list(root: &BValue) -> Vec<Vec<String>> {
    let Some(tiers) = root.get(b"announce-list").and_then(BValue::as_list) else {
        return Vec::new();
    };

    tiers
        .iter()
        .filter_map(BValue::as_list)
        .map(|tier| {
            tier.iter()
                .filter_map(BValue::as_bytes)
                .map(lossy)
                .collect::<Vec<_>>()
        })
        .filter(|tier| !tier.is_empty())
        .collect()
}
