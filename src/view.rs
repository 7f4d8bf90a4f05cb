//! Picks which parts of a torrent a renderer gets to show.

use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyNode;
use crate::torrent::{FileEntry, TorrentMetadata};
use crate::utils::text::as_lossy_text;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Summary fields, total size and file count.
    #[default]
    Basic,
    /// Immediate children of the root with their sizes.
    TopLevelOnly,
    /// Summary fields plus every file entry.
    WithFiles,
    /// The whole tree, one row per node.
    FullDump,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopLevelEntry<'a> {
    #[serde(serialize_with = "as_lossy_text")]
    pub name: &'a [u8],
    pub size: u64,
    pub is_directory: bool,
}

/// A hierarchy node tagged with how deep it sits (the root is 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpRow<'a> {
    pub depth: usize,
    #[serde(serialize_with = "as_lossy_text")]
    pub name: &'a [u8],
    pub size: u64,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewPayload<'a> {
    Basic {
        metadata: &'a TorrentMetadata,
        total_size: u64,
        file_count: usize,
    },
    TopLevelOnly {
        metadata: &'a TorrentMetadata,
        entries: Vec<TopLevelEntry<'a>>,
    },
    WithFiles {
        metadata: &'a TorrentMetadata,
        files: &'a [FileEntry],
    },
    FullDump {
        metadata: &'a TorrentMetadata,
        #[serde(skip)]
        tree: &'a HierarchyNode,
        rows: Vec<DumpRow<'a>>,
    },
}

/// Selects the data for `mode`. No formatting happens here.
pub fn select_view<'a>(
    mode: ViewMode,
    metadata: &'a TorrentMetadata,
    files: &'a [FileEntry],
    hierarchy: &'a HierarchyNode,
) -> ViewPayload<'a> {
    match mode {
        ViewMode::Basic => ViewPayload::Basic {
            metadata,
            total_size: hierarchy.size(),
            file_count: files.len(),
        },
        ViewMode::TopLevelOnly => {
            let entries = if hierarchy.is_directory() {
                hierarchy.children().map(top_level_entry).collect()
            } else {
                vec![top_level_entry(hierarchy)]
            };
            ViewPayload::TopLevelOnly { metadata, entries }
        }
        ViewMode::WithFiles => ViewPayload::WithFiles { metadata, files },
        ViewMode::FullDump => ViewPayload::FullDump {
            metadata,
            tree: hierarchy,
            rows: hierarchy
                .walk()
                .map(|(depth, node)| DumpRow {
                    depth,
                    name: node.name(),
                    size: node.size(),
                    is_directory: node.is_directory(),
                })
                .collect(),
        },
    }
}

fn top_level_entry(node: &HierarchyNode) -> TopLevelEntry<'_> {
    TopLevelEntry {
        name: node.name(),
        size: node.size(),
        is_directory: node.is_directory(),
    }
}
