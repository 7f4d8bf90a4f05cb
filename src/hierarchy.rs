//! Rebuilds the directory tree of a torrent from its flat file list.

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::torrent::{FileEntry, TorrentMetadata};
use crate::utils::text::lossy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("'{path}' is used both as a file and as a directory")]
    ConflictingPathEntry { path: String },

    #[error("File entry has an empty path")]
    EmptyPath,

    #[error("Total size of '{name}' does not fit in 64 bits")]
    SizeOverflow { name: String },
}

/// A node of the rebuilt file tree. Children keep the order in which the
/// torrent listed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyNode {
    File {
        name: Vec<u8>,
        size: u64,
    },
    Directory {
        name: Vec<u8>,
        children: IndexMap<Vec<u8>, HierarchyNode>,
        aggregate_size: u64,
    },
}

impl HierarchyNode {
    pub fn name(&self) -> &[u8] {
        match self {
            HierarchyNode::File { name, .. } | HierarchyNode::Directory { name, .. } => name,
        }
    }

    /// File size, or the precomputed total of everything below a directory.
    pub fn size(&self) -> u64 {
        match self {
            HierarchyNode::File { size, .. } => *size,
            HierarchyNode::Directory { aggregate_size, .. } => *aggregate_size,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, HierarchyNode::Directory { .. })
    }

    /// Immediate children in listing order. Files have none.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &HierarchyNode> {
        let children = match self {
            HierarchyNode::Directory { children, .. } => Some(children.values()),
            HierarchyNode::File { .. } => None,
        };
        children.into_iter().flatten()
    }

    pub fn child(&self, name: &[u8]) -> Option<&HierarchyNode> {
        match self {
            HierarchyNode::Directory { children, .. } => children.get(name),
            HierarchyNode::File { .. } => None,
        }
    }

    /// Pre-order traversal yielding each node with its depth (root is 0).
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }
}

// Path lists are not bounded by the decoder's nesting limit, so a tree can be
// arbitrarily deep. Tear it down with a heap stack instead of recursion.
impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        if let HierarchyNode::Directory { children, .. } = self {
            stack.extend(std::mem::take(children).into_values());
        }
        while let Some(mut node) = stack.pop() {
            if let HierarchyNode::Directory { children, .. } = &mut node {
                stack.extend(std::mem::take(children).into_values());
            }
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a HierarchyNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a HierarchyNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Builds a directory named `root_name` holding every entry of `files`.
///
/// Intermediate directories are created on first use and reused afterwards.
/// Aggregate sizes are filled in by a single pass once every entry is placed.
pub fn build(files: &[FileEntry], root_name: &[u8]) -> Result<HierarchyNode, HierarchyError> {
    let mut arena = Arena::default();
    for entry in files {
        arena.insert(&entry.path_components, entry.size)?;
    }
    let tree = arena.finish(root_name.to_vec())?;
    debug!(
        "built hierarchy for {} files, {} bytes total",
        files.len(),
        tree.size()
    );
    Ok(tree)
}

/// Builds the tree a torrent's layout calls for: a lone file node for a
/// single-file torrent, otherwise a directory named after the torrent.
pub fn build_for(
    metadata: &TorrentMetadata,
    files: &[FileEntry],
) -> Result<HierarchyNode, HierarchyError> {
    match files {
        [only] if !metadata.is_multi_file => Ok(HierarchyNode::File {
            name: metadata.name.clone(),
            size: only.size,
        }),
        _ => build(files, &metadata.name),
    }
}

type Entries = IndexMap<Vec<u8>, usize>;

enum SlotKind {
    File(u64),
    Dir(Entries),
}

struct Slot {
    name: Vec<u8>,
    kind: SlotKind,
}

/// The tree under construction, flattened. `None` addresses the root; every
/// other node lives in `slots`, always after its parent.
#[derive(Default)]
struct Arena {
    root: Entries,
    slots: Vec<Slot>,
}

impl Arena {
    fn entries(&self, dir: Option<usize>) -> Option<&Entries> {
        match dir {
            None => Some(&self.root),
            Some(index) => match &self.slots[index].kind {
                SlotKind::Dir(entries) => Some(entries),
                SlotKind::File(_) => None,
            },
        }
    }

    fn push(&mut self, dir: Option<usize>, name: &[u8], kind: SlotKind) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            name: name.to_vec(),
            kind,
        });
        let entries = match dir {
            None => Some(&mut self.root),
            Some(parent) => match &mut self.slots[parent].kind {
                SlotKind::Dir(entries) => Some(entries),
                SlotKind::File(_) => None,
            },
        };
        if let Some(entries) = entries {
            entries.insert(name.to_vec(), index);
        }
        index
    }

    fn insert(&mut self, components: &[Vec<u8>], size: u64) -> Result<(), HierarchyError> {
        let (leaf, parents) = components.split_last().ok_or(HierarchyError::EmptyPath)?;

        let mut dir = None;
        for (i, component) in parents.iter().enumerate() {
            let existing = self
                .entries(dir)
                .and_then(|entries| entries.get(component.as_slice()).copied());
            let next = match existing {
                Some(index) => match self.slots[index].kind {
                    SlotKind::Dir(_) => index,
                    SlotKind::File(_) => {
                        return Err(HierarchyError::ConflictingPathEntry {
                            path: join(&components[..=i]),
                        })
                    }
                },
                None => self.push(dir, component, SlotKind::Dir(Entries::new())),
            };
            dir = Some(next);
        }

        let taken = self
            .entries(dir)
            .map_or(false, |entries| entries.contains_key(leaf.as_slice()));
        if taken {
            return Err(HierarchyError::ConflictingPathEntry {
                path: join(components),
            });
        }
        self.push(dir, leaf, SlotKind::File(size));
        Ok(())
    }

    /// Children always sit after their parent, so walking the slots backwards
    /// finishes every child before the directory that holds it.
    fn finish(self, root_name: Vec<u8>) -> Result<HierarchyNode, HierarchyError> {
        let mut built: Vec<Option<HierarchyNode>> = Vec::new();
        built.resize_with(self.slots.len(), || None);

        for (index, slot) in self.slots.into_iter().enumerate().rev() {
            let node = match slot.kind {
                SlotKind::File(size) => HierarchyNode::File {
                    name: slot.name,
                    size,
                },
                SlotKind::Dir(entries) => directory(slot.name, entries, &mut built)?,
            };
            built[index] = Some(node);
        }
        directory(root_name, self.root, &mut built)
    }
}

fn directory(
    name: Vec<u8>,
    entries: Entries,
    built: &mut [Option<HierarchyNode>],
) -> Result<HierarchyNode, HierarchyError> {
    let mut children = IndexMap::with_capacity(entries.len());
    let mut aggregate_size: u64 = 0;
    for (child_name, index) in entries {
        let Some(node) = built[index].take() else {
            continue;
        };
        aggregate_size = aggregate_size
            .checked_add(node.size())
            .ok_or_else(|| HierarchyError::SizeOverflow { name: lossy(&name) })?;
        children.insert(child_name, node);
    }
    Ok(HierarchyNode::Directory {
        name,
        children,
        aggregate_size,
    })
}

fn join(components: &[Vec<u8>]) -> String {
    components
        .iter()
        .map(|c| lossy(c))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &[&str], size: u64) -> FileEntry {
        FileEntry {
            path_components: path.iter().map(|c| c.as_bytes().to_vec()).collect(),
            size,
        }
    }

    fn names(node: &HierarchyNode) -> Vec<String> {
        node.children().map(|c| lossy(c.name())).collect()
    }

    #[test]
    fn test_single_nested_file() {
        let tree = build(&[entry(&["a", "b"], 10)], b"X").unwrap();
        assert_eq!(tree.name(), b"X");
        assert_eq!(tree.size(), 10);

        let a = tree.child(b"a").unwrap();
        assert!(a.is_directory());
        assert_eq!(a.size(), 10);

        let b = a.child(b"b").unwrap();
        assert_eq!(
            b,
            &HierarchyNode::File {
                name: b"b".to_vec(),
                size: 10
            }
        );
    }

    #[test]
    fn test_directories_are_reused_and_aggregated() {
        let files = vec![
            entry(&["docs", "readme.txt"], 100),
            entry(&["src", "main.rs"], 2_000),
            entry(&["docs", "guide", "intro.md"], 50),
            entry(&["LICENSE"], 7),
        ];
        let tree = build(&files, b"project").unwrap();

        assert_eq!(tree.size(), 2_157);
        assert_eq!(names(&tree), vec!["docs", "src", "LICENSE"]);

        let docs = tree.child(b"docs").unwrap();
        assert_eq!(docs.size(), 150);
        assert_eq!(names(docs), vec!["readme.txt", "guide"]);
        assert_eq!(docs.child(b"guide").unwrap().size(), 50);
    }

    #[test]
    fn test_root_children_sum_to_file_total() {
        let files = vec![
            entry(&["a", "1"], 3),
            entry(&["a", "2"], 4),
            entry(&["b"], 5),
            entry(&["c", "d", "e"], 0),
        ];
        let tree = build(&files, b"root").unwrap();
        let from_children: u64 = tree.children().map(HierarchyNode::size).sum();
        let from_files: u64 = files.iter().map(|f| f.size).sum();
        assert_eq!(from_children, from_files);
    }

    #[test]
    fn test_aggregate_size_overflow_is_an_error() {
        let half = u64::MAX / 2 + 1;
        let files = vec![entry(&["a"], half), entry(&["b", "c"], half)];
        assert_eq!(
            build(&files, b"root"),
            Err(HierarchyError::SizeOverflow {
                name: "root".to_string()
            })
        );

        let nested = vec![entry(&["d", "x"], u64::MAX), entry(&["d", "y"], 1)];
        assert_eq!(
            build(&nested, b"root"),
            Err(HierarchyError::SizeOverflow {
                name: "d".to_string()
            })
        );
    }

    #[test]
    fn test_largest_total_still_fits() {
        let files = vec![entry(&["a"], u64::MAX - 1), entry(&["b"], 1)];
        assert_eq!(build(&files, b"root").unwrap().size(), u64::MAX);
    }

    #[test]
    fn test_build_is_idempotent() {
        let files = vec![entry(&["x", "y"], 1), entry(&["x", "z"], 2), entry(&["w"], 3)];
        let first = build(&files, b"t").unwrap();
        let second = build(&files, b"t").unwrap();
        assert_eq!(first, second);
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_file_then_directory_conflicts() {
        let files = vec![entry(&["a"], 1), entry(&["a", "b"], 2)];
        assert_eq!(
            build(&files, b"t"),
            Err(HierarchyError::ConflictingPathEntry {
                path: "a".to_string()
            })
        );
    }

    #[test]
    fn test_directory_then_file_conflicts() {
        let files = vec![entry(&["a", "b"], 2), entry(&["a"], 1)];
        assert!(matches!(
            build(&files, b"t"),
            Err(HierarchyError::ConflictingPathEntry { .. })
        ));
    }

    #[test]
    fn test_duplicate_file_conflicts() {
        let files = vec![entry(&["a", "b"], 2), entry(&["a", "b"], 2)];
        assert_eq!(
            build(&files, b"t"),
            Err(HierarchyError::ConflictingPathEntry {
                path: "a/b".to_string()
            })
        );
    }

    #[test]
    fn test_empty_path_rejected() {
        let files = vec![FileEntry {
            path_components: vec![],
            size: 1,
        }];
        assert_eq!(build(&files, b"t"), Err(HierarchyError::EmptyPath));
    }

    #[test]
    fn test_very_deep_path_builds() {
        let depth = 100_000;
        let path: Vec<&str> = std::iter::repeat("d").take(depth).collect();
        let tree = build(&[entry(&path, 1)], b"t").unwrap();
        assert_eq!(tree.size(), 1);

        let (deepest, leaf) = tree.walk().last().unwrap();
        assert_eq!(deepest, depth);
        assert!(!leaf.is_directory());
        assert_eq!(tree.walk().filter(|(_, n)| n.size() == 1).count(), depth + 1);
    }

    #[test]
    fn test_empty_file_list_gives_empty_root() {
        let tree = build(&[], b"empty").unwrap();
        assert!(tree.is_directory());
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.children().count(), 0);
    }

    #[test]
    fn test_walk_is_preorder_with_depths() {
        let files = vec![entry(&["a", "b"], 1), entry(&["c"], 2)];
        let tree = build(&files, b"r").unwrap();
        let visited: Vec<(usize, String)> =
            tree.walk().map(|(d, n)| (d, lossy(n.name()))).collect();
        let expected = [(0, "r"), (1, "a"), (2, "b"), (1, "c")]
            .iter()
            .map(|(d, n)| (*d, n.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_build_for_single_file_degenerates() {
        let metadata = TorrentMetadata {
            name: b"a.txt".to_vec(),
            is_multi_file: false,
            ..TorrentMetadata::default()
        };
        let tree = build_for(&metadata, &[entry(&["a.txt"], 100)]).unwrap();
        assert_eq!(
            tree,
            HierarchyNode::File {
                name: b"a.txt".to_vec(),
                size: 100
            }
        );
    }

    #[test]
    fn test_build_for_multi_file_single_entry_stays_directory() {
        let metadata = TorrentMetadata {
            name: b"X".to_vec(),
            is_multi_file: true,
            ..TorrentMetadata::default()
        };
        let tree = build_for(&metadata, &[entry(&["only.bin"], 9)]).unwrap();
        assert!(tree.is_directory());
        assert_eq!(names(&tree), vec!["only.bin"]);
    }
}
