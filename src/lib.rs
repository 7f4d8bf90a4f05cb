// lib.rs - Library interface for torrentinfo

pub mod bencode;
pub mod config;
pub mod hierarchy;
pub mod render;
pub mod torrent;
pub mod utils;
pub mod view;

// Re-export commonly used types for easier testing
pub use bencode::{decode_bencode, decode_torrent, BValue, BencodeError, DecodeOptions};
pub use config::{Config, ConfigError};
pub use hierarchy::{build, build_for, HierarchyError, HierarchyNode};
pub use render::Renderer;
pub use torrent::{
    extract, extract_files, FileEntry, FileEntryWarning, FileListing, Torrent, TorrentError,
    TorrentMetadata,
};
pub use view::{select_view, ViewMode, ViewPayload};
