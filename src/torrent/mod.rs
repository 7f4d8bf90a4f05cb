pub mod error;
pub mod metadata;

pub use error::{FileEntryWarning, MalformedFileEntry, TorrentError};
pub use metadata::{
    extract, extract_files, extract_files_from_info, FileEntry, FileListing, Torrent,
    TorrentMetadata,
};
