pub mod bvalue;
pub mod decode;
pub mod error;

pub use bvalue::BValue;   // re-export
pub use decode::{decode_bencode, decode_bencode_at, decode_torrent, DecodeOptions, DEFAULT_MAX_DEPTH};   // re-export
pub use error::BencodeError;   // re-export
