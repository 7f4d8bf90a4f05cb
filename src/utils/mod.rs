pub mod text;

pub use text::{is_printable, lossy};
