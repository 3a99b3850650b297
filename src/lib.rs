//! # Huffpack
//!
//! Two-pass Huffman compression of arbitrary byte streams.
//! The first pass counts byte frequencies, the second pass writes the
//! prefix codes.  The container holds the serialized code tree, so the
//! expansion side needs nothing but the compressed file.
//!
//! * `huffman` has the file level `compress` and `expand` functions
//! * `tools` has the building blocks (bit I/O, frequencies, tree, codes)
//! * `display` renders the building blocks for diagnostics

pub mod tools;
pub mod huffman;
pub mod display;

pub use tools::freq::FrequencyTable;
pub use tools::huff_tree::{HuffTree,Node};
pub use tools::code_table::CodeTable;

/// Huffman Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot build a tree without symbols")]
    EmptyAlphabet,
    #[error("tree framing is malformed")]
    MalformedTree,
    #[error("source length changed between passes")]
    SourceLengthChanged,
    #[error("ran out of bits before all symbols were decoded")]
    UnexpectedEndOfBits,
    #[error("file too large")]
    FileTooLarge
}
