//! Building blocks for the Huffman stages.

pub mod bit_stream;
pub mod freq;
pub mod huff_tree;
pub mod code_table;
