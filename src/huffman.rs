//! Two-pass Huffman Compression
//!
//! The first pass counts byte frequencies, the tree is built from the counts,
//! and the second pass writes the codes.  Container layout, all integers big endian:
//!
//! * u32 node count, 0 means the expanded data is empty and nothing follows
//! * node count records of 6 bytes each, postorder (see `tools::huff_tree`)
//! * u32 length of the expanded data
//! * packed codes, MSB first, the last byte is zero padded
//!
//! The number of payload bits is not stored, the decoder resolves exactly as many
//! symbols as the expanded length calls for.

use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufReader,BufWriter,ErrorKind};
use crate::tools::bit_stream::{BitReader,BitWriter};
use crate::tools::freq::FrequencyTable;
use crate::tools::huff_tree::{HuffTree,Record,RECORD_SIZE,MAX_NODES};
use crate::tools::code_table::CodeTable;
use crate::Error;

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64,
    /// return error if expanded data is larger, cannot usefully exceed u32::MAX
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    out_offset: 0,
    max_file_size: u32::MAX as u64
};

/// Statistics from one compression or expansion
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Summary {
    /// bytes consumed from the input, starting at the input offset
    pub in_size: u64,
    /// bytes produced in the output, starting at the output offset
    pub out_size: u64,
    /// number of nodes in the Huffman tree, 0 for empty data
    pub node_count: u32
}

/// An EOF inside the framing means the tree cannot be trusted
fn framing_err(e: std::io::Error) -> Error {
    if e.kind()==ErrorKind::UnexpectedEof {
        log::error!("compressed data ends inside the tree framing");
        return Error::MalformedTree;
    }
    Error::Io(e)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32,Error> {
    let mut buf: [u8;4] = [0;4];
    reader.read_exact(&mut buf).map_err(framing_err)?;
    Ok(u32::from_be_bytes(buf))
}

/// Seek to the end to find the length, then seek to `offset`.
fn length_from<S: Seek>(stream: &mut S,offset: u64) -> Result<u64,Error> {
    let end = stream.seek(SeekFrom::End(0))?;
    if offset > end {
        return Err(Error::Io(std::io::Error::new(ErrorKind::InvalidInput,"offset is beyond end of input")));
    }
    stream.seek(SeekFrom::Start(offset))?;
    Ok(end - offset)
}

/// Read the node count, tree records, and expanded length.
/// Returns `None` if the container holds empty data.
/// On success the reader is positioned at the start of the packed codes.
pub fn read_header<R: Read>(compressed_in: &mut R) -> Result<Option<(HuffTree,u32)>,Error> {
    let node_count = read_u32(compressed_in)?;
    if node_count == 0 {
        return Ok(None);
    }
    if node_count as usize > MAX_NODES {
        log::error!("node count {} exceeds maximum",node_count);
        return Err(Error::MalformedTree);
    }
    let mut records = Vec::with_capacity(node_count as usize);
    let mut buf: [u8;RECORD_SIZE] = [0;RECORD_SIZE];
    for _i in 0..node_count {
        compressed_in.read_exact(&mut buf).map_err(framing_err)?;
        records.push(Record::from_bytes(&buf)?);
    }
    let tree = HuffTree::deserialize(&records,node_count as usize)?;
    let expanded_length = read_u32(compressed_in)?;
    log::debug!("read tree with {} nodes, expanded length {}",node_count,expanded_length);
    Ok(Some((tree,expanded_length)))
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// The input is read twice, if it changes in between the result is `SourceLengthChanged`.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<Summary,Error>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BufWriter::new(compressed_out);
    let max_size = opt.max_file_size.min(u32::MAX as u64);
    if length_from(&mut reader,opt.in_offset)? > max_size {
        return Err(Error::FileTooLarge);
    }
    writer.seek(SeekFrom::Start(opt.out_offset))?;

    log::debug!("counting symbols");
    let freq = FrequencyTable::scan(&mut reader)?;
    if freq.total() > max_size {
        return Err(Error::FileTooLarge);
    }
    if freq.is_empty() {
        log::debug!("empty input, writing null tree");
        writer.write_all(&u32::to_be_bytes(0))?;
        writer.flush()?;
        return Ok(Summary {
            in_size: 0,
            out_size: writer.stream_position()? - opt.out_offset,
            node_count: 0
        });
    }
    let tree = HuffTree::build(&freq)?;
    let codes = CodeTable::from_tree(&tree);
    let records = tree.serialize()?;
    // at most MAX_NODES records
    let node_count = records.len() as u32;
    writer.write_all(&u32::to_be_bytes(node_count))?;
    for rec in &records {
        writer.write_all(&rec.to_bytes())?;
    }
    // total was checked against max_size
    writer.write_all(&u32::to_be_bytes(freq.total() as u32))?;
    log::debug!("wrote tree with {} nodes",node_count);

    log::debug!("encoding symbols");
    reader.seek(SeekFrom::Start(opt.in_offset))?;
    let mut bits = BitWriter::new(&mut writer);
    let mut consumed: u64 = 0;
    for maybe_byte in (&mut reader).bytes() {
        let byte = maybe_byte?;
        consumed += 1;
        let code = match (consumed > freq.total(),codes.get(byte)) {
            (false,Some(code)) => code,
            _ => {
                log::error!("input changed after counting, at byte {}",consumed);
                return Err(Error::SourceLengthChanged);
            }
        };
        bits.put_code(code)?;
    }
    if consumed != freq.total() {
        log::error!("counted {} bytes but encoded {}",freq.total(),consumed);
        return Err(Error::SourceLengthChanged);
    }
    let payload_bytes = bits.flush()?;
    log::debug!("payload has {} bits in {} bytes",bits.bit_count(),payload_bytes);
    writer.flush()?;
    Ok(Summary {
        in_size: consumed,
        out_size: writer.stream_position()? - opt.out_offset,
        node_count
    })
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<Summary,Error>
where R: Read + Seek, W: Write + Seek {
    let mut reader = BufReader::new(compressed_in);
    let mut writer = BufWriter::new(expanded_out);
    let compressed_size = length_from(&mut reader,opt.in_offset)?;
    writer.seek(SeekFrom::Start(opt.out_offset))?;

    let (tree,expanded_length) = match read_header(&mut reader)? {
        Some(header) => header,
        None => {
            log::debug!("null tree, nothing to expand");
            writer.flush()?;
            return Ok(Summary {
                in_size: compressed_size,
                out_size: 0,
                node_count: 0
            });
        }
    };
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    let mut bits = BitReader::create(&payload);
    log::debug!("decoding {} symbols from {} bytes",expanded_length,payload.len());
    for _i in 0..expanded_length {
        let byte = CodeTable::resolve(&tree,&mut bits)?;
        writer.write_all(&[byte])?;
    }
    log::debug!("used {} of {} payload bits",bits.position(),payload.len()*8);
    writer.flush()?;
    Ok(Summary {
        in_size: compressed_size,
        out_size: writer.stream_position()? - opt.out_offset,
        // header was validated against MAX_NODES
        node_count: tree.node_count() as u32
    })
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,&STD_OPTIONS)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8]) -> Result<Vec<u8>,Error> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,&STD_OPTIONS)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[cfg(test)]
fn golden(s: &str) -> Vec<u8> {
    hex::decode(s.replace(" ","")).unwrap()
}

/// 90% of the bytes are `x`, the rest cycle through all byte values
#[cfg(test)]
fn skewed_data() -> Vec<u8> {
    (0..10000usize).map(|i| match i % 10 {
        0 => ((i / 10) * 37 % 256) as u8,
        _ => b'x'
    }).collect()
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[]).expect("compression failed");
    assert_eq!(compressed,golden("00 00 00 00"));
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn single_symbol() {
    let compressed = compress_slice("AAAAA".as_bytes()).expect("compression failed");
    assert_eq!(compressed,golden("00000001 0141 00000005 00000005 F8"));
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"AAAAA".as_bytes());
}

#[test]
fn two_symbols() {
    let compressed = compress_slice("AAAB".as_bytes()).expect("compression failed");
    assert_eq!(compressed,golden("00000003 0142 00000001 0141 00000003 0000 00000004 00000004 E0"));
    let expanded = expand_slice(&compressed).expect("expansion failed");
    assert_eq!(expanded,"AAAB".as_bytes());
}

#[test]
fn invertibility() {
    let all_values: Vec<u8> = (0..=255u8).chain(0..=127u8).collect();
    let cases: Vec<Vec<u8>> = vec![
        "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes().to_vec(),
        vec![0],
        vec![255;3],
        all_values,
        "ab".as_bytes().to_vec()
    ];
    for test_data in cases {
        let compressed = compress_slice(&test_data).expect("compression failed");
        let expanded = expand_slice(&compressed).expect("expansion failed");
        assert_eq!(test_data,expanded);
    }
}

#[test]
fn framing_consistency() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let distinct = FrequencyTable::build(test_data).len();
    let compressed = compress_slice(test_data).expect("compression failed");
    let mut src = Cursor::new(&compressed);
    let (tree,expanded_length) = read_header(&mut src).expect("bad header").expect("null tree");
    assert_eq!(tree.leaf_count(),distinct);
    assert_eq!(tree.node_count(),2*distinct - 1);
    assert_eq!(expanded_length as usize,test_data.len());
    assert_eq!(u32::from_be_bytes([compressed[0],compressed[1],compressed[2],compressed[3]]) as usize,tree.node_count());
}

#[test]
fn skewed_distribution() {
    let test_data = skewed_data();
    let freq = FrequencyTable::build(&test_data);
    assert!(freq.get(b'x') >= 9000);
    let codes = CodeTable::from_tree(&HuffTree::build(&freq).expect("build failed"));
    let payload_bits = codes.encoded_bits(&freq);
    assert!(payload_bits < 10000*8/2);
    let mut src = Cursor::new(&test_data);
    let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let summary = compress(&mut src,&mut dst,&STD_OPTIONS).expect("compression failed");
    assert_eq!(summary.in_size,10000);
    assert_eq!(summary.out_size,4 + 6*summary.node_count as u64 + 4 + (payload_bits + 7)/8);
    let expanded = expand_slice(&dst.into_inner()).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn wrong_node_count() {
    let mut compressed = compress_slice("AAAB".as_bytes()).expect("compression failed");
    compressed[3] = 5;
    assert!(matches!(expand_slice(&compressed),Err(Error::MalformedTree)));
    compressed[3] = 2;
    assert!(matches!(expand_slice(&compressed),Err(Error::MalformedTree)));
    compressed[3] = 0;
    compressed[2] = 2;
    assert!(matches!(expand_slice(&compressed),Err(Error::MalformedTree)));
}

#[test]
fn truncated_data() {
    let compressed = compress_slice("AAAB".as_bytes()).expect("compression failed");
    let n = compressed.len();
    assert!(matches!(expand_slice(&compressed[0..n-1]),Err(Error::UnexpectedEndOfBits)));
    assert!(matches!(expand_slice(&compressed[0..n-3]),Err(Error::MalformedTree)));
    assert!(matches!(expand_slice(&compressed[0..2]),Err(Error::MalformedTree)));
}

#[test]
fn offsets() {
    let test_data = "HDR:I am Sam. Sam I am.".as_bytes();
    let opt = Options {
        in_offset: 4,
        out_offset: 2,
        max_file_size: STD_OPTIONS.max_file_size
    };
    let mut src = Cursor::new(test_data);
    let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let summary = compress(&mut src,&mut dst,&opt).expect("compression failed");
    assert_eq!(summary.in_size,19);
    let compressed = dst.into_inner();
    assert_eq!(compressed.len() as u64,summary.out_size + 2);
    let opt = Options {
        in_offset: 2,
        out_offset: 0,
        max_file_size: STD_OPTIONS.max_file_size
    };
    let mut src = Cursor::new(&compressed);
    let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut dst,&opt).expect("expansion failed");
    assert_eq!(dst.into_inner(),test_data[4..].to_vec());
}

#[test]
fn size_limit() {
    let opt = Options {
        in_offset: 0,
        out_offset: 0,
        max_file_size: 4
    };
    let mut src = Cursor::new("12345".as_bytes());
    let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    assert!(matches!(compress(&mut src,&mut dst,&opt),Err(Error::FileTooLarge)));
    assert!(dst.into_inner().is_empty());
}

/// Source that gains a byte each time it is rewound after the first
#[cfg(test)]
struct GrowingSource {
    inner: Cursor<Vec<u8>>,
    rewinds: usize
}

#[cfg(test)]
impl Read for GrowingSource {
    fn read(&mut self,buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
impl Seek for GrowingSource {
    fn seek(&mut self,pos: SeekFrom) -> std::io::Result<u64> {
        if let SeekFrom::Start(_) = pos {
            self.rewinds += 1;
            if self.rewinds > 1 {
                self.inner.get_mut().push(b'A');
            }
        }
        self.inner.seek(pos)
    }
}

#[test]
fn source_changed() {
    let mut src = GrowingSource {
        inner: Cursor::new("AAAB".as_bytes().to_vec()),
        rewinds: 0
    };
    let mut dst: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    assert!(matches!(compress(&mut src,&mut dst,&STD_OPTIONS),Err(Error::SourceLengthChanged)));
}
