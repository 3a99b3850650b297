//! Bit level I/O for the Huffman payload.
//! Bits are packed MSB first within each byte, which is also the
//! native ordering of the `bit_vec` crate.

use bit_vec::BitVec;
use std::io::Write;
use crate::Error;

/// Packs bits into bytes and sends completed bytes to the underlying writer.
pub struct BitWriter<W: Write> {
    writer: W,
    /// pending bits, aligned to the right
    acc: u8,
    /// number of pending bits, 0..8
    pending: u8,
    /// total number of bits accepted
    count: u64
}

impl <W: Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            acc: 0,
            pending: 0,
            count: 0
        }
    }
    pub fn put_bit(&mut self,bit: bool) -> Result<(),Error> {
        self.acc = (self.acc << 1) | bit as u8;
        self.pending += 1;
        self.count += 1;
        if self.pending == 8 {
            self.writer.write_all(&[self.acc])?;
            self.acc = 0;
            self.pending = 0;
        }
        Ok(())
    }
    /// output every bit of `code` in order
    pub fn put_code(&mut self,code: &BitVec) -> Result<(),Error> {
        for bit in code.iter() {
            self.put_bit(bit)?;
        }
        Ok(())
    }
    /// Write out any partial byte, left justified with zero padding.
    /// Returns the number of bytes the bit stream occupies.
    pub fn flush(&mut self) -> Result<u64,Error> {
        if self.pending > 0 {
            let byte = self.acc << (8 - self.pending);
            self.writer.write_all(&[byte])?;
            self.acc = 0;
            self.pending = 0;
        }
        self.writer.flush()?;
        Ok((self.count + 7) / 8)
    }
    /// total bits accepted so far, not counting padding
    pub fn bit_count(&self) -> u64 {
        self.count
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Hands out bits one at a time from a byte buffer.
/// There is no end marker, the caller has to know how much to ask for.
pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

impl BitReader {
    pub fn create(dat: &[u8]) -> Self {
        Self {
            bits: BitVec::from_bytes(dat),
            ptr: 0
        }
    }
    /// get the next bit based on the internal bit pointer
    pub fn get_bit(&mut self) -> Result<bool,Error> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => Err(Error::UnexpectedEndOfBits)
        }
    }
    /// number of bits consumed so far
    pub fn position(&self) -> usize {
        self.ptr
    }
}

#[test]
fn msb_first_with_padding() {
    let mut writer = BitWriter::new(Vec::new());
    for _i in 0..5 {
        writer.put_bit(true).unwrap();
    }
    assert_eq!(writer.bit_count(),5);
    assert_eq!(writer.flush().unwrap(),1);
    assert_eq!(writer.into_inner(),vec![0b1111_1000]);
}

#[test]
fn whole_bytes_need_no_padding() {
    let mut writer = BitWriter::new(Vec::new());
    let code = BitVec::from_bytes(&[0xa5,0x3c]);
    writer.put_code(&code).unwrap();
    assert_eq!(writer.flush().unwrap(),2);
    assert_eq!(writer.into_inner(),vec![0xa5,0x3c]);
}

#[test]
fn reader_runs_dry() {
    let mut reader = BitReader::create(&[0x80]);
    assert_eq!(reader.get_bit().unwrap(),true);
    for _i in 1..8 {
        assert_eq!(reader.get_bit().unwrap(),false);
    }
    assert_eq!(reader.position(),8);
    assert!(matches!(reader.get_bit(),Err(Error::UnexpectedEndOfBits)));
}
