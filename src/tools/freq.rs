//! Byte frequency counting, the first of the two passes.

use std::io::{Read,ErrorKind};
use crate::Error;

/// Occurrence count for every byte value.
/// Only values that occur at least once are considered part of the alphabet.
#[derive(Clone,Debug,PartialEq)]
pub struct FrequencyTable {
    counts: [u64;256],
    total: u64
}

impl FrequencyTable {
    pub fn build(dat: &[u8]) -> Self {
        let mut counts = [0;256];
        for b in dat {
            counts[*b as usize] += 1;
        }
        Self {
            counts,
            total: dat.len() as u64
        }
    }
    /// Count bytes from a reader until EOF, the reader is left at EOF.
    pub fn scan<R: Read>(reader: &mut R) -> Result<Self,Error> {
        let mut counts = [0;256];
        let mut total: u64 = 0;
        let mut buf = [0u8;4096];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind()==ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e))
            };
            for b in &buf[0..n] {
                counts[*b as usize] += 1;
            }
            total += n as u64;
        }
        Ok(Self {
            counts,
            total
        })
    }
    /// count for a given byte value, 0 if absent
    pub fn get(&self,value: u8) -> u64 {
        self.counts[value as usize]
    }
    /// sum of all counts, equals the length of the scanned data
    pub fn total(&self) -> u64 {
        self.total
    }
    /// number of distinct byte values present
    pub fn len(&self) -> usize {
        self.counts.iter().filter(|c| **c > 0).count()
    }
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
    /// (value,count) pairs in ascending value order, absent values skipped
    pub fn iter(&self) -> impl Iterator<Item = (u8,u64)> + '_ {
        self.counts.iter().enumerate()
            .filter(|(_,c)| **c > 0)
            .map(|(v,c)| (v as u8,*c))
    }
}

#[test]
fn counts_sum_to_length() {
    let freq = FrequencyTable::build("I am Sam. Sam I am.".as_bytes());
    assert_eq!(freq.total(),19);
    assert_eq!(freq.iter().map(|(_,c)| c).sum::<u64>(),19);
    assert_eq!(freq.get(b'a'),4);
    assert_eq!(freq.get(b' '),5);
    assert_eq!(freq.get(b'z'),0);
    assert_eq!(freq.len(),6);
}

#[test]
fn empty_input() {
    let freq = FrequencyTable::build(&[]);
    assert!(freq.is_empty());
    assert_eq!(freq.len(),0);
    assert_eq!(freq.iter().count(),0);
}

#[test]
fn scan_matches_build() {
    let dat: Vec<u8> = (0..10000u32).map(|i| (i*i % 251) as u8).collect();
    let mut src = std::io::Cursor::new(&dat);
    let scanned = FrequencyTable::scan(&mut src).expect("scan failed");
    assert_eq!(scanned,FrequencyTable::build(&dat));
}
