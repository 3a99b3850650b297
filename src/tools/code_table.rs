//! Prefix codes derived from the Huffman tree, and the matching decoder walk.

use bit_vec::BitVec;
use crate::tools::bit_stream::BitReader;
use crate::tools::freq::FrequencyTable;
use crate::tools::huff_tree::{HuffTree,Node};
use crate::Error;

/// Map from byte value to its code, left branches are 0 and right branches are 1.
/// A tree that is a single leaf gets the one bit code `1`.
#[derive(Clone,Debug)]
pub struct CodeTable {
    codes: Vec<Option<BitVec>>
}

impl CodeTable {
    pub fn from_tree(tree: &HuffTree) -> Self {
        let mut codes: Vec<Option<BitVec>> = vec![None;256];
        if let Node::Leaf { value, .. } = tree.node(tree.root()) {
            codes[*value as usize] = Some(BitVec::from_elem(1,true));
            return Self { codes };
        }
        let mut stack = vec![(tree.root(),BitVec::new())];
        while let Some((idx,prefix)) = stack.pop() {
            match tree.node(idx) {
                Node::Leaf { value, .. } => {
                    codes[*value as usize] = Some(prefix);
                },
                Node::Internal { left, right, .. } => {
                    let mut rcode = prefix.clone();
                    rcode.push(true);
                    let mut lcode = prefix;
                    lcode.push(false);
                    stack.push((*right,rcode));
                    stack.push((*left,lcode));
                }
            }
        }
        Self { codes }
    }
    pub fn get(&self,value: u8) -> Option<&BitVec> {
        self.codes[value as usize].as_ref()
    }
    /// number of symbols with a code
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// (value,code) pairs in ascending value order
    pub fn iter(&self) -> impl Iterator<Item = (u8,&BitVec)> + '_ {
        self.codes.iter().enumerate()
            .filter_map(|(v,c)| c.as_ref().map(|code| (v as u8,code)))
    }
    /// Exact payload length in bits for data with these frequencies.
    /// Symbols without a code contribute nothing.
    pub fn encoded_bits(&self,freq: &FrequencyTable) -> u64 {
        self.iter().map(|(v,code)| freq.get(v) * code.len() as u64).sum()
    }
    /// Walk from the root to a leaf, consuming one bit per branch.
    /// A single leaf tree still consumes one bit, matching the encoder.
    pub fn resolve(tree: &HuffTree,bits: &mut BitReader) -> Result<u8,Error> {
        let mut idx = tree.root();
        if let Node::Leaf { value, .. } = tree.node(idx) {
            bits.get_bit()?;
            return Ok(*value);
        }
        loop {
            match tree.node(idx) {
                Node::Leaf { value, .. } => return Ok(*value),
                Node::Internal { left, right, .. } => {
                    idx = match bits.get_bit()? {
                        false => *left,
                        true => *right
                    };
                }
            }
        }
    }
}

#[cfg(test)]
fn code_string(code: &BitVec) -> String {
    code.iter().map(|b| if b { '1' } else { '0' }).collect()
}

#[test]
fn single_leaf_gets_one() {
    let tree = HuffTree::build(&FrequencyTable::build("AAAAA".as_bytes())).expect("build failed");
    let table = CodeTable::from_tree(&tree);
    assert_eq!(table.len(),1);
    assert_eq!(code_string(table.get(b'A').unwrap()),"1");
    let mut bits = BitReader::create(&[0b0100_0000]);
    assert_eq!(CodeTable::resolve(&tree,&mut bits).unwrap(),b'A');
    assert_eq!(CodeTable::resolve(&tree,&mut bits).unwrap(),b'A');
    assert_eq!(bits.position(),2);
}

#[test]
fn two_symbols_differ() {
    let freq = FrequencyTable::build("AAAB".as_bytes());
    let tree = HuffTree::build(&freq).expect("build failed");
    let table = CodeTable::from_tree(&tree);
    let a = table.get(b'A').unwrap();
    let b = table.get(b'B').unwrap();
    assert_eq!(a.len(),1);
    assert_eq!(b.len(),1);
    assert_ne!(a,b);
    assert_eq!(table.encoded_bits(&freq),4);
}

#[test]
fn prefix_free() {
    let dat: Vec<u8> = (0..5000u32).map(|i| ((i * 7919) % 97 % 40) as u8).collect();
    let freq = FrequencyTable::build(&dat);
    let table = CodeTable::from_tree(&HuffTree::build(&freq).expect("build failed"));
    assert_eq!(table.len(),freq.len());
    let codes: Vec<String> = table.iter().map(|(_,c)| code_string(c)).collect();
    for i in 0..codes.len() {
        for j in 0..codes.len() {
            if i != j {
                assert!(!codes[j].starts_with(&codes[i]),"{} is a prefix of {}",codes[i],codes[j]);
            }
        }
    }
}

#[test]
fn resolve_inverts_codes() {
    let freq = FrequencyTable::build("abracadabra".as_bytes());
    let tree = HuffTree::build(&freq).expect("build failed");
    let table = CodeTable::from_tree(&tree);
    for (v,code) in table.iter() {
        let mut padded = code.clone();
        while padded.len() % 8 > 0 {
            padded.push(false);
        }
        let mut bits = BitReader::create(&padded.to_bytes());
        assert_eq!(CodeTable::resolve(&tree,&mut bits).unwrap(),v);
        assert_eq!(bits.position(),code.len());
    }
}

#[test]
fn resolve_runs_dry() {
    let tree = HuffTree::build(&FrequencyTable::build("abracadabra".as_bytes())).expect("build failed");
    let mut bits = BitReader::create(&[]);
    assert!(matches!(CodeTable::resolve(&tree,&mut bits),Err(Error::UnexpectedEndOfBits)));
}
