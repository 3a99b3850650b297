//! Huffman tree construction and its serialized form.
//!
//! The tree is held in a flat node pool, children are referred to by index.
//! Leaves are stored first in ascending byte value order, branches follow
//! in the order they are created.  Every traversal uses an explicit stack.
//!
//! The serialized tree is a postorder sequence of 6 byte records:
//! kind (1=leaf, 0=branch), value (leaves only), and weight as big endian u32.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use crate::tools::freq::FrequencyTable;
use crate::Error;

/// Bytes in one serialized node record
pub const RECORD_SIZE: usize = 6;
/// Largest possible tree, 256 leaves and 255 branches
pub const MAX_NODES: usize = 511;

#[derive(FromPrimitive)]
enum RecordKind {
    Internal = 0,
    Leaf = 1
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum Node {
    Leaf { value: u8, weight: u64 },
    /// `left` and `right` are indices into the node pool
    Internal { weight: u64, left: usize, right: usize }
}

impl Node {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight
        }
    }
}

/// One node of the serialized tree
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Record {
    pub is_leaf: bool,
    /// meaningful only for leaves, written as 0 for branches
    pub value: u8,
    pub weight: u32
}

impl Record {
    pub fn to_bytes(&self) -> [u8;RECORD_SIZE] {
        let w = u32::to_be_bytes(self.weight);
        [self.is_leaf as u8,self.value,w[0],w[1],w[2],w[3]]
    }
    pub fn from_bytes(buf: &[u8;RECORD_SIZE]) -> Result<Self,Error> {
        let is_leaf = match RecordKind::from_u8(buf[0]) {
            Some(RecordKind::Leaf) => true,
            Some(RecordKind::Internal) => false,
            None => {
                log::error!("bad node kind {}",buf[0]);
                return Err(Error::MalformedTree);
            }
        };
        Ok(Self {
            is_leaf,
            value: buf[1],
            weight: u32::from_be_bytes([buf[2],buf[3],buf[4],buf[5]])
        })
    }
}

/// Binary decision tree with one leaf per distinct byte value.
#[derive(Clone,Debug)]
pub struct HuffTree {
    nodes: Vec<Node>,
    root: usize
}

impl HuffTree {
    /// Build the tree by repeatedly merging the two lightest nodes.
    /// Ties are broken by node index: leaves in byte value order come first,
    /// then branches in order of creation.  The first node popped goes left.
    pub fn build(freq: &FrequencyTable) -> Result<Self,Error> {
        if freq.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        let mut nodes: Vec<Node> = freq.iter()
            .map(|(value,weight)| Node::Leaf { value, weight })
            .collect();
        let mut queue: BinaryHeap<Reverse<(u64,usize)>> = nodes.iter()
            .enumerate()
            .map(|(i,n)| Reverse((n.weight(),i)))
            .collect();
        while queue.len() > 1 {
            // len > 1 so both pops succeed
            let Reverse((w1,left)) = queue.pop().ok_or(Error::EmptyAlphabet)?;
            let Reverse((w2,right)) = queue.pop().ok_or(Error::EmptyAlphabet)?;
            let weight = w1 + w2;
            nodes.push(Node::Internal { weight, left, right });
            queue.push(Reverse((weight,nodes.len()-1)));
        }
        let root = nodes.len() - 1;
        log::debug!("built tree with {} nodes, root weight {}",nodes.len(),nodes[root].weight());
        Ok(Self { nodes, root })
    }
    pub fn root(&self) -> usize {
        self.root
    }
    pub fn node(&self,idx: usize) -> &Node {
        &self.nodes[idx]
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n,Node::Leaf {..})).count()
    }
    /// Node indices in postorder, left subtree, right subtree, then the node itself.
    pub fn postorder(&self) -> Vec<usize> {
        let mut ans = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root,false)];
        while let Some((idx,expanded)) = stack.pop() {
            match self.nodes[idx] {
                Node::Internal { left, right, .. } if !expanded => {
                    stack.push((idx,true));
                    stack.push((right,false));
                    stack.push((left,false));
                },
                _ => ans.push(idx)
            }
        }
        ans
    }
    /// Serialize in postorder, fails if a weight does not fit the record.
    pub fn serialize(&self) -> Result<Vec<Record>,Error> {
        let mut ans = Vec::with_capacity(self.nodes.len());
        for idx in self.postorder() {
            let node = &self.nodes[idx];
            let weight = u32::try_from(node.weight()).map_err(|_| Error::FileTooLarge)?;
            let rec = match node {
                Node::Leaf { value, .. } => Record { is_leaf: true, value: *value, weight },
                Node::Internal { .. } => Record { is_leaf: false, value: 0, weight }
            };
            log::trace!("record {:?}",rec);
            ans.push(rec);
        }
        Ok(ans)
    }
    /// Rebuild a tree from the first `node_count` postorder records.
    /// The most recently pushed node is the right child of the next branch.
    pub fn deserialize(records: &[Record],node_count: usize) -> Result<Self,Error> {
        if node_count > MAX_NODES || node_count > records.len() {
            log::error!("expected {} records, found {}",node_count,records.len());
            return Err(Error::MalformedTree);
        }
        let mut nodes: Vec<Node> = Vec::with_capacity(node_count);
        let mut stack: Vec<usize> = Vec::new();
        for rec in &records[0..node_count] {
            let weight = rec.weight as u64;
            if rec.is_leaf {
                nodes.push(Node::Leaf { value: rec.value, weight });
            } else {
                let right = stack.pop().ok_or(Error::MalformedTree)?;
                let left = stack.pop().ok_or(Error::MalformedTree)?;
                nodes.push(Node::Internal { weight, left, right });
            }
            stack.push(nodes.len()-1);
        }
        match stack.as_slice() {
            [root] => Ok(Self { nodes, root: *root }),
            _ => {
                log::error!("tree records left {} roots",stack.len());
                Err(Error::MalformedTree)
            }
        }
    }
    /// Depth of every leaf as (value,weight,depth), in no particular order.
    pub fn leaf_depths(&self) -> Vec<(u8,u64,usize)> {
        let mut ans = Vec::new();
        let mut stack = vec![(self.root,0)];
        while let Some((idx,depth)) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf { value, weight } => ans.push((value,weight,depth)),
                Node::Internal { left, right, .. } => {
                    stack.push((right,depth+1));
                    stack.push((left,depth+1));
                }
            }
        }
        ans
    }
}

// *************** TESTS *****************

/// Optimal weighted path length by trying every split of the leaf set.
#[cfg(test)]
fn brute_force_cost(weights: &[u64]) -> u64 {
    fn cost(mask: usize,weights: &[u64],memo: &mut std::collections::HashMap<usize,u64>) -> u64 {
        if mask.count_ones() == 1 {
            return 0;
        }
        if let Some(c) = memo.get(&mask) {
            return *c;
        }
        let total: u64 = (0..weights.len()).filter(|i| mask & (1 << i) > 0).map(|i| weights[i]).sum();
        let mut best = u64::MAX;
        // proper nonempty submasks, each split counted twice which is harmless
        let mut sub = (mask - 1) & mask;
        while sub > 0 {
            let c = cost(sub,weights,memo) + cost(mask ^ sub,weights,memo);
            best = best.min(c);
            sub = (sub - 1) & mask;
        }
        memo.insert(mask,best + total);
        best + total
    }
    let mut memo = std::collections::HashMap::new();
    cost((1 << weights.len()) - 1,weights,&mut memo)
}

#[test]
fn two_symbols() {
    let tree = HuffTree::build(&FrequencyTable::build("AAAB".as_bytes())).expect("build failed");
    assert_eq!(tree.node_count(),3);
    assert_eq!(tree.leaf_count(),2);
    match tree.node(tree.root()) {
        Node::Internal { weight, left, right } => {
            assert_eq!(*weight,4);
            assert_eq!(*tree.node(*left),Node::Leaf { value: b'B', weight: 1 });
            assert_eq!(*tree.node(*right),Node::Leaf { value: b'A', weight: 3 });
        },
        _ => panic!("root should branch")
    }
}

#[test]
fn single_symbol() {
    let tree = HuffTree::build(&FrequencyTable::build("AAAAA".as_bytes())).expect("build failed");
    assert_eq!(tree.node_count(),1);
    assert_eq!(*tree.node(tree.root()),Node::Leaf { value: b'A', weight: 5 });
}

#[test]
fn empty_alphabet() {
    let ans = HuffTree::build(&FrequencyTable::build(&[]));
    assert!(matches!(ans,Err(Error::EmptyAlphabet)));
}

#[test]
fn optimal_on_small_alphabets() {
    let cases: [&[u64];6] = [
        &[1,1],
        &[5,9,12,13,16,45],
        &[1,1,1,1,1],
        &[1,2,4,8,16,32],
        &[7,3,3,2,2,1],
        &[10,10,1,1,30]
    ];
    for weights in cases {
        let dat: Vec<u8> = weights.iter().enumerate()
            .flat_map(|(v,w)| std::iter::repeat(v as u8 + b'a').take(*w as usize))
            .collect();
        let tree = HuffTree::build(&FrequencyTable::build(&dat)).expect("build failed");
        let cost: u64 = tree.leaf_depths().iter().map(|(_,w,d)| w * *d as u64).sum();
        assert_eq!(cost,brute_force_cost(weights));
    }
}

#[test]
fn serialize_postorder() {
    let tree = HuffTree::build(&FrequencyTable::build("AAAB".as_bytes())).expect("build failed");
    let recs = tree.serialize().expect("serialize failed");
    assert_eq!(recs,vec![
        Record { is_leaf: true, value: b'B', weight: 1 },
        Record { is_leaf: true, value: b'A', weight: 3 },
        Record { is_leaf: false, value: 0, weight: 4 }
    ]);
}

#[test]
fn deserialize_is_isomorphic() {
    let dat = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let tree = HuffTree::build(&FrequencyTable::build(dat)).expect("build failed");
    let recs = tree.serialize().expect("serialize failed");
    assert_eq!(recs.len(),tree.node_count());
    let rebuilt = HuffTree::deserialize(&recs,recs.len()).expect("deserialize failed");
    assert_eq!(rebuilt.serialize().expect("serialize failed"),recs);
    let mut d1 = tree.leaf_depths();
    let mut d2 = rebuilt.leaf_depths();
    d1.sort();
    d2.sort();
    assert_eq!(d1,d2);
}

#[test]
fn missing_record() {
    let recs = [
        Record { is_leaf: true, value: b'B', weight: 1 },
        Record { is_leaf: true, value: b'A', weight: 3 }
    ];
    assert!(matches!(HuffTree::deserialize(&recs,3),Err(Error::MalformedTree)));
    assert!(matches!(HuffTree::deserialize(&recs,2),Err(Error::MalformedTree)));
}

#[test]
fn branch_without_children() {
    let recs = [
        Record { is_leaf: true, value: b'B', weight: 1 },
        Record { is_leaf: false, value: 0, weight: 1 }
    ];
    assert!(matches!(HuffTree::deserialize(&recs,2),Err(Error::MalformedTree)));
}

#[test]
fn record_bytes() {
    let rec = Record { is_leaf: true, value: b'A', weight: 0x01020304 };
    assert_eq!(rec.to_bytes(),[1,0x41,1,2,3,4]);
    assert_eq!(Record::from_bytes(&rec.to_bytes()).unwrap(),rec);
    assert!(matches!(Record::from_bytes(&[2,0,0,0,0,1]),Err(Error::MalformedTree)));
}
