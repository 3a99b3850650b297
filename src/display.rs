//! Text renderings of the frequency table, tree, and code table.
//! These only look at finished structures, nothing here affects compression.

use std::fmt::Write;
use crate::tools::freq::FrequencyTable;
use crate::tools::huff_tree::{HuffTree,Node};
use crate::tools::code_table::CodeTable;
use crate::huffman::Summary;

/// printable ASCII as a quoted character, anything else as hex
pub fn symbol(value: u8) -> String {
    match value {
        0x21..=0x7e => format!("'{}'",value as char),
        _ => format!("0x{:02X}",value)
    }
}

pub fn frequency_report(freq: &FrequencyTable) -> String {
    let mut ans = String::new();
    writeln!(ans,"Frequency table, {} symbols, {} bytes",freq.len(),freq.total()).ok();
    for (value,count) in freq.iter() {
        writeln!(ans,"  {:>6} {:>10}",symbol(value),count).ok();
    }
    ans
}

pub fn tree_report(tree: &HuffTree) -> String {
    let mut ans = String::new();
    writeln!(ans,"Code tree, {} nodes",tree.node_count()).ok();
    // preorder, left child printed first
    let mut stack = vec![(tree.root(),0,"root")];
    while let Some((idx,depth,label)) = stack.pop() {
        let indent = "  ".repeat(depth + 1);
        match tree.node(idx) {
            Node::Leaf { value, weight } => {
                writeln!(ans,"{}{}: leaf {} [{}]",indent,label,symbol(*value),weight).ok();
            },
            Node::Internal { weight, left, right } => {
                writeln!(ans,"{}{}: [{}]",indent,label,weight).ok();
                stack.push((*right,depth+1,"1"));
                stack.push((*left,depth+1,"0"));
            }
        }
    }
    ans
}

pub fn code_report(codes: &CodeTable) -> String {
    let mut ans = String::new();
    writeln!(ans,"Code table, {} symbols",codes.len()).ok();
    for (value,code) in codes.iter() {
        let bits: String = code.iter().map(|b| if b { '1' } else { '0' }).collect();
        writeln!(ans,"  {:>6} {}",symbol(value),bits).ok();
    }
    ans
}

/// Sizes and ratio, the ratio is always compressed over expanded.
pub fn ratio_report(summary: &Summary,compressing: bool) -> String {
    let (expanded,compressed) = match compressing {
        true => (summary.in_size,summary.out_size),
        false => (summary.out_size,summary.in_size)
    };
    let ratio = match expanded {
        0 => 0.0,
        x => 100.0 * compressed as f64 / x as f64
    };
    format!("expanded {} bytes, compressed {} bytes, {} tree nodes, ratio {:.2}%\n",
        expanded,compressed,summary.node_count,ratio)
}

#[test]
fn symbols() {
    assert_eq!(symbol(b'A'),"'A'");
    assert_eq!(symbol(b' '),"0x20");
    assert_eq!(symbol(0xff),"0xFF");
}

#[test]
fn reports() {
    let freq = FrequencyTable::build("AAAB".as_bytes());
    let tree = HuffTree::build(&freq).unwrap();
    let codes = CodeTable::from_tree(&tree);
    let txt = frequency_report(&freq);
    assert!(txt.contains("2 symbols, 4 bytes"));
    assert!(txt.contains("'A'          3"));
    let txt = tree_report(&tree);
    assert_eq!(txt,"Code tree, 3 nodes\n  root: [4]\n    0: leaf 'B' [1]\n    1: leaf 'A' [3]\n");
    let txt = code_report(&codes);
    assert!(txt.contains("   'A' 1\n"));
    assert!(txt.contains("   'B' 0\n"));
}

#[test]
fn ratio() {
    let summary = Summary { in_size: 200, out_size: 50, node_count: 7 };
    assert_eq!(ratio_report(&summary,true),"expanded 200 bytes, compressed 50 bytes, 7 tree nodes, ratio 25.00%\n");
    assert_eq!(ratio_report(&summary,false),"expanded 50 bytes, compressed 200 bytes, 7 tree nodes, ratio 400.00%\n");
}
