use super::node::{NodeKind, QuadNode};
use super::{QuadTree, UnitKey};
use std::fmt::{self, Debug, Write};

const INDENT: &str = "\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t";
const LABELS: [&str; 4] = ["NW", "NE", "SW", "SE"];

impl<T: Debug, K> QuadTree<T, K>
where
    K: UnitKey<T>,
    K::Key: Debug,
{
    /// Debug listing of the tree: one line per leaf holding its entry map,
    /// and for every divided node one labelled line per child with the
    /// child's size, followed by that child's own listing. Lines are indented
    /// by node depth. The format is for eyeballing only and may change.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_node(&self.root, &mut out);
        out
    }
}

fn write_node<T: Debug, Q: Debug>(node: &QuadNode<T, Q>, out: &mut impl Write) -> fmt::Result {
    let indent = &INDENT[..(node.depth as usize).min(INDENT.len())];
    match &node.kind {
        NodeKind::Leaf(entries) => writeln!(out, "{indent}{entries:?}"),
        NodeKind::Divided(children) => {
            for (label, child) in LABELS.iter().zip(children.iter()) {
                writeln!(out, "{indent}{label} {}", child.size)?;
                write_node(child, out)?;
            }
            Ok(())
        }
    }
}
