/// Tree-wide tunables, captured when the tree is built and handed down to
/// every node by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// A leaf holding this many entries subdivides on the next insertion.
    pub node_capacity: usize,
    /// Nodes at this depth never subdivide and hold any number of entries.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_capacity: 8,
            max_depth: 8,
        }
    }
}
