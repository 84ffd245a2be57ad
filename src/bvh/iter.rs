use crate::bvh::{BvhNode, INVALID};

/// Iterator following the skip pointers of a linearized node array, the way the shader
/// walks the packed buffer. It needs no stack and allocates nothing.
///
/// For every visited internal node `descend` decides whether its subtree is entered. Leaves
/// are always yielded and then left through their `next` pointer.
pub struct StacklessWalk<'bvh, F> {
    /// The linearized nodes.
    nodes: &'bvh [BvhNode],
    /// Node the next call to `next` yields, or [`INVALID`] when done.
    cursor: u32,
    /// Decides whether to enter an internal node.
    descend: F,
}

impl<'bvh, F> StacklessWalk<'bvh, F>
where
    F: FnMut(&BvhNode) -> bool,
{
    /// Creates a walk starting at the root of `nodes`.
    pub fn new(nodes: &'bvh [BvhNode], descend: F) -> Self {
        StacklessWalk {
            nodes,
            cursor: if nodes.is_empty() { INVALID } else { 0 },
            descend,
        }
    }
}

impl<'bvh, F> Iterator for StacklessWalk<'bvh, F>
where
    F: FnMut(&BvhNode) -> bool,
{
    type Item = (usize, &'bvh BvhNode);

    fn next(&mut self) -> Option<(usize, &'bvh BvhNode)> {
        let index = self.cursor as usize;
        if self.cursor == INVALID || index >= self.nodes.len() {
            return None;
        }
        let node = &self.nodes[index];
        self.cursor = if !node.is_leaf() && (self.descend)(node) {
            self.cursor + 1
        } else {
            node.next
        };
        Some((index, node))
    }
}
