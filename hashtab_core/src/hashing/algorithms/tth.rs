//! Tiger Tree Hash (TTH) algorithm implementation

use crate::hashing::traits::{HashAccumulator, HashAlgorithmImpl};
use tiger::{Digest as TigerDigest, Tiger};

pub struct TthAlgorithm;

const LEAF_SIZE: usize = 1024;
const HASH_SIZE: usize = 24;

type Node = [u8; HASH_SIZE];

/// Streaming TTH state
///
/// Completed subtrees are kept on a stack tagged with their height, so memory
/// grows with the logarithm of the file size instead of one hash per leaf.
struct TthAccumulator {
    leaf_buffer: Vec<u8>,
    stack: Vec<(u32, Node)>,
    total_bytes: u64,
}

impl TthAccumulator {
    fn new() -> Self {
        Self {
            leaf_buffer: Vec::with_capacity(LEAF_SIZE),
            stack: Vec::new(),
            total_bytes: 0,
        }
    }

    fn push_leaf(&mut self) {
        let mut hasher = Tiger::new();
        TigerDigest::update(&mut hasher, [0x00]);
        TigerDigest::update(&mut hasher, &self.leaf_buffer);
        self.leaf_buffer.clear();

        let mut node = to_node(&TigerDigest::finalize(hasher));
        let mut height = 0;
        while let Some(&(top_height, left)) = self.stack.last() {
            if top_height != height {
                break;
            }
            self.stack.pop();
            node = combine(&left, &node);
            height += 1;
        }
        self.stack.push((height, node));
    }
}

fn to_node(hash: &[u8]) -> Node {
    let mut node = [0u8; HASH_SIZE];
    node.copy_from_slice(hash);
    node
}

fn combine(left: &Node, right: &Node) -> Node {
    let mut hasher = Tiger::new();
    TigerDigest::update(&mut hasher, [0x01]);
    TigerDigest::update(&mut hasher, left);
    TigerDigest::update(&mut hasher, right);
    to_node(&TigerDigest::finalize(hasher))
}

impl HashAccumulator for TthAccumulator {
    fn update(&mut self, data: &[u8]) {
        let mut remaining = data;

        while !remaining.is_empty() {
            let take = remaining.len().min(LEAF_SIZE - self.leaf_buffer.len());
            self.leaf_buffer.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];

            if self.leaf_buffer.len() == LEAF_SIZE {
                self.push_leaf();
            }
        }

        self.total_bytes += data.len() as u64;
    }

    fn finish(mut self: Box<Self>) -> Vec<u8> {
        // The empty file still has one (empty) leaf
        if !self.leaf_buffer.is_empty() || self.total_bytes == 0 {
            self.push_leaf();
        }

        // Fold the remaining subtrees right to left; an unpaired node is
        // promoted unchanged, as in the level-by-level construction
        let mut root = match self.stack.pop() {
            Some((_, node)) => node,
            None => return Vec::new(),
        };
        while let Some((_, left)) = self.stack.pop() {
            root = combine(&left, &root);
        }
        root.to_vec()
    }

    fn output_size(&self) -> usize {
        HASH_SIZE
    }
}

impl HashAlgorithmImpl for TthAlgorithm {
    fn id(&self) -> &'static str {
        "tth"
    }

    fn display_name(&self) -> &'static str {
        "TTH"
    }

    fn is_secure(&self) -> bool {
        true
    }

    fn default_output_size(&self) -> usize {
        HASH_SIZE
    }

    fn create_accumulator(&self, _output_size: usize) -> Box<dyn HashAccumulator> {
        Box::new(TthAccumulator::new())
    }
}
