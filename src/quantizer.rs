//! Octree color quantization.
//!
//! Colors stream into an octree branching on one bit of each channel per
//! level. Whenever the number of leaves exceeds the budget, the most recently
//! created interior node on the deepest populated level is folded into a leaf.

use crate::error::{CoreError, Result};
use crate::pixmap::{PixMap, PixMapFormat, Rgb, RgbList};

type NodeId = u32;

#[derive(Clone, Default)]
struct Node {
    is_leaf: bool,
    pixel_count: u32,
    red_sum: u64,
    green_sum: u64,
    blue_sum: u64,
    children: [Option<NodeId>; 8],
    /// Next node in the same level's reducible list.
    next: Option<NodeId>,
}

pub struct Quantizer {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    leaf_count: usize,
    reducible: [Option<NodeId>; 9],
    max_colors: usize,
    color_bits: u32,
}

impl Quantizer {
    /// `color_bits` is the tree depth and may not exceed 8.
    pub fn new(max_colors: usize, color_bits: u32) -> Self {
        assert!(color_bits <= 8, "color_bits {color_bits} exceeds 8");
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            leaf_count: 0,
            reducible: [None; 9],
            max_colors,
            color_bits,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Feed every pixel of an 8-bit indexed, 24-bit RGB or 32-bit ARGB image.
    pub fn process_image(&mut self, pm: &PixMap<'_>) -> Result<()> {
        let size = pm.size();
        let (width, height) = (size.x.max(0) as usize, size.y.max(0) as usize);

        match pm.format() {
            PixMapFormat::Indexed8 => {
                let colors = pm.color_table();
                for y in 0..height {
                    for &ix in &pm.row(y)[..width] {
                        let c = colors.get(ix as usize).copied().unwrap_or_else(|| {
                            log::warn!("pixel index {ix} outside a {}-entry palette", colors.len());
                            Rgb::BLACK
                        });
                        self.add(c);
                    }
                }
            }
            PixMapFormat::Rgb24 => {
                for y in 0..height {
                    for px in pm.row(y)[..width * 3].chunks_exact(3) {
                        self.add(Rgb::new(px[0], px[1], px[2]));
                    }
                }
            }
            PixMapFormat::Argb32 => {
                for y in 0..height {
                    for px in pm.row(y)[..width * 4].chunks_exact(4) {
                        self.add(Rgb::new(px[1], px[2], px[3]));
                    }
                }
            }
            other => return Err(CoreError::UnsupportedFormat(other)),
        }
        Ok(())
    }

    pub fn process_color_table(&mut self, colors: &[Rgb]) {
        for &c in colors {
            self.add(c);
        }
    }

    /// One averaged color per leaf, in depth-first child order.
    pub fn color_table(&self) -> RgbList {
        let mut colors = Vec::with_capacity(self.leaf_count);
        if let Some(root) = self.root {
            self.collect(root, &mut colors);
        }
        colors
    }

    /// Total pixels represented by all leaves.
    pub fn pixel_count(&self) -> u64 {
        let mut total = 0;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if node.is_leaf {
                total += node.pixel_count as u64;
            } else {
                stack.extend(node.children.iter().flatten());
            }
        }
        total
    }

    fn add(&mut self, c: Rgb) {
        let mut level = 0;
        let mut id = match self.root {
            Some(id) => id,
            None => {
                let id = self.create_node(0);
                self.root = Some(id);
                id
            }
        };

        loop {
            let node = &mut self.nodes[id as usize];
            if node.is_leaf {
                node.pixel_count += 1;
                node.red_sum += c.red as u64;
                node.green_sum += c.green as u64;
                node.blue_sum += c.blue as u64;
                break;
            }

            let shift = 7 - level;
            let index = (((c.red >> shift) & 1) << 2
                | ((c.green >> shift) & 1) << 1
                | ((c.blue >> shift) & 1)) as usize;
            level += 1;
            id = match self.nodes[id as usize].children[index] {
                Some(child) => child,
                None => {
                    let child = self.create_node(level);
                    self.nodes[id as usize].children[index] = Some(child);
                    child
                }
            };
        }

        while self.leaf_count > self.max_colors {
            if !self.reduce() {
                break;
            }
        }
    }

    fn create_node(&mut self, level: u32) -> NodeId {
        let is_leaf = level == self.color_bits;
        let mut node = Node {
            is_leaf,
            ..Node::default()
        };
        if is_leaf {
            self.leaf_count += 1;
        }

        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.nodes.push(Node::default());
                (self.nodes.len() - 1) as NodeId
            }
        };
        if !is_leaf {
            node.next = self.reducible[level as usize].replace(id);
        }
        self.nodes[id as usize] = node;
        id
    }

    /// Fold the newest interior node of the deepest populated level.
    /// Returns false when nothing is left to fold.
    fn reduce(&mut self) -> bool {
        let mut level = self.color_bits.saturating_sub(1) as usize;
        while level > 0 && self.reducible[level].is_none() {
            level -= 1;
        }
        let Some(id) = self.reducible[level] else {
            return false;
        };
        self.reducible[level] = self.nodes[id as usize].next.take();

        let (mut red, mut green, mut blue, mut count, mut merged) = (0, 0, 0, 0, 0);
        let children = std::mem::take(&mut self.nodes[id as usize].children);
        for child in children.into_iter().flatten() {
            let c = &self.nodes[child as usize];
            red += c.red_sum;
            green += c.green_sum;
            blue += c.blue_sum;
            count += c.pixel_count;
            merged += 1;
            self.free.push(child);
        }

        let node = &mut self.nodes[id as usize];
        node.is_leaf = true;
        node.red_sum = red;
        node.green_sum = green;
        node.blue_sum = blue;
        node.pixel_count += count;
        self.leaf_count = (self.leaf_count + 1).saturating_sub(merged);
        true
    }

    fn collect(&self, id: NodeId, out: &mut RgbList) {
        let node = &self.nodes[id as usize];
        if node.is_leaf {
            // A freshly folded node can still be empty if no pixel ever reached it.
            let n = node.pixel_count.max(1) as u64;
            out.push(Rgb::new(
                (node.red_sum / n) as u8,
                (node.green_sum / n) as u8,
                (node.blue_sum / n) as u8,
            ));
        } else {
            for &child in node.children.iter().flatten() {
                self.collect(child, out);
            }
        }
    }
}
