use crate::BLOCK_SIZE;

/// One unit of rendering work: `BLOCK_SIZE` stereo samples for one cycle.
///
/// The audio backend pulls one block per cycle. Nodes keep their own output
/// block and hand out references to it, so a block is only ever copied at
/// the very edge of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub left: [f32; BLOCK_SIZE],
    pub right: [f32; BLOCK_SIZE],
    pub cycle: u64,
}

impl Block {
    pub const fn new() -> Self {
        Self {
            left: [0.0; BLOCK_SIZE],
            right: [0.0; BLOCK_SIZE],
            cycle: 0,
        }
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    pub fn copy_from(&mut self, other: &Block) {
        self.left = other.left;
        self.right = other.right;
        self.cycle = other.cycle;
    }

    /// Largest absolute sample across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers which cycle a value was last computed for.
///
/// Params and nodes call [`claim`](CycleStamp::claim) on entry; a `false`
/// return means the cached output for this cycle is already valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStamp(Option<u64>);

impl CycleStamp {
    pub const fn new() -> Self {
        Self(None)
    }

    /// Stamp `cycle`. Returns `false` if it was already stamped.
    #[inline]
    pub fn claim(&mut self, cycle: u64) -> bool {
        if self.0 == Some(cycle) {
            false
        } else {
            self.0 = Some(cycle);
            true
        }
    }

    pub fn current(&self) -> Option<u64> {
        self.0
    }

    pub fn invalidate(&mut self) {
        self.0 = None;
    }
}
