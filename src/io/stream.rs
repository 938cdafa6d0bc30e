use crate::{Block, BLOCK_SIZE};

/// Adapts fixed-size blocks to whatever buffer size the host asks for.
///
/// Keeps the current block and a read position; when the block runs out,
/// `render` is called for the next one. Nothing allocates, so this can sit
/// directly in an audio callback.
#[derive(Debug, Clone)]
pub struct BlockStream {
    block: Block,
    position: usize,
}

impl Default for BlockStream {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStream {
    pub fn new() -> Self {
        Self {
            block: Block::new(),
            position: BLOCK_SIZE,
        }
    }

    /// Frames left in the current block.
    pub fn buffered(&self) -> usize {
        BLOCK_SIZE - self.position
    }

    /// Fill an interleaved buffer of `channels` channels.
    ///
    /// Two or more channels get left/right in the first two and silence in
    /// the rest; a mono buffer gets the average of left and right.
    pub fn fill_interleaved<F>(&mut self, out: &mut [f32], channels: usize, mut render: F)
    where
        F: FnMut(&mut Block),
    {
        if channels == 0 {
            return;
        }
        for frame in out.chunks_mut(channels) {
            if self.position >= BLOCK_SIZE {
                render(&mut self.block);
                self.position = 0;
            }
            let left = self.block.left[self.position];
            let right = self.block.right[self.position];
            self.position += 1;

            match frame {
                [mono] => *mono = 0.5 * (left + right),
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
    }
}
