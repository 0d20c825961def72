//! Reusable scratch buffers
//!
//! The dispatch loop stages operand and result bytes here instead of
//! allocating per instruction. There are thirteen lanes: four each of 1, 2 and
//! 4 bytes, plus one growable main buffer for everything else.
//!
//! Lanes are handed out as `&mut [u8]`, so the borrow checker enforces that a
//! caller is done with a lane before asking for another. The pool has no
//! internal locking; it belongs to exactly one [`Machine`](crate::interpreter::engine::Machine).

const LANES: usize = 4;

/// Fixed arena of staging buffers
#[derive(Debug, Clone)]
pub struct ScratchPool {
    hwords: [[u8; 1]; LANES],
    words: [[u8; 2]; LANES],
    lwords: [[u8; 4]; LANES],
    main: Vec<u8>,
}

impl ScratchPool {
    /// Create a pool whose main buffer starts at `main_size` bytes
    pub fn new(main_size: usize) -> Self {
        ScratchPool {
            hwords: [[0; 1]; LANES],
            words: [[0; 2]; LANES],
            lwords: [[0; 4]; LANES],
            main: vec![0; main_size],
        }
    }

    /// Borrow the lane for `size` bytes at `slot`.
    ///
    /// Sizes 1, 2 and 4 map to their fixed lanes (`slot` is taken modulo 4).
    /// Any other size returns the first `size` bytes of the main buffer,
    /// growing it if needed.
    pub fn get_buffer(&mut self, size: usize, slot: usize) -> &mut [u8] {
        let slot = slot % LANES;
        match size {
            1 => &mut self.hwords[slot],
            2 => &mut self.words[slot],
            4 => &mut self.lwords[slot],
            _ => self.main_buffer(size),
        }
    }

    /// Borrow all four fixed lanes of `size` at once
    pub fn lanes(&mut self, size: usize) -> Option<[&mut [u8]; LANES]> {
        match size {
            1 => {
                let [a, b, c, d] = &mut self.hwords;
                Some([&mut a[..], &mut b[..], &mut c[..], &mut d[..]])
            }
            2 => {
                let [a, b, c, d] = &mut self.words;
                Some([&mut a[..], &mut b[..], &mut c[..], &mut d[..]])
            }
            4 => {
                let [a, b, c, d] = &mut self.lwords;
                Some([&mut a[..], &mut b[..], &mut c[..], &mut d[..]])
            }
            _ => None,
        }
    }

    /// Borrow the first `size` bytes of the main buffer
    pub fn main_buffer(&mut self, size: usize) -> &mut [u8] {
        if self.main.len() < size {
            self.main.resize(size, 0);
        }
        &mut self.main[..size]
    }

    pub fn main_size(&self) -> usize {
        self.main.len()
    }

    /// Zero every lane; the main buffer keeps its size
    pub fn clear(&mut self) {
        self.hwords = [[0; 1]; LANES];
        self.words = [[0; 2]; LANES];
        self.lwords = [[0; 4]; LANES];
        self.main.fill(0);
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(crate::interpreter::constants::DEFAULT_SCRATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_lanes_have_their_size() {
        let mut pool = ScratchPool::new(16);
        for size in [1, 2, 4] {
            for slot in 0..4 {
                assert_eq!(pool.get_buffer(size, slot).len(), size);
            }
        }
    }

    #[test]
    fn test_lanes_are_independent() {
        let mut pool = ScratchPool::new(16);
        pool.get_buffer(2, 0).copy_from_slice(&[1, 2]);
        pool.get_buffer(2, 1).copy_from_slice(&[3, 4]);
        assert_eq!(pool.get_buffer(2, 0), &[1, 2]);
        assert_eq!(pool.get_buffer(2, 1), &[3, 4]);
        // Slot wraps
        assert_eq!(pool.get_buffer(2, 4), &[1, 2]);
    }

    #[test]
    fn test_other_sizes_use_main_buffer() {
        let mut pool = ScratchPool::new(4);
        assert_eq!(pool.get_buffer(3, 0).len(), 3);
        assert_eq!(pool.get_buffer(32, 0).len(), 32);
        assert_eq!(pool.main_size(), 32);
    }

    #[test]
    fn test_borrow_all_lanes() {
        let mut pool = ScratchPool::new(0);
        let [a, b, _, _] = pool.lanes(4).unwrap();
        a.copy_from_slice(&[1, 0, 0, 0]);
        b.copy_from_slice(&[2, 0, 0, 0]);
        assert_eq!(pool.get_buffer(4, 1), &[2, 0, 0, 0]);
        assert!(pool.lanes(8).is_none());
    }

    #[test]
    fn test_clear_zeroes_lanes() {
        let mut pool = ScratchPool::new(8);
        pool.get_buffer(1, 3)[0] = 9;
        pool.get_buffer(8, 0)[7] = 9;
        pool.clear();
        assert_eq!(pool.get_buffer(1, 3), &[0]);
        assert_eq!(pool.get_buffer(8, 0), &[0; 8]);
    }
}
