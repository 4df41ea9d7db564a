//! Per-search visited marks over dense node ids.
//!
//! One bit per node. Words that received a bit during the current search are
//! listed, so clearing touches only those words: a greedy search visits a
//! small neighborhood of the graph, not all `N / 64` words.

#[derive(Debug)]
pub struct VisitedSet {
    words: Vec<u64>,
    dirty: Vec<u32>,
}

impl VisitedSet {
    pub fn with_nodes(n: usize) -> Self {
        Self {
            words: vec![0; n.div_ceil(64)],
            dirty: Vec::new(),
        }
    }

    /// Clear the marks of the previous search and cover ids `0..n`.
    pub fn prepare(&mut self, n: usize) {
        for w in self.dirty.drain(..) {
            self.words[w as usize] = 0;
        }
        let needed = n.div_ceil(64);
        if needed > self.words.len() {
            self.words.resize(needed, 0);
        }
    }

    /// Mark `id`. Returns `true` if it was unmarked.
    #[inline]
    pub fn mark(&mut self, id: u32) -> bool {
        let w = (id / 64) as usize;
        let bit = 1u64 << (id % 64);
        let word = &mut self.words[w];
        if *word & bit != 0 {
            return false;
        }
        if *word == 0 {
            self.dirty.push(w as u32);
        }
        *word |= bit;
        true
    }

    #[cfg(test)]
    fn marked(&self) -> usize {
        self.dirty
            .iter()
            .map(|&w| self.words[w as usize].count_ones() as usize)
            .sum()
    }
}
