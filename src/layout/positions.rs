/*!
# Position Buffers

A [`PositionBuffer`] holds two dense position arrays sized to the node capacity:
- the **main** buffer is the snapshot every pass reads from, and
- the **scratch** buffer receives the placements of the running pass.

Placed nodes of the running pass are remembered in a list of pending nodes, so that merging the
scratch buffer into the main buffer at the end of a pass costs time proportional to the number of
new placements and not to the capacity.
*/

use crate::node::*;

/// Double-buffered positions of all nodes
#[derive(Debug, Clone)]
pub struct PositionBuffer {
    main: Vec<Position>,
    scratch: Vec<Position>,
    pending: Vec<Node>,
    number_of_placed: u64,
}

impl PositionBuffer {
    /// Creates buffers for nodes `0..capacity`, all unplaced
    pub fn new(capacity: NumNodes) -> Self {
        Self {
            main: vec![Position::UNPLACED; capacity as usize],
            scratch: vec![Position::UNPLACED; capacity as usize],
            pending: Vec::new(),
            number_of_placed: 0,
        }
    }

    /// Number of nodes covered
    #[inline(always)]
    pub fn capacity(&self) -> NumNodes {
        self.main.len() as NumNodes
    }

    /// Returns *true* if `u` can be stored
    #[inline(always)]
    pub fn contains(&self, u: Node) -> bool {
        (u as usize) < self.main.len()
    }

    /// Position of `u` in the main buffer ([`Position::UNPLACED`] if out of range)
    #[inline(always)]
    pub fn get(&self, u: Node) -> Position {
        self.main
            .get(u as usize)
            .copied()
            .unwrap_or(Position::UNPLACED)
    }

    /// Returns *true* if `u` is placed in the main buffer
    #[inline(always)]
    pub fn is_placed(&self, u: Node) -> bool {
        self.get(u).is_placed()
    }

    /// Returns *true* if `u` was placed during the running pass
    #[inline(always)]
    pub fn is_pending(&self, u: Node) -> bool {
        self.scratch
            .get(u as usize)
            .is_some_and(|p| p.is_placed())
    }

    /// Number of nodes placed in the main buffer
    pub fn number_of_placed(&self) -> u64 {
        self.number_of_placed
    }

    /// Number of nodes placed during the running pass
    pub fn number_of_pending(&self) -> usize {
        self.pending.len()
    }

    /// Places `u` directly in the main buffer.
    /// Returns *false* (and changes nothing) if `u` is already placed.
    ///
    /// # Panics
    /// Panics if `u` is out of range or `position` is the sentinel.
    pub fn place(&mut self, u: Node, position: Position) -> bool {
        assert!(position.is_placed());
        let slot = &mut self.main[u as usize];
        if slot.is_placed() {
            return false;
        }
        *slot = position;
        self.number_of_placed += 1;
        true
    }

    /// Places `u` in the scratch buffer, visible in the main buffer after [`PositionBuffer::merge`].
    /// Returns *false* (and changes nothing) if `u` is already placed in either buffer.
    ///
    /// # Panics
    /// Panics if `u` is out of range or `position` is the sentinel.
    pub fn place_pending(&mut self, u: Node, position: Position) -> bool {
        assert!(position.is_placed());
        if self.main[u as usize].is_placed() || self.scratch[u as usize].is_placed() {
            return false;
        }
        self.scratch[u as usize] = position;
        self.pending.push(u);
        true
    }

    /// Moves all pending placements into the main buffer and returns their number
    pub fn merge(&mut self) -> usize {
        let merged = self.pending.len();
        for u in self.pending.drain(..) {
            let position = std::mem::take(&mut self.scratch[u as usize]);
            debug_assert!(!self.main[u as usize].is_placed());
            self.main[u as usize] = position;
        }
        self.number_of_placed += merged as u64;
        merged
    }

    /// Iterates over all placed nodes of the main buffer in increasing order
    pub fn placed(&self) -> impl Iterator<Item = (Node, Position)> + '_ {
        self.main
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_placed())
            .map(|(u, &p)| (u as Node, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn pending_is_invisible_until_merge() {
        let mut buffer = PositionBuffer::new(10);
        assert!(buffer.place(1, Position::new(1.0, 1.0)));
        assert!(!buffer.place(1, Position::new(2.0, 2.0)));

        assert!(buffer.place_pending(2, Position::new(3.0, 3.0)));
        assert!(!buffer.place_pending(2, Position::new(4.0, 4.0)));
        assert!(!buffer.place_pending(1, Position::new(4.0, 4.0)));

        assert!(buffer.is_pending(2));
        assert!(!buffer.is_placed(2));
        assert_eq!(buffer.number_of_placed(), 1);

        assert_eq!(buffer.merge(), 1);
        assert!(!buffer.is_pending(2));
        assert_eq!(buffer.get(2), Position::new(3.0, 3.0));
        assert_eq!(buffer.get(1), Position::new(1.0, 1.0));
        assert_eq!(buffer.number_of_placed(), 2);
        assert_eq!(buffer.number_of_pending(), 0);

        assert_eq!(buffer.placed().map(|(u, _)| u).collect_vec(), vec![1, 2]);
    }

    #[test]
    fn out_of_range_reads_are_unplaced() {
        let buffer = PositionBuffer::new(3);
        assert!(!buffer.contains(3));
        assert_eq!(buffer.get(100), Position::UNPLACED);
        assert!(!buffer.is_pending(100));
    }
}
