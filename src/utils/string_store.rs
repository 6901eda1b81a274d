/*!
# Compact String Store

Maps dense node ids to strings without allocating one `String` per id.

All values are appended to a shared backing buffer that is split into **chunks** of at most
`chunk_capacity` bytes. Per id we only keep
- `starts[id]`: the packed start position `chunk_index * chunk_capacity + offset_in_chunk`, and
- `lengths[id]`: the length of the value in bytes.

A value is never split across chunks: if it does not fit into the currently open chunk, that chunk
is sealed and a new one opened. This keeps every offset far below `i32::MAX` for the default
capacity, matching consumers that address the chunks with signed 32-bit offsets.

### Lifecycle
The store has two phases: a **write** phase in which only [`CompactStringStore::put`] is allowed,
followed by a single [`CompactStringStore::freeze`], after which only reads are allowed.

### Absent values
The first chunk starts with one reserved padding byte, so no value ever starts at packed position
`0`. An id with `start == 0 && length == 0` has never been written and [`CompactStringStore::get`]
returns `None` for it. Empty strings that were written are returned as `Some("")`.

# Examples
```
use citemap::utils::string_store::CompactStringStore;

let mut store = CompactStringStore::with_chunk_capacity(10, 16);
store.put(3, "graphene");
store.put(7, "black hole");
store.freeze();

assert_eq!(store.get(3), Some("graphene"));
assert_eq!(store.get(7), Some("black hole"));
assert_eq!(store.get(5), None);
```
*/

use crate::node::*;

/// Default maximum size of a chunk in bytes
pub const DEFAULT_CHUNK_CAPACITY: usize = 2_000_000_000;

/// Padding in front of the first chunk reserving the packed position `0`
const PADDING: &str = " ";

/// Append-only, id-indexed string storage with a write phase and a read phase
#[derive(Debug, Clone)]
pub struct CompactStringStore {
    /// Sealed chunks, chunk `i` covers packed positions `i * chunk_capacity..`
    chunks: Vec<String>,
    /// The chunk currently being appended to
    open: String,
    starts: Vec<u64>,
    lengths: Vec<u32>,
    chunk_capacity: usize,
    number_of_values: usize,
    frozen: bool,
}

impl CompactStringStore {
    /// Creates a store for ids `0..capacity` using [`DEFAULT_CHUNK_CAPACITY`]
    pub fn new(capacity: NumNodes) -> Self {
        Self::with_chunk_capacity(capacity, DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates a store for ids `0..capacity` whose chunks hold at most `chunk_capacity` bytes.
    ///
    /// # Panics
    /// Panics if `chunk_capacity` is too small to hold the reserved padding byte or exceeds the
    /// `u32` range of stored lengths.
    pub fn with_chunk_capacity(capacity: NumNodes, chunk_capacity: usize) -> Self {
        assert!(chunk_capacity > PADDING.len());
        assert!(
            chunk_capacity <= u32::MAX as usize,
            "Chunk capacity {chunk_capacity} exceeds the range of value lengths"
        );

        Self {
            chunks: Vec::new(),
            open: PADDING.to_string(),
            starts: vec![0; capacity as usize],
            lengths: vec![0; capacity as usize],
            chunk_capacity,
            number_of_values: 0,
            frozen: false,
        }
    }

    /// Maximum number of ids this store can hold
    pub fn capacity(&self) -> NumNodes {
        self.starts.len() as NumNodes
    }

    /// Number of puts into previously unwritten ids
    pub fn len(&self) -> usize {
        self.number_of_values
    }

    /// Returns *true* if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.number_of_values == 0
    }

    /// Returns *true* if the store has been frozen and is readable
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of chunks (including the open chunk before freezing)
    pub fn number_of_chunks(&self) -> usize {
        self.chunks.len() + usize::from(!self.frozen)
    }

    /// Stores `value` for `id`, replacing a previous value.
    /// The bytes of a replaced value stay in the buffer.
    ///
    /// # Panics
    /// Panics if
    /// - the store is already frozen,
    /// - `id` is not below [`CompactStringStore::capacity`], or
    /// - `value` is longer than the chunk capacity.
    pub fn put(&mut self, id: Node, value: &str) {
        assert!(!self.frozen, "CompactStringStore is frozen");
        assert!(id < self.capacity(), "Id {id} exceeds store capacity");
        assert!(
            value.len() <= self.chunk_capacity,
            "Value of length {} exceeds chunk capacity",
            value.len()
        );

        // Offsets stay strictly below `chunk_capacity`
        if self.open.len() + value.len() >= self.chunk_capacity && !self.open.is_empty() {
            self.seal_open_chunk();
        }

        let start = (self.chunks.len() * self.chunk_capacity + self.open.len()) as u64;
        self.open.push_str(value);

        let idx = id as usize;
        if self.starts[idx] == 0 {
            self.number_of_values += 1;
        }
        self.starts[idx] = start;
        self.lengths[idx] = value.len() as u32;
    }

    /// Seals the last chunk and switches the store into its read phase.
    ///
    /// # Panics
    /// Panics if the store is already frozen.
    pub fn freeze(&mut self) {
        assert!(!self.frozen, "CompactStringStore is already frozen");
        self.seal_open_chunk();
        self.frozen = true;
    }

    /// Returns the value stored for `id` or `None` if `id` was never written or is out of range.
    ///
    /// # Panics
    /// Panics if the store has not been frozen yet.
    pub fn get(&self, id: Node) -> Option<&str> {
        assert!(self.frozen, "CompactStringStore is not yet frozen");

        let idx = id as usize;
        let start = *self.starts.get(idx)? as usize;
        let length = self.lengths[idx] as usize;
        if start == 0 {
            debug_assert_eq!(length, 0);
            return None;
        }

        let chunk = &self.chunks[start / self.chunk_capacity];
        let offset = start % self.chunk_capacity;
        Some(&chunk[offset..offset + length])
    }

    fn seal_open_chunk(&mut self) {
        let sealed = std::mem::take(&mut self.open);
        self.chunks.push(sealed);
    }
}
