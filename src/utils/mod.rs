/*!
# Utilities

Data structures that keep per-node data of `10^8` nodes compact:
- [`CompactStringStore`](self::string_store::CompactStringStore): id-indexed strings in a few
  large chunks instead of one allocation per node.
*/

pub mod string_store;
