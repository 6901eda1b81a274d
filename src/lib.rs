/*!
`citemap` computes 2-D layouts of citation graphs with hundreds of millions of nodes and renders
them as density images, all on a single machine.

# Representation

We represent **nodes** as `u32` obtained from the zero-padded 9-digit keys of the citation records
(see [`node`]). Every per-node attribute (positions, categories, years, titles) lives in a dense
array indexed by the node itself, so there are no per-node heap objects or hash maps.
A **position** is two `f32`; the origin `(0, 0)` is reserved as the "unplaced" sentinel.

Graphs are never materialized: neighbor lists are decoded lazily from each [`record`] while the
record files are streamed, once per pass.

# Usage

There are *4* core submodules you probably want to interact with:
- [`io`] streams citation records ([`io::RecordSource`]), seed layouts, layout CSVs and subjects,
- [`layout`] places unplaced nodes at the centroid of their placed neighbors in passes of
  decreasing thresholds ([`layout::LayoutEngine`]),
- [`render`] accumulates edge density and paints node disks into a PNG ([`render::Renderer`]),
- [`annotate`] joins a layout with titles and years ([`annotate::RecordIndex`]).

All of them are configured via structs using the *Builder* / *Setter* pattern, validated before a
run starts. Per-record problems (malformed records, duplicates, missing neighbors) are counted and
logged via [`tracing`]; only I/O failures abort a run with an [`Error`].

In most use-cases, `use citemap::prelude::*;` suffices for your needs.
*/

pub mod annotate;
pub mod error;
pub mod io;
pub mod layout;
pub mod node;
pub mod record;
pub mod render;
#[cfg(test)]
pub(crate) mod testing;
pub mod utils;

pub use error::{Error, Result};

/// `citemap::prelude` includes nodes and positions, records, sources and all configurable engines.
pub mod prelude {
    pub use super::{
        annotate::RecordIndex,
        error::{Error, Result},
        io::{RecordDirectory, RecordSource},
        layout::{LayoutConfig, LayoutEngine, PlacementSink},
        node::*,
        record::CitationRecord,
        render::{RenderConfig, Renderer, ZOrder},
    };
}
