//! Compiles an OpenStreetMap osm.pbf extract into a compact in-memory
//! routable road graph: vertices at road intersections and dead ends, and a
//! packed adjacency of symmetric directed edges between them.
//!
//! The input is usually far larger than the output, so the graph is built by
//! four sequential passes over the same memory-mapped file, each decoding
//! only the block types it needs. Working memory is dominated by two flat
//! hash tables that map sparse 64-bit node ids to dense 32-bit indices; all
//! other tables are plain arrays sized exactly from earlier passes.
//!
//! ```no_run
//! let graph = roadgraph::build("planet.osm.pbf")?;
//! for vertex in 0..graph.num_vertices() as u32 {
//!     for edge in graph.out_edges(vertex) {
//!         println!("{} -> {}", vertex, edge.target);
//!     }
//! }
//! # Ok::<(), roadgraph::Error>(())
//! ```

mod builder;
mod error;
mod graph;
mod ids;
pub mod pbf;
pub mod proto;
mod stats;

pub use builder::{build, build_with, LengthMode, Options};
pub use error::{Error, Result};
pub use graph::{project, Edge, Graph, Vertex, DEC_PER_DEG};
pub use stats::Stats;
