//! The four-pass pipeline that turns a node/way stream into the graph.
//!
//! Each pass is one sequential scan of the same file:
//!
//! 1. count nodes, to size the id maps;
//! 2. classify the nodes of routable ways into interior highway nodes and
//!    intersections, assigning dense ids in first-encounter order;
//! 3. materialize coordinates and tally per-vertex edge counts;
//! 4. emit edge records into the exactly pre-sized adjacency.
//!
//! All intermediate state lives in one [`Builder`] value; the pass handlers
//! borrow disjoint parts of it.

use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{project, Edge, Graph, Vertex};
use crate::ids::{DenseIdMap, ABSENT};
use crate::pbf::{Handlers, Reader};
use crate::proto;
use crate::stats::Stats;

/// Tag key that marks a way as part of the road network. The value is not
/// inspected.
const HIGHWAY_KEY: &[u8] = b"highway";

/// How edge lengths are computed during the emit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthMode {
    /// Every edge costs 1.
    #[default]
    Unit,
    /// Straight-line distance between the two endpoint vertices, in
    /// decimeters, saturating at `u16::MAX`.
    Euclidean,
    /// Sum of segment lengths over the way geometry between the two
    /// endpoints, in decimeters, saturating at `u16::MAX`.
    Polyline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub length_mode: LengthMode,
}

/// Builds the road graph of `path` with default options.
pub fn build<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let (graph, _) = build_with(path, Options::default())?;
    Ok(graph)
}

/// Builds the road graph of `path`, also returning the pass counters.
pub fn build_with<P: AsRef<Path>>(path: P, options: Options) -> Result<(Graph, Stats)> {
    let reader = Reader::open(path.as_ref())?;
    debug!("indexed {} blocks", reader.num_blocks());

    let mut builder = Builder::new(options);
    builder.pass1_count(&reader)?;
    builder.allocate_maps();
    builder.pass2_classify(&reader)?;
    builder.allocate_tables();
    builder.pass3_materialize(&reader)?;
    builder.layout_edges()?;
    builder.pass4_emit(&reader)?;
    Ok(builder.finish())
}

/// True iff any tag key resolves to the exact bytes `highway`. Out-of-range
/// indices and arbitrary (even non-UTF-8) table entries simply fail the
/// comparison.
fn is_routable(way: &proto::Way, strings: &proto::StringTable) -> bool {
    way.keys
        .iter()
        .any(|&key| strings.s.get(key as usize).map(Vec::as_slice) == Some(HIGHWAY_KEY))
}

fn euclidean(a: (i32, i32), b: (i32, i32)) -> f64 {
    (f64::from(a.0) - f64::from(b.0)).hypot(f64::from(a.1) - f64::from(b.1))
}

fn clamp_length(length: f64) -> u16 {
    if length >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        length.round() as u16
    }
}

/// Writes one edge record into the first free slot of `from`'s run. The run
/// was sized from the exact tally, so a free slot always exists before the
/// next vertex's run begins.
fn emit(vertices: &[Vertex], edges: &mut [Edge], from: u32, to: u32, length: u16) {
    let mut slot = vertices[from as usize].first_edge as usize;
    while edges[slot].flags != 0 {
        slot += 1;
    }
    debug_assert!(slot < vertices[from as usize + 1].first_edge as usize);
    edges[slot] = Edge {
        target: to,
        length,
        flags: 1,
    };
}

/// All mutable build state, threaded through the pass handlers.
struct Builder {
    options: Options,
    /// Interior highway node id to dense coordinate index.
    highway: DenseIdMap,
    /// Intersection node id to dense vertex index.
    intersections: DenseIdMap,
    /// Projected positions of interior highway nodes.
    coords: Vec<(i32, i32)>,
    /// Outgoing-edge count per vertex.
    tally: Vec<u8>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    total_edges: u64,
    min_x: i32,
    min_y: i32,
    stats: Stats,
}

impl Builder {
    fn new(options: Options) -> Self {
        Self {
            options,
            highway: DenseIdMap::with_capacity(0),
            intersections: DenseIdMap::with_capacity(0),
            coords: Vec::new(),
            tally: Vec::new(),
            vertices: Vec::new(),
            edges: Vec::new(),
            total_edges: 0,
            min_x: i32::MAX,
            min_y: i32::MAX,
            stats: Stats::default(),
        }
    }

    /// Pass 1: count every node in the input.
    fn pass1_count(&mut self, reader: &Reader) -> Result<()> {
        let mut num_nodes: u64 = 0;
        reader.process(Handlers {
            node: Some(Box::new(|_| {
                num_nodes += 1;
                Ok(())
            })),
            ..Handlers::default()
        })?;
        self.stats.num_nodes = num_nodes;
        info!("pass 1: {} nodes", num_nodes);
        Ok(())
    }

    /// The node count only exists to size the maps before anything is
    /// inserted; they dominate peak memory, so one allocation each.
    fn allocate_maps(&mut self) {
        let num_nodes = self.stats.num_nodes as usize;
        self.highway = DenseIdMap::with_capacity(num_nodes);
        self.intersections = DenseIdMap::with_capacity(num_nodes / 2);
        debug!(
            "sized id maps for {} / {} entries",
            num_nodes,
            num_nodes / 2
        );
    }

    /// Pass 2: walk every routable way and classify its nodes.
    ///
    /// Endpoints always become intersections, so dead ends stay reachable.
    /// An interior node seen for the second time is shared between two ways
    /// and becomes an intersection too; otherwise it is recorded as a plain
    /// highway node. A node that was an endpoint first and interior later
    /// (or the other way round) ends up an intersection through the same two
    /// rules.
    fn pass2_classify(&mut self, reader: &Reader) -> Result<()> {
        let highway = &mut self.highway;
        let intersections = &mut self.intersections;
        let mut num_routable_ways: u64 = 0;

        reader.process(Handlers {
            way: Some(Box::new(|way, strings| {
                if !is_routable(way, strings) {
                    return Ok(());
                }
                num_routable_ways += 1;

                let last = way.refs.len().saturating_sub(1);
                let mut id = 0i64;
                for (i, delta) in way.refs.iter().enumerate() {
                    id += delta;
                    if i == 0 || i == last || highway.contains(id) {
                        if !intersections.contains(id) {
                            if intersections.len() >= ABSENT as usize {
                                return Err(Error::TooManyVertices);
                            }
                            intersections.put(id, intersections.len() as u32);
                        }
                    } else {
                        if highway.len() >= ABSENT as usize {
                            return Err(Error::TooManyHighwayNodes);
                        }
                        highway.put(id, highway.len() as u32);
                    }
                }
                Ok(())
            })),
            ..Handlers::default()
        })?;

        self.stats.num_routable_ways = num_routable_ways;
        info!(
            "pass 2: {} routable ways, {} vertices, {} interior highway nodes",
            num_routable_ways,
            self.intersections.len(),
            self.highway.len()
        );
        Ok(())
    }

    fn allocate_tables(&mut self) {
        let num_highway = self.highway.len();
        let num_vertices = self.intersections.len();
        self.coords = vec![(0, 0); num_highway];
        self.tally = vec![0u8; num_vertices];
        // One sentinel element past the end closes the last edge run.
        self.vertices = vec![Vertex::default(); num_vertices + 1];
        self.stats.num_highway_nodes = num_highway as u64;
        self.stats.num_vertices = num_vertices as u64;
    }

    /// Pass 3: store projected coordinates for every classified node and
    /// count the edges each vertex will receive. Nodes arrive before ways
    /// within the scan, so the way handler never sees unresolved positions.
    fn pass3_materialize(&mut self, reader: &Reader) -> Result<()> {
        let highway = &self.highway;
        let intersections = &self.intersections;
        let coords = &mut self.coords;
        let vertices = &mut self.vertices;
        let tally = &mut self.tally;
        let min_x = &mut self.min_x;
        let min_y = &mut self.min_y;
        let mut total_edges: u64 = 0;

        reader.process(Handlers {
            node: Some(Box::new(|node| {
                let h = highway.get(node.id);
                let v = intersections.get(node.id);
                if h == ABSENT && v == ABSENT {
                    return Ok(());
                }
                let (x, y) = project(node.lat_nano, node.lon_nano);
                if h != ABSENT {
                    coords[h as usize] = (x, y);
                }
                if v != ABSENT {
                    vertices[v as usize].x = x;
                    vertices[v as usize].y = y;
                }
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                Ok(())
            })),
            way: Some(Box::new(|way, strings| {
                if !is_routable(way, strings) || way.refs.len() < 2 {
                    return Ok(());
                }
                let mut id = way.refs[0];
                let mut a = intersections.get(id);
                if a == ABSENT {
                    // The first ref of a routable way is always an
                    // intersection; anything else is malformed input.
                    return Ok(());
                }
                for delta in &way.refs[1..] {
                    id += delta;
                    let b = intersections.get(id);
                    if b == ABSENT {
                        continue;
                    }
                    for vertex in [a, b] {
                        if tally[vertex as usize] == u8::MAX {
                            return Err(Error::DegreeOverflow { vertex });
                        }
                        tally[vertex as usize] += 1;
                    }
                    total_edges += 2;
                    a = b;
                }
                Ok(())
            })),
            ..Handlers::default()
        })?;

        self.total_edges = total_edges;
        info!("pass 3: {} edges tallied", total_edges);

        // Coordinates are resolved now; the big map is only kept when the
        // emit pass still needs to place interior geometry.
        if self.options.length_mode != LengthMode::Polyline {
            self.highway = DenseIdMap::with_capacity(0);
        }
        Ok(())
    }

    /// Turns the tally into prefix sums and allocates the packed edge array.
    fn layout_edges(&mut self) -> Result<()> {
        if self.total_edges > u64::from(u32::MAX) {
            return Err(Error::TooManyEdges);
        }
        let mut first_edge: u32 = 0;
        for (vertex, &count) in self.tally.iter().enumerate() {
            self.vertices[vertex].first_edge = first_edge;
            first_edge += u32::from(count);
        }
        self.vertices[self.tally.len()].first_edge = first_edge;
        debug_assert_eq!(u64::from(first_edge), self.total_edges);

        self.edges = vec![Edge::default(); first_edge as usize];
        self.stats.num_edges = u64::from(first_edge);
        Ok(())
    }

    /// Pass 4: repeat the tally walk, this time writing symmetric edge
    /// pairs into the runs laid out by [`layout_edges`](Self::layout_edges).
    fn pass4_emit(&mut self, reader: &Reader) -> Result<()> {
        let highway = &self.highway;
        let intersections = &self.intersections;
        let coords = &self.coords;
        let vertices = &self.vertices;
        let edges = &mut self.edges;
        let mode = self.options.length_mode;

        // Position of a classified node: vertices know their own position,
        // interior nodes are looked up in the coordinate table.
        let position = |id: i64| -> Option<(i32, i32)> {
            let v = intersections.get(id);
            if v != ABSENT {
                let vertex = &vertices[v as usize];
                return Some((vertex.x, vertex.y));
            }
            let h = highway.get(id);
            if h != ABSENT {
                return Some(coords[h as usize]);
            }
            None
        };

        reader.process(Handlers {
            way: Some(Box::new(|way, strings| {
                if !is_routable(way, strings) || way.refs.len() < 2 {
                    return Ok(());
                }
                let mut id = way.refs[0];
                let mut a = intersections.get(id);
                if a == ABSENT {
                    return Ok(());
                }
                let mut segment_length = 0f64;
                let mut prev_position = (vertices[a as usize].x, vertices[a as usize].y);

                for delta in &way.refs[1..] {
                    id += delta;
                    if mode == LengthMode::Polyline {
                        if let Some(next_position) = position(id) {
                            segment_length += euclidean(prev_position, next_position);
                            prev_position = next_position;
                        }
                    }
                    let b = intersections.get(id);
                    if b == ABSENT {
                        continue;
                    }
                    let length = match mode {
                        LengthMode::Unit => 1,
                        LengthMode::Euclidean => {
                            let va = &vertices[a as usize];
                            let vb = &vertices[b as usize];
                            clamp_length(euclidean((va.x, va.y), (vb.x, vb.y)))
                        }
                        LengthMode::Polyline => clamp_length(segment_length),
                    };
                    emit(vertices, edges, a, b, length);
                    emit(vertices, edges, b, a, length);
                    segment_length = 0.0;
                    a = b;
                }
                Ok(())
            })),
            ..Handlers::default()
        })?;

        info!("pass 4: {} edges emitted", edges.len());
        Ok(())
    }

    fn finish(self) -> (Graph, Stats) {
        (
            Graph {
                vertices: self.vertices,
                edges: self.edges,
                min_x: self.min_x,
                min_y: self.min_y,
            },
            self.stats,
        )
    }
}
