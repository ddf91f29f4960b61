use std::fmt;

/// Counters accumulated over the four passes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Every node in the input, road or not.
    pub num_nodes: u64,
    pub num_routable_ways: u64,
    /// Interior nodes referenced by routable ways.
    pub num_highway_nodes: u64,
    pub num_vertices: u64,
    pub num_edges: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            r#"Graph built:
  nodes scanned:  {}
  routable ways:  {}
  highway nodes:  {}
  vertices:       {}
  edges:          {}"#,
            self.num_nodes,
            self.num_routable_ways,
            self.num_highway_nodes,
            self.num_vertices,
            self.num_edges,
        )
    }
}
