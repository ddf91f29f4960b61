use std::path::PathBuf;

use roadgraph::LengthMode;

/// Compiler of OpenStreetMap data from osm.pbf format to an in-memory
/// routable road graph
#[derive(Debug, clap::Parser)]
#[clap(about, version, author)]
pub struct Args {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Input OSM pbf file
    pub input: PathBuf,

    /// Edge length policy
    #[clap(long, value_enum, default_value = "unit")]
    pub length: LengthArg,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LengthArg {
    /// Unit cost of 1 per edge
    Unit,
    /// Straight-line distance between endpoints, in decimeters
    Euclidean,
    /// Distance along the way geometry, in decimeters
    Polyline,
}

impl From<LengthArg> for LengthMode {
    fn from(arg: LengthArg) -> Self {
        match arg {
            LengthArg::Unit => LengthMode::Unit,
            LengthArg::Euclidean => LengthMode::Euclidean,
            LengthArg::Polyline => LengthMode::Polyline,
        }
    }
}
