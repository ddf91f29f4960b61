mod args;

use clap::Parser;
use colored::Colorize;
use log::info;

use roadgraph::{build_with, Options};

fn run(args: args::Args) -> roadgraph::Result<()> {
    let options = Options {
        length_mode: args.length.into(),
    };
    let (graph, stats) = build_with(&args.input, options)?;
    info!(
        "graph ready: {} vertices, {} edges",
        graph.num_vertices(),
        graph.num_edges()
    );
    println!("{stats}");
    Ok(())
}

fn main() {
    let args = args::Args::parse();
    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_module_path(false)
        .format_timestamp_nanos()
        .init();

    if let Err(e) = run(args) {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }
}
