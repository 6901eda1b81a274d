//! Citation map CLI
//!
//! # Usage
//!
//! ```bash
//! # Lay out all records below data/wos around the seed layout in input/core.gexf
//! citemap layout input/core.gexf
//!
//! # Render the layout into files/im-la-core.png, coloured by subject
//! citemap render files/la-core.csv --subjects input/wos-node-subjects.txt
//!
//! # Join the layout with titles and years
//! citemap annotate files/la-core.csv
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use citemap::{
    annotate::{RecordIndex, try_annotate_file},
    io::*,
    layout::*,
    node::{DEFAULT_CAPACITY, Node, NumNodes, Position},
    render::*,
};

/// Directory of all default outputs
const OUTPUT_DIR: &str = "files";

#[derive(Parser)]
#[command(name = "citemap")]
#[command(about = "Layouts and density images of large citation graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug messages (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Place all nodes reachable from a seed layout
    Layout(LayoutArgs),

    /// Render a layout as PNG
    Render(RenderArgs),

    /// Join a layout with titles and years
    Annotate(AnnotateArgs),
}

#[derive(Args)]
struct RecordArgs {
    /// Directory searched recursively for *.txt record files
    #[arg(short, long, default_value = "data/wos")]
    data_dir: PathBuf,

    /// Number of nodes per-node arrays are allocated for
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: NumNodes,
}

#[derive(Args)]
struct LayoutArgs {
    /// Seed layout with `<node id=...>` and `<viz:position ...>` lines
    base: PathBuf,

    /// Output CSV [default: files/la-<base>.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,

    /// Standard deviation of the jitter added to every placement
    #[arg(short, long, default_value_t = DEFAULT_NOISE)]
    noise: f64,

    /// Offset added to seed coordinates
    #[arg(long, default_value_t = DEFAULT_OFFSET)]
    offset: f64,

    /// Neighbor thresholds of the expansion passes
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_THRESHOLDS)]
    thresholds: Vec<u32>,

    /// Threshold repeated until no more nodes are placed
    #[arg(long, default_value_t = DEFAULT_FINAL_THRESHOLD)]
    final_threshold: u32,

    /// Seed of the jitter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Layout CSV of an earlier (partial) run whose positions are kept verbatim
    #[arg(long)]
    resume: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum)]
enum ZOrderArg {
    NodesOverEdges,
    EdgesOverNodes,
}

impl From<ZOrderArg> for ZOrder {
    fn from(value: ZOrderArg) -> Self {
        match value {
            ZOrderArg::NodesOverEdges => ZOrder::NodesOverEdges,
            ZOrderArg::EdgesOverNodes => ZOrder::EdgesOverNodes,
        }
    }
}

#[derive(Args)]
struct RenderArgs {
    /// Layout CSV
    layout: PathBuf,

    /// Output PNG [default: files/im-<layout>.png]
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,

    /// Width and height in pixels
    #[arg(short, long, default_value_t = DEFAULT_SIZE)]
    size: u32,

    /// Factor from layout coordinates to pixels
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: f64,

    /// Diameter of node disks in pixels
    #[arg(long, default_value_t = DEFAULT_DOT_SIZE)]
    dot_size: f32,

    /// Opacity of node disks
    #[arg(long, default_value_t = DEFAULT_NODE_ALPHA)]
    node_alpha: f32,

    /// Opacity of a single edge
    #[arg(long, default_value_t = DEFAULT_EDGE_ALPHA)]
    edge_alpha: f32,

    /// Subject codes per node (`<id>;<codes>` lines); nodes are blue without it
    #[arg(long)]
    subjects: Option<PathBuf>,

    /// Subject code to category CSV
    #[arg(long, default_value = "input/wos-subjects.csv")]
    subject_map: PathBuf,

    /// Which layer is painted on top
    #[arg(long, value_enum, default_value_t = ZOrderArg::NodesOverEdges)]
    z_order: ZOrderArg,
}

#[derive(Args)]
struct AnnotateArgs {
    /// Layout CSV
    layout: PathBuf,

    /// Output CSV [default: files/an-<layout>.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    records: RecordArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Layout(args) => layout(args),
        Commands::Render(args) => render(args),
        Commands::Annotate(args) => annotate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn layout(args: LayoutArgs) -> anyhow::Result<()> {
    let config = LayoutConfig::default()
        .capacity(args.records.capacity)
        .offset(args.offset)
        .noise(args.noise)
        .thresholds(args.thresholds)
        .final_threshold(args.final_threshold);
    let mut engine = LayoutEngine::new(config, Pcg64Mcg::seed_from_u64(args.seed))?;

    // The resume file may be the output itself, so it is read completely before truncating
    let mut resumed: Vec<(Node, Position)> = Vec::new();
    if let Some(resume) = &args.resume {
        let stats = try_read_layout_file(resume, |u, position| {
            engine.resume_position(u, position, &mut resumed).map(|_| ())
        })
        .with_context(|| format!("cannot resume from {}", resume.display()))?;
        info!(
            rows = stats.rows,
            malformed = stats.malformed,
            seeds = engine.number_of_seeds(),
            "Resumed layout"
        );
    }

    let output = output_path(args.output, &args.base, "la", "csv")?;
    let mut writer = LayoutCsvWriter::try_create(&output)?;
    for (u, position) in resumed {
        writer.write_row(u, position)?;
    }

    let stats = try_read_base_points_file(&args.base, |u, x, y| {
        engine.seed_position(u, x, y, &mut writer).map(|_| ())
    })
    .with_context(|| format!("cannot read seed layout {}", args.base.display()))?;
    info!(
        points = stats.points,
        errors = stats.errors,
        seeds = engine.number_of_seeds(),
        "Read seed layout"
    );
    if stats.points == 0 {
        warn!(base = %args.base.display(), "Seed layout contains no positions");
    }

    let source = RecordDirectory::new(&args.records.data_dir);
    let summary = engine.run(&source, &mut writer)?;

    let rows = writer.rows();
    writer.finish()?;
    info!(
        output = %output.display(),
        rows,
        placed = summary.placed(),
        missing = summary.missing(),
        "Wrote layout"
    );
    Ok(())
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let config = RenderConfig::default()
        .size(args.size)
        .scale(args.scale)
        .dot_size(args.dot_size)
        .node_alpha(args.node_alpha)
        .edge_alpha(args.edge_alpha)
        .z_order(args.z_order.into());
    let mut renderer = Renderer::new(config)?;

    let capacity = args.records.capacity;
    let (positions, stats) = try_load_layout_file(&args.layout, capacity)
        .with_context(|| format!("cannot read layout {}", args.layout.display()))?;
    info!(
        rows = stats.rows,
        malformed = stats.malformed,
        "Read layout"
    );
    if stats.malformed > 0 {
        warn!(malformed = stats.malformed, "Skipped malformed layout rows");
    }

    let categories = match &args.subjects {
        Some(subjects) => Some(read_categories(subjects, &args.subject_map, capacity)?),
        None => None,
    };

    let output = output_path(args.output, &args.layout, "im", "png")?;
    renderer.draw_edges(&RecordDirectory::new(&args.records.data_dir), &positions)?;
    let image = renderer.compose(&positions, categories.as_ref());
    save_png(&image, &output)?;
    Ok(())
}

fn read_categories(
    subjects: &Path,
    subject_map: &Path,
    capacity: NumNodes,
) -> anyhow::Result<Categories> {
    let map = try_read_subject_map_file(subject_map)
        .with_context(|| format!("cannot read subject map {}", subject_map.display()))?;
    info!(codes = map.len(), "Read subject map");

    let mut categories = Categories::new(capacity);
    let skipped = try_read_categories_file(subjects, &map, &mut categories)
        .with_context(|| format!("cannot read subjects {}", subjects.display()))?;

    for (category, nodes) in categories.totals().iter().enumerate() {
        info!(category, nodes, "Category total");
    }
    info!(skipped, "Read subjects");
    Ok(categories)
}

fn annotate(args: AnnotateArgs) -> anyhow::Result<()> {
    let source = RecordDirectory::new(&args.records.data_dir);
    let (index, _) = RecordIndex::try_build(&source, args.records.capacity)?;

    let output = output_path(args.output, &args.layout, "an", "csv")?;
    try_annotate_file(&index, &args.layout, &output)?;
    Ok(())
}

/// Returns `output` or `files/<prefix>-<input name up to its first dot>.<extension>`, creating
/// missing directories
fn output_path(
    output: Option<PathBuf>,
    input: &Path,
    prefix: &str,
    extension: &str,
) -> anyhow::Result<PathBuf> {
    let output = output.unwrap_or_else(|| {
        // everything from the first dot on is dropped: `core.v2.gexf` becomes `core`
        let name = input.file_name().unwrap_or_default().to_string_lossy();
        let stem = name.split('.').next().unwrap_or_default();
        Path::new(OUTPUT_DIR).join(format!("{prefix}-{stem}.{extension}"))
    });

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    Ok(output)
}
