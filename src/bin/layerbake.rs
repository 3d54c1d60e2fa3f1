use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use layerbake::{
    BakeOptions,
    BakingResult,
    CanvasPolicy,
    Session,
    config::{BakeConfig, parse_canvas, parse_list, parse_opacities, parse_positions},
};

#[derive(Parser, Debug)]
#[command(name = "layerbake", version, about = "Composite image layers and their annotations")]
struct Cli {
    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite layers into one image.
    #[command(subcommand)]
    Bake(BakeCommand),
    /// Print the size and color type of an image.
    Info(InfoArgs),
    /// Print the version.
    Version,
}

#[derive(Subcommand, Debug)]
enum BakeCommand {
    /// Composite images given on the command line, first image at the bottom.
    Simple(SimpleArgs),
    /// Composite the layers described by a JSON config file.
    FromConfig(FromConfigArgs),
}

#[derive(Parser, Debug)]
struct SimpleArgs {
    /// Image files to composite.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output image path.
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Positions as 'x1,y1;x2,y2;...'.
    #[arg(short, long, allow_hyphen_values = true)]
    positions: Option<String>,

    /// Opacities as 'o1,o2,...' in [0, 1].
    #[arg(long)]
    opacities: Option<String>,

    /// Uniform scales as 's1,s2,...'.
    #[arg(long)]
    scales: Option<String>,

    /// Rotations in degrees as 'r1,r2,...'.
    #[arg(long, allow_hyphen_values = true)]
    rotations: Option<String>,

    /// Fixed canvas size as WIDTHxHEIGHT; defaults to fitting all layers.
    #[arg(long)]
    canvas: Option<String>,

    /// Write annotations as a JSON sidecar next to the output.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FromConfigArgs {
    /// Bake config JSON.
    config: PathBuf,

    /// Output image path; overrides the config's `output`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write annotations as a JSON sidecar next to the output.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Image to inspect.
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    match cli.cmd {
        Command::Bake(BakeCommand::Simple(args)) => cmd_bake_simple(args),
        Command::Bake(BakeCommand::FromConfig(args)) => cmd_bake_from_config(args),
        Command::Info(args) => cmd_info(args),
        Command::Version => {
            println!("layerbake {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_bake_simple(args: SimpleArgs) -> anyhow::Result<()> {
    let n = args.images.len();
    let positions = parse_positions(args.positions.as_deref(), n)?;
    let opacities = parse_opacities(args.opacities.as_deref(), n)?;
    let scales = parse_list(args.scales.as_deref(), n, 1.0, "scales")?;
    let rotations = parse_list(args.rotations.as_deref(), n, 0.0, "rotations")?;

    let mut opts = BakeOptions::default();
    if let Some(canvas) = args.canvas.as_deref() {
        let (width, height) = parse_canvas(canvas)?;
        opts.canvas = CanvasPolicy::Fixed { width, height };
    }

    let mut session = Session::new();
    for (i, path) in args.images.iter().enumerate() {
        let id = session
            .add_layer_from_file(path)
            .with_context(|| format!("load layer {i}"))?;
        let (x, y) = positions[i];
        session.set_layer_position(id, x, y)?;
        session.set_layer_opacity(id, opacities[i])?;
        session.set_layer_scale(id, scales[i], None)?;
        session.set_layer_rotation(id, rotations[i])?;
    }

    let result = session.bake(None, &opts)?;
    write_result(&result, &args.output, args.json)
}

fn cmd_bake_from_config(args: FromConfigArgs) -> anyhow::Result<()> {
    let cfg = BakeConfig::load(&args.config)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));
    let session = cfg
        .build_session(base_dir)
        .with_context(|| format!("build layers from '{}'", args.config.display()))?;

    let output = args
        .output
        .or_else(|| cfg.output.as_ref().map(|p| base_dir.join(p)))
        .context("no output path: pass --output or set 'output'")?;

    let result = session.bake(None, &cfg.options)?;
    write_result(&result, &output, args.json || cfg.save_annotations)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let img = image::open(&args.image)
        .with_context(|| format!("open image '{}'", args.image.display()))?;
    println!(
        "{}: {}x{} {:?}",
        args.image.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(())
}

fn write_result(result: &BakingResult, output: &Path, json: bool) -> anyhow::Result<()> {
    let saved = result
        .save(output, json)
        .with_context(|| format!("write '{}'", output.display()))?;
    eprintln!("wrote {}", saved.image.display());
    if let Some(p) = saved.annotations {
        eprintln!("wrote {}", p.display());
    }
    Ok(())
}
