use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};
use log::info;
use nalgebra::Point2;
use tagboard::core::Anchor;
use tagboard::dict::{BitMatrix, DictError, DictionaryProvider, DictionaryRegistry, Matcher};
use tagboard::finder::{match_any, match_single};
use tagboard::{
    ConfigError, EditorConfig, EditorError, EditorEvent, EditorState, FinderSelection, LayoutError, MarkerCode,
    MatchOutcome, RasterError, RasterFormat,
};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dict(#[from] DictError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("marker generation failed: {0}")]
    Generation(String),
    #[error("{0}")]
    Usage(String),
}

#[derive(Parser, Debug)]
#[command(name = "tagboard", version, about = "Fiducial marker layouts from the command line")]
struct Cli {
    /// Editor configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dictionary JSON files, in addition to those in the config.
    #[arg(long = "dict", value_name = "PATH", global = true)]
    dictionaries: Vec<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten a layout file into a raster image.
    Render(RenderArgs),
    /// Generate a single marker image.
    Marker(MarkerArgs),
    /// Look a bit string up in one dictionary or in every dictionary of a size.
    Find(FindArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Layout JSON as produced by the editor export.
    #[arg(long)]
    layout: PathBuf,
    /// Output image path.
    #[arg(long)]
    out: PathBuf,
    /// Output format; guessed from the extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
    /// JPEG quality, 1-100.
    #[arg(long)]
    quality: Option<u8>,
}

#[derive(Args, Debug)]
struct MarkerArgs {
    /// Dictionary name.
    #[arg(long)]
    name: String,
    /// Marker id; clamped to the dictionary size.
    #[arg(long)]
    id: u32,
    /// Requested side in pixels; snapped to a multiple of the cell count.
    #[arg(long, default_value_t = 100.0)]
    size: f64,
    /// Output image path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["name", "any"])))]
struct FindArgs {
    /// Dictionary name.
    #[arg(long)]
    name: Option<String>,
    /// Interior size class, e.g. 4 for every 4x4 dictionary.
    #[arg(long)]
    any: Option<usize>,
    /// Interior cells, row-major, '0' black and '1' white.
    #[arg(long)]
    bits: String,
    /// Also report matches of the rotated grid.
    #[arg(long)]
    rotations: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn verbosity(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    if let Err(err) = tagboard::core::init_with_level(verbosity(verbose)) {
        eprintln!("warning: logger already set: {err}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8) {
    tagboard::core::init_tracing(verbosity(verbose));
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load_json(path)?,
        None => EditorConfig::default(),
    };
    let mut registry = config.build_registry()?;
    for path in &cli.dictionaries {
        registry.load_json_file(path)?;
    }
    info!("{} dictionaries available", registry.len());
    let registry = Arc::new(registry);

    match cli.command {
        Command::Render(args) => render(registry, config, &args),
        Command::Marker(args) => marker(registry, config, &args),
        Command::Find(args) => find(&registry, &args),
    }
}

fn output_format(path: &Path, format: Option<FormatArg>, quality: u8) -> RasterFormat {
    let format = match format {
        Some(FormatArg::Png) => RasterFormat::Png,
        Some(FormatArg::Jpeg) => RasterFormat::jpeg(),
        None => RasterFormat::from_extension(path).unwrap_or_default(),
    };
    match format {
        RasterFormat::Jpeg { .. } => RasterFormat::Jpeg { quality },
        png => png,
    }
}

fn render(
    registry: Arc<DictionaryRegistry>,
    config: EditorConfig,
    args: &RenderArgs,
) -> Result<(), CliError> {
    let quality = args.quality.unwrap_or(config.jpeg_quality);
    let mut editor = EditorState::new(registry, config)?;
    let report = editor.import_layout(&fs::read_to_string(&args.layout)?)?;

    let scene = editor.render();
    for event in editor.drain_events() {
        log::debug!("{event:?}");
    }
    let format = output_format(&args.out, args.format, quality);
    tagboard::raster::write(&scene, format, &args.out)?;
    println!(
        "wrote {} ({}x{}, {} markers, {} skipped)",
        args.out.display(),
        scene.width(),
        scene.height(),
        report.imported,
        report.skipped
    );
    Ok(())
}

fn marker(
    registry: Arc<DictionaryRegistry>,
    config: EditorConfig,
    args: &MarkerArgs,
) -> Result<(), CliError> {
    let dict = registry.get(&args.name)?;
    let unit = u32::try_from(dict.mark_size()).unwrap_or(u32::MAX);
    let side = tagboard::snap_size(args.size, unit).map_err(EditorError::from)?;

    let config = EditorConfig {
        canvas_width: side,
        canvas_height: side,
        background_color: "#ffffff".into(),
        ..config
    };
    let quality = config.jpeg_quality;
    let mut editor = EditorState::new(Arc::clone(&registry), config)?;
    let id = editor.add_marker(
        MarkerCode::fixed(args.name.as_str(), args.id),
        Point2::new(0.0, 0.0),
        f64::from(side),
        Anchor::TOP_LEFT,
    )?;
    let scene = editor.render();
    let failure = editor.drain_events().find_map(|e| match e {
        EditorEvent::GenerationFailed { message, .. } => Some(message),
        _ => None,
    });
    if let Some(message) = failure {
        return Err(CliError::Generation(message));
    }

    let stored_id = match editor.marker(id).map(|m| m.code()) {
        Some(MarkerCode::FixedGrid { id, .. }) => *id,
        _ => args.id,
    };
    let format = output_format(&args.out, None, quality);
    tagboard::raster::write(&scene, format, &args.out)?;
    println!(
        "wrote {} ({} id {stored_id}, {side}px)",
        args.out.display(),
        args.name
    );
    Ok(())
}

fn find(registry: &DictionaryRegistry, args: &FindArgs) -> Result<(), CliError> {
    let bits = BitMatrix::from_bit_str(&args.bits)?;
    let selection = match (&args.name, args.any) {
        (Some(name), _) => FinderSelection::Dictionary(name.clone()),
        (None, Some(n)) => FinderSelection::AnySize(n),
        (None, None) => return Err(CliError::Usage("either --name or --any is required".into())),
    };

    let outcome = match &selection {
        FinderSelection::Dictionary(name) => {
            let dict = registry.get(name)?;
            if dict.interior_size() != bits.side() {
                return Err(DictError::SideMismatch {
                    expected: dict.interior_size(),
                    got: bits.side(),
                }
                .into());
            }
            match_single(&bits, dict).map_or(MatchOutcome::NoMatch, |id| MatchOutcome::Found { id })
        }
        FinderSelection::AnySize(n) => {
            let hits = match_any(&bits, *n, registry.iter());
            if hits.is_empty() {
                MatchOutcome::NoMatch
            } else {
                MatchOutcome::FoundAny(hits)
            }
        }
    };
    println!("{outcome}");

    if args.rotations {
        let candidates: Vec<_> = match &selection {
            FinderSelection::Dictionary(name) => vec![registry.get(name)?],
            FinderSelection::AnySize(n) => registry.by_interior_size(*n).collect(),
        };
        for dict in candidates {
            if let Some(m) = Matcher::new(dict, 0).match_bits(&bits) {
                println!(
                    "{} ID: {} rotation: {} hamming: {}",
                    dict.name, m.id, m.rotation, m.hamming
                );
            }
        }
    }
    Ok(())
}
