use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use deck_records::colour::Palette;
use deck_records::{ColourFormat, DataTable, Layer, MaterializeOptions, layer_json, storage};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "deckrec",
    version,
    about = "Merge map layer styling parameters over defaults and emit layer JSON"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Point cloud layer (polyline, elevation, radius, fill_colour).
    Pointcloud(LayerArgs),
    /// Extruded column layer (polyline, elevation, fill/stroke colour, stroke_width).
    Column(LayerArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PaletteArg {
    Viridis,
    Office,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ColourFormatArg {
    Hex,
    Rgba,
}

#[derive(Args, Debug)]
struct LayerArgs {
    /// Data file (.csv or .json array of row objects).
    #[arg(long, conflicts_with = "rows")]
    data: Option<PathBuf>,
    /// Row count when no data file is given.
    #[arg(long)]
    rows: Option<usize>,
    /// Styling parameters as inline JSON, e.g. '{"radius": 50}'.
    #[arg(long, conflicts_with = "params_file")]
    params: Option<String>,
    /// Read styling parameters from a JSON file.
    #[arg(long)]
    params_file: Option<PathBuf>,
    /// Palette for data-mapped colours.
    #[arg(long, value_enum, default_value = "viridis")]
    palette: PaletteArg,
    /// How colours are written.
    #[arg(long, value_enum, default_value = "hex")]
    colour_format: ColourFormatArg,
    /// Alpha (0-255) for data-mapped colours.
    #[arg(long)]
    opacity: Option<u8>,
    /// Write the result here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Pointcloud(args) => cmd_layer(Layer::Pointcloud, args),
        Command::Column(args) => cmd_layer(Layer::Column, args),
    }
}

fn read_params(args: &LayerArgs) -> Result<Value> {
    let text = match (&args.params, &args.params_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        (None, None) => return Ok(Value::Null),
    };
    serde_json::from_str(&text).context("parse params json")
}

fn cmd_layer(layer: Layer, args: LayerArgs) -> Result<()> {
    let table = match (&args.data, args.rows) {
        (Some(path), _) => storage::load_table(path)?,
        (None, Some(n)) => DataTable::with_rows(n),
        (None, None) => anyhow::bail!("either --data or --rows is required"),
    };
    let params = read_params(&args)?;
    let options = MaterializeOptions {
        palette: match args.palette {
            PaletteArg::Viridis => Palette::Viridis,
            PaletteArg::Office => Palette::Office,
        },
        colour_format: match args.colour_format {
            ColourFormatArg::Hex => ColourFormat::Hex,
            ColourFormatArg::Rgba => ColourFormat::Rgba,
        },
        opacity: args.opacity,
    };

    let payload = layer_json(layer, &table, &params, &options)?;

    match args.out.as_ref() {
        Some(path) => {
            storage::save_payload(&payload, path)?;
            eprintln!("Wrote {} rows to {}", table.nrows(), path.display());
        }
        None => println!("{}", payload.to_document()),
    }
    Ok(())
}
