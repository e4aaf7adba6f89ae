use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use hexasphere::{
    render::stl::grid_to_stl, timed, Hexasphere, HexasphereConfig,
    TerrainConfig, TileSave,
};
use log::{info, LevelFilter};
use serde::de::DeserializeOwned;
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for generating hexasphere tile grids.
#[derive(Debug, StructOpt)]
#[structopt(name = "hexasphere")]
struct Opt {
    /// Path to a config file that defines the sphere to be generated.
    /// Supported formats: JSON, TOML. If omitted, the default config is used
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// Path to a terrain config file. If given, terrain is generated on the
    /// sphere after it's built. Supported formats: JSON, TOML
    #[structopt(short, long)]
    terrain: Option<PathBuf>,

    /// Path to saved tile state (.json or .bin) to apply after generation
    #[structopt(long)]
    tiles: Option<PathBuf>,

    /// If given, output files will be saved to this directory. The exact
    /// files that appear in the directory are defined by the output formats.
    /// See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output the sphere in. Supported formats:
    ///
    /// bin - Tile state in a binary format that can be reloaded with
    ///   `--tiles`. Use this for persisting & sharing spheres
    ///
    /// cfg - The full config object used for the sphere, in TOML format
    ///
    /// json - Tile state in JSON. Similar to the binary format, but slower
    ///   and much less compact
    ///
    /// stl - 3D rendering of the sphere
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use during generation. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export tile state in a binary format, which can be loaded later
    Bin,
    /// Export the sphere's full config in a human-readable file
    Cfg,
    /// Export tile state as JSON, which can be loaded later
    Json,
    /// Render the sphere as a 3D STL
    Stl,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Bin => "bin",
            Self::Cfg => "toml",
            Self::Json => "json",
            Self::Stl => "stl",
        }
    }
}

/// Load a JSON or TOML config file into any config type
fn load_config<T: DeserializeOwned>(config_path: &Path) -> anyhow::Result<T> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .with_context(|| format!("error reading config file {}", config_path))?;
    settings.try_into().context("error reading config")
}

/// Load saved tile state, picking the format from the file extension
fn load_tiles(path: &Path) -> anyhow::Result<TileSave> {
    let bytes = fs::read(path)
        .with_context(|| format!("error reading tile file {:?}", path))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("bin") => TileSave::from_bin(bytes.as_slice()),
        Some("json") => {
            let json = String::from_utf8(bytes)
                .context("tile file is not valid UTF-8")?;
            TileSave::from_json(&json)
        }
        _ => bail!(
            "unknown tile file format {:?}, expected .bin or .json",
            path
        ),
    }
}

/// Generate an output form of the sphere in the given format.
fn gen_output(
    output_dir: &Path,
    output_format: OutputFormat,
    sphere: &Hexasphere,
) -> anyhow::Result<()> {
    fn generate_bytes(
        output_format: OutputFormat,
        sphere: &Hexasphere,
    ) -> anyhow::Result<Vec<u8>> {
        Ok(match output_format {
            OutputFormat::Bin => sphere.save_tiles().to_bin(),
            OutputFormat::Cfg => toml::to_string_pretty(sphere.config())
                .context("error serializing config")?
                .into_bytes(),
            OutputFormat::Json => sphere.save_tiles().to_json().into_bytes(),
            OutputFormat::Stl => {
                let mesh = grid_to_stl(sphere);
                let mut bytes = Vec::new();
                stl_io::write_stl(&mut bytes, mesh.iter())
                    .context("error rendering STL")?;
                bytes
            }
        })
    }

    let output_file_path = output_dir
        .join("hexasphere")
        .with_extension(output_format.file_ext());

    timed!(
        format!(
            "Generating {} output and writing to {:?}",
            output_format, &output_file_path
        ),
        log::Level::Info,
        {
            let bytes = generate_bytes(output_format, sphere)?;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&output_file_path)
                .with_context(|| {
                    format!("error opening output file {:?}", &output_file_path)
                })?;
            file.write_all(&bytes).with_context(|| {
                format!("error writing to file {:?}", &output_file_path)
            })?;
        }
    );

    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let config: HexasphereConfig = match &opt.config {
        Some(config_path) => load_config(config_path)?,
        None => HexasphereConfig::default(),
    };
    let mut sphere = Hexasphere::generate(config)?;

    if let Some(terrain_path) = &opt.terrain {
        let terrain: TerrainConfig = load_config(terrain_path)?;
        sphere.apply_terrain(&terrain)?;
    }
    if let Some(tiles_path) = &opt.tiles {
        let save = load_tiles(tiles_path)?;
        let loaded = sphere.load_tiles(&save);
        info!("Loaded {} tiles from {:?}", loaded, tiles_path);
    }

    println!(
        "{} tiles ({} pentagons), {} shaded chunks, {} wireframe chunks",
        sphere.tile_count(),
        sphere.pentagon_count(),
        sphere.mesh().shaded().len(),
        sphere.mesh().wireframe().len()
    );

    // If an output dir was specified, write out output format(s) there
    if let Some(output_dir) = opt.output {
        if opt.output_formats.is_empty() {
            bail!("output dir was specified, but no output formats were given")
        }
        fs::create_dir_all(&output_dir)?;
        for output_format in opt.output_formats {
            gen_output(&output_dir, output_format, &sphere)?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
