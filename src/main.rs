use clap::{Parser, Subcommand};
use imagestate::config::{self, BackendConfig};
use imagestate::imaging::{
    DecodedImage, FileFormat, ImageBackend, ImageFile, Operation, OperationOutput, Quality, Rect,
    RustBackend, Size, State, StateKind,
};
use imagestate::output::{self, ImageInfo};
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "imagestate")]
#[command(about = "Decode, transform and re-encode JPEG, PNG and GIF images")]
#[command(long_about = "\
Decode, transform and re-encode JPEG, PNG and GIF images

Every command goes through the same backend a state-graph resolver would
use: files decode into an in-memory image (JPEG EXIF orientation applied),
operations return new images, and encoders or raw-buffer converters
produce the output.

Output format for 'convert' follows the output file extension
(.jpg/.jpeg, .png, .gif). GIF output needs a palette or grayscale image.

Crop boxes are L,T,R,B with right/bottom exclusive. Parts of the box
outside the image are filled with zeros (black, or transparent).

Run 'imagestate gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Backend config file (TOML). Stock defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print size, color mode, alpha and animation flags
    Info {
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Decode, optionally crop and resize, then encode by output extension
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Crop box applied before resizing, as L,T,R,B
        #[arg(long, allow_hyphen_values = true)]
        crop: Option<Rect>,
        /// Resize target, as WIDTHxHEIGHT
        #[arg(long)]
        resize: Option<Size>,
        /// JPEG quality 0-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Dump packed pixels (no header) as RGB, or RGBA with --rgba
    Raw {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        rgba: bool,
    },
    /// Show the backend's declared operations and converters
    Capabilities {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let backend_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Info { input, json } => {
            let backend = ready_backend(backend_config)?;
            let (image, format) = decode_file(&backend, &input)?;
            let info = ImageInfo::of(&image, format);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&input, &info);
            }
        }
        Command::Convert {
            input,
            output: target,
            crop,
            resize,
            quality,
        } => {
            let backend = ready_backend(backend_config)?;
            let format = FileFormat::from_path(&target).ok_or_else(|| {
                format!(
                    "cannot infer output format from '{}'; use .jpg, .png or .gif",
                    target.display()
                )
            })?;

            let (mut image, _) = decode_file(&backend, &input)?;
            if let Some(rect) = crop {
                image = apply_image(&backend, image, Operation::Crop(rect))?;
            }
            if let Some(size) = resize {
                image = apply_image(&backend, image, Operation::Resize(size))?;
            }

            let save = match format {
                FileFormat::Jpeg => Operation::SaveAsJpeg(quality.map(Quality::new)),
                FileFormat::Png => Operation::SaveAsPng,
                FileFormat::Gif => Operation::SaveAsGif,
            };
            let state = State::Decoded(image);
            let file = match backend.apply(&state, save)? {
                OperationOutput::File(file) => file,
                other => return Err(format!("save returned {other:?}").into()),
            };
            std::fs::write(&target, &file.bytes)?;

            if let State::Decoded(image) = &state {
                println!(
                    "{}",
                    output::format_written(&input, &target, image, file.bytes.len())
                );
            }
        }
        Command::Raw {
            input,
            output: target,
            rgba,
        } => {
            let backend = ready_backend(backend_config)?;
            let (image, _) = decode_file(&backend, &input)?;
            let kind = if rgba {
                StateKind::RgbaBuffer
            } else {
                StateKind::RgbBuffer
            };
            let data = match backend.convert(&State::Decoded(image.clone()), kind)? {
                State::RgbBuffer(buffer) => buffer.into_raw(),
                State::RgbaBuffer(buffer) => buffer.into_raw(),
                other => return Err(format!("converter returned {:?}", other.kind()).into()),
            };
            std::fs::write(&target, &data)?;
            println!(
                "{}",
                output::format_written(&input, &target, &image, data.len())
            );
        }
        Command::Capabilities { json } => {
            let backend = RustBackend::with_config(backend_config);
            let available = backend.is_available();
            let caps = backend.capabilities();
            if json {
                println!("{}", serde_json::to_string_pretty(&caps)?);
            } else {
                output::print_capabilities(&caps, available);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Build the backend and run its registration-time probe.
fn ready_backend(config: BackendConfig) -> CliResult<RustBackend> {
    let backend = RustBackend::with_config(config);
    backend.probe()?;
    Ok(backend)
}

/// Read a file, identify its format (magic bytes first, then extension) and
/// follow the file → decoded converter.
fn decode_file(backend: &RustBackend, path: &Path) -> CliResult<(DecodedImage, FileFormat)> {
    let bytes = std::fs::read(path)?;
    let format = FileFormat::sniff(&bytes)
        .or_else(|| FileFormat::from_path(path))
        .ok_or_else(|| format!("'{}' is not a JPEG, PNG or GIF file", path.display()))?;

    let file = State::File(ImageFile::new(format, bytes));
    match backend.convert(&file, StateKind::Decoded)? {
        State::Decoded(image) => Ok((image, format)),
        other => Err(format!("decode returned {:?}", other.kind()).into()),
    }
}

fn apply_image(backend: &RustBackend, image: DecodedImage, op: Operation) -> CliResult<DecodedImage> {
    match backend.apply(&State::Decoded(image), op)? {
        OperationOutput::Image(image) => Ok(image),
        other => Err(format!("{op:?} returned {other:?}").into()),
    }
}
