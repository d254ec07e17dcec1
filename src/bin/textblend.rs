use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use textblend::{
    DEFAULT_JPEG_QUALITY, Editor, EditorConfig, Entitlements, ExportFormat, LayerDocument,
    available_fonts, decode_image_path, encode_frame,
};

#[derive(Parser, Debug)]
#[command(name = "textblend", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite text layers under a photo and write the flattened image.
    Render(RenderArgs),
    /// Print the dimensions and aspect ratio of an image.
    Info(InfoArgs),
    /// List the font catalog available to a tier.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Base photo (PNG, JPEG, ...).
    #[arg(long)]
    image: PathBuf,

    /// Layer document JSON (`{ "layers": [...] }`).
    #[arg(long)]
    layers: Option<PathBuf>,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Output format (`png` or `jpeg`); inferred from `--out` when omitted.
    #[arg(long)]
    format: Option<ExportFormat>,

    /// JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Render the preview at this width instead of exporting at native resolution.
    #[arg(long)]
    preview_width: Option<u32>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra font directory (repeatable).
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Do not scan system fonts.
    #[arg(long, default_value_t = false)]
    no_system_fonts: bool,

    /// Upper bound on waiting for fonts, in milliseconds.
    #[arg(long)]
    font_timeout_ms: Option<u64>,

    /// Allow the full font catalog.
    #[arg(long, default_value_t = false)]
    premium: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Image to inspect.
    #[arg(long)]
    image: PathBuf,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    /// Show the premium catalog.
    #[arg(long, default_value_t = false)]
    premium: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Info(args) => cmd_info(args),
        Command::Fonts(args) => cmd_fonts(args),
    }
}

fn entitlements(premium: bool) -> Entitlements {
    if premium {
        Entitlements::premium()
    } else {
        Entitlements::free()
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::from_path(path)?,
        None => EditorConfig::default(),
    };
    config.font_dirs.extend(args.font_dirs.iter().cloned());
    if args.no_system_fonts {
        config.load_system_fonts = false;
    }
    if let Some(ms) = args.font_timeout_ms {
        config.export_font_timeout_ms = ms;
    }
    let format = output_format(&args, config.export_format);

    let mut editor = Editor::new(config, entitlements(args.premium));
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("read image '{}'", args.image.display()))?;
    editor.load_image_bytes(&bytes)?;

    if let Some(path) = &args.layers {
        let doc = LayerDocument::from_path(path)?;
        editor.apply_document(&doc)?;
    }

    let encoded = match args.preview_width {
        Some(width) => {
            editor.set_preview_width(width);
            let timeout = editor.config().export_font_timeout();
            if !editor.wait_for_fonts(timeout) {
                tracing::warn!("fonts not ready, previewing with fallback");
            }
            let frame = editor.request_preview_frame();
            encode_frame(&frame, format)?
        }
        None => editor.request_export_as(format)?,
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &encoded)
        .with_context(|| format!("write {} '{}'", format.extension(), args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn output_format(args: &RenderArgs, configured: ExportFormat) -> ExportFormat {
    let base = args
        .format
        .or_else(|| format_from_extension(&args.out))
        .unwrap_or(configured);
    match (base, args.quality) {
        (ExportFormat::Jpeg { .. }, Some(q)) => ExportFormat::jpeg(q),
        (other, _) => other,
    }
}

fn format_from_extension(path: &Path) -> Option<ExportFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(ExportFormat::Png),
        "jpg" | "jpeg" => Some(ExportFormat::jpeg(DEFAULT_JPEG_QUALITY)),
        _ => None,
    }
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let info = decode_image_path(&args.image)?.info();
    if args.json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{}x{} ({})", info.width, info.height, info.aspect_ratio);
    }
    Ok(())
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    for (i, family) in available_fonts(entitlements(args.premium)).iter().enumerate() {
        println!("{i:>2}  {family}");
    }
    Ok(())
}
