use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "qrcard", version)]
struct Cli {
    /// Log pipeline progress to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a QR card as a PNG.
    Render(RenderArgs),
    /// Print the effective layout constants as JSON.
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Text to encode.
    #[arg(long)]
    text: String,

    /// Border and module color, `#rrggbb`.
    #[arg(long, default_value = "#144da3")]
    color: String,

    /// Logo image (PNG, JPEG, SVG, ...).
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Caption drawn under the QR box.
    #[arg(long)]
    caption: Option<String>,

    /// Caption font family.
    #[arg(long, default_value = "sans-serif")]
    caption_font: String,

    /// Caption font size in logical pixels. Larger captions are shrunk to fit above the border.
    #[arg(long, default_value_t = qrcard::DEFAULT_CAPTION_SIZE_PX)]
    caption_size: f32,

    /// Extra font file to register for captions.
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Resolution tier.
    #[arg(long, value_enum, default_value_t = TierChoice::Export)]
    tier: TierChoice,

    /// Multiplier used by the export tier.
    #[arg(long, env = "QRCARD_EXPORT_SCALE", default_value_t = qrcard::DEFAULT_EXPORT_SCALE)]
    export_scale: u32,

    /// Layout overrides (JSON).
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, default_value = qrcard::SUGGESTED_FILENAME)]
    out: PathBuf,

    /// Print the PNG as a data URI on stdout instead of writing a file.
    #[arg(long)]
    data_uri: bool,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Layout overrides (JSON) to merge over the defaults.
    #[arg(long)]
    layout: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TierChoice {
    Preview,
    Export,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

fn load_layout(path: Option<&Path>) -> anyhow::Result<qrcard::LayoutConstants> {
    match path {
        Some(p) => Ok(qrcard::LayoutConstants::from_path(p)?),
        None => Ok(qrcard::LayoutConstants::default()),
    }
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let layout = load_layout(args.layout.as_deref())?;
    layout.validate()?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    if args.text.is_empty() {
        anyhow::bail!("--text must not be empty; nothing was rendered");
    }

    let layout = load_layout(args.layout.as_deref())?;
    let tier = match args.tier {
        TierChoice::Preview => qrcard::RenderTier::Preview,
        TierChoice::Export => qrcard::RenderTier::Export {
            scale: args.export_scale,
        },
    };

    let mut builder = qrcard::RenderRequest::builder(args.text.as_str(), &args.color).tier(tier);
    if let Some(path) = &args.logo {
        let bytes =
            std::fs::read(path).with_context(|| format!("read logo '{}'", path.display()))?;
        builder = builder.logo(qrcard::PendingRaster::decode(bytes));
    }
    if let Some(text) = &args.caption {
        builder = builder.caption(qrcard::Caption::new(
            text.as_str(),
            args.caption_font.as_str(),
            args.caption_size,
        ));
    }
    let request = builder.build()?;

    let mut compositor = qrcard::Compositor::default().with_layout(layout);
    if let Some(path) = &args.font_file {
        let mut fonts = qrcard::FontBook::system();
        fonts.add_font_file(path)?;
        compositor = compositor.with_fonts(fonts);
    }

    let result = compositor.render_blocking(&request)?;
    if let qrcard::LogoOutcome::DecodeFailed(msg) = result.logo() {
        eprintln!("warning: logo skipped: {msg}");
    }

    if args.data_uri {
        println!("{}", result.data_uri());
        return Ok(());
    }

    result.save(&args.out)?;
    eprintln!(
        "wrote {} ({}x{}, {:016x})",
        args.out.display(),
        result.width(),
        result.height(),
        result.content_hash()
    );
    Ok(())
}
