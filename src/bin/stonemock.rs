use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stonemock", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a recipe over a slab photo and write one PNG per variant.
    Render(RenderArgs),
    /// List the available recipes.
    Recipes(RecipesArgs),
    /// Solve the homography mapping four source points onto four destination points.
    Solve(SolveArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Slab photo (any format the `image` crate decodes).
    #[arg(long)]
    photo: PathBuf,

    /// Recipe id.
    #[arg(long)]
    recipe: String,

    /// Number of variants to render.
    #[arg(long, default_value_t = 1)]
    variants: u8,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Recipe book JSON. Defaults to the built-in recipes.
    #[arg(long)]
    recipes: Option<PathBuf>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root override.
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RecipesArgs {
    /// Recipe book JSON. Defaults to the built-in recipes.
    #[arg(long)]
    recipes: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SolveArgs {
    /// Source corners as `x,y` in TL TR BL BR order.
    #[arg(long, num_args = 4, required = true)]
    src: Vec<String>,

    /// Destination corners as `x,y` in TL TR BL BR order.
    #[arg(long, num_args = 4, required = true)]
    dst: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Recipes(args) => cmd_recipes(args),
        Command::Solve(args) => cmd_solve(args),
    }
}

fn load_book(path: Option<&PathBuf>) -> anyhow::Result<stonemock::RecipeBook> {
    let book = match path {
        Some(p) => stonemock::RecipeBook::from_path(p)
            .with_context(|| format!("load recipes '{}'", p.display()))?,
        None => stonemock::RecipeBook::builtin().context("load built-in recipes")?,
    };
    Ok(book)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(p) => stonemock::EngineConfig::from_path(p)?,
        None => stonemock::EngineConfig::default(),
    };
    if let Some(root) = args.assets {
        config.asset_root = root;
    }
    let engine = stonemock::MockupEngine::new(config, load_book(args.recipes.as_ref())?)?;

    let photo = image::open(&args.photo)
        .with_context(|| format!("decode photo '{}'", args.photo.display()))?
        .to_rgba8();
    let (w, h) = photo.dimensions();
    let photo = stonemock::PixelBuffer::from_straight_rgba8(w, h, photo.into_raw())?;

    let missing = engine.preload();
    if !missing.is_empty() {
        tracing::warn!(count = missing.len(), "some overlay assets are unavailable");
    }

    let report = engine.compose_report(&photo, &args.recipe, args.variants)?;
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    let images = report.into_images()?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    for (n, img) in images.into_iter().enumerate() {
        let path = args.out.join(format!("{}_{}.png", args.recipe, n + 1));
        let (w, h) = (img.width(), img.height());
        image::save_buffer_with_format(
            &path,
            &img.into_straight_rgba8(),
            w,
            h,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_recipes(args: RecipesArgs) -> anyhow::Result<()> {
    let book = load_book(args.recipes.as_ref())?;
    for recipe in book.iter() {
        println!(
            "{}\t{}x{}\t{} layers\t{} variants",
            recipe.id,
            recipe.canvas.width,
            recipe.canvas.height,
            recipe.layers.len(),
            recipe.variants.len()
        );
    }
    Ok(())
}

fn parse_point(s: &str) -> anyhow::Result<stonemock::Point> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("expected 'x,y', got '{s}'"))?;
    let x: f64 = x.trim().parse().with_context(|| format!("bad x in '{s}'"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("bad y in '{s}'"))?;
    Ok(stonemock::Point::new(x, y))
}

fn parse_quad(points: &[String]) -> anyhow::Result<stonemock::Quad> {
    let p = points
        .iter()
        .map(|s| parse_point(s.as_str()))
        .collect::<anyhow::Result<Vec<_>>>()?;
    anyhow::ensure!(p.len() == 4, "expected 4 points, got {}", p.len());
    Ok(stonemock::Quad::new(p[0], p[1], p[2], p[3]))
}

fn cmd_solve(args: SolveArgs) -> anyhow::Result<()> {
    let src = parse_quad(&args.src)?;
    let dst = parse_quad(&args.dst)?;
    let t = stonemock::solve(&src, &dst)?;
    for row in t.m.chunks(3) {
        println!("{:>14.8} {:>14.8} {:>14.8}", row[0], row[1], row[2]);
    }
    Ok(())
}
