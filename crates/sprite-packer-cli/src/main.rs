use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use sprite_packer_core::compositing::{CompositeOptions, PngCompositor};
use sprite_packer_core::container::{embed_manifest, extract_manifest};
use sprite_packer_core::raster::ResvgRasterizer;
use sprite_packer_core::validate::validate_metadata;
use sprite_packer_core::{
    IconSource, SpriteConfig, generate_image, generate_layout, to_json_layout, to_json_manifest,
};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-packer",
    about = "Pack SVG icons into a sprite sheet and manifest",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack icons into sprite PNG(s) plus JSON manifest(s)
    Pack(PackArgs),
    /// Layout-only export (no PNGs): compute placements and write the JSON manifest
    Layout(PackArgs),
    /// Check every entry of a JSON manifest against the metadata rules
    Validate(ValidateArgs),
    /// Print the manifest embedded in a sprite PNG
    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input SVG file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sprite base name (files will be name.png/.json, name@2x.png/.json, ...)
    #[arg(short, long, default_value = "sprite", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (values override the matching flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Sprite
    /// Pixel ratio(s) to generate; repeat for several sheets (--ratio 1 --ratio 2)
    #[arg(long = "ratio", default_values_t = vec![1.0], help_heading = "Sprite")]
    ratios: Vec<f32>,
    /// Largest allowed icon side in pixels after scaling
    #[arg(long, help_heading = "Sprite")]
    max_icon_size: Option<u32>,
    /// Drop icons larger than --max-icon-size instead of failing
    #[arg(long, default_value_t = false, help_heading = "Sprite")]
    remove_oversized_icons: bool,
    /// Pack byte-identical icons once; every id keeps its manifest entry
    #[arg(long, default_value_t = false, help_heading = "Sprite")]
    unique: bool,
    /// Read stretch/content/placeholder zones from mapbox-* marker shapes
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Sprite")]
    extract_metadata: bool,
    /// Flag every icon as a signed distance field
    #[arg(long, default_value_t = false, help_heading = "Sprite")]
    sdf: bool,
    /// Rasterize in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Sprite")]
    parallel: bool,

    // Image
    /// PNG compression effort 0..=9
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9), help_heading = "Image")]
    quality: Option<u8>,
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Image")]
    outlines: bool,
    /// Embed the binary manifest as a private chunk in each PNG
    #[arg(long, default_value_t = false, help_heading = "Image")]
    embed_manifest: bool,

    // Export
    /// Layout-only: write the manifest JSON and skip PNGs
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_only: bool,
    /// Also write the image layout (`{width, height, items}`) as name.layout.json
    #[arg(long, default_value_t = false, help_heading = "Export")]
    export_layout: bool,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct ValidateArgs {
    /// JSON manifest (`{ id: { width, height, content?, stretchX?, stretchY? } }`)
    manifest: PathBuf,
}

#[derive(Parser, Debug, Clone)]
struct InspectArgs {
    /// Sprite PNG
    sprite: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => {
            let mut a = args.clone();
            a.layout_only = true;
            run_pack(&a, false)
        }
        Commands::Validate(args) => run_validate(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn sprite_config(cli: &PackArgs) -> anyhow::Result<SpriteConfig> {
    let base = SpriteConfig::builder()
        .pixel_ratio(cli.ratios.first().copied().unwrap_or(1.0))
        .max_icon_size(cli.max_icon_size)
        .remove_oversized_icons(cli.remove_oversized_icons)
        .deduplicate(cli.unique)
        .extract_metadata(cli.extract_metadata)
        .signed_distance_field(cli.sdf)
        .format(true)
        .parallel(cli.parallel)
        .build();

    // Config file values win over flags
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.into_sprite_config(base)
    } else {
        base
    };
    cfg.validate()?;
    Ok(cfg)
}

fn ratio_suffix(ratio: f32) -> String {
    if ratio == 1.0 {
        String::new()
    } else if ratio.fract() == 0.0 {
        format!("@{}x", ratio as u32)
    } else {
        format!("@{}x", ratio)
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = sprite_config(cli)?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let filter = InputFilter::new(&cli.include, &cli.exclude)?;
    let paths = collect_svgs(&cli.input, &filter)?;
    let icons = load_icons_with_progress(&paths, show_progress)?;
    info!(count = icons.len(), "loaded input icons");

    let composite = CompositeOptions {
        quality: cli.quality,
        outlines: cli.outlines,
    };
    let mut stats = Vec::with_capacity(cli.ratios.len());

    for &ratio in &cli.ratios {
        let mut run_cfg = cfg.clone();
        run_cfg.pixel_ratio = ratio;
        let layout = generate_layout(icons.clone(), &run_cfg, &ResvgRasterizer)
            .with_context(|| format!("generate layout at pixel ratio {}", ratio))?;
        let base = format!("{}{}", cli.name, ratio_suffix(ratio));

        let layout_stats = layout.stats();
        info!(
            ratio,
            width = layout.bin.width,
            height = layout.bin.height,
            items = layout.items.len(),
            occupancy = format!("{:.2}%", layout_stats.occupancy * 100.0),
            "layout"
        );
        stats.push(serde_json::json!({
            "pixelRatio": ratio,
            "width": layout.bin.width,
            "height": layout.bin.height,
            "items": layout_stats.num_items,
            "usedArea": layout_stats.used_area,
            "binArea": layout_stats.bin_area,
            "occupancy": layout_stats.occupancy,
        }));

        if cli.dry_run {
            continue;
        }

        if let Some(manifest) = &layout.manifest {
            let json_path = cli.out_dir.join(format!("{}.json", base));
            let json = serde_json::to_string_pretty(&to_json_manifest(manifest))?;
            fs::write(&json_path, json)
                .with_context(|| format!("write {}", json_path.display()))?;
            info!(?json_path, entries = manifest.len(), "manifest written");
        }
        if cli.export_layout {
            let layout_path = cli.out_dir.join(format!("{}.layout.json", base));
            let json = serde_json::to_string_pretty(&to_json_layout(&layout))?;
            fs::write(&layout_path, json)
                .with_context(|| format!("write {}", layout_path.display()))?;
        }
        if cli.layout_only {
            continue;
        }

        let mut png = generate_image(&layout, &PngCompositor, &composite)?;
        if cli.embed_manifest {
            if let Some(manifest) = &layout.manifest {
                png = embed_manifest(&png, manifest)?;
            }
        }
        let png_path = cli.out_dir.join(format!("{}.png", base));
        fs::write(&png_path, &png).with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, bytes = png.len(), "sprite written");
    }

    if let Some(stats_path) = &cli.export_stats {
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
        }
    }
    Ok(())
}

fn run_validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.manifest)
        .with_context(|| format!("read {}", args.manifest.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse {}", args.manifest.display()))?;
    let entries = value
        .as_object()
        .context("manifest must be a JSON object keyed by icon id")?;

    let mut failures = 0usize;
    for (id, entry) in entries {
        // An entry carries both the icon size and its zones.
        if let Err(violation) = validate_metadata(entry, entry) {
            error!(%id, %violation, "invalid metadata");
            failures += 1;
        }
    }
    if failures > 0 {
        anyhow::bail!("{} of {} entries failed validation", failures, entries.len());
    }
    info!(entries = entries.len(), "manifest is valid");
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let png = fs::read(&args.sprite).with_context(|| format!("read {}", args.sprite.display()))?;
    match extract_manifest(&png).with_context(|| format!("inspect {}", args.sprite.display()))? {
        Some(manifest) => {
            println!("{}", serde_json::to_string_pretty(&to_json_manifest(&manifest))?);
        }
        None => warn!(sprite = ?args.sprite, "no embedded manifest"),
    }
    Ok(())
}

/// Include/exclude globs over slash-separated paths. An empty include list
/// accepts everything not excluded.
struct InputFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl InputFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        if !is_svg(path) {
            return false;
        }
        let key = path.to_string_lossy().replace('\\', "/");
        let excluded = self.exclude.as_ref().is_some_and(|set| set.is_match(&key));
        let included = self.include.as_ref().is_none_or(|set| set.is_match(&key));
        included && !excluded
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("bad glob {pattern:?}"))?);
    }
    Ok(Some(builder.build()?))
}

/// SVG files under `input` (or `input` itself), in file-name order.
fn collect_svgs(input: &Path, filter: &InputFilter) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(filter
            .accepts(input)
            .then(|| input.to_path_buf())
            .into_iter()
            .collect());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", input.display()))?;
        if entry.file_type().is_file() && filter.accepts(entry.path()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn is_svg(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Icon id is the file name without its extension.
fn icon_id(p: &Path) -> String {
    p.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.to_string_lossy().into_owned())
}

fn load_icons_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<IconSource>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        let svg = fs::read(p).with_context(|| format!("read icon {}", p.display()))?;
        list.push(IconSource::new(icon_id(p), svg));
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

/// `RUST_LOG` wins when set; otherwise `-q` and `-v` pick the level.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    max_icon_size: Option<u32>,
    remove_oversized_icons: Option<bool>,
    deduplicate: Option<bool>,
    extract_metadata: Option<bool>,
    signed_distance_field: Option<bool>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_sprite_config(self, mut base: SpriteConfig) -> SpriteConfig {
        if let Some(v) = self.max_icon_size {
            base.max_icon_size = Some(v);
        }
        if let Some(v) = self.remove_oversized_icons {
            base.remove_oversized_icons = v;
        }
        if let Some(v) = self.deduplicate {
            base.deduplicate = v;
        }
        if let Some(v) = self.extract_metadata {
            base.extract_metadata = v;
        }
        if let Some(v) = self.signed_distance_field {
            base.signed_distance_field = v;
        }
        if let Some(v) = self.parallel {
            base.parallel = v;
        }
        base
    }
}
