//! scatter-yolo CLI: generate scattered-object images with YOLO annotations.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use scatter_core::{
    BatchConfig, BatchReport, DirectoryAssets, GeneratorConfig, OverlapIndex, SyntheticGenerator,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scatter-yolo")]
#[command(about = "Scatter object cut-outs over a canvas and write YOLO annotations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images with objects from OBJECT_DIRECTORIES scattered in them.
    Generate(GenerateArgs),
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    /// One directory per object category; order defines the category index.
    object_directories: Vec<PathBuf>,

    /// Folder with images to be used as backgrounds.
    #[arg(short = 'b', long)]
    backgrounds: Option<PathBuf>,

    /// JSON file with generator settings; flags given explicitly override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side of the square each object is rendered into, px.
    #[arg(long = "object-size", visible_alias = "os")]
    object_size: Option<u32>,

    /// Directory where generated images are stored.
    #[arg(short = 'o', long, default_value = "scatter_yolo_images")]
    output_directory: PathBuf,

    /// Minimum number of objects to scatter.
    #[arg(long = "min-objects", visible_alias = "min")]
    min_objects: Option<usize>,

    /// Maximum number of objects to scatter.
    #[arg(long = "max-objects", visible_alias = "max")]
    max_objects: Option<usize>,

    /// Number of images to generate.
    #[arg(short = 'c', long, default_value = "1")]
    image_count: usize,

    /// Side of the generated square images, px.
    #[arg(short = 's', long)]
    image_size: Option<u32>,

    /// Clustering index in [0, 1]; 1 means maximum clustering.
    #[arg(long = "cluster-idx", visible_alias = "cx")]
    cluster_idx: Option<f64>,

    /// Pixels inside the image border where objects are not placed.
    #[arg(long = "image-padding", visible_alias = "pad")]
    image_padding: Option<u32>,

    /// Per-category sampling weights, comma separated (one per directory).
    #[arg(short = 'r', long, value_delimiter = ',')]
    ratios: Option<Vec<f64>>,

    /// Base seed; every image derives its own seed from it.
    #[arg(long)]
    seed: Option<u64>,

    /// Filename prefix, to keep parallel runs in one directory apart.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Region-sum strategy for the overlap test.
    #[arg(long, value_enum)]
    overlap_index: Option<OverlapIndexArg>,

    /// Generate placement animation GIFs along with the images.
    #[arg(long = "generate-animation", visible_alias = "anim")]
    generate_animation: bool,

    /// Write a preview PNG with every annotation box outlined.
    #[arg(long)]
    preview: bool,

    /// Print the effective generator settings as JSON and exit.
    #[arg(long)]
    dump_config: bool,

    /// Log progress for every generated image.
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OverlapIndexArg {
    Scan,
    Fenwick,
}

impl From<OverlapIndexArg> for OverlapIndex {
    fn from(arg: OverlapIndexArg) -> Self {
        match arg {
            OverlapIndexArg::Scan => OverlapIndex::Scan,
            OverlapIndexArg::Fenwick => OverlapIndex::Fenwick,
        }
    }
}

impl GenerateArgs {
    fn generator_config(&self) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_json_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(v) = self.object_size {
            config.object_size = v;
        }
        if let Some(v) = self.image_size {
            config.image_size = v;
        }
        if let Some(v) = self.image_padding {
            config.image_padding = v;
        }
        if let Some(v) = self.min_objects {
            config.min_objects = v;
        }
        if let Some(v) = self.max_objects {
            config.max_objects = v;
        }
        if let Some(v) = self.cluster_idx {
            config.cluster_idx = v;
        }
        if let Some(v) = &self.ratios {
            config.scatter_ratios = Some(v.clone());
        }
        if let Some(v) = self.overlap_index {
            config.overlap_index = v.into();
        }
        if self.generate_animation {
            config.animate = true;
        }
        Ok(config)
    }

    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            image_count: self.image_count,
            output_dir: self.output_directory.clone(),
            seed: self.seed,
            file_prefix: self.prefix.clone(),
            preview: self.preview,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn print_report(report: &BatchReport) {
    println!(
        "Generated {} image(s), seed {}",
        report.generated.len(),
        report.seed
    );
    if report.exhausted_count() > 0 {
        println!(
            "{} image(s) ran out of free space before reaching their object count",
            report.exhausted_count()
        );
    }
    for failed in &report.failed {
        eprintln!("Image {} failed: {}", failed.index, failed.error);
    }
    if let Some(aborted) = &report.aborted {
        eprintln!("Generation aborted at image {}: {}", aborted.index, aborted.error);
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = args.generator_config()?;
    if args.dump_config {
        println!("{}", config.to_json());
        return Ok(());
    }

    if args.object_directories.is_empty() {
        bail!("no objects provided to scatter");
    }

    let assets = DirectoryAssets::open(&args.object_directories, args.backgrounds.as_deref())
        .context("failed to scan asset directories")?;
    let generator = SyntheticGenerator::new(config, assets).context("invalid generator settings")?;

    println!("Generating images...");
    let report = generator
        .generate_batch(&args.batch_config())
        .context("image generation was not completed")?;
    print_report(&report);

    if !report.is_success() {
        bail!(
            "{} image(s) failed{}",
            report.failed.len(),
            if report.aborted.is_some() { ", batch aborted" } else { "" }
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => {
            init_logging(args.verbose);
            run_generate(args)
        }
    }
}
