use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use segview::config::MASKS_ONLY_ALPHA;
use segview::segment::available_models;
use segview::{load_config, SessionConfig};

#[derive(Debug, Parser)]
#[command(
    name = "segview",
    version,
    about = "Run a pretrained detector on an image and draw boxes, labels and masks"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the models in the catalog.
    Models,
    /// Detect objects in one image and write the annotated result.
    Detect(DetectArgs),
}

#[derive(Debug, clap::Args)]
#[cfg_attr(not(feature = "backend-onnx"), allow(dead_code))]
struct DetectArgs {
    /// Catalog name of the model, e.g. "SSD MobileNet V2".
    #[arg(long)]
    model: String,
    /// Local ONNX export of the model.
    #[arg(long)]
    weights: PathBuf,
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// TOML session config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    threshold: Option<f32>,
    #[arg(long)]
    max_detections: Option<usize>,
    /// Also write a masks-only view to this path.
    #[arg(long)]
    masks_out: Option<PathBuf>,
    /// Mask opacity of the masks-only view.
    #[arg(long, default_value_t = MASKS_ONLY_ALPHA)]
    masks_alpha: u8,
    /// Print detections as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Models => list_models(),
        Command::Detect(args) => detect(args),
    }
}

fn list_models() -> Result<()> {
    for info in available_models() {
        println!(
            "{:<34} {:<13} speed: {:<10} accuracy: {}  {}",
            info.name,
            format!("{:?}", info.kind).to_lowercase(),
            info.speed,
            info.accuracy,
            info.description
        );
    }
    Ok(())
}

fn session_config(args: &DetectArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            load_config(path).with_context(|| format!("load config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(max_detections) = args.max_detections {
        config.max_detections = max_detections;
    }
    config.validate().context("validate config")?;
    Ok(config)
}

#[cfg(feature = "backend-onnx")]
fn detect(args: DetectArgs) -> Result<()> {
    use std::sync::Arc;

    use segview::segment::stats::{filter_by_classes, DetectionStats};
    use segview::{load_image, LabelTable, ObjectDetector, Palette, Renderer};

    let config = session_config(&args)?;
    let mut detector =
        ObjectDetector::new(&args.model, Arc::new(LabelTable::coco())).context("select model")?;
    detector.load_onnx(&args.weights).context("load model")?;

    let image = load_image(&args.image)
        .with_context(|| format!("load image {}", args.image.display()))?;
    let detections = detector.detect(&image, &config).context("run detection")?;
    let detections = filter_by_classes(detections, config.selected_class_ids.as_ref());

    let stats = DetectionStats::from_detections(&detections);
    info!(
        model = detector.model_name(),
        total = stats.total,
        classes = stats.unique_classes,
        masks = stats.masks,
        mean_confidence = stats.mean_confidence,
        "detections"
    );
    if args.json {
        let summaries: Vec<_> = detections.iter().map(|d| d.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for (i, det) in detections.iter().enumerate() {
            println!(
                "{:>3}: {:<16} {:>5.1}%  {:?}",
                i + 1,
                det.class_name,
                det.confidence * 100.0,
                det.bbox.as_array()
            );
        }
    }

    let renderer = Renderer::new(Arc::new(Palette::default()));
    if renderer.font().is_builtin() {
        info!("labels use the 8px bitmap font, font_size is ignored");
    }
    let result = renderer.render(&image, &detections, &config);
    result.save(&args.out).with_context(|| format!("save {}", args.out.display()))?;
    info!(path = %args.out.display(), "result saved");

    if let Some(masks_out) = &args.masks_out {
        renderer
            .render_masks_only(&image, &detections, args.masks_alpha)
            .save(masks_out)
            .with_context(|| format!("save {}", masks_out.display()))?;
        info!(path = %masks_out.display(), "masks view saved");
    }
    Ok(())
}

#[cfg(not(feature = "backend-onnx"))]
fn detect(args: DetectArgs) -> Result<()> {
    session_config(&args)?;
    info!(model = %args.model, "detect requested without an inference backend");
    anyhow::bail!("segview was built without the `backend-onnx` feature")
}
