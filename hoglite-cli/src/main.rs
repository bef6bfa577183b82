use clap::Parser;
use hoglite::io::load_gray_image;
use hoglite::{
    CellSize, CoarseStage, DetectConfig, Detection, Detector, FeatureSize, LinearFilter,
    PyramidConfig, SeparableFilter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "HOG-Lite detector CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
struct DenseFilterJson {
    width: usize,
    height: usize,
    feature_size: usize,
    weights: Vec<f32>,
}

impl DenseFilterJson {
    fn into_filter(self) -> Result<LinearFilter, Box<dyn std::error::Error>> {
        let feature_size = FeatureSize::try_from(self.feature_size)?;
        Ok(LinearFilter::new(
            self.width,
            self.height,
            feature_size,
            self.weights,
        )?)
    }
}

#[derive(Debug, Deserialize)]
struct ComponentJson {
    width: usize,
    feature_size: usize,
    horizontal: Vec<f32>,
    vertical: Vec<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FilterFile {
    Separable { components: Vec<ComponentJson> },
    Dense(DenseFilterJson),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    cell: usize,
    pca: Option<Vec<f32>>,
    max_levels: usize,
    scale_step: f32,
    min_size: usize,
    threshold: f32,
    coarse_threshold: f32,
    coarse_window: usize,
    nms_radius: usize,
    max_detections: usize,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        let pyramid = PyramidConfig::default();
        Self {
            cell: cfg.cell.pixels(),
            pca: None,
            max_levels: pyramid.max_levels,
            scale_step: pyramid.scale_step,
            min_size: pyramid.min_size,
            threshold: cfg.threshold,
            coarse_threshold: 0.0,
            coarse_window: 3,
            nms_radius: cfg.nms_radius,
            max_detections: cfg.max_detections,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: String,
    filter_path: String,
    coarse_filter_path: Option<String>,
    output_path: Option<String>,
    detect: DetectConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            filter_path: String::new(),
            coarse_filter_path: None,
            output_path: None,
            detect: DetectConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x: usize,
    y: usize,
    level: usize,
    scale: f32,
    score: f32,
    image_x: f32,
    image_y: f32,
}

impl DetectionRecord {
    fn new(det: Detection, cell: CellSize) -> Self {
        let (image_x, image_y) = det.image_origin(cell);
        Self {
            x: det.x,
            y: det.y,
            level: det.level,
            scale: det.scale,
            score: det.score,
            image_x,
            image_y,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    detections: Vec<DetectionRecord>,
}

fn read_filter(path: &Path) -> Result<FilterFile, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn build_detector(fine: FilterFile) -> Result<Detector, Box<dyn std::error::Error>> {
    match fine {
        FilterFile::Dense(dense) => Ok(Detector::new(dense.into_filter()?)),
        FilterFile::Separable { components } => {
            let mut parts = Vec::with_capacity(components.len());
            for c in components {
                parts.push(SeparableFilter::new(
                    c.width,
                    FeatureSize::try_from(c.feature_size)?,
                    c.horizontal,
                    c.vertical,
                )?);
            }
            Ok(Detector::separable(parts)?)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("hoglite=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.image_path.is_empty() || config.filter_path.is_empty() {
        return Err("image_path and filter_path must be set in the config".into());
    }
    if config.detect.max_detections == 0 {
        return Err("max_detections must be at least 1".into());
    }

    let cell = CellSize::try_from(config.detect.cell)?;
    let coarse = match &config.coarse_filter_path {
        Some(path) => match read_filter(Path::new(path))? {
            FilterFile::Dense(dense) => Some(CoarseStage {
                filter: dense.into_filter()?,
                threshold: config.detect.coarse_threshold,
                window: config.detect.coarse_window,
            }),
            FilterFile::Separable { .. } => {
                return Err("coarse filter must be a dense filter".into());
            }
        },
        None => None,
    };

    let detector = build_detector(read_filter(Path::new(&config.filter_path))?)?.with_config(
        DetectConfig {
            cell,
            pca: config.detect.pca,
            pyramid: PyramidConfig {
                max_levels: config.detect.max_levels,
                scale_step: config.detect.scale_step,
                min_size: config.detect.min_size,
            },
            threshold: config.detect.threshold,
            coarse,
            nms_radius: config.detect.nms_radius,
            max_detections: config.detect.max_detections,
            parallel: config.detect.parallel,
        },
    );

    let image = load_gray_image(&config.image_path)?;
    let detections = detector.detect(image.view())?;
    let output = Output {
        detections: detections
            .into_iter()
            .map(|det| DetectionRecord::new(det, cell))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
