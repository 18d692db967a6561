use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use yolopost::{
    AnchorSet, ClassNames, Compaction, CoordinateSpace, DecodeConfig, Detection, DiscardRule,
    GridLayout, NmsConfig, PostprocessConfig, Postprocessor, DEFAULT_DISPLAY_THRESHOLD,
    TINY_YOLOV2_VOC_ANCHORS,
};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "YOLO output decoder (JSON config driven)")]
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

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DiscardRuleConfig {
    #[default]
    Objectness,
    BestClassScore,
}

impl From<DiscardRuleConfig> for DiscardRule {
    fn from(value: DiscardRuleConfig) -> Self {
        match value {
            DiscardRuleConfig::Objectness => DiscardRule::Objectness,
            DiscardRuleConfig::BestClassScore => DiscardRule::BestClassScore,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CoordinateSpaceConfig {
    #[default]
    Pixels,
    Normalized,
}

impl From<CoordinateSpaceConfig> for CoordinateSpace {
    fn from(value: CoordinateSpaceConfig) -> Self {
        match value {
            CoordinateSpaceConfig::Pixels => CoordinateSpace::Pixels,
            CoordinateSpaceConfig::Normalized => CoordinateSpace::Normalized,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CompactionConfig {
    #[default]
    None,
    BestClass,
    AnyClass,
}

impl From<CompactionConfig> for Compaction {
    fn from(value: CompactionConfig) -> Self {
        match value {
            CompactionConfig::None => Compaction::None,
            CompactionConfig::BestClass => Compaction::BestClass,
            CompactionConfig::AnyClass => Compaction::AnyClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LayoutJson {
    grid_width: usize,
    grid_height: usize,
    classes: usize,
    anchors: Vec<f32>,
    /// Square input size; non-square grids must set `cell_size` instead.
    input_resolution: usize,
    cell_size: Option<f32>,
}

impl Default for LayoutJson {
    fn default() -> Self {
        let layout = GridLayout::tiny_yolov2_voc();
        Self {
            grid_width: layout.grid_width(),
            grid_height: layout.grid_height(),
            classes: layout.classes(),
            anchors: TINY_YOLOV2_VOC_ANCHORS.to_vec(),
            input_resolution: layout.input_width() as usize,
            cell_size: None,
        }
    }
}

impl LayoutJson {
    fn build(&self) -> yolopost::YoloPostResult<GridLayout> {
        let anchors = AnchorSet::from_flat(&self.anchors)?;
        match self.cell_size {
            Some(cell_size) => GridLayout::new(
                self.grid_width,
                self.grid_height,
                self.classes,
                anchors,
                cell_size,
            ),
            None => GridLayout::from_input_resolution(
                self.grid_width,
                self.grid_height,
                self.classes,
                anchors,
                self.input_resolution,
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DecodeConfigJson {
    discard_threshold: f32,
    discard_rule: DiscardRuleConfig,
    coordinate_space: CoordinateSpaceConfig,
    parallel: bool,
}

impl Default for DecodeConfigJson {
    fn default() -> Self {
        let cfg = DecodeConfig::default();
        Self {
            discard_threshold: cfg.discard_threshold,
            discard_rule: DiscardRuleConfig::Objectness,
            coordinate_space: CoordinateSpaceConfig::Pixels,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NmsConfigJson {
    iou_threshold: f32,
    compaction: CompactionConfig,
    parallel: bool,
}

impl Default for NmsConfigJson {
    fn default() -> Self {
        let cfg = NmsConfig::default();
        Self {
            iou_threshold: cfg.iou_threshold,
            compaction: CompactionConfig::None,
            parallel: cfg.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    class_names_path: Option<String>,
    output_path: Option<String>,
    display_threshold: f32,
    layout: LayoutJson,
    decode: DecodeConfigJson,
    nms: NmsConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            class_names_path: None,
            output_path: None,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
            layout: LayoutJson::default(),
            decode: DecodeConfigJson::default(),
            nms: NmsConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: Option<String>,
    class_index: usize,
    score: f32,
    objectness: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    cell_x: usize,
    cell_y: usize,
    box_index: usize,
}

impl DetectionRecord {
    fn new(det: &Detection, names: &ClassNames) -> Self {
        let slot = det.slot();
        Self {
            label: names.label(det.best_class_index()).map(str::to_owned),
            class_index: det.best_class_index(),
            score: det.best_score(),
            objectness: det.objectness(),
            x: det.rect.x,
            y: det.rect.y,
            width: det.rect.width,
            height: det.rect.height,
            cell_x: slot.cell_x,
            cell_y: slot.cell_y,
            box_index: slot.box_index,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    decoded: usize,
    detections: Vec<DetectionRecord>,
}

/// Reads a tensor stored as a JSON array or as raw little-endian `f32`s.
fn load_tensor(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let text = fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&text)?);
    }
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(format!(
            "raw tensor file has {} bytes, not a multiple of 4",
            bytes.len()
        )
        .into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolopost=info".parse()?))
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
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }

    let layout = config.layout.build()?;
    let names = match &config.class_names_path {
        Some(path) => ClassNames::parse_comma_separated(&fs::read_to_string(path)?),
        None => ClassNames::voc(),
    };
    names.ensure_matches(&layout)?;

    let post_cfg = PostprocessConfig {
        decode: DecodeConfig {
            discard_threshold: config.decode.discard_threshold,
            discard_rule: config.decode.discard_rule.into(),
            coordinate_space: config.decode.coordinate_space.into(),
            parallel: config.decode.parallel,
        },
        nms: NmsConfig {
            iou_threshold: config.nms.iou_threshold,
            compaction: config.nms.compaction.into(),
            parallel: config.nms.parallel,
        },
    };
    post_cfg.validate()?;
    let post = Postprocessor::new(layout).with_config(post_cfg);

    let tensor = load_tensor(Path::new(&config.tensor_path))?;
    let detections = post.process(&tensor)?;
    let confident = Postprocessor::confident(&detections, config.display_threshold);
    tracing::info!(
        decoded = detections.len(),
        confident = confident.len(),
        "postprocessed tensor"
    );

    let output = Output {
        decoded: detections.len(),
        detections: confident
            .into_iter()
            .map(|det| DetectionRecord::new(det, &names))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_square_layout_builds_from_cell_size() {
        let json = r#"{ "grid_width": 20, "grid_height": 10, "cell_size": 32.0 }"#;
        let layout: LayoutJson = serde_json::from_str(json).unwrap();
        let built = layout.build().unwrap();
        assert_eq!(built.grid_width(), 20);
        assert_eq!(built.input_height(), 320.0);

        let json = r#"{ "grid_width": 20, "grid_height": 10, "input_resolution": 640 }"#;
        let layout: LayoutJson = serde_json::from_str(json).unwrap();
        assert!(layout.build().is_err());
    }

    #[test]
    fn schema_points_non_square_grids_at_cell_size() {
        let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON).unwrap();
        let description = schema["properties"]["layout"]["properties"]["input_resolution"]
            ["description"]
            .as_str()
            .unwrap();
        assert!(description.contains("cell_size"));
    }
}
