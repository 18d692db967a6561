//! Python bindings for yolopost.
//!
//! Exposes layout configuration, the end-to-end post-processor and decoded
//! detections to Python via PyO3. Output tensors are passed as 1-D float32
//! numpy arrays.

use numpy::PyReadonlyArray1;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use yolopost::{
    AnchorSet, Compaction, CoordinateSpace, DecodeConfig, Detection as RustDetection,
    DiscardRule, GridLayout, NmsConfig, PostprocessConfig as RustPostprocessConfig,
    Postprocessor as RustPostprocessor, YoloPostError,
};

/// Convert a YoloPostError to a Python exception.
fn to_py_err(err: YoloPostError) -> PyErr {
    if err.is_invalid_input() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Output grid geometry of a detector.
#[pyclass]
#[derive(Clone)]
pub struct Layout {
    inner: GridLayout,
}

#[pymethods]
impl Layout {
    /// Create a layout.
    ///
    /// Args:
    ///     grid_width: Grid width in cells (default: 13)
    ///     grid_height: Grid height in cells (default: 13)
    ///     classes: Number of classes (default: 20)
    ///     anchors: Flat [w0, h0, w1, h1, ...] priors (default: tiny YOLOv2 VOC)
    ///     input_resolution: Square network input size in pixels (default: 416);
    ///         only valid for square grids, pass cell_size for non-square ones
    ///     cell_size: Pixels per cell; overrides input_resolution when given
    #[new]
    #[pyo3(signature = (grid_width=13, grid_height=13, classes=20, anchors=None, input_resolution=416, cell_size=None))]
    fn new(
        grid_width: usize,
        grid_height: usize,
        classes: usize,
        anchors: Option<Vec<f32>>,
        input_resolution: usize,
        cell_size: Option<f32>,
    ) -> PyResult<Self> {
        let anchors = match anchors {
            Some(values) => AnchorSet::from_flat(&values).map_err(to_py_err)?,
            None => AnchorSet::tiny_yolov2_voc(),
        };
        let inner = match cell_size {
            Some(cell_size) => {
                GridLayout::new(grid_width, grid_height, classes, anchors, cell_size)
            }
            None => GridLayout::from_input_resolution(
                grid_width,
                grid_height,
                classes,
                anchors,
                input_resolution,
            ),
        }
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Tiny YOLOv2 Pascal VOC layout.
    #[staticmethod]
    fn voc() -> Self {
        Self {
            inner: GridLayout::tiny_yolov2_voc(),
        }
    }

    /// Expected output length in floats.
    #[getter]
    fn expected_len(&self) -> usize {
        self.inner.expected_len()
    }

    /// Number of classes.
    #[getter]
    fn classes(&self) -> usize {
        self.inner.classes()
    }

    /// Anchor boxes per cell.
    #[getter]
    fn boxes_per_cell(&self) -> usize {
        self.inner.boxes_per_cell()
    }

    fn __repr__(&self) -> String {
        format!(
            "Layout(grid={}x{}, boxes={}, classes={}, cell_size={})",
            self.inner.grid_width(),
            self.inner.grid_height(),
            self.inner.boxes_per_cell(),
            self.inner.classes(),
            self.inner.cell_size()
        )
    }
}

/// Decode and suppression settings.
#[pyclass]
#[derive(Clone)]
pub struct PostprocessConfig {
    inner: RustPostprocessConfig,
}

#[pymethods]
impl PostprocessConfig {
    /// Create a new PostprocessConfig.
    ///
    /// Args:
    ///     discard_threshold: Objectness below which slots are dropped (default: 0.1)
    ///     iou_threshold: IoU at or above which duplicates are zeroed (default: 0.2)
    ///     coordinate_space: "pixels" or "normalized" (default: "pixels")
    ///     discard_rule: "objectness" or "best_class_score" (default: "objectness")
    ///     compaction: "none", "best_class" or "any_class" (default: "none")
    ///     parallel: Enable parallel execution (default: False)
    #[new]
    #[pyo3(signature = (
        discard_threshold = 0.1,
        iou_threshold = 0.2,
        coordinate_space = "pixels",
        discard_rule = "objectness",
        compaction = "none",
        parallel = false
    ))]
    fn new(
        discard_threshold: f32,
        iou_threshold: f32,
        coordinate_space: &str,
        discard_rule: &str,
        compaction: &str,
        parallel: bool,
    ) -> PyResult<Self> {
        let coordinate_space = match coordinate_space.to_lowercase().as_str() {
            "pixels" => CoordinateSpace::Pixels,
            "normalized" => CoordinateSpace::Normalized,
            _ => {
                return Err(PyValueError::new_err(
                    "coordinate_space must be 'pixels' or 'normalized'",
                ))
            }
        };
        let discard_rule = match discard_rule.to_lowercase().as_str() {
            "objectness" => DiscardRule::Objectness,
            "best_class_score" => DiscardRule::BestClassScore,
            _ => {
                return Err(PyValueError::new_err(
                    "discard_rule must be 'objectness' or 'best_class_score'",
                ))
            }
        };
        let compaction = match compaction.to_lowercase().as_str() {
            "none" => Compaction::None,
            "best_class" => Compaction::BestClass,
            "any_class" => Compaction::AnyClass,
            _ => {
                return Err(PyValueError::new_err(
                    "compaction must be 'none', 'best_class' or 'any_class'",
                ))
            }
        };
        let inner = RustPostprocessConfig {
            decode: DecodeConfig {
                discard_threshold,
                discard_rule,
                coordinate_space,
                parallel,
            },
            nms: NmsConfig {
                iou_threshold,
                compaction,
                parallel,
            },
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "PostprocessConfig(discard_threshold={}, iou_threshold={}, parallel={})",
            self.inner.decode.discard_threshold,
            self.inner.nms.iou_threshold,
            self.inner.decode.parallel
        )
    }
}

/// A decoded detection.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Left edge.
    #[pyo3(get)]
    pub x: f32,
    /// Top edge.
    #[pyo3(get)]
    pub y: f32,
    /// Box width.
    #[pyo3(get)]
    pub width: f32,
    /// Box height.
    #[pyo3(get)]
    pub height: f32,
    /// Best class at decode time.
    #[pyo3(get)]
    pub class_index: usize,
    /// Current score of the best class.
    #[pyo3(get)]
    pub score: f32,
    /// Sigmoid of the objectness logit.
    #[pyo3(get)]
    pub objectness: f32,
    /// Per-class scores after suppression.
    #[pyo3(get)]
    pub class_scores: Vec<f32>,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(x={:.2}, y={:.2}, width={:.2}, height={:.2}, class_index={}, score={:.4})",
            self.x, self.y, self.width, self.height, self.class_index, self.score
        )
    }
}

impl From<&RustDetection> for Detection {
    fn from(d: &RustDetection) -> Self {
        Self {
            x: d.rect.x,
            y: d.rect.y,
            width: d.rect.width,
            height: d.rect.height,
            class_index: d.best_class_index(),
            score: d.best_score(),
            objectness: d.objectness(),
            class_scores: d.class_scores().to_vec(),
        }
    }
}

fn to_py_detections(detections: &[RustDetection], display_threshold: Option<f32>) -> Vec<Detection> {
    match display_threshold {
        Some(threshold) => RustPostprocessor::confident(detections, threshold)
            .into_iter()
            .map(Detection::from)
            .collect(),
        None => detections.iter().map(Detection::from).collect(),
    }
}

/// Decodes and de-duplicates detector output tensors.
#[pyclass]
pub struct Postprocessor {
    inner: RustPostprocessor,
}

#[pymethods]
impl Postprocessor {
    /// Create a post-processor.
    ///
    /// Args:
    ///     layout: Layout (default: Layout.voc())
    ///     config: PostprocessConfig (default: PostprocessConfig())
    #[new]
    #[pyo3(signature = (layout = None, config = None))]
    fn new(layout: Option<Layout>, config: Option<PostprocessConfig>) -> PyResult<Self> {
        let layout = layout.map(|l| l.inner).unwrap_or_else(GridLayout::tiny_yolov2_voc);
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        cfg.validate().map_err(to_py_err)?;
        Ok(Self {
            inner: RustPostprocessor::new(layout).with_config(cfg),
        })
    }

    /// Post-process one output tensor.
    ///
    /// Args:
    ///     output: 1-D float32 numpy array in (row, column, box, record) order
    ///     display_threshold: Keep only detections whose best-class score
    ///         exceeds this value (default: keep all)
    ///
    /// Returns:
    ///     List of Detection objects in decode order
    #[pyo3(signature = (output, display_threshold = None))]
    fn process(
        &self,
        output: PyReadonlyArray1<'_, f32>,
        display_threshold: Option<f32>,
    ) -> PyResult<Vec<Detection>> {
        let data = output.as_slice()?;
        let detections = self.inner.process(data).map_err(to_py_err)?;
        Ok(to_py_detections(&detections, display_threshold))
    }

    fn __repr__(&self) -> String {
        format!(
            "Postprocessor(expected_len={})",
            self.inner.layout().expected_len()
        )
    }
}

/// Convenience function for the tiny YOLOv2 VOC layout.
///
/// Args:
///     output: 1-D float32 numpy array of length 13 * 13 * 125
///     discard_threshold: Objectness below which slots are dropped (default: 0.1)
///     iou_threshold: IoU at or above which duplicates are zeroed (default: 0.2)
///     display_threshold: Minimum best-class score to return (default: 0.3)
///
/// Returns:
///     List of Detection objects
#[pyfunction]
#[pyo3(signature = (output, discard_threshold = 0.1, iou_threshold = 0.2, display_threshold = 0.3))]
fn postprocess(
    output: PyReadonlyArray1<'_, f32>,
    discard_threshold: f32,
    iou_threshold: f32,
    display_threshold: f32,
) -> PyResult<Vec<Detection>> {
    let cfg = RustPostprocessConfig {
        decode: DecodeConfig {
            discard_threshold,
            ..DecodeConfig::default()
        },
        nms: NmsConfig {
            iou_threshold,
            ..NmsConfig::default()
        },
    };
    let post = RustPostprocessor::new(GridLayout::tiny_yolov2_voc()).with_config(cfg);
    let data = output.as_slice()?;
    let detections = post.process(data).map_err(to_py_err)?;
    Ok(to_py_detections(&detections, Some(display_threshold)))
}

/// Python module for yolopost.
#[pymodule]
fn _yolopost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Layout>()?;
    m.add_class::<PostprocessConfig>()?;
    m.add_class::<Detection>()?;
    m.add_class::<Postprocessor>()?;
    m.add_function(wrap_pyfunction!(postprocess, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
