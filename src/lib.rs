pub mod config;
pub mod error;
pub mod segment;

pub use config::{load_config, SessionConfig};
pub use error::{Error, Result};

// 重新导出segment模块中的常用类型和函数
pub use segment::{Detection, DetectionSummary, InstanceMask, PixelBox};
pub use segment::{LabelTable, Palette, PostProcessor, RawDetections, RawOutputs};
pub use segment::{ModelGateway, ModelInfo, ModelKind, ObjectDetector};
pub use segment::{draw_detections, load_image, Renderer};
#[cfg(feature = "backend-onnx")]
pub use segment::OnnxGateway;
