//! Segment模块 - 检测结果后处理与可视化
//!
//! 该模块把预训练检测/分割模型的原始输出变成可以展示的图像，包括：
//! - 模型目录与推理网关
//! - 结果后处理（阈值过滤、坐标换算、掩码生成）
//! - 可视化绘制（掩码、边界框、标签）
//!
//! # 主要组件
//!
//! - ObjectDetector：检测器，串起推理网关和后处理
//! - PostProcessor：把原始张量转换为Detection列表
//! - Renderer：在图像副本上绘制检测结果
//! - Palette / LabelTable：类别颜色和名称，构造后只读，可共享
//!
//! # 工作流程
//!
//! 1. 使用ObjectDetector::new按名称选择模型，再加载推理网关
//! 2. 调用detect得到检测结果
//! 3. 使用Renderer绘制结果
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use image::{DynamicImage, RgbImage};
//! use ndarray::{arr2, arr3};
//! use segview::{LabelTable, ObjectDetector, Palette, RawOutputs, Renderer, SessionConfig};
//!
//! # fn main() -> Result<(), segview::Error> {
//! let mut detector = ObjectDetector::new("SSD MobileNet V2", Arc::new(LabelTable::coco()))?;
//! detector.load_with(|_: &RgbImage| -> segview::Result<RawOutputs> {
//!     let mut outputs = RawOutputs::new();
//!     outputs.insert("detection_boxes".into(), arr3(&[[[0.2f32, 0.2, 0.8, 0.8]]]).into_dyn());
//!     outputs.insert("detection_classes".into(), arr2(&[[18.0f32]]).into_dyn());
//!     outputs.insert("detection_scores".into(), arr2(&[[0.9f32]]).into_dyn());
//!     Ok(outputs)
//! });
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
//! let config = SessionConfig::default();
//! let detections = detector.detect(&image, &config)?;
//! assert_eq!(detections[0].class_name, "dog");
//!
//! let renderer = Renderer::new(Arc::new(Palette::default()));
//! let result = renderer.render(&image, &detections, &config);
//! assert_eq!(result.dimensions(), (64, 48));
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod detect;
pub mod draw;
pub mod font;
pub mod image;
#[cfg(feature = "backend-onnx")]
pub mod infer;
pub mod labels;
pub mod masks;
pub mod model;
pub mod palette;
pub mod posts;
pub mod stats;

// 重新导出常用类型和函数
pub use bounds::{Detection, DetectionSummary, InstanceMask, PixelBox};
pub use detect::ObjectDetector;
pub use draw::{draw_detections, Renderer};
pub use font::{resolve_font, LabelFont};
pub use self::image::{is_supported_format, load_image};
#[cfg(feature = "backend-onnx")]
pub use infer::OnnxGateway;
pub use labels::{label_for, LabelTable, COCO_LABELS};
pub use model::{available_models, model_info, ModelGateway, ModelInfo, ModelKind, AVAILABLE_MODELS};
pub use palette::Palette;
pub use posts::{PostProcessor, RawDetections, RawOutputs};
pub use stats::{filter_by_classes, DetectionStats};
