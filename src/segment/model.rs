//! 模型目录与推理网关
//!
//! 目录列出可选的预训练模型及其元数据；[`ModelGateway`] 把“对一张图像执行推理”
//! 抽象为单个阻塞调用，返回命名的原始张量。模型本身作为黑盒使用。

use image::RgbImage;
use serde::Serialize;

use crate::error::Result;
use crate::segment::posts::RawOutputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// 只输出边界框
    Detection,
    /// 同时输出实例掩码
    Segmentation,
}

/// 模型元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: &'static str,
    pub url: &'static str,
    pub kind: ModelKind,
    pub speed: &'static str,
    pub accuracy: &'static str,
    pub description: &'static str,
    pub supports_masks: bool,
}

const fn detection(
    name: &'static str,
    url: &'static str,
    speed: &'static str,
    accuracy: &'static str,
    description: &'static str,
) -> ModelInfo {
    ModelInfo {
        name,
        url,
        kind: ModelKind::Detection,
        speed,
        accuracy,
        description,
        supports_masks: false,
    }
}

pub const AVAILABLE_MODELS: &[ModelInfo] = &[
    detection(
        "SSD MobileNet V2",
        "https://tfhub.dev/tensorflow/ssd_mobilenet_v2/2",
        "very fast",
        "2/5",
        "Real-time friendly, less accurate",
    ),
    detection(
        "SSD MobileNet V2 FPNLite 320",
        "https://tfhub.dev/tensorflow/ssd_mobilenet_v2/fpnlite_320x320/1",
        "very fast",
        "3/5",
        "Improved variant with a feature pyramid",
    ),
    detection(
        "SSD MobileNet V2 FPNLite 640",
        "https://tfhub.dev/tensorflow/ssd_mobilenet_v2/fpnlite_640x640/1",
        "fast",
        "4/5",
        "Higher input resolution, better accuracy",
    ),
    detection(
        "EfficientDet D0",
        "https://tfhub.dev/tensorflow/efficientdet/d0/1",
        "fast",
        "3/5",
        "Balanced speed and accuracy",
    ),
    detection(
        "EfficientDet D1",
        "https://tfhub.dev/tensorflow/efficientdet/d1/1",
        "moderate",
        "4/5",
        "More accurate than D0",
    ),
    detection(
        "EfficientDet D2",
        "https://tfhub.dev/tensorflow/efficientdet/d2/1",
        "moderate",
        "4/5",
        "More accurate than D1",
    ),
    detection(
        "EfficientDet D3",
        "https://tfhub.dev/tensorflow/efficientdet/d3/1",
        "slow",
        "5/5",
        "Very accurate, slower",
    ),
    detection(
        "CenterNet HourGlass104",
        "https://tfhub.dev/tensorflow/centernet/hourglass_512x512/1",
        "slow",
        "5/5",
        "Strong on centered objects",
    ),
    detection(
        "CenterNet Resnet50 V1 FPN",
        "https://tfhub.dev/tensorflow/centernet/resnet50v1_fpn_512x512/1",
        "moderate",
        "4/5",
        "ResNet backbone, good trade-off",
    ),
    detection(
        "Faster R-CNN ResNet50 V1",
        "https://tfhub.dev/tensorflow/faster_rcnn/resnet50_v1_640x640/1",
        "slow",
        "5/5",
        "Classic two-stage detector",
    ),
    detection(
        "Faster R-CNN ResNet101 V1",
        "https://tfhub.dev/tensorflow/faster_rcnn/resnet101_v1_640x640/1",
        "very slow",
        "5/5",
        "Maximum accuracy",
    ),
    detection(
        "Faster R-CNN Inception ResNet V2",
        "https://tfhub.dev/tensorflow/faster_rcnn/inception_resnet_v2_640x640/1",
        "very slow",
        "5/5",
        "Very strong backbone",
    ),
    ModelInfo {
        name: "Mask R-CNN Inception ResNet V2",
        url: "https://tfhub.dev/tensorflow/mask_rcnn/inception_resnet_v2_1024x1024/1",
        kind: ModelKind::Segmentation,
        speed: "very slow",
        accuracy: "5/5",
        description: "Instance segmentation with precise masks",
        supports_masks: true,
    },
];

/// 按名称查找模型
pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|info| info.name == name)
}

pub fn available_models() -> &'static [ModelInfo] {
    AVAILABLE_MODELS
}

/// 推理网关
///
/// 输入为 `H x W x 3` 的RGB图像，输出为命名张量。调用是阻塞的，不支持取消。
pub trait ModelGateway {
    fn infer(&mut self, image: &RgbImage) -> Result<RawOutputs>;
}

impl<F> ModelGateway for F
where
    F: FnMut(&RgbImage) -> Result<RawOutputs>,
{
    fn infer(&mut self, image: &RgbImage) -> Result<RawOutputs> {
        self(image)
    }
}

/// 加载ONNX格式的检测模型
///
/// # 错误处理
/// 如果模型加载失败会返回Err
#[cfg(feature = "backend-onnx")]
pub fn load_model<P: AsRef<std::path::Path>>(model_path: P) -> Result<ort::session::Session> {
    use ort::session::{builder::GraphOptimizationLevel, Session};

    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)?;
    Ok(model)
}
