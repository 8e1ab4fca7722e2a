use std::sync::Arc;
use std::time::Instant;

use image::{DynamicImage, RgbImage};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::segment::bounds::Detection;
use crate::segment::labels::LabelTable;
use crate::segment::model::{model_info, ModelGateway, ModelInfo};
use crate::segment::posts::{PostProcessor, RawOutputs};

/// 目标检测器
///
/// 封装了完整的检测流程：模型推理和结果后处理。创建时只校验模型名称，
/// 加载推理网关后才能执行推理。
///
/// # 示例
///
/// ```
/// use std::sync::Arc;
/// use segview::{Error, LabelTable, ObjectDetector};
///
/// let detector = ObjectDetector::new("SSD MobileNet V2", Arc::new(LabelTable::coco())).unwrap();
/// assert!(!detector.is_loaded());
///
/// let err = ObjectDetector::new("No Such Model", Arc::new(LabelTable::coco())).unwrap_err();
/// assert!(matches!(err, Error::UnknownModel(_)));
/// ```
pub struct ObjectDetector {
    info: &'static ModelInfo,
    gateway: Option<Box<dyn ModelGateway>>,
    post: PostProcessor,
}

impl ObjectDetector {
    /// 创建检测器
    ///
    /// # 错误处理
    /// 模型名称不在目录中时返回 [`Error::UnknownModel`]
    pub fn new(model_name: &str, labels: Arc<LabelTable>) -> Result<Self> {
        let info = model_info(model_name)
            .ok_or_else(|| Error::UnknownModel(model_name.to_string()))?;
        Ok(Self {
            info,
            gateway: None,
            post: PostProcessor::new(labels),
        })
    }

    pub fn info(&self) -> &'static ModelInfo {
        self.info
    }

    pub fn model_name(&self) -> &'static str {
        self.info.name
    }

    /// 使用给定的推理网关
    pub fn load_with<G: ModelGateway + 'static>(&mut self, gateway: G) {
        info!(model = self.info.name, "model gateway attached");
        self.gateway = Some(Box::new(gateway));
    }

    /// 从本地ONNX文件加载模型
    #[cfg(feature = "backend-onnx")]
    pub fn load_onnx<P: AsRef<std::path::Path>>(&mut self, model_path: P) -> Result<()> {
        let start_time = Instant::now();
        let gateway = crate::segment::infer::OnnxGateway::from_file(model_path.as_ref())?;
        info!(
            model = self.info.name,
            path = %model_path.as_ref().display(),
            elapsed = ?start_time.elapsed(),
            "model loaded"
        );
        self.gateway = Some(Box::new(gateway));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.gateway.is_some()
    }

    /// 对图像执行一次推理，返回原始输出
    ///
    /// # 错误处理
    /// 模型尚未加载时返回 [`Error::NotReady`]
    pub fn predict(&mut self, image: &RgbImage) -> Result<RawOutputs> {
        let gateway = self.gateway.as_mut().ok_or(Error::NotReady)?;
        let start_time = Instant::now();
        let outputs = gateway.infer(image)?;
        info!(model = self.info.name, elapsed = ?start_time.elapsed(), "inference finished");
        Ok(outputs)
    }

    /// 完整的检测流程：从图像到检测结果
    pub fn detect(
        &mut self,
        image: &DynamicImage,
        config: &SessionConfig,
    ) -> Result<Vec<Detection>> {
        let rgb = image.to_rgb8();
        let outputs = self.predict(&rgb)?;
        let detections = self.post.process(&outputs, rgb.width(), rgb.height(), config)?;
        info!(model = self.info.name, count = detections.len(), "detection finished");
        Ok(detections)
    }
}

impl std::fmt::Debug for ObjectDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDetector")
            .field("model", &self.info.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
