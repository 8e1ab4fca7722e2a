use std::path::Path;

use image::RgbImage;
use ndarray::{ArrayD, IxDyn};
use ort::{inputs, session::Session, value::Tensor};
use tracing::debug;

use crate::error::{Error, Result};
use crate::segment::model::{load_model, ModelGateway};
use crate::segment::posts::{RawOutputs, BOXES_KEY, CLASSES_KEY, MASKS_KEY, SCORES_KEY};

pub const INPUT_NAME: &str = "input_tensor";

/// 基于ONNX Runtime的推理网关
///
/// 模型输入为 `[1, H, W, 3]` 的 `uint8` 张量，输出沿用目标检测导出模型的命名
/// （`detection_boxes` 等）。
pub struct OnnxGateway {
    session: Session,
}

impl OnnxGateway {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// 从本地文件加载模型
    pub fn from_file<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Ok(Self::new(load_model(model_path)?))
    }
}

impl ModelGateway for OnnxGateway {
    fn infer(&mut self, image: &RgbImage) -> Result<RawOutputs> {
        let (width, height) = image.dimensions();
        let input_tensor = Tensor::from_array((
            [1usize, height as usize, width as usize, 3],
            image.as_raw().clone(),
        ))?;
        let outputs = self.session.run(inputs![INPUT_NAME => input_tensor])?;

        let mut raw = RawOutputs::new();
        for key in [BOXES_KEY, CLASSES_KEY, SCORES_KEY, MASKS_KEY] {
            let Some(value) = outputs.get(key) else {
                continue;
            };
            let (shape, data) = value.try_extract_tensor::<f32>()?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            let tensor = ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec())
                .map_err(|e| Error::Format(format!("output `{}`: {}", key, e)))?;
            debug!(output = key, shape = ?dims, "model output extracted");
            raw.insert(key.to_string(), tensor);
        }
        Ok(raw)
    }
}
