//! 错误类型
//!
//! 所有公开操作都返回 [`Result`]。错误分为几类：
//! - 配置错误（未知模型、空调色板、非法参数）：构造时立即返回
//! - 未就绪错误：模型加载前调用推理
//! - 格式错误：模型输出缺少约定的张量
//!
//! 越界或退化的几何（例如面积为0的框）不会报错，而是在本地钳制处理。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// 模型名称不在模型目录中
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// 调色板为空，无法为类别分配颜色
    #[error("color palette is empty")]
    EmptyPalette,

    /// 配置参数不合法
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// 模型尚未加载
    #[error("model is not loaded, call load first")]
    NotReady,

    /// 模型输出不符合约定格式
    #[error("unrecognized model output format: {0}")]
    Format(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "backend-onnx")]
    #[error(transparent)]
    Backend(#[from] ort::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
