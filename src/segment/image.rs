use std::path::Path;

use image::DynamicImage;

use crate::config::SUPPORTED_IMAGE_FORMATS;
use crate::error::{Error, Result};

/// 文件扩展名是否在支持列表中（不区分大小写）
pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_IMAGE_FORMATS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 加载图像文件
///
/// 无论原始颜色模式如何，都转换为RGB。
///
/// # 错误处理
/// 扩展名不受支持时返回 [`Error::UnsupportedImageFormat`]，解码失败时返回 [`Error::Image`]
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    if !is_supported_format(path) {
        return Err(Error::UnsupportedImageFormat(path.display().to_string()));
    }
    let img = image::open(path)?;
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn recognizes_supported_extensions() {
        assert!(is_supported_format("photo.JPG"));
        assert!(is_supported_format("dir/a.webp"));
        assert!(!is_supported_format("notes.txt"));
        assert!(!is_supported_format("no_extension"));
    }

    #[test]
    fn rejects_unsupported_files() {
        let err = load_image("scan.tiff").unwrap_err();
        assert!(matches!(err, Error::UnsupportedImageFormat(_)));
    }

    #[test]
    fn loads_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40])).save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert!(matches!(img, DynamicImage::ImageRgb8(_)));
        assert_eq!(img.to_rgb8().get_pixel(2, 1).0, [10, 20, 30]);
    }
}
