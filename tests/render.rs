use std::collections::BTreeSet;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage, Rgba};
use ndarray::Array2;
use segview::segment::draw::over;
use segview::segment::LabelFont;
use segview::{Detection, InstanceMask, Palette, PixelBox, Renderer, SessionConfig};

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rgb<u8> = Rgb([100, 100, 100]);

    fn renderer() -> Renderer {
        Renderer::with_font(Arc::new(Palette::default()), LabelFont::Builtin)
    }

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, BASE))
    }

    /// 掩码覆盖 `[x0, x1) x [y0, y1)` 的检测
    fn masked(class_id: i64, size: (u32, u32), x: (usize, usize), y: (usize, usize)) -> Detection {
        let (width, height) = size;
        let mut grid = Array2::<f32>::zeros((height as usize, width as usize));
        grid.slice_mut(ndarray::s![y.0..y.1, x.0..x.1]).fill(1.0);
        Detection::new(
            class_id,
            "thing",
            0.9,
            PixelBox::new(x.0 as u32, y.0 as u32, x.1 as u32, y.1 as u32),
        )
        .with_mask(InstanceMask::Synthesized(grid))
    }

    fn masks_only_config(alpha: u8) -> SessionConfig {
        SessionConfig {
            show_boxes: false,
            show_labels: false,
            show_masks: true,
            mask_alpha: alpha,
            ..SessionConfig::default()
        }
    }

    fn blended(color: Rgb<u8>, alpha: u8) -> Rgb<u8> {
        let Rgb([r, g, b]) = color;
        let [br, bg, bb] = BASE.0;
        let [r, g, b, _] = over(Rgba([r, g, b, alpha]), Rgba([br, bg, bb, 255])).0;
        Rgb([r, g, b])
    }

    #[test]
    fn test_all_toggles_off_is_identity() {
        let mut source = RgbImage::new(12, 9);
        for (x, y, pixel) in source.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 20) as u8, (y * 25) as u8, 77]);
        }
        let image = DynamicImage::ImageRgb8(source.clone());
        let detections = vec![masked(1, (12, 9), (2, 8), (1, 6))];
        let config = SessionConfig {
            show_boxes: false,
            show_labels: false,
            show_masks: false,
            ..SessionConfig::default()
        };

        let result = renderer().render(&image, &detections, &config);
        assert_eq!(result, source);
    }

    #[test]
    fn test_no_detections_is_identity() {
        let image = gray(10, 10);
        let result = renderer().render(&image, &[], &SessionConfig::default());
        assert_eq!(result, image.to_rgb8());
    }

    #[test]
    fn test_mask_blends_over_image() {
        let renderer = renderer();
        let detections = vec![masked(1, (10, 10), (2, 6), (2, 6))];
        let result = renderer.render(&gray(10, 10), &detections, &masks_only_config(100));

        let expected = blended(renderer.palette().color_for(1), 100);
        assert_eq!(*result.get_pixel(3, 3), expected);
        assert_ne!(expected, BASE);
        assert_eq!(*result.get_pixel(8, 8), BASE);
    }

    #[test]
    fn test_overlapping_masks_differ_between_modes() {
        let renderer = renderer();
        let image = gray(10, 10);
        let first = masked(1, (10, 10), (0, 6), (0, 6));
        let second = masked(2, (10, 10), (4, 10), (4, 10));
        let detections = vec![first, second];

        // 叠加模式：重叠处是后一个检测的颜色与原图混合
        let blended_result = renderer.render(&image, &detections, &masks_only_config(100));
        let later = renderer.palette().color_for(2);
        assert_eq!(*blended_result.get_pixel(5, 5), blended(later, 100));

        // 替换模式：重叠处就是后一个检测的颜色
        let overlay = renderer.render_overlay_for_classes(&image, &detections, None);
        assert_eq!(*overlay.get_pixel(5, 5), later);
        assert_eq!(*overlay.get_pixel(1, 1), renderer.palette().color_for(1));
        assert_eq!(*overlay.get_pixel(9, 0), BASE);

        assert_ne!(blended_result.get_pixel(5, 5), overlay.get_pixel(5, 5));
    }

    #[test]
    fn test_overlay_respects_selected_classes() {
        let renderer = renderer();
        let image = gray(10, 10);
        let detections = vec![
            masked(1, (10, 10), (0, 5), (0, 5)),
            masked(2, (10, 10), (5, 10), (5, 10)),
        ];

        let selected = BTreeSet::from([2]);
        let overlay = renderer.render_overlay_for_classes(&image, &detections, Some(&selected));
        assert_eq!(*overlay.get_pixel(2, 2), BASE);
        assert_eq!(*overlay.get_pixel(7, 7), renderer.palette().color_for(2));

        let nothing = BTreeSet::new();
        let untouched = renderer.render_overlay_for_classes(&image, &detections, Some(&nothing));
        assert_eq!(untouched, image.to_rgb8());
    }

    #[test]
    fn test_masks_only_uses_stronger_alpha() {
        let renderer = renderer();
        let image = gray(10, 10);
        let detections = vec![masked(5, (10, 10), (0, 4), (0, 4))];

        let result = renderer.render_masks_only_default(&image, &detections);
        assert_eq!(*result.get_pixel(1, 1), blended(renderer.palette().color_for(5), 150));
        assert_eq!(*result.get_pixel(6, 6), BASE);
        assert_eq!(result, renderer.render_masks_only(&image, &detections, 150));
    }

    #[test]
    fn test_box_outline_uses_class_color() {
        let renderer = renderer();
        let image = gray(40, 40);
        let detections = vec![Detection::new(3, "car", 0.8, PixelBox::new(5, 5, 30, 30))];
        let config = SessionConfig {
            show_boxes: true,
            show_labels: false,
            show_masks: false,
            box_thickness: 3,
            ..SessionConfig::default()
        };

        let result = renderer.render(&image, &detections, &config);
        let color = renderer.palette().color_for(3);
        // 抗锯齿后的整像素覆盖允许1级误差
        let close = |p: &Rgb<u8>| p.0.iter().zip(color.0).all(|(&a, b)| a.abs_diff(b) <= 1);
        assert!(close(result.get_pixel(5, 15)), "left edge: {:?}", result.get_pixel(5, 15));
        assert!(close(result.get_pixel(15, 5)), "top edge: {:?}", result.get_pixel(15, 5));
        assert_eq!(*result.get_pixel(15, 15), BASE);
        assert_eq!(*result.get_pixel(35, 35), BASE);
    }

    #[test]
    fn test_labels_near_edges_do_not_panic() {
        let renderer = renderer();
        assert!(renderer.font().is_builtin());
        let image = gray(30, 30);
        let detections = vec![
            Detection::new(1, "person", 0.95, PixelBox::new(0, 0, 10, 10)),
            Detection::new(2, "bicycle", 0.6, PixelBox::new(20, 2, 30, 28)),
            Detection::new(99, "unknown", 0.5, PixelBox::new(29, 29, 30, 30)),
        ];

        let result = renderer.render(&image, &detections, &SessionConfig::default());
        assert_eq!(result.dimensions(), (30, 30));
        // 第一个框的标签翻到框下方，背景是类别颜色
        assert_eq!(*result.get_pixel(0, 14), renderer.palette().color_for(1));
    }
}
