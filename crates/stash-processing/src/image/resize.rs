use image::{DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> image::imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            image::imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            image::imageops::FilterType::CatmullRom
        } else {
            image::imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions, ignoring the source aspect ratio.
    pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img.clone();
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::imageops::FilterType;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_select_filter_by_ratio() {
        assert_eq!(ImageResize::select_filter(1000, 1000, 100, 100), FilterType::Triangle);
        assert_eq!(ImageResize::select_filter(180, 180, 100, 100), FilterType::CatmullRom);
        assert_eq!(ImageResize::select_filter(120, 120, 100, 100), FilterType::Lanczos3);
        // Upscaling keeps the sharpest filter.
        assert_eq!(ImageResize::select_filter(50, 50, 317, 262), FilterType::Lanczos3);
    }

    #[test]
    fn test_resize_exact_distorts_aspect_ratio() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(800, 100, Rgba([9, 9, 9, 255])));
        let resized = ImageResize::resize_exact(&img, 317, 262);
        assert_eq!(resized.dimensions(), (317, 262));
    }

    #[test]
    fn test_resize_exact_same_size_is_identity() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 20, Rgba([1, 2, 3, 255])));
        let resized = ImageResize::resize_exact(&img, 10, 20);
        assert_eq!(resized.dimensions(), (10, 20));
        assert_eq!(resized.to_rgba8().get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }
}
