use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::integral_image::{integral_image, sum_image_pixels};

/// Preprocessing parameters tuned for card photos captured from a webcam.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessArgs {
    pub gaussian_blur_sigma: f32,
    pub threshold_block_radius: u32,
    pub threshold_delta: i64,
}

impl Default for PreprocessArgs {
    fn default() -> Self {
        Self {
            // equivalent of a 5x5 gaussian kernel with auto sigma
            gaussian_blur_sigma: 1.1,
            // 11x11 neighborhood
            threshold_block_radius: 5,
            threshold_delta: 2,
        }
    }
}

/// Prepares a frame for OCR: grayscale, blur to reduce sensor noise,
/// then adaptive thresholding so text stays legible under uneven lighting.
pub fn preprocess_frame(frame: &DynamicImage, args: &PreprocessArgs) -> GrayImage {
    let gray_img = frame.to_luma8();
    let blurred_img = gaussian_blur_f32(&gray_img, args.gaussian_blur_sigma);
    adaptive_threshold(&blurred_img, args.threshold_block_radius, args.threshold_delta)
}

/// Binarizes against the local mean of a (2*block_radius+1)^2 window,
/// clamped at the image borders. A pixel survives as white when it is
/// brighter than the window mean minus `delta`. The window mean is a
/// plain box mean, a close stand-in for the gaussian-weighted local
/// mean the earlier OpenCV pipeline used.
fn adaptive_threshold(img: &GrayImage, block_radius: u32, delta: i64) -> GrayImage {
    let width = img.width();
    let height = img.height();
    let integral: ImageBuffer<Luma<i64>, Vec<i64>> = integral_image(img);
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        let top = y.saturating_sub(block_radius);
        let bottom = (y + block_radius).min(height - 1);
        for x in 0..width {
            let left = x.saturating_sub(block_radius);
            let right = (x + block_radius).min(width - 1);
            let sum = sum_image_pixels(&integral, left, top, right, bottom)[0];
            let num_pixels = ((right - left + 1) * (bottom - top + 1)) as i64;
            let mean = sum / num_pixels;
            let value = if img.get_pixel(x, y)[0] as i64 > mean - delta {
                255
            } else {
                0
            };
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}
