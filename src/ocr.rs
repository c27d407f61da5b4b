use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use tesseract::{Tesseract, TesseractError};

use crate::errors::OcrError;

/// Runs tesseract over a preprocessed frame. The frame is PNG-encoded in
/// memory; tesseract only accepts image bytes in a container format.
pub fn recognize(
    tesseract_data: &str,
    tesseract_lang: &str,
    frame: &GrayImage,
) -> Result<String, OcrError> {
    let mut png_bytes = Vec::new();
    frame.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;

    let tes = Tesseract::new(Some(tesseract_data), Some(tesseract_lang))
        .map_err(TesseractError::from)?;
    let mut tes = tes
        .set_image_from_mem(&png_bytes)
        .map_err(TesseractError::from)?;
    let text = tes.get_text().map_err(TesseractError::from)?;
    Ok(text)
}
