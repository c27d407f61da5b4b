use thiserror::Error;
use tesseract::TesseractError;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("tesseract error: {0}")]
    TesseractError(#[from] TesseractError),
    #[error("io error")]
    IoError(#[from] std::io::Error),
    #[error("image could not be decoded: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("invalid base64 image data: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("no image data provided")]
    EmptyImageData,
}
