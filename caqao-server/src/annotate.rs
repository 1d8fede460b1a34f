//! Detection box rendering
//!
//! The stored image is the upload with one box per detection drawn on it,
//! re-encoded as JPEG.

use std::io::Cursor;

use caqao_common::grading::{normalize_label, CategoryGroup};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;

use crate::detector::RawDetection;

const BOX_THICKNESS: u32 = 2;

const COLOUR_BOX: [u8; 3] = [255, 165, 0];
const CUT_BOX: [u8; 3] = [0, 200, 0];
const DEFECT_BOX: [u8; 3] = [255, 0, 0];
const UNKNOWN_BOX: [u8; 3] = [128, 128, 128];

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("{0}")]
    Decode(image::ImageError),

    #[error("{0}")]
    Encode(image::ImageError),
}

/// Draw `detections` onto the encoded `image` and return JPEG bytes
pub fn annotate(image: &[u8], detections: &[RawDetection]) -> Result<Vec<u8>, AnnotateError> {
    render(decode(image)?, detections)
}

/// Decode an upload in any supported format
pub fn decode(image: &[u8]) -> Result<RgbImage, AnnotateError> {
    Ok(image::load_from_memory(image)
        .map_err(AnnotateError::Decode)?
        .to_rgb8())
}

/// Draw `detections` onto a decoded image and encode it as JPEG
pub fn render(
    mut canvas: RgbImage,
    detections: &[RawDetection],
) -> Result<Vec<u8>, AnnotateError> {
    for detection in detections {
        draw_box(&mut canvas, &detection.bbox, box_colour(&detection.label));
    }

    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .map_err(AnnotateError::Encode)?;
    Ok(encoded)
}

/// Compound labels take the cut-grade colour
fn box_colour(label: &str) -> Rgb<u8> {
    let group = normalize_label(label)
        .ok()
        .and_then(|categories| categories.iter().last())
        .map(|category| category.group());

    Rgb(match group {
        Some(CategoryGroup::Colour) => COLOUR_BOX,
        Some(CategoryGroup::Cut) => CUT_BOX,
        Some(CategoryGroup::Defect) => DEFECT_BOX,
        None => UNKNOWN_BOX,
    })
}

/// Pixel box `[xmin, ymin, xmax, ymax]`, clamped to the image
fn draw_box(canvas: &mut RgbImage, bbox: &[f32; 4], colour: Rgb<u8>) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    if w == 0 || h == 0 {
        return;
    }

    let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
    let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
    let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
        return;
    }

    for inset in 0..BOX_THICKNESS as i32 {
        let width = x_max - x_min + 1 - 2 * inset;
        let height = y_max - y_min + 1 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x_min + inset, y_min + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(canvas, rect, colour);
    }
}
