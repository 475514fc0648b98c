//! Conversions between encoded images and the host's `[batch, height, width, channels]`
//! float tensors with values in `[0, 1]`.

use crate::error::{LiblibError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use ndarray::{concatenate, Array4, ArrayView4, Axis};
use std::io::Cursor;

/// Decode any supported container format into a `[1, H, W, 3]` tensor.
pub fn decode_image(bytes: &[u8]) -> Result<Array4<f32>> {
    if bytes.is_empty() {
        return Err(LiblibError::Image("Image data is empty".into()));
    }

    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data: Vec<f32> = rgb.into_raw().into_iter().map(|v| v as f32 / 255.0).collect();

    Array4::from_shape_vec((1, height as usize, width as usize, 3), data)
        .map_err(|e| LiblibError::Image(e.to_string()))
}

/// Stack tensors along the batch axis. All inputs must agree on H, W and C.
pub fn concat_batches(batches: &[Array4<f32>]) -> Result<Array4<f32>> {
    let first = batches
        .first()
        .ok_or_else(|| LiblibError::Image("No images to concatenate".into()))?;
    let expected = &first.shape()[1..];

    if let Some(mismatch) = batches.iter().find(|b| &b.shape()[1..] != expected) {
        return Err(LiblibError::Image(format!(
            "Cannot batch images of shape {:?} with {:?}",
            mismatch.shape(),
            first.shape()
        )));
    }

    let views: Vec<ArrayView4<f32>> = batches.iter().map(|b| b.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| LiblibError::Image(e.to_string()))
}

/// PNG-encode the first image of the batch and return it as standard base64.
pub fn tensor_to_base64_png(tensor: &Array4<f32>) -> Result<String> {
    let shape = tensor.shape();
    if shape[0] == 0 {
        return Err(LiblibError::Image("Tensor has an empty batch".into()));
    }
    let (height, width, channels) = (shape[1] as u32, shape[2] as u32, shape[3]);

    let pixels: Vec<u8> = tensor
        .index_axis(Axis(0), 0)
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();

    let image = match channels {
        1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8),
        other => {
            return Err(LiblibError::Image(format!(
                "Unsupported channel count {}",
                other
            )))
        }
    }
    .ok_or_else(|| LiblibError::Image("Pixel buffer does not match tensor shape".into()))?;

    let mut encoded = Cursor::new(Vec::new());
    image.write_to(&mut encoded, ImageFormat::Png)?;
    Ok(STANDARD.encode(encoded.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::png_bytes;

    #[test]
    fn test_decode_shape_and_range() {
        let tensor = decode_image(&png_bytes(4, 2, [255, 0, 51])).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 4, 3]);
        assert_eq!(tensor[[0, 1, 3, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 3, 1]], 0.0);
        assert!((tensor[[0, 0, 0, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image(&[]), Err(LiblibError::Image(_))));
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(LiblibError::Image(_))
        ));
    }

    #[test]
    fn test_concat_batches() {
        let a = decode_image(&png_bytes(3, 3, [0, 0, 0])).unwrap();
        let b = decode_image(&png_bytes(3, 3, [255, 255, 255])).unwrap();
        let batch = concat_batches(&[a, b]).unwrap();

        assert_eq!(batch.shape(), &[2, 3, 3, 3]);
        assert_eq!(batch[[0, 0, 0, 0]], 0.0);
        assert_eq!(batch[[1, 0, 0, 0]], 1.0);
    }

    #[test]
    fn test_concat_rejects_mismatched_sizes() {
        let a = decode_image(&png_bytes(3, 3, [0, 0, 0])).unwrap();
        let b = decode_image(&png_bytes(4, 3, [0, 0, 0])).unwrap();
        assert!(concat_batches(&[a, b]).is_err());
        assert!(concat_batches(&[]).is_err());
    }

    #[test]
    fn test_tensor_to_base64_png() {
        let original = png_bytes(5, 2, [10, 200, 30]);
        let tensor = decode_image(&original).unwrap();

        let encoded = tensor_to_base64_png(&tensor).unwrap();
        let decoded = decode_image(&STANDARD.decode(encoded).unwrap()).unwrap();

        assert_eq!(decoded.shape(), tensor.shape());
        let pixel = decoded.index_axis(Axis(0), 0);
        assert!((pixel[[1, 4, 1]] - 200.0 / 255.0).abs() < 1.0 / 255.0 + 1e-6);
    }

    #[test]
    fn test_tensor_to_base64_rejects_odd_channels() {
        let tensor = Array4::<f32>::zeros((1, 2, 2, 2));
        assert!(tensor_to_base64_png(&tensor).is_err());
    }
}
