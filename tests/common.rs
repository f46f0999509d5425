#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }))
}

pub fn write_image(path: &Path, format: ImageFormat) -> PathBuf {
    gradient_image(32, 24).save_with_format(path, format).unwrap();
    path.to_path_buf()
}

pub fn write_text(path: &Path, contents: &[u8]) -> PathBuf {
    File::create(path).unwrap().write_all(contents).unwrap();
    path.to_path_buf()
}

/// A PNG cut off right after its header chunk
pub fn write_truncated_png(path: &Path) -> PathBuf {
    write_image(path, ImageFormat::Png);
    let bytes = std::fs::read(path).unwrap();
    std::fs::write(path, &bytes[..33]).unwrap();
    path.to_path_buf()
}

/// The mixed directory used by the end-to-end scenarios:
/// `a.jpg` (JPEG), `b.png` (PNG), `c.jpg` (PNG content), `d.txt` (text)
pub fn create_mixed_tree(root: &Path) {
    write_image(&root.join("a.jpg"), ImageFormat::Jpeg);
    write_image(&root.join("b.png"), ImageFormat::Png);
    write_image(&root.join("c.jpg"), ImageFormat::Png);
    write_text(&root.join("d.txt"), b"not an image");
}
