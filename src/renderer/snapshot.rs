use std::path::Path;

use anyhow::Context;

/// Reverses the order of the rows in place. GL reads the framebuffer bottom
/// row first, image files want the top row first.
pub fn flip_rows(pixels: &mut [u8], row_len: usize) {
    if row_len == 0 {
        return;
    }
    let rows = pixels.len() / row_len;
    for row in 0..rows / 2 {
        let (top, bottom) = pixels.split_at_mut((rows - row - 1) * row_len);
        top[row * row_len..(row + 1) * row_len].swap_with_slice(&mut bottom[..row_len]);
    }
}

/// Encodes tightly packed RGB8 pixels, top row first, as a PNG file.
pub fn write_png(path: &Path, width: u32, height: u32, pixels: &[u8]) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        pixels,
        width,
        height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    log::info!("Wrote {width}x{height} snapshot to {}", path.display());
    Ok(())
}
