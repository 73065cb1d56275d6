use anyhow::Context;
use image::DynamicImage;

pub const THUMB_SIZE: u32 = 300;
/// Charts larger than this are downscaled before upload; leaves headroom for
/// the lightbox zoom.
pub const CHART_MAX: u32 = 4096;

/// Decode a fetched chart into an egui image, capped at `CHART_MAX`.
pub fn decode_chart(bytes: &[u8]) -> anyhow::Result<egui::ColorImage> {
    let img = decode(bytes)?;
    let img = if img.width() > CHART_MAX || img.height() > CHART_MAX {
        img.thumbnail(CHART_MAX, CHART_MAX)
    } else {
        img
    };
    Ok(to_color_image(img))
}

/// Decode a fetched chart and shrink it to tile size.
pub fn decode_thumbnail(bytes: &[u8]) -> anyhow::Result<egui::ColorImage> {
    let img = decode(bytes)?;
    Ok(to_color_image(img.thumbnail(THUMB_SIZE, THUMB_SIZE)))
}

fn decode(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    let format = image::guess_format(bytes).context("unrecognised image format")?;
    image::load_from_memory_with_format(bytes, format).context("image decode failed")
}

fn to_color_image(img: DynamicImage) -> egui::ColorImage {
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}
