use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::CodecError;

/// Write `input` (any decodable raster image) as a one-page PDF whose page
/// matches the image at `dpi`. Palette, grayscale and alpha images are
/// flattened to RGB first; the page embeds a JPEG stream. The decoder is
/// chosen from the file's content, falling back to its extension.
///
/// Blocking: run it on the blocking pool.
pub fn image_to_pdf(input: &Path, output: &Path, dpi: u32, quality: u8) -> Result<(), CodecError> {
    let decoded = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))?;

    let scale = 72.0 / dpi.max(1) as f32;
    let (page_w, page_h) = (width as f32 * scale, height as f32 * scale);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![page_w.into(), 0.into(), 0.into(), page_h.into(), 0.into(), 0.into()],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(output)?;
    Ok(())
}
