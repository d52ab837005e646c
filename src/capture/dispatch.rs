//! Output dispatch: one format, one encoder, one write.
//!
//! Given the resolved `OutputFormat`, selects exactly one encoding path:
//! vector (SVG wrapping the render surface), paginated (the engine's print
//! pipeline), text (extracted document content), or raster (surface encoded
//! via the `image` crate, plus small in-crate XBM/XPM encoders). Adding a
//! format means adding a variant and an encoder arm here; the coordinator is
//! never touched.

use base64::Engine as _;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use super::types::{CaptureError, CaptureResult};
use crate::engine::{ContentKind, PageEngine, PrintOptions, RenderSurface, Viewport};
use crate::format::{FormatClass, OutputFormat};
use crate::request::CaptureRequest;

/// Surface dimensions of the written output, where the format has any
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputDetails {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl OutputDetails {
    fn sized(viewport: Viewport) -> Self {
        Self {
            width: Some(viewport.width),
            height: Some(viewport.height),
        }
    }
}

/// Encode the current page state to the request's output path.
///
/// Invoked exactly once per session by the driver. Paginated formats await
/// the engine's print-finished completion; text formats await content
/// extraction; everything else paints the render surface first.
pub async fn dispatch_output<E: PageEngine + ?Sized>(
    engine: &mut E,
    request: &CaptureRequest,
    viewport: Viewport,
) -> CaptureResult<OutputDetails> {
    match request.format.class() {
        FormatClass::Vector => {
            let surface = engine.render_surface(viewport, request.smooth).await?;
            let svg = encode_svg(&surface)?;
            fs::write(&request.output, svg)?;
            Ok(OutputDetails::sized(surface.viewport()))
        }
        FormatClass::Paginated => {
            let options = PrintOptions::from_settings(&request.settings);
            engine.print_document(&request.output, &options).await?;
            Ok(OutputDetails::default())
        }
        FormatClass::Text => {
            let kind = match request.format {
                OutputFormat::Html => ContentKind::Html,
                _ => ContentKind::PlainText,
            };
            let content = engine.extract_content(kind).await?;
            fs::write(&request.output, content)?;
            Ok(OutputDetails::default())
        }
        FormatClass::Raster => {
            let surface = engine.render_surface(viewport, request.smooth).await?;
            let bytes = encode_raster(&surface, request.format, &request.output)?;
            fs::write(&request.output, bytes)?;
            Ok(OutputDetails::sized(surface.viewport()))
        }
    }
}

/// Wrap the render surface in an SVG document sized to the viewport, with
/// the raster embedded as a PNG data URI
fn encode_svg(surface: &RenderSurface) -> CaptureResult<String> {
    let png = surface.to_png()?;
    let data = base64::engine::general_purpose::STANDARD.encode(&png);
    let (w, h) = (surface.width(), surface.height());
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" \
         xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n\
         \x20 <image width=\"{w}\" height=\"{h}\" \
         xlink:href=\"data:image/png;base64,{data}\"/>\n\
         </svg>\n"
    ))
}

/// Encode the surface in the given raster format
fn encode_raster(
    surface: &RenderSurface,
    format: OutputFormat,
    output: &Path,
) -> CaptureResult<Vec<u8>> {
    if let Some(image_format) = format.image_format() {
        let img = surface.to_image();
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image_format)?;
        return Ok(bytes);
    }
    match format {
        OutputFormat::Xbm => Ok(encode_xbm(surface, &symbol_name(output))),
        OutputFormat::Xpm => encode_xpm(surface, &symbol_name(output)),
        other => Err(CaptureError::Encode(format!(
            "no encoder is available for the '{}' format",
            other.identifier()
        ))),
    }
}

/// Derive a C identifier for XBM/XPM output from the output file stem
fn symbol_name(output: &Path) -> String {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "capture".to_string());
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Encode as an X bitmap: one bit per pixel, dark pixels set, rows padded to
/// whole bytes, bits stored LSB-first
fn encode_xbm(surface: &RenderSurface, name: &str) -> Vec<u8> {
    let (w, h) = (surface.width(), surface.height());
    let mut out = String::new();
    out.push_str(&format!("#define {name}_width {w}\n"));
    out.push_str(&format!("#define {name}_height {h}\n"));
    out.push_str(&format!("static unsigned char {name}_bits[] = {{\n"));

    let bytes_per_row = w.div_ceil(8);
    let mut literals = Vec::with_capacity((bytes_per_row * h) as usize);
    for y in 0..h {
        for byte_x in 0..bytes_per_row {
            let mut byte = 0u8;
            for bit in 0..8 {
                let x = byte_x * 8 + bit;
                if x < w && luminance(surface.get_pixel(x, y)) < 128 {
                    byte |= 1 << bit;
                }
            }
            literals.push(format!("0x{byte:02x}"));
        }
    }
    for (ix, literal) in literals.iter().enumerate() {
        if ix % 12 == 0 {
            out.push_str("   ");
        }
        out.push_str(literal);
        if ix + 1 < literals.len() {
            out.push(',');
        }
        if ix % 12 == 11 {
            out.push('\n');
        } else if ix + 1 < literals.len() {
            out.push(' ');
        }
    }
    out.push_str(" };\n");
    out.into_bytes()
}

/// Characters used for XPM palette keys. Excludes `"` and `\` so rows never
/// need escaping.
const XPM_CHARSET: &[u8] =
    b" .XoO+@#$%&*=-;:>,<1234567890qwertyuipasdfghjklzxcvbnmMNBVCZASDFGHJKLPIUYTREWQ!~^/()_`'][{}|";

/// Encode as an X pixmap with an exact palette built from the surface
fn encode_xpm(surface: &RenderSurface, name: &str) -> CaptureResult<Vec<u8>> {
    let (w, h) = (surface.width(), surface.height());

    // Collect unique colors in first-seen order
    let mut palette: Vec<[u8; 3]> = Vec::new();
    let mut index = std::collections::HashMap::new();
    for y in 0..h {
        for x in 0..w {
            let color = surface.get_pixel(x, y);
            index.entry(color).or_insert_with(|| {
                palette.push(color);
                palette.len() - 1
            });
        }
    }

    let base = XPM_CHARSET.len();
    let cpp = match palette.len() {
        0..=1 => 1,
        n if n <= base => 1,
        n if n <= base * base => 2,
        n if n <= base * base * base => 3,
        n => {
            return Err(CaptureError::Encode(format!(
                "xpm palette overflow: {} unique colors",
                n
            )));
        }
    };

    let key = |ix: usize| -> String {
        let mut ix = ix;
        let mut chars = vec![b' '; cpp];
        for slot in chars.iter_mut().rev() {
            *slot = XPM_CHARSET[ix % base];
            ix /= base;
        }
        String::from_utf8_lossy(&chars).to_string()
    };

    let mut out = String::new();
    out.push_str("/* XPM */\n");
    out.push_str(&format!("static char *{name}[] = {{\n"));
    out.push_str(&format!("\"{} {} {} {}\",\n", w, h, palette.len(), cpp));
    for (ix, color) in palette.iter().enumerate() {
        out.push_str(&format!(
            "\"{} c #{:02X}{:02X}{:02X}\",\n",
            key(ix),
            color[0],
            color[1],
            color[2]
        ));
    }
    for y in 0..h {
        out.push('"');
        for x in 0..w {
            out.push_str(&key(index[&surface.get_pixel(x, y)]));
        }
        out.push('"');
        if y + 1 < h {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("};\n");
    Ok(out.into_bytes())
}

fn luminance(rgb: [u8; 3]) -> u32 {
    // Integer Rec.601 approximation
    (299 * rgb[0] as u32 + 587 * rgb[1] as u32 + 114 * rgb[2] as u32) / 1000
}
