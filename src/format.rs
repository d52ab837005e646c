//! Output format identification and classification.
//!
//! Fourteen formats are recognized, resolved either from the output file
//! extension or from an explicit identifier. Each format belongs to one of
//! four dispatch classes that determine how the Output Dispatcher obtains and
//! encodes the capture (see `capture::dispatch`).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A supported capture output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Pdf,
    Ps,
    /// Plain text extracted from the document (identifier `itext`)
    IText,
    Html,
    Png,
    Jpeg,
    Mng,
    Tiff,
    Gif,
    Bmp,
    Ppm,
    Xbm,
    Xpm,
}

/// How the Output Dispatcher produces a given format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    /// Render surface streamed through the SVG generator
    Vector,
    /// Engine print pipeline with a fixed page size (PDF/PostScript)
    Paginated,
    /// Extracted document content written as UTF-8 text
    Text,
    /// Render surface painted into a raster buffer and encoded
    Raster,
}

/// Format, file extension, and CLI identifier for every known format
const FORMAT_TABLE: &[(OutputFormat, &str, &str)] = &[
    (OutputFormat::Svg, ".svg", "svg"),
    (OutputFormat::Pdf, ".pdf", "pdf"),
    (OutputFormat::Ps, ".ps", "ps"),
    (OutputFormat::IText, ".txt", "itext"),
    (OutputFormat::Html, ".html", "html"),
    (OutputFormat::Jpeg, ".jpeg", "jpeg"),
    (OutputFormat::Png, ".png", "png"),
    (OutputFormat::Mng, ".mng", "mng"),
    (OutputFormat::Tiff, ".tiff", "tiff"),
    (OutputFormat::Gif, ".gif", "gif"),
    (OutputFormat::Bmp, ".bmp", "bmp"),
    (OutputFormat::Ppm, ".ppm", "ppm"),
    (OutputFormat::Xbm, ".xbm", "xbm"),
    (OutputFormat::Xpm, ".xpm", "xpm"),
];

impl OutputFormat {
    /// Resolve a format from its CLI identifier (e.g. "png", "itext")
    pub fn from_identifier(id: &str) -> Option<Self> {
        FORMAT_TABLE
            .iter()
            .find(|(_, _, ident)| *ident == id)
            .map(|(format, _, _)| *format)
    }

    /// Resolve a format from the extension of an output path
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        FORMAT_TABLE
            .iter()
            .find(|(_, ext, _)| name.ends_with(ext))
            .map(|(format, _, _)| *format)
    }

    /// The CLI identifier for this format
    pub fn identifier(&self) -> &'static str {
        FORMAT_TABLE
            .iter()
            .find(|(format, _, _)| format == self)
            .map(|(_, _, ident)| *ident)
            .unwrap_or("")
    }

    /// The canonical file extension for this format, including the dot
    pub fn extension(&self) -> &'static str {
        FORMAT_TABLE
            .iter()
            .find(|(format, _, _)| format == self)
            .map(|(_, ext, _)| *ext)
            .unwrap_or("")
    }

    /// All known CLI identifiers, in table order
    pub fn identifiers() -> impl Iterator<Item = &'static str> {
        FORMAT_TABLE.iter().map(|(_, _, ident)| *ident)
    }

    /// The dispatch class this format belongs to
    pub fn class(&self) -> FormatClass {
        match self {
            OutputFormat::Svg => FormatClass::Vector,
            OutputFormat::Pdf | OutputFormat::Ps => FormatClass::Paginated,
            OutputFormat::IText | OutputFormat::Html => FormatClass::Text,
            _ => FormatClass::Raster,
        }
    }

    /// The `image` crate format for raster encoding, where one exists
    pub(crate) fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            OutputFormat::Png => Some(image::ImageFormat::Png),
            OutputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            OutputFormat::Tiff => Some(image::ImageFormat::Tiff),
            OutputFormat::Gif => Some(image::ImageFormat::Gif),
            OutputFormat::Bmp => Some(image::ImageFormat::Bmp),
            OutputFormat::Ppm => Some(image::ImageFormat::Pnm),
            _ => None,
        }
    }

    /// Whether an encoder exists for this format.
    ///
    /// MNG is recognized for compatibility but no encoder is available, so
    /// requests for it are rejected before any load begins.
    pub fn encoder_available(&self) -> bool {
        match self.class() {
            FormatClass::Raster => {
                self.image_format().is_some()
                    || matches!(self, OutputFormat::Xbm | OutputFormat::Xpm)
            }
            _ => true,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}
