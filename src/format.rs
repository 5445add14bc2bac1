//! Image format identification.
//!
//! This module defines the closed set of formats the proxy serves and the
//! static extension-to-MIME mapping used for responses.
//!
//! # Normalization
//!
//! The `jpeg` spelling is folded into [`ImageFormat::Jpg`] everywhere: as a
//! filename extension, as a path directive, and before transform-stage
//! selection. The proxy never distinguishes the two.

use std::fmt;

/// Supported image formats.
///
/// Raster formats (JPEG, PNG, GIF) can be decoded, resized, converted and
/// recompressed in-process. SVG is carried as opaque bytes and only ever
/// passed through or handed to an external optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// JPEG (`.jpg` / `.jpeg`, normalized to `jpg`)
    Jpg,
    /// GIF
    Gif,
    /// PNG
    Png,
    /// SVG (vector)
    Svg,
}

impl ImageFormat {
    /// Parse a file extension (without the dot), case-insensitively.
    ///
    /// `jpeg` is normalized to [`ImageFormat::Jpg`]. Returns `None` for
    /// anything outside the supported set.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Derive the format from a filename's extension.
    ///
    /// Returns `None` when there is no extension or the extension is not a
    /// supported image format.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1;
        Self::from_extension(ext)
    }

    /// The canonical extension for this format (`jpg`, never `jpeg`).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// The MIME type used for the `Content-Type` response header.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Whether this is a vector format.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Whether this is a raster format the image codec layer can process.
    pub fn is_raster(&self) -> bool {
        !self.is_vector()
    }

    /// The corresponding codec format for raster formats.
    ///
    /// Returns `None` for vector formats, which have no in-process codec.
    pub fn codec_format(&self) -> Option<image::ImageFormat> {
        match self {
            Self::Jpg => Some(image::ImageFormat::Jpeg),
            Self::Gif => Some(image::ImageFormat::Gif),
            Self::Png => Some(image::ImageFormat::Png),
            Self::Svg => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// =============================================================================
// Tests
// =============================================================================
