//! Request path parsing.
//!
//! A request path names a source image plus optional transform directives,
//! all packed into the final path segment:
//!
//! ```text
//! /photos/cat.jpg,w100,h50,png
//!  └────┬───────┘ └─┬┘ └┬┘ └┬┘
//!   filename     width height output format
//! ```
//!
//! The grammar, applied after stripping the leading slash:
//!
//! - a filename ending in one of `.jpg`, `.jpeg`, `.gif`, `.png`, `.svg`;
//! - optionally `,w<digits>` (1-4 digits);
//! - optionally `,h<digits>` (1-4 digits);
//! - optionally `,<format>` with format in `{jpg, jpeg, gif, png, svg}`.
//!
//! The suffixes must appear in that fixed order and the whole path must be
//! consumed. The filename match is non-greedy so directive suffixes are not
//! absorbed into the name, while filenames that themselves contain commas
//! (`a,b.jpg`) still parse. A path that does not match is answered with 404
//! before any cache or source access.

use std::sync::OnceLock;

use regex::Regex;

use crate::format::ImageFormat;

/// The transform directives extracted from a request path.
///
/// Immutable and request-scoped: one is built per inbound request and
/// discarded once the response is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Source filename, including its original extension. May contain
    /// directory separators and commas. Never empty.
    pub filename: String,

    /// Target width in pixels. Absent means no constraint on this axis.
    pub width: Option<u32>,

    /// Target height in pixels. Absent means no constraint on this axis.
    pub height: Option<u32>,

    /// Requested output format. Absent means "keep the source format".
    pub format: Option<ImageFormat>,

    /// Format implied by the filename extension.
    source_format: ImageFormat,
}

impl TransformRequest {
    /// The format implied by the filename extension.
    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    /// The output format: the explicit directive if given, otherwise the
    /// source format. Determines the response `Content-Type`.
    pub fn target_format(&self) -> ImageFormat {
        self.format.unwrap_or(self.source_format)
    }

    /// Whether a resize directive is present on either axis.
    pub fn wants_resize(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Whether the requested output format differs from the source format.
    pub fn wants_conversion(&self) -> bool {
        self.target_format() != self.source_format
    }
}

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?x)^
              (?P<filename>.+?\.(?:jpe?g|gif|png|svg))  # file name
              (?:,w(?P<width>[0-9]{1,4}))?              # width
              (?:,h(?P<height>[0-9]{1,4}))?             # height
              (?:,(?P<format>jpe?g|gif|png|svg))?       # output format
            $",
        )
        .expect("path pattern is a valid regex")
    })
}

/// Parse a request path into a [`TransformRequest`].
///
/// Accepts the path with or without its leading slash. Returns `None` when
/// the path does not match the grammar, when a directive digit run parses
/// to zero (directives are positive integers), or when directives appear
/// out of order.
pub fn parse_path(path: &str) -> Option<TransformRequest> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let captures = path_pattern().captures(path)?;

    let filename = captures.name("filename")?.as_str().to_string();
    let source_format = ImageFormat::from_filename(&filename)?;

    let width = match captures.name("width") {
        Some(m) => Some(parse_dimension(m.as_str())?),
        None => None,
    };
    let height = match captures.name("height") {
        Some(m) => Some(parse_dimension(m.as_str())?),
        None => None,
    };
    let format = match captures.name("format") {
        Some(m) => Some(ImageFormat::from_extension(m.as_str())?),
        None => None,
    };

    Some(TransformRequest {
        filename,
        width,
        height,
        format,
        source_format,
    })
}

/// Parse a width/height digit run, rejecting zero.
fn parse_dimension(digits: &str) -> Option<u32> {
    let value = digits.parse::<u32>().ok()?;
    (value > 0).then_some(value)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_only() {
        let req = parse_path("/photo.jpg").unwrap();
        assert_eq!(req.filename, "photo.jpg");
        assert_eq!(req.width, None);
        assert_eq!(req.height, None);
        assert_eq!(req.format, None);
        assert_eq!(req.source_format(), ImageFormat::Jpg);
        assert_eq!(req.target_format(), ImageFormat::Jpg);
        assert!(!req.wants_resize());
        assert!(!req.wants_conversion());
    }

    #[test]
    fn test_all_directives() {
        let req = parse_path("/photo.jpg,w100,h50,png").unwrap();
        assert_eq!(req.filename, "photo.jpg");
        assert_eq!(req.width, Some(100));
        assert_eq!(req.height, Some(50));
        assert_eq!(req.format, Some(ImageFormat::Png));
        assert_eq!(req.target_format(), ImageFormat::Png);
        assert!(req.wants_resize());
        assert!(req.wants_conversion());
    }

    #[test]
    fn test_partial_directives() {
        let req = parse_path("/photo.jpg,w100").unwrap();
        assert_eq!(req.width, Some(100));
        assert_eq!(req.height, None);
        assert_eq!(req.format, None);

        let req = parse_path("/photo.jpg,h50").unwrap();
        assert_eq!(req.width, None);
        assert_eq!(req.height, Some(50));

        let req = parse_path("/photo.jpg,gif").unwrap();
        assert_eq!(req.width, None);
        assert_eq!(req.height, None);
        assert_eq!(req.format, Some(ImageFormat::Gif));
    }

    #[test]
    fn test_jpeg_directive_normalized() {
        let req = parse_path("/photo.png,jpeg").unwrap();
        assert_eq!(req.format, Some(ImageFormat::Jpg));
        assert_eq!(req.target_format(), ImageFormat::Jpg);

        let req = parse_path("/photo.jpeg").unwrap();
        assert_eq!(req.source_format(), ImageFormat::Jpg);
        assert_eq!(req.target_format(), ImageFormat::Jpg);
    }

    #[test]
    fn test_nested_path_and_commas_in_filename() {
        let req = parse_path("/albums/2024/photo.jpg,w10").unwrap();
        assert_eq!(req.filename, "albums/2024/photo.jpg");
        assert_eq!(req.width, Some(10));

        // A comma segment that is not a valid directive belongs to the name.
        let req = parse_path("/a,b.jpg").unwrap();
        assert_eq!(req.filename, "a,b.jpg");
        assert_eq!(req.width, None);
    }

    #[test]
    fn test_directives_not_absorbed_into_filename() {
        // Non-greedy filename: the w/h/format suffixes must be recognized,
        // not swallowed by the name.
        let req = parse_path("/photo.jpg,w1,h2,svg").unwrap();
        assert_eq!(req.filename, "photo.jpg");
        assert_eq!(req.width, Some(1));
        assert_eq!(req.height, Some(2));
        assert_eq!(req.format, Some(ImageFormat::Svg));
    }

    #[test]
    fn test_no_match_cases() {
        assert!(parse_path("/").is_none());
        assert!(parse_path("").is_none());
        assert!(parse_path("/photo.txt").is_none());
        assert!(parse_path("/photo").is_none());
        assert!(parse_path("/favicon.ico").is_none());
        // Missing dot before the extension
        assert!(parse_path("/photojpg").is_none());
    }

    #[test]
    fn test_out_of_order_directives_rejected() {
        assert!(parse_path("/photo.jpg,h50,w100").is_none());
        assert!(parse_path("/photo.jpg,png,w100").is_none());
        assert!(parse_path("/photo.jpg,png,h50").is_none());
    }

    #[test]
    fn test_malformed_directives_rejected() {
        assert!(parse_path("/photo.jpg,wabc").is_none());
        assert!(parse_path("/photo.jpg,w").is_none());
        assert!(parse_path("/photo.jpg,w12345").is_none()); // 5 digits
        assert!(parse_path("/photo.jpg,w100,").is_none());
        assert!(parse_path("/photo.jpg,w100,h50,bmp").is_none());
        assert!(parse_path("/photo.jpg,w100,h50,png,extra").is_none());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(parse_path("/photo.jpg,w0").is_none());
        assert!(parse_path("/photo.jpg,w100,h0").is_none());
    }

    #[test]
    fn test_four_digit_dimensions() {
        let req = parse_path("/photo.jpg,w9999,h9999").unwrap();
        assert_eq!(req.width, Some(9999));
        assert_eq!(req.height, Some(9999));
    }

    #[test]
    fn test_directive_digits_recovered_exactly() {
        let req = parse_path("/photo.gif,w7,h123,png").unwrap();
        assert_eq!(req.filename, "photo.gif");
        assert_eq!(req.width, Some(7));
        assert_eq!(req.height, Some(123));
        assert_eq!(req.format, Some(ImageFormat::Png));
    }
}
