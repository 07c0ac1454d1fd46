//! Error taxonomy for font construction and text operations.
//!
//! Construction failures (`FontError`) never yield a partial `Font`.
//! Per-call failures (`TextError`) abort the enclosing cache/render/assemble
//! call and leave the glyph cache in its previous consistent state.
//! GPU validation errors are not represented here — they are programmer
//! errors surfaced through wgpu's own diagnostics.

use std::path::PathBuf;

use thiserror::Error;

/// Why a `Font` could not be constructed.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font data is unsupported or corrupt")]
    UnsupportedFont,
    #[error("invalid pixel size: {0}")]
    InvalidSize(u32),
}

/// Why a cache/render/assemble call failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    /// The rasterizer cannot produce a bitmap for this glyph.
    #[error("rasterizer produced no bitmap for glyph {0}")]
    Rasterization(u16),
    /// The atlas has no room left. The cache is append-only: the remedy
    /// is a new `Font` with a larger minimum cache size.
    #[error("glyph cache full ({width}x{height} atlas)")]
    CacheOverflow { width: u32, height: u32 },
    /// Strict assembly hit a glyph that was never cached.
    #[error("glyph {0} is not cached")]
    UncachedGlyph(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_error_display() {
        let err = TextError::CacheOverflow { width: 256, height: 128 };
        assert_eq!(err.to_string(), "glyph cache full (256x128 atlas)");
        assert_eq!(
            TextError::UncachedGlyph(42).to_string(),
            "glyph 42 is not cached"
        );
    }

    #[test]
    fn font_error_keeps_io_source() {
        let err = FontError::Io {
            path: PathBuf::from("/no/such/font.ttf"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/no/such/font.ttf"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
