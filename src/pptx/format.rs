//! Image formats accepted for picture shapes.

/// Raster format of an embedded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Extension of the media part, also used as the content-type default key.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Detect the format from its magic number.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];
        const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
        const GIF: &[u8] = b"GIF8";
        const BMP: &[u8] = b"BM";

        if bytes.starts_with(PNG) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(GIF) {
            Some(Self::Gif)
        } else if bytes.starts_with(BMP) {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}
