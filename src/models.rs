use serde::Serialize;
use url::Url;

// What the client can ask us to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Png,
    Jpeg,
    Pdf,
}

impl OutputType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Pdf => "pdf",
        }
    }

    // Value for the content-type header of a successful capture
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

// Validated capture request
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub url: Url,
    pub full_page: bool,
    pub output_type: OutputType,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

impl CaptureRequest {
    pub fn options(&self) -> CaptureOptions {
        CaptureOptions {
            full_page: self.full_page,
            output_type: self.output_type,
            width: self.width,
            height: self.height,
            quality: self.quality,
        }
    }
}

// Options handed to the renderer, each one present or absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureOptions {
    pub full_page: bool,
    pub output_type: OutputType,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

// One violated field of a capture request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_type_tokens_and_mime() {
        assert_eq!(OutputType::parse("png"), Some(OutputType::Png));
        assert_eq!(OutputType::parse("jpeg"), Some(OutputType::Jpeg));
        assert_eq!(OutputType::parse("pdf"), Some(OutputType::Pdf));
        assert_eq!(OutputType::parse("PNG"), None);
        assert_eq!(OutputType::parse("webp"), None);

        assert_eq!(OutputType::Png.content_type(), "image/png");
        assert_eq!(OutputType::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputType::Pdf.content_type(), "application/pdf");
        assert_eq!(OutputType::default(), OutputType::Png);
    }
}
