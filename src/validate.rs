use std::collections::HashMap;
use url::Url;

use crate::models::{CaptureRequest, FieldError, OutputType};

const FULL_PAGE_TOKEN: &str = "true";

// Raw query parameters in, CaptureRequest out. Every violated field is
// reported, not just the first; empty optional values count as absent
pub fn validate(params: &HashMap<String, String>) -> Result<CaptureRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let url = match param(params, "url") {
        None => {
            errors.push(FieldError::new("url", "required"));
            None
        }
        Some(raw) => match Url::parse(raw) {
            Ok(url) if url.has_host() => Some(url),
            _ => {
                errors.push(FieldError::new("url", "invalid"));
                None
            }
        },
    };

    // anything but the literal token is false, never an error
    let full_page = params.get("fullPage").map(String::as_str) == Some(FULL_PAGE_TOKEN);

    let output_type = match param(params, "type") {
        None => OutputType::default(),
        Some(raw) => OutputType::parse(raw).unwrap_or_else(|| {
            errors.push(FieldError::new(
                "type",
                format!("invalid value '{raw}', expected one of png, jpeg, pdf"),
            ));
            OutputType::default()
        }),
    };

    let width = positive_dimension(params, "width", &mut errors);
    let height = positive_dimension(params, "height", &mut errors);

    let quality = param(params, "quality").and_then(|raw| match coerce_integer(raw) {
        Some(q) if (0..=100).contains(&q) => Some(q as u8),
        Some(_) => {
            errors.push(FieldError::new("quality", "must be between 0 and 100"));
            None
        }
        None => {
            errors.push(FieldError::new("quality", "expected an integer"));
            None
        }
    });

    match url {
        Some(url) if errors.is_empty() => Ok(CaptureRequest {
            url,
            full_page,
            output_type,
            width,
            height,
            quality,
        }),
        _ => Err(errors),
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn positive_dimension(
    params: &HashMap<String, String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<u32> {
    let raw = param(params, field)?;
    match coerce_integer(raw).map(u32::try_from) {
        Some(Ok(value)) if value > 0 => Some(value),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a positive integer"));
            None
        }
        None => {
            errors.push(FieldError::new(field, "expected an integer"));
            None
        }
    }
}

// Accepts "42", " 42 " and integral decimals like "42.0"; rejects "4.5" and "abc".
fn coerce_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
