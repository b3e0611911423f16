//! Tagged photo payload
//!
//! Photos travel as one of four explicit kinds. Producers that already know
//! the encoding send the tagged form:
//!
//! ```json
//! {"kind": "url", "value": "https://cdn.example/p/17.jpg"}
//! {"kind": "inlineImage", "value": "data:image/png;base64,iVBOR..."}
//! {"kind": "rawEncoded", "value": "/9j/4AAQ..."}
//! {"kind": "none"}
//! ```
//!
//! Legacy producers send a bare string (or null). Such a string is classified
//! exactly once, at decode time, and the rest of the client only ever looks at
//! the tag.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;

/// Hosts that serve stock avatars rather than a real photo of the person
pub const STOCK_PHOTO_MARKERS: &[&str] = &["pravatar.cc", "placeholder"];

/// Image format assumed for raw base64 payloads
pub const RAW_IMAGE_FORMAT: &str = "jpeg";

/// Raw payloads shorter than this are never treated as a real image
const MIN_RAW_LENGTH: usize = 100;

const FALLBACK_AVATAR_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="96" height="96" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M20 21v-2a4 4 0 0 0-4-4H8a4 4 0 0 0-4 4v2"></path><circle cx="12" cy="7" r="4"></circle></svg>"#;

static FALLBACK_AVATAR: Lazy<String> =
    Lazy::new(|| format!("data:image/svg+xml;base64,{}", STANDARD.encode(FALLBACK_AVATAR_SVG)));

/// Inline SVG user icon shown when a person has no usable photo
pub fn fallback_avatar() -> &'static str {
    FALLBACK_AVATAR.as_str()
}

/// Photo of a person, tagged by encoding
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PhotoPayload {
    /// Direct http(s) URL
    Url(String),
    /// Complete data URI
    InlineImage(String),
    /// Base64 image bytes without a data URI prefix
    RawEncoded(String),
    /// No photo
    #[default]
    None,
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
enum TaggedPhoto {
    Url(String),
    InlineImage(String),
    RawEncoded(String),
    None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PhotoWire {
    Tagged(TaggedPhoto),
    Plain(String),
}

impl<'de> Deserialize<'de> for PhotoPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Option::<PhotoWire>::deserialize(deserializer)?;
        Ok(match wire {
            None => PhotoPayload::None,
            Some(PhotoWire::Plain(raw)) => PhotoPayload::classify(&raw),
            Some(PhotoWire::Tagged(tagged)) => match tagged {
                TaggedPhoto::Url(v) => PhotoPayload::Url(v),
                TaggedPhoto::InlineImage(v) => PhotoPayload::InlineImage(v),
                TaggedPhoto::RawEncoded(v) => PhotoPayload::RawEncoded(v),
                TaggedPhoto::None => PhotoPayload::None,
            },
        })
    }
}

impl PhotoPayload {
    /// Classify a legacy untagged photo string
    ///
    /// `http://`/`https://` is a URL, `data:` is an inline image, any other
    /// non-blank string is raw base64.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            PhotoPayload::None
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            PhotoPayload::Url(trimmed.to_string())
        } else if trimmed.starts_with("data:") {
            PhotoPayload::InlineImage(trimmed.to_string())
        } else {
            PhotoPayload::RawEncoded(trimmed.to_string())
        }
    }

    /// Underlying string, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhotoPayload::Url(v) | PhotoPayload::InlineImage(v) | PhotoPayload::RawEncoded(v) => {
                Some(v)
            }
            PhotoPayload::None => None,
        }
    }

    /// Tag name, as used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            PhotoPayload::Url(_) => "url",
            PhotoPayload::InlineImage(_) => "inlineImage",
            PhotoPayload::RawEncoded(_) => "rawEncoded",
            PhotoPayload::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PhotoPayload::None)
    }

    /// True if the payload points at a stock/placeholder avatar host
    pub fn is_stock(&self) -> bool {
        self.as_str()
            .map(|v| STOCK_PHOTO_MARKERS.iter().any(|marker| v.contains(marker)))
            .unwrap_or(false)
    }

    /// True if this looks like an actual photo of the person
    pub fn is_real(&self) -> bool {
        if self.is_stock() {
            return false;
        }
        match self {
            PhotoPayload::None => false,
            PhotoPayload::Url(_) => true,
            PhotoPayload::InlineImage(v) => v.starts_with("data:image/") && v.contains("base64,"),
            PhotoPayload::RawEncoded(v) => {
                v.len() > MIN_RAW_LENGTH
                    && (v.starts_with("/9j/")
                        || v.starts_with("iVBORw0KGgo")
                        || is_base64_alphabet(v)
                        || !v.contains('.'))
            }
        }
    }

    /// Image source a renderer can use directly
    ///
    /// Stock and missing photos resolve to [`fallback_avatar`].
    pub fn display_source(&self) -> Cow<'_, str> {
        if self.is_stock() {
            return Cow::Borrowed(fallback_avatar());
        }
        match self {
            PhotoPayload::Url(v) | PhotoPayload::InlineImage(v) => Cow::Borrowed(v),
            PhotoPayload::RawEncoded(v) => {
                Cow::Owned(format!("data:image/{};base64,{}", RAW_IMAGE_FORMAT, v))
            }
            PhotoPayload::None => Cow::Borrowed(fallback_avatar()),
        }
    }
}

fn is_base64_alphabet(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}
