//! Asset references and the content records that hold them

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Server-issued locator of an uploaded file
///
/// The value is kept exactly as the upload endpoint returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Public URL of the asset under `base`, as `base/uri`
    ///
    /// Absolute URIs are returned as they are.
    pub fn public_url(&self, base: &str) -> String {
        if self.0.starts_with("http://") || self.0.starts_with("https://") {
            return self.0.clone();
        }
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.0.trim_start_matches('/')
        )
    }
}

impl Display for AssetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<AssetRef> for String {
    fn from(asset: AssetRef) -> Self {
        asset.0
    }
}

/// Which asset field of a record an upload fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSlot {
    File,
    Cover,
    Video,
}

impl AssetSlot {
    /// Name of the record field holding this asset
    pub fn field_name(&self) -> &'static str {
        match self {
            AssetSlot::File => "file_uri",
            AssetSlot::Cover => "cover_uri",
            AssetSlot::Video => "video_uri",
        }
    }
}

impl Display for AssetSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetSlot::File => write!(f, "file"),
            AssetSlot::Cover => write!(f, "cover"),
            AssetSlot::Video => write!(f, "video"),
        }
    }
}

impl FromStr for AssetSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "file_uri" => Ok(AssetSlot::File),
            "cover" | "cover_uri" => Ok(AssetSlot::Cover),
            "video" | "video_uri" => Ok(AssetSlot::Video),
            other => Err(format!("unknown asset slot: {}", other)),
        }
    }
}

/// Kinds of content records managed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Book,
    BookDocument,
    Worksheet,
    Document,
    Video,
    VideoDocument,
    Lecturer,
}

impl ContentKind {
    /// Assets a new record of this kind cannot be created without
    pub fn required_slots(&self) -> &'static [AssetSlot] {
        match self {
            ContentKind::Book | ContentKind::Worksheet => &[AssetSlot::File, AssetSlot::Cover],
            ContentKind::BookDocument | ContentKind::VideoDocument => &[AssetSlot::File],
            ContentKind::Document => &[AssetSlot::Cover],
            ContentKind::Video => &[AssetSlot::Video],
            ContentKind::Lecturer => &[],
        }
    }

    pub fn accepts(&self, slot: AssetSlot) -> bool {
        self.required_slots().contains(&slot)
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::Book => "book",
            ContentKind::BookDocument => "book-document",
            ContentKind::Worksheet => "worksheet",
            ContentKind::Document => "document",
            ContentKind::Video => "video",
            ContentKind::VideoDocument => "video-document",
            ContentKind::Lecturer => "lecturer",
        };
        write!(f, "{}", name)
    }
}
