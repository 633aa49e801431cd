//! Embedded media.

use serde::{Deserialize, Serialize};

/// Image extracted from a paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageData {
    /// Relationship id of the blip
    pub rel_id: String,

    /// Package entry, e.g. `word/media/image1.png`
    pub part_name: String,

    /// Binary content
    #[serde(skip)]
    pub data: Vec<u8>,

    /// Width and height in EMU, when the drawing declares them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<(i64, i64)>,

    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 1-based figure sequence number
    pub sequence: u32,
}

impl ImageData {
    /// File extension of the media part, lowercase.
    pub fn extension(&self) -> String {
        self.part_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "png".to_string())
    }

    /// MIME type guessed from the extension.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            "emf" => "image/x-emf",
            "wmf" => "image/x-wmf",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }

    /// Check if the binary content was loaded.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}
