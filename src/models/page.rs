//! Page and content-block models.

use serde::{Deserialize, Serialize};

/// Block type discriminator for image content.
pub const IMAGE_BLOCK: &str = "image";

/// One page of a module: an ordered list of content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// A single content block. The discriminator stays a plain string so
/// block types this subsystem does not care about (text, quiz, video, ...)
/// round-trip through a snapshot untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub content: String,
}

impl ContentBlock {
    pub fn is_image(&self) -> bool {
        self.block_type == IMAGE_BLOCK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_block_types_round_trip() {
        let json = r#"{"content":[{"type":"quiz","content":"q-77"},{"type":"image","content":"https://x/a.png"}]}"#;
        let page: Page = serde_json::from_str(json).expect("parse page");
        assert_eq!(page.content.len(), 2);
        assert!(!page.content[0].is_image());
        assert!(page.content[1].is_image());

        let back = serde_json::to_string(&page).expect("serialize page");
        assert_eq!(back, json);
    }
}
