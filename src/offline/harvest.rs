//! Asset harvesting: which URLs a module needs downloaded.

use crate::models::Page;

/// Whether a URL is externally hosted (network scheme) rather than
/// already a local or handle reference.
pub fn is_external_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Every externally hosted image URL in document order, followed by the
/// module's cover image if externally hosted.
///
/// Pure; occurrences are preserved as found - callers dedupe when they
/// fan out downloads.
pub fn collect_asset_urls(pages: &[Page], cover_image_url: Option<&str>) -> Vec<String> {
    let mut urls = Vec::new();
    for page in pages {
        for block in &page.content {
            if block.is_image() && is_external_url(&block.content) {
                urls.push(block.content.clone());
            }
        }
    }
    if let Some(cover) = cover_image_url {
        if is_external_url(cover) {
            urls.push(cover.to_string());
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentBlock;

    fn image(url: &str) -> ContentBlock {
        ContentBlock {
            block_type: "image".to_string(),
            content: url.to_string(),
        }
    }

    fn text(body: &str) -> ContentBlock {
        ContentBlock {
            block_type: "text".to_string(),
            content: body.to_string(),
        }
    }

    #[test]
    fn test_document_order_then_cover() {
        let pages = vec![
            Page {
                content: vec![image("https://x/a.png"), text("intro")],
            },
            Page {
                content: vec![image("http://x/b.png")],
            },
        ];
        let urls = collect_asset_urls(&pages, Some("https://x/cover.png"));
        assert_eq!(
            urls,
            vec!["https://x/a.png", "http://x/b.png", "https://x/cover.png"]
        );
    }

    #[test]
    fn test_local_references_do_not_qualify() {
        let pages = vec![Page {
            content: vec![image("blob:3f9a"), image("file:///tmp/a.png")],
        }];
        assert!(collect_asset_urls(&pages, Some("blob:cover")).is_empty());
    }

    #[test]
    fn test_non_image_blocks_are_ignored() {
        let pages = vec![Page {
            content: vec![text("https://x/not-an-asset")],
        }];
        assert!(collect_asset_urls(&pages, None).is_empty());
    }

    #[test]
    fn test_duplicate_occurrences_are_preserved() {
        let pages = vec![Page {
            content: vec![image("https://x/a.png"), image("https://x/a.png")],
        }];
        assert_eq!(collect_asset_urls(&pages, None).len(), 2);
    }
}
