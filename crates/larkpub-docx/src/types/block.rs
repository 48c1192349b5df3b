//! Docx block types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a docx block.
///
/// Only the kinds the publisher creates are named; everything else keeps its
/// numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "u32", into = "u32")]
pub enum BlockType {
    /// Document root.
    Page,
    /// Paragraph of text runs.
    Text,
    /// Image.
    Image,
    /// Any other block kind.
    Other(u32),
}

impl From<u32> for BlockType {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Page,
            2 => Self::Text,
            27 => Self::Image,
            other => Self::Other(other),
        }
    }
}

impl From<BlockType> for u32 {
    fn from(kind: BlockType) -> Self {
        match kind {
            BlockType::Page => 1,
            BlockType::Text => 2,
            BlockType::Image => 27,
            BlockType::Other(code) => code,
        }
    }
}

/// Docx block as returned by the children listing.
///
/// Fields the publisher does not model are kept in `extra` so block dumps
/// stay faithful to the upstream payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Block {
    /// Block ID.
    pub block_id: String,
    /// Block kind.
    pub block_type: BlockType,
    /// Parent block ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Child block IDs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    /// Text payload for text blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBody>,
    /// Image payload for image blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageBody>,
    /// Remaining upstream fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text block payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextBody {
    /// Inline elements.
    #[serde(default)]
    pub elements: Vec<TextElement>,
    /// Remaining upstream fields (paragraph style etc).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextBody {
    /// Concatenated content of all text runs.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| r.content.as_str())
            .collect()
    }
}

/// Inline element of a text block.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextElement {
    /// Styled text run, if this element is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
    /// Other element kinds (mentions, equations, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Run of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextRun {
    /// Run text.
    pub content: String,
    /// Inline style; omitted when no flag is set.
    #[serde(
        rename = "text_element_style",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub style: Option<TextElementStyle>,
}

impl TextRun {
    /// Unstyled run.
    #[must_use]
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: None,
        }
    }

    /// Run with `style`, dropping the style when it sets nothing.
    #[must_use]
    pub fn styled(content: impl Into<String>, style: TextElementStyle) -> Self {
        Self {
            content: content.into(),
            style: (!style.is_empty()).then_some(style),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Inline text style. Only set flags are serialized.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextElementStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    /// Lark font color index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<u8>,
}

impl TextElementStyle {
    /// Whether no flag or color is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Image block payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImageBody {
    /// Bound media token; empty for a placeholder.
    #[serde(default)]
    pub token: String,
    /// Pixel width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One page of a block's children.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildrenPage {
    /// Blocks on this page.
    #[serde(default)]
    pub items: Vec<Block>,
    /// Cursor for the next page.
    #[serde(default)]
    pub page_token: Option<String>,
    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_block_type_codes() {
        assert_eq!(BlockType::from(1), BlockType::Page);
        assert_eq!(BlockType::from(2), BlockType::Text);
        assert_eq!(BlockType::from(27), BlockType::Image);
        assert_eq!(BlockType::from(12), BlockType::Other(12));
        assert_eq!(u32::from(BlockType::Image), 27);
    }

    #[test]
    fn test_styled_run_serializes_only_set_flags() {
        let run = TextRun::styled(
            "DeCard",
            TextElementStyle {
                underline: true,
                text_color: Some(3),
                ..TextElementStyle::default()
            },
        );
        assert_eq!(
            serde_json::to_value(&run).unwrap(),
            json!({
                "content": "DeCard",
                "text_element_style": {"underline": true, "text_color": 3}
            })
        );
    }

    #[test]
    fn test_empty_style_is_dropped() {
        let run = TextRun::styled("plain", TextElementStyle::default());
        assert_eq!(run, TextRun::plain("plain"));
        assert_eq!(serde_json::to_value(&run).unwrap(), json!({"content": "plain"}));
    }

    #[test]
    fn test_children_page_parses_listing() {
        let page: ChildrenPage = serde_json::from_value(json!({
            "has_more": true,
            "page_token": "next",
            "items": [
                {
                    "block_id": "b1",
                    "block_type": 2,
                    "parent_id": "doc",
                    "text": {
                        "elements": [
                            {"text_run": {"content": "Hello "}},
                            {"mention_user": {"user_id": "u1"}},
                            {"text_run": {"content": "world", "text_element_style": {"bold": true}}}
                        ],
                        "style": {"align": 1}
                    }
                },
                {"block_id": "b2", "block_type": 27, "image": {"token": "tok", "width": 1400}},
                {"block_id": "b3", "block_type": 14, "code": {"style": {"language": 1}}}
            ]
        }))
        .unwrap();

        assert!(page.has_more);
        assert_eq!(page.page_token.as_deref(), Some("next"));
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].text.as_ref().unwrap().plain_text(), "Hello world");
        assert_eq!(page.items[1].image.as_ref().unwrap().token, "tok");
        assert_eq!(page.items[2].block_type, BlockType::Other(14));
        assert!(page.items[2].extra.contains_key("code"));
    }

    #[test]
    fn test_block_dump_keeps_unknown_fields() {
        let raw = json!({"block_id": "b3", "block_type": 14, "code": {"style": {"language": 1}}});
        let block: Block = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_empty_listing() {
        let page: ChildrenPage = serde_json::from_value(json!({"has_more": false})).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page_token, None);
    }
}
