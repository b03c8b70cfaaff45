//! # Renderer
//!
//! Turns a title and a block sequence into display instructions. All schema
//! and codec decisions are already made by the time blocks get here, so this
//! is a one-to-one, order-preserving mapping.

use crate::models::{Alignment, Block};
use serde::Serialize;

/// One paintable unit of a post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderInstruction {
    Paragraph { text: String },
    #[serde(rename_all = "camelCase")]
    Image { url: String, alignment: Alignment, width_percent: u8 },
    #[serde(rename_all = "camelCase")]
    Video { url: String, alignment: Alignment, width_percent: u8 },
    Audio { url: String },
    Quote { text: String },
    Divider,
}

impl From<&Block> for RenderInstruction {
    fn from(block: &Block) -> Self {
        match block {
            Block::Text { content } => RenderInstruction::Paragraph { text: content.clone() },
            Block::Quote { content } => RenderInstruction::Quote { text: content.clone() },
            Block::Divider {} => RenderInstruction::Divider,
            Block::Image { media_ref, alignment, width_percent } => RenderInstruction::Image {
                url: media_ref.url.clone(),
                alignment: *alignment,
                width_percent: width_percent.get(),
            },
            Block::Video { media_ref, alignment, width_percent } => RenderInstruction::Video {
                url: media_ref.url.clone(),
                alignment: *alignment,
                width_percent: width_percent.get(),
            },
            Block::Audio { media_ref } => RenderInstruction::Audio { url: media_ref.url.clone() },
        }
    }
}

/// A post ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPost {
    pub title: String,
    pub body: Vec<RenderInstruction>,
}

impl RenderedPost {
    /// An empty body is a valid post with nothing under the title.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

pub fn render(title: &str, blocks: &[Block]) -> RenderedPost {
    RenderedPost {
        title: title.to_string(),
        body: blocks.iter().map(RenderInstruction::from).collect(),
    }
}

/// The leading image or video, shown above the excerpt in the feed.
pub fn lead_media(blocks: &[Block]) -> Option<RenderInstruction> {
    blocks
        .first()
        .filter(|b| matches!(b, Block::Image { .. } | Block::Video { .. }))
        .map(RenderInstruction::from)
}

/// Plain-text preview: text and quote content in order, whitespace collapsed,
/// cut to `max_chars` characters with a trailing ellipsis.
pub fn excerpt(blocks: &[Block], max_chars: usize) -> Option<String> {
    let words: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Text { content } | Block::Quote { content } => Some(content.as_str()),
            _ => None,
        })
        .flat_map(str::split_whitespace)
        .collect();
    if words.is_empty() {
        return None;
    }

    let flat = words.join(" ");
    if flat.chars().count() <= max_chars {
        return Some(flat);
    }
    let cut: String = flat.chars().take(max_chars).collect();
    Some(format!("{}…", cut.trim_end()))
}
