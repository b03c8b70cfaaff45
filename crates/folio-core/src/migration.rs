//! # Legacy Migration
//!
//! Resolves a stored post body into a block sequence. Posts written before the
//! `blocks` field existed carry flat text with markers, an optional main
//! ("hero") media and a positional media list; those are rebuilt here so that
//! nothing downstream ever branches on the schema.

use crate::codec;
use crate::models::{
    Alignment, Block, Document, LegacyBody, MediaKind, MediaRef, Post, PostBody, PostRecord,
    WidthPercent,
};

/// Produces the block sequence for a stored body.
pub fn migrate(body: PostBody) -> Vec<Block> {
    match body {
        PostBody::Blocks(blocks) => blocks,
        PostBody::Legacy(legacy) => migrate_legacy(&legacy),
    }
}

/// Hero media first (centered, 80%), then the blocks decoded from `content`.
pub fn migrate_legacy(legacy: &LegacyBody) -> Vec<Block> {
    let mut blocks = Vec::new();
    if let Some(url) = legacy.media_url.as_deref().filter(|url| !url.trim().is_empty()) {
        blocks.push(hero_block(url, legacy.media_type.as_deref()));
    }
    blocks.extend(codec::decode(&legacy.content, &legacy.additional_media));
    blocks
}

fn hero_block(url: &str, media_type: Option<&str>) -> Block {
    let is_video = media_type.is_some_and(|t| t.to_ascii_lowercase().contains("video"));
    if is_video {
        Block::Video {
            media_ref: MediaRef::new(url, MediaKind::Video),
            alignment: Alignment::Center,
            width_percent: WidthPercent::HERO,
        }
    } else {
        Block::Image {
            media_ref: MediaRef::new(url, MediaKind::Image),
            alignment: Alignment::Center,
            width_percent: WidthPercent::HERO,
        }
    }
}

/// Writes blocks in the legacy shape: an optional hero kept outside the
/// positional list, the rest encoded through the placeholder codec.
pub fn to_legacy(hero: Option<&MediaRef>, blocks: &[Block]) -> LegacyBody {
    let encoded = codec::encode(blocks);
    LegacyBody {
        content: encoded.text,
        media_url: hero.map(|m| m.url.clone()),
        media_type: hero.map(|m| m.kind.as_str().to_string()),
        additional_media: encoded.media,
    }
}

/// Builds a `Post` from a raw thought document. This is the only place the
/// stored schema is inspected.
pub fn resolve(doc: Document) -> Result<Post, serde_json::Error> {
    let record: PostRecord = serde_json::from_value(doc.fields)?;
    let title = record.title.clone().unwrap_or_default();
    let like_count = record.like_count.unwrap_or(0).max(0) as u64;
    Ok(Post {
        id: doc.id,
        title,
        blocks: migrate(record.into_body()),
        like_count,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}
