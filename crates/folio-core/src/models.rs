//! # Domain Models
//!
//! These types represent the content of a Folio "thought": its blocks, the
//! media they point at, and the persisted record shapes (current and legacy).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Collection holding thought records.
pub const THOUGHTS: &str = "thoughts";
/// Collection holding comments, linked by `thoughtId`.
pub const COMMENTS: &str = "comments";

/// The kind of an externally hosted media file, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Classifies a host-reported kind or MIME string ("video", "video/*",
    /// "audio/mpeg", "image/png"). Anything unrecognized is an image.
    pub fn from_reported(reported: &str) -> Self {
        let lower = reported.to_ascii_lowercase();
        if lower.contains("video") {
            MediaKind::Video
        } else if lower.contains("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let reported = String::deserialize(deserializer)?;
        Ok(MediaKind::from_reported(&reported))
    }
}

/// An externally hosted media file. The block model never looks at bytes,
/// only at the URL and the kind the host reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self { url: url.into(), kind }
    }
}

/// Horizontal placement of an image or video block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    /// Case-insensitive; missing or unknown values fall back to `Center`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Alignment::Left,
            "right" => Alignment::Right,
            _ => Alignment::Center,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Alignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Alignment::parse(&raw))
    }
}

/// Display width of a media block as a percentage of the column.
///
/// Always within `[MIN, MAX]`: out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidthPercent(u8);

impl WidthPercent {
    pub const MIN: u8 = 20;
    pub const MAX: u8 = 100;
    /// Width given to media blocks created in the editor.
    pub const EDITOR_DEFAULT: WidthPercent = WidthPercent(70);
    /// Width given to a legacy post's main media.
    pub const HERO: WidthPercent = WidthPercent(80);

    pub fn clamped(value: i64) -> Self {
        WidthPercent(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Parses marker text such as `"50%"`. Non-numeric input yields the
    /// editor default; numbers too large to represent clamp to `MAX`.
    pub fn parse(raw: &str) -> Self {
        let digits = raw.trim().trim_end_matches('%').trim();
        match digits.parse::<i64>() {
            Ok(value) => Self::clamped(value),
            Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                WidthPercent(Self::MAX)
            }
            Err(_) => Self::EDITOR_DEFAULT,
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for WidthPercent {
    fn default() -> Self {
        Self::EDITOR_DEFAULT
    }
}

impl fmt::Display for WidthPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for WidthPercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for WidthPercent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(value) => WidthPercent::clamped(value),
            Raw::Float(value) if value.is_finite() => WidthPercent::clamped(value.round() as i64),
            Raw::Float(_) => WidthPercent::EDITOR_DEFAULT,
            Raw::Text(text) => WidthPercent::parse(&text),
        })
    }
}

/// One unit of post content. Order within a sequence is the render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Text {
        content: String,
    },
    Quote {
        content: String,
    },
    Divider {},
    #[serde(rename_all = "camelCase")]
    Image {
        media_ref: MediaRef,
        #[serde(default)]
        alignment: Alignment,
        #[serde(default)]
        width_percent: WidthPercent,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        media_ref: MediaRef,
        #[serde(default)]
        alignment: Alignment,
        #[serde(default)]
        width_percent: WidthPercent,
    },
    #[serde(rename_all = "camelCase")]
    Audio { media_ref: MediaRef },
}

impl Block {
    pub fn text(content: impl Into<String>) -> Self {
        Block::Text { content: content.into() }
    }

    pub fn quote(content: impl Into<String>) -> Self {
        Block::Quote { content: content.into() }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Text { .. } => BlockKind::Text,
            Block::Quote { .. } => BlockKind::Quote,
            Block::Divider {} => BlockKind::Divider,
            Block::Image { .. } => BlockKind::Image,
            Block::Video { .. } => BlockKind::Video,
            Block::Audio { .. } => BlockKind::Audio,
        }
    }

    /// The hosted file this block displays, if any.
    pub fn media(&self) -> Option<&MediaRef> {
        match self {
            Block::Image { media_ref, .. }
            | Block::Video { media_ref, .. }
            | Block::Audio { media_ref } => Some(media_ref),
            _ => None,
        }
    }
}

/// The variant tag of a `Block`, used when adding blocks in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Quote,
    Divider,
    Image,
    Video,
    Audio,
}

impl BlockKind {
    pub fn is_media(&self) -> bool {
        matches!(self, BlockKind::Image | BlockKind::Video | BlockKind::Audio)
    }
}

impl FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(BlockKind::Text),
            "quote" => Ok(BlockKind::Quote),
            "divider" => Ok(BlockKind::Divider),
            "image" => Ok(BlockKind::Image),
            "video" => Ok(BlockKind::Video),
            "audio" => Ok(BlockKind::Audio),
            other => Err(format!("unknown block type '{other}'")),
        }
    }
}

/// A file chosen in the editor but not yet sent to the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_reported(&self.content_type)
    }
}

/// The older flat post body: text with inline markers, plus media that the
/// markers refer to by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyBody {
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub additional_media: Vec<MediaRef>,
}

/// A post body as found in storage, before migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    Blocks(Vec<Block>),
    Legacy(LegacyBody),
}

/// The persisted field set of a thought. Both schemas share this shape; a
/// present `blocks` field marks the current schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_blocks", skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_media: Option<Vec<MediaRef>>,
    #[serde(default)]
    pub like_count: Option<i64>,
}

/// Reads stored blocks one at a time. An entry that no longer parses is
/// logged and dropped; the rest of the body survives.
fn lenient_blocks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<Block>>, D::Error> {
    let Some(entries) = Option::<Vec<serde_json::Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let blocks = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Block>(entry) {
            Ok(block) => Some(block),
            Err(err) => {
                log::warn!("dropping unreadable block #{}: {}", index, err);
                None
            }
        })
        .collect();
    Ok(Some(blocks))
}

impl PostRecord {
    /// Splits off the body. `blocks` wins whenever it is present.
    pub fn into_body(self) -> PostBody {
        match self.blocks {
            Some(blocks) => PostBody::Blocks(blocks),
            None => PostBody::Legacy(LegacyBody {
                content: self.content.unwrap_or_default(),
                media_url: self.media_url,
                media_type: self.media_type,
                additional_media: self.additional_media.unwrap_or_default(),
            }),
        }
    }
}

/// A thought after load-time migration: the body is always a block list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub blocks: Vec<Block>,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A raw record held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub fields: serde_json::Value,
    /// Assigned by the store on create.
    pub created_at: DateTime<Utc>,
    /// Assigned by the store on update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A reader comment on a thought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub thought_id: String,
    pub name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted field set of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub thought_id: String,
    pub name: String,
    pub text: String,
}

/// A message submitted through the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Which record shape new and edited thoughts are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSchema {
    /// `{title, blocks[]}`
    #[default]
    Blocks,
    /// `{title, content, mediaUrl, mediaType, additionalMedia[]}`
    Legacy,
}

impl FromStr for PostSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(PostSchema::Blocks),
            "legacy" => Ok(PostSchema::Legacy),
            other => Err(format!("unknown post schema '{other}'")),
        }
    }
}
