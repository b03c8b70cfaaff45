//! # Placeholder Codec
//!
//! Maps a block sequence to a flat text body plus an ordered media list, and
//! back. Media blocks leave a marker line such as `[Image: left, 50%]` in the
//! text; the Nth marker owns the Nth media reference.
//!
//! Decoding is total: any text yields some block sequence.

use crate::models::{Alignment, Block, MediaKind, MediaRef, WidthPercent};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const DIVIDER_RULE: &str = "---";

static IMAGE_MARKER: Lazy<Regex> = Lazy::new(|| sized_marker("image"));
static VIDEO_MARKER: Lazy<Regex> = Lazy::new(|| sized_marker("video"));
static AUDIO_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[\s*audio\s*\]$").expect("audio marker pattern"));
static DIVIDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{3,}$").expect("divider pattern"));

/// `[Label: alignment, NN%]`, alignment and width both optional.
fn sized_marker(label: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)^\[\s*{label}\s*:\s*([^,\]]*?)\s*(?:,\s*([^\]]*?)\s*)?\]$"
    ))
    .expect("sized marker pattern")
}

/// A text body with the media its markers point at, in marker order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub media: Vec<MediaRef>,
}

/// Flattens blocks into text + positional media. Pure: the same blocks always
/// produce byte-identical output.
pub fn encode(blocks: &[Block]) -> Encoded {
    let mut text = String::new();
    let mut media = Vec::new();

    for block in blocks {
        match block {
            Block::Text { content } => text.push_str(content),
            Block::Quote { content } => {
                text.push('"');
                text.push_str(content);
                text.push('"');
            }
            Block::Divider {} => text.push_str(DIVIDER_RULE),
            Block::Image { media_ref, alignment, width_percent } => {
                text.push_str(&format!("[Image: {alignment}, {width_percent}%]"));
                media.push(media_ref.clone());
            }
            Block::Video { media_ref, alignment, width_percent } => {
                text.push_str(&format!("[Video: {alignment}, {width_percent}%]"));
                media.push(media_ref.clone());
            }
            Block::Audio { media_ref } => {
                text.push_str("[Audio]");
                media.push(media_ref.clone());
            }
        }
        text.push_str("\n\n");
    }

    let kept = text.trim_end().len();
    text.truncate(kept);
    Encoded { text, media }
}

/// Rebuilds blocks from a text body and the media its markers refer to.
///
/// A marker with no media left to consume is kept as literal text. Extra
/// media entries beyond the last marker are ignored.
pub fn decode(text: &str, media: &[MediaRef]) -> Vec<Block> {
    let mut decoder = Decoder { media, next_media: 0, pending: Vec::new(), blocks: Vec::new() };
    for line in text.lines() {
        decoder.feed(line);
    }
    decoder.finish()
}

struct Decoder<'m, 't> {
    media: &'m [MediaRef],
    next_media: usize,
    pending: Vec<&'t str>,
    blocks: Vec<Block>,
}

impl<'t> Decoder<'_, 't> {
    fn feed(&mut self, line: &'t str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.flush();
            return;
        }

        if let Some(marker) = Marker::parse(trimmed) {
            if let Some(media_ref) = self.media.get(self.next_media) {
                self.flush();
                self.next_media += 1;
                self.blocks.push(marker.into_block(media_ref.clone()));
                return;
            }
            // Starved marker: not a media block, stays visible as text.
            self.pending.push(line);
            return;
        }

        if DIVIDER.is_match(trimmed) {
            self.flush();
            self.blocks.push(Block::Divider {});
        } else if is_quote(trimmed) {
            self.flush();
            self.blocks.push(Block::quote(&trimmed[1..trimmed.len() - 1]));
        } else {
            self.pending.push(line);
        }
    }

    /// Emits accumulated lines as one paragraph, unless they are all blank.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let joined = self.pending.join("\n");
        self.pending.clear();
        let content = joined.trim_end();
        if !content.trim().is_empty() {
            self.blocks.push(Block::text(content));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

fn is_quote(trimmed: &str) -> bool {
    trimmed.len() > 1 && trimmed.starts_with('"') && trimmed.ends_with('"')
}

/// A recognized media marker line, before it is paired with a media entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    kind: MediaKind,
    alignment: Alignment,
    width: WidthPercent,
}

impl Marker {
    fn parse(trimmed: &str) -> Option<Self> {
        if let Some(caps) = IMAGE_MARKER.captures(trimmed) {
            return Some(Self::sized(MediaKind::Image, &caps));
        }
        if let Some(caps) = VIDEO_MARKER.captures(trimmed) {
            return Some(Self::sized(MediaKind::Video, &caps));
        }
        AUDIO_MARKER.is_match(trimmed).then(|| Marker {
            kind: MediaKind::Audio,
            alignment: Alignment::default(),
            width: WidthPercent::default(),
        })
    }

    fn sized(kind: MediaKind, caps: &Captures<'_>) -> Self {
        Marker {
            kind,
            alignment: Alignment::parse(caps.get(1).map_or("", |m| m.as_str())),
            width: caps
                .get(2)
                .map_or(WidthPercent::EDITOR_DEFAULT, |m| WidthPercent::parse(m.as_str())),
        }
    }

    /// The marker decides the block variant, whatever kind the media entry reports.
    fn into_block(self, media_ref: MediaRef) -> Block {
        match self.kind {
            MediaKind::Image => Block::Image {
                media_ref,
                alignment: self.alignment,
                width_percent: self.width,
            },
            MediaKind::Video => Block::Video {
                media_ref,
                alignment: self.alignment,
                width_percent: self.width,
            },
            MediaKind::Audio => Block::Audio { media_ref },
        }
    }
}
