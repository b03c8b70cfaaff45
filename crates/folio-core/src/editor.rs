//! # Block Sequence Builder
//!
//! The in-memory block list of one authoring session. Each draft carries a
//! session-local id used only to address it; the position in the list is the
//! only ordering signal. Media drafts hold an un-uploaded file until submit.

use crate::models::{Alignment, Block, BlockKind, MediaRef, UploadFile, WidthPercent};

/// Session-local handle of a draft block. Never persisted.
pub type BlockId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// One editable field of a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockField {
    Content(String),
    Alignment(Alignment),
    /// Clamped into the valid width range.
    Width(i64),
    /// An already hosted file (e.g. when re-editing a saved post).
    Media(MediaRef),
    /// A file to upload at submit time.
    File(UploadFile),
}

/// A block under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftBlock {
    id: BlockId,
    kind: BlockKind,
    content: String,
    alignment: Alignment,
    width: WidthPercent,
    media: Option<MediaRef>,
    pending: Option<UploadFile>,
}

impl DraftBlock {
    fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            content: String::new(),
            alignment: Alignment::Center,
            width: WidthPercent::EDITOR_DEFAULT,
            media: None,
            pending: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn width(&self) -> WidthPercent {
        self.width
    }

    pub fn media(&self) -> Option<&MediaRef> {
        self.media.as_ref()
    }

    pub fn has_pending_file(&self) -> bool {
        self.pending.is_some()
    }

    /// Hands the pending file to the uploader.
    pub fn take_pending(&mut self) -> Option<UploadFile> {
        self.pending.take()
    }

    /// Records where the uploaded file now lives.
    pub fn attach(&mut self, media: MediaRef) {
        self.media = Some(media);
        self.pending = None;
    }

    /// Whether submitting this draft would produce a block.
    pub fn has_content(&self) -> bool {
        match self.kind {
            BlockKind::Text | BlockKind::Quote => !self.content.trim().is_empty(),
            BlockKind::Divider => true,
            BlockKind::Image | BlockKind::Video | BlockKind::Audio => {
                self.media.is_some() || self.pending.is_some()
            }
        }
    }

    fn apply(&mut self, field: BlockField) {
        match field {
            BlockField::Content(content) => self.content = content,
            BlockField::Alignment(alignment) => self.alignment = alignment,
            BlockField::Width(width) => self.width = WidthPercent::clamped(width),
            BlockField::Media(media) => {
                self.media = Some(media);
                self.pending = None;
            }
            BlockField::File(file) => self.pending = Some(file),
        }
    }

    /// Blank text and media without a hosted file produce nothing.
    fn into_block(self) -> Option<Block> {
        match self.kind {
            BlockKind::Text => (!self.content.trim().is_empty()).then(|| Block::text(self.content)),
            BlockKind::Quote => {
                (!self.content.trim().is_empty()).then(|| Block::quote(self.content))
            }
            BlockKind::Divider => Some(Block::Divider {}),
            BlockKind::Image => self.media.map(|media_ref| Block::Image {
                media_ref,
                alignment: self.alignment,
                width_percent: self.width,
            }),
            BlockKind::Video => self.media.map(|media_ref| Block::Video {
                media_ref,
                alignment: self.alignment,
                width_percent: self.width,
            }),
            BlockKind::Audio => self.media.map(|media_ref| Block::Audio { media_ref }),
        }
    }
}

/// Ordered, mutable list of drafts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSequence {
    drafts: Vec<DraftBlock>,
    next_id: BlockId,
}

impl BlockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads saved blocks back into drafts for editing.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut sequence = Self::new();
        for block in blocks {
            let id = sequence.add_block(block.kind());
            let fields = match block {
                Block::Text { content } | Block::Quote { content } => {
                    vec![BlockField::Content(content)]
                }
                Block::Divider {} => Vec::new(),
                Block::Image { media_ref, alignment, width_percent }
                | Block::Video { media_ref, alignment, width_percent } => vec![
                    BlockField::Media(media_ref),
                    BlockField::Alignment(alignment),
                    BlockField::Width(width_percent.get() as i64),
                ],
                Block::Audio { media_ref } => vec![BlockField::Media(media_ref)],
            };
            for field in fields {
                sequence.update_block(id, field);
            }
        }
        sequence
    }

    /// Appends an empty draft (center alignment, default width).
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        self.next_id += 1;
        let id = self.next_id;
        self.drafts.push(DraftBlock::new(id, kind));
        id
    }

    /// Replaces one field of one draft. Returns false for an unknown id.
    pub fn update_block(&mut self, id: BlockId, field: BlockField) -> bool {
        match self.drafts.iter_mut().find(|d| d.id == id) {
            Some(draft) => {
                draft.apply(field);
                true
            }
            None => false,
        }
    }

    /// Returns false for an unknown id.
    pub fn delete_block(&mut self, id: BlockId) -> bool {
        let before = self.drafts.len();
        self.drafts.retain(|d| d.id != id);
        self.drafts.len() != before
    }

    /// Swaps the draft at `index` with its neighbour; no-op at the edges.
    pub fn move_block(&mut self, index: usize, direction: Direction) {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        if let Some(target) = target {
            if index < self.drafts.len() && target < self.drafts.len() {
                self.drafts.swap(index, target);
            }
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&DraftBlock> {
        self.drafts.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DraftBlock> {
        self.drafts.iter()
    }

    /// Drafts in sequence order, for the uploader.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DraftBlock> {
        self.drafts.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn has_content(&self) -> bool {
        self.drafts.iter().any(DraftBlock::has_content)
    }

    pub fn pending_uploads(&self) -> usize {
        self.drafts.iter().filter(|d| d.has_pending_file()).count()
    }

    /// Finalizes the session into persisted blocks, keeping order.
    pub fn into_blocks(self) -> Vec<Block> {
        self.drafts.into_iter().filter_map(DraftBlock::into_block).collect()
    }
}
