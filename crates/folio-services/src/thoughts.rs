//! # Thought publishing
//!
//! Create, edit, delete and like thoughts. A save is all-or-nothing: every
//! pending file is uploaded, one after another in block order, before the
//! record is written; any failure aborts without touching the store.

use crate::upload::{UploadPolicy, Uploader};
use folio_core::editor::BlockSequence;
use folio_core::migration::{self, to_legacy};
use folio_core::render::excerpt;
use folio_core::{
    Alignment, AppError, Block, DocumentStore, MediaHost, MediaRef, Post, PostSchema, Result,
    SortOrder, UploadFile, WidthPercent, THOUGHTS,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Everything the admin submitted for one save.
#[derive(Debug, Clone, Default)]
pub struct ThoughtDraft {
    pub title: String,
    /// The "main image" field, shown before the body.
    pub hero: Option<UploadFile>,
    pub blocks: BlockSequence,
}

impl ThoughtDraft {
    /// Rejects drafts that could never be saved, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("Title is required"));
        }
        if self.hero.is_none() && !self.blocks.has_content() {
            return Err(AppError::validation("A thought needs at least one content block"));
        }
        Ok(())
    }
}

pub struct ThoughtService {
    store: Arc<dyn DocumentStore>,
    uploader: Uploader,
    schema: PostSchema,
}

impl ThoughtService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaHost>,
        policy: UploadPolicy,
        schema: PostSchema,
    ) -> Self {
        Self { store, uploader: Uploader::new(media, policy), schema }
    }

    /// Newest first. `search` matches title or body text, case-insensitively.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Post>> {
        let needle = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
        let docs = self.store.query(THOUGHTS, None, SortOrder::NewestFirst).await?;

        let mut posts = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match migration::resolve(doc) {
                Ok(post) => posts.push(post),
                Err(err) => log::warn!("skipping unreadable thought {}: {}", id, err),
            }
        }

        if let Some(needle) = needle {
            posts.retain(|post| {
                post.title.to_lowercase().contains(&needle)
                    || excerpt(&post.blocks, usize::MAX)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
            });
        }
        Ok(posts)
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        let doc = self
            .store
            .get(THOUGHTS, id)
            .await?
            .ok_or_else(|| AppError::not_found("Thought", id))?;
        migration::resolve(doc)
            .map_err(|err| AppError::Persistence(format!("thought {id} is unreadable: {err}")))
    }

    /// Uploads pending media and writes a new record. Returns the new id.
    pub async fn create(&self, draft: ThoughtDraft) -> Result<String> {
        draft.validate()?;
        let title = draft.title.trim().to_string();
        let (hero, blocks, uploaded) = self.publish_media(draft).await?;

        let mut fields = self.record_fields(&title, hero, blocks);
        fields["likeCount"] = json!(0);

        match self.store.create(THOUGHTS, fields).await {
            Ok(id) => {
                log::info!("created thought {} ({} uploads)", id, uploaded.len());
                Ok(id)
            }
            Err(err) => {
                log::error!("could not save new thought: {}", err);
                self.uploader.discard(&uploaded).await;
                Err(err)
            }
        }
    }

    /// Replaces title and body of an existing thought.
    pub async fn update(&self, id: &str, draft: ThoughtDraft) -> Result<()> {
        draft.validate()?;
        if self.store.get(THOUGHTS, id).await?.is_none() {
            return Err(AppError::not_found("Thought", id));
        }

        let title = draft.title.trim().to_string();
        let (hero, blocks, uploaded) = self.publish_media(draft).await?;
        let fields = self.record_fields(&title, hero, blocks);

        if let Err(err) = self.store.update(THOUGHTS, id, fields).await {
            log::error!("could not update thought {}: {}", id, err);
            self.uploader.discard(&uploaded).await;
            return Err(err);
        }
        log::info!("updated thought {}", id);
        Ok(())
    }

    /// Removes the record, then makes a best-effort attempt to remove its media.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let post = self.get(id).await?;
        self.store.delete(THOUGHTS, id).await?;

        for media in post.blocks.iter().filter_map(Block::media) {
            if let Err(err) = self.uploader.host().delete_by_url(&media.url).await {
                log::warn!("media cleanup for thought {} failed (non-fatal): {}", id, err);
            }
        }
        log::info!("deleted thought {}", id);
        Ok(())
    }

    /// Applies +1 when a reader likes, −1 when they take it back.
    pub async fn toggle_like(&self, id: &str, liked: bool) -> Result<u64> {
        let delta = if liked { 1 } else { -1 };
        let count = self.store.increment(THOUGHTS, id, "likeCount", delta).await?;
        Ok(count.max(0) as u64)
    }

    /// A single upload outside of any save.
    pub async fn upload_media(&self, file: UploadFile) -> Result<MediaRef> {
        Ok(self.uploader.upload(file).await?)
    }

    pub async fn delete_media(&self, url: &str) -> Result<()> {
        self.uploader.host().delete_by_url(url).await?;
        log::info!("deleted media {}", url);
        Ok(())
    }

    /// Uploads the hero and every pending block file, strictly in order.
    /// On failure the files already uploaded by this save are discarded.
    async fn publish_media(
        &self,
        draft: ThoughtDraft,
    ) -> Result<(Option<MediaRef>, Vec<Block>, Vec<String>)> {
        let ThoughtDraft { hero, mut blocks, .. } = draft;
        let mut uploaded = Vec::new();

        let hero = match hero {
            Some(file) => match self.uploader.upload(file).await {
                Ok(media) => {
                    uploaded.push(media.url.clone());
                    Some(media)
                }
                Err(err) => return Err(err.into()),
            },
            None => None,
        };

        for draft_block in blocks.iter_mut() {
            let Some(file) = draft_block.take_pending() else {
                continue;
            };
            match self.uploader.upload(file).await {
                Ok(media) => {
                    uploaded.push(media.url.clone());
                    draft_block.attach(media);
                }
                Err(err) => {
                    log::error!("aborting save, upload failed: {}", err);
                    self.uploader.discard(&uploaded).await;
                    return Err(err.into());
                }
            }
        }

        Ok((hero, blocks.into_blocks(), uploaded))
    }

    fn record_fields(&self, title: &str, hero: Option<MediaRef>, blocks: Vec<Block>) -> Value {
        match self.schema {
            PostSchema::Blocks => {
                let mut all = Vec::with_capacity(blocks.len() + 1);
                if let Some(media_ref) = hero {
                    all.push(hero_block(media_ref));
                }
                all.extend(blocks);
                json!({ "title": title, "blocks": all })
            }
            PostSchema::Legacy => {
                let legacy = to_legacy(hero.as_ref(), &blocks);
                json!({
                    "title": title,
                    "blocks": Value::Null,
                    "content": legacy.content,
                    "mediaUrl": legacy.media_url,
                    "mediaType": legacy.media_type,
                    "additionalMedia": legacy.additional_media,
                })
            }
        }
    }
}

fn hero_block(media_ref: MediaRef) -> Block {
    if media_ref.kind == folio_core::MediaKind::Video {
        Block::Video { media_ref, alignment: Alignment::Center, width_percent: WidthPercent::HERO }
    } else {
        Block::Image { media_ref, alignment: Alignment::Center, width_percent: WidthPercent::HERO }
    }
}
