//! Request bodies for authoring: the editor's JSON drafts and the multipart
//! upload that carries them alongside their files.

use crate::error::ApiError;
use actix_multipart::{Field, Multipart};
use bytes::BytesMut;
use folio_core::editor::{BlockField, BlockSequence};
use folio_core::{Alignment, BlockKind, MediaRef, UploadFile, WidthPercent};
use folio_services::ThoughtDraft;
use futures_util::TryStreamExt;
use serde::Deserialize;
use std::collections::HashMap;

/// Largest single part accepted from the editor.
pub const MAX_PART_BYTES: usize = 100 * 1024 * 1024;
/// Most parts one request may carry.
pub const MAX_PARTS: usize = 64;
/// Largest total body across all parts of one request.
pub const MAX_REQUEST_BYTES: usize = 200 * 1024 * 1024;

/// One block as the editor sends it. `file` names a multipart part.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub width_percent: Option<WidthPercent>,
    #[serde(default)]
    pub media_ref: Option<MediaRef>,
    #[serde(default)]
    pub file: Option<String>,
}

/// Replays drafts through the sequence builder, attaching named file parts.
pub fn build_sequence(
    drafts: Vec<DraftInput>,
    files: &mut HashMap<String, UploadFile>,
) -> Result<BlockSequence, ApiError> {
    let mut sequence = BlockSequence::new();
    for draft in drafts {
        let id = sequence.add_block(draft.kind);
        if let Some(content) = draft.content {
            sequence.update_block(id, BlockField::Content(content));
        }
        if let Some(alignment) = draft.alignment {
            sequence.update_block(id, BlockField::Alignment(alignment));
        }
        if let Some(width) = draft.width_percent {
            sequence.update_block(id, BlockField::Width(i64::from(width.get())));
        }
        if let Some(media) = draft.media_ref {
            sequence.update_block(id, BlockField::Media(media));
        }
        if let Some(part) = draft.file {
            let file = files
                .remove(&part)
                .ok_or_else(|| ApiError::bad_request(format!("missing file part '{part}'")))?;
            sequence.update_block(id, BlockField::File(file));
        }
    }
    Ok(sequence)
}

/// Running totals for one multipart request.
#[derive(Debug, Default)]
struct Budget {
    parts: usize,
    bytes: usize,
}

impl Budget {
    fn admit_part(&mut self) -> Result<(), ApiError> {
        self.parts += 1;
        if self.parts > MAX_PARTS {
            return Err(ApiError::bad_request(format!("too many parts (at most {MAX_PARTS})")));
        }
        Ok(())
    }

    fn charge(&mut self, len: usize) -> Result<(), ApiError> {
        self.bytes += len;
        if self.bytes > MAX_REQUEST_BYTES {
            return Err(ApiError::bad_request("upload is too large"));
        }
        Ok(())
    }
}

async fn read_field(field: &mut Field, budget: &mut Budget) -> Result<BytesMut, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed upload: {e}")))?
    {
        if buf.len() + chunk.len() > MAX_PART_BYTES {
            return Err(ApiError::bad_request("file is too large"));
        }
        budget.charge(chunk.len())?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Every part of a multipart body: text fields by name, and file parts that
/// actually carry a file.
#[derive(Default)]
pub struct Parts {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadFile>,
}

pub async fn collect_parts(mut payload: Multipart) -> Result<Parts, ApiError> {
    let mut parts = Parts::default();
    let mut budget = Budget::default();
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed upload: {e}")))?
    {
        budget.admit_part()?;
        let name = field.name().to_string();
        let file_name = field.content_disposition().get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let data = read_field(&mut field, &mut budget).await?;

        match file_name {
            Some(file_name) => {
                if data.is_empty() {
                    continue;
                }
                let content_type = content_type.unwrap_or_else(|| "application/octet-stream".into());
                parts
                    .files
                    .insert(name, UploadFile { file_name, content_type, data: data.freeze() });
            }
            None => {
                let text = String::from_utf8(data.to_vec())
                    .map_err(|_| ApiError::bad_request(format!("field '{name}' is not UTF-8")))?;
                parts.fields.insert(name, text);
            }
        }
    }
    Ok(parts)
}

/// The create form: `title`, optional `hero` file, `blocks` JSON and the
/// file parts the drafts name.
pub async fn read_draft(payload: Multipart) -> Result<ThoughtDraft, ApiError> {
    let Parts { mut fields, mut files } = collect_parts(payload).await?;

    let title = fields.remove("title").unwrap_or_default();
    let drafts: Vec<DraftInput> = match fields.remove("blocks") {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
            .map_err(|e| ApiError::bad_request(format!("invalid blocks: {e}")))?,
        _ => Vec::new(),
    };
    let hero = files.remove("hero");
    let blocks = build_sequence(drafts, &mut files)?;

    Ok(ThoughtDraft { title, hero, blocks })
}
