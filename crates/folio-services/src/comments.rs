use folio_core::{
    AppError, Comment, CommentRecord, Document, DocumentStore, FieldFilter, Result, SortOrder,
    COMMENTS, THOUGHTS,
};
use std::sync::Arc;

pub const MAX_COMMENT_CHARS: usize = 500;
pub const MAX_NAME_CHARS: usize = 80;
const ANONYMOUS: &str = "Anonymous";

pub struct CommentService {
    store: Arc<dyn DocumentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Comments on one thought, newest first.
    pub async fn list(&self, thought_id: &str) -> Result<Vec<Comment>> {
        let docs = self
            .store
            .query(COMMENTS, Some(FieldFilter::eq("thoughtId", thought_id)), SortOrder::NewestFirst)
            .await?;

        let mut comments = Vec::with_capacity(docs.len());
        for doc in docs {
            match into_comment(doc) {
                Ok(comment) => comments.push(comment),
                Err(err) => log::warn!("skipping unreadable comment: {}", err),
            }
        }
        Ok(comments)
    }

    /// A blank name is stored as "Anonymous". The text is required.
    pub async fn add(&self, thought_id: &str, name: &str, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Comment text is required"));
        }
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::validation(format!(
                "Comments are limited to {MAX_COMMENT_CHARS} characters"
            )));
        }
        let name = match name.trim() {
            "" => ANONYMOUS,
            trimmed if trimmed.chars().count() > MAX_NAME_CHARS => {
                return Err(AppError::validation(format!(
                    "Names are limited to {MAX_NAME_CHARS} characters"
                )));
            }
            trimmed => trimmed,
        };

        if self.store.get(THOUGHTS, thought_id).await?.is_none() {
            return Err(AppError::not_found("Thought", thought_id));
        }

        let record = CommentRecord {
            thought_id: thought_id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
        };
        let fields = serde_json::to_value(&record).map_err(|e| AppError::Internal(e.to_string()))?;
        let id = self.store.create(COMMENTS, fields).await?;
        log::info!("comment {} added to thought {}", id, thought_id);
        Ok(id)
    }

    /// Admin removal. The comment must belong to `thought_id`.
    pub async fn delete(&self, thought_id: &str, comment_id: &str) -> Result<()> {
        let doc = self
            .store
            .get(COMMENTS, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        let comment = into_comment(doc)?;
        if comment.thought_id != thought_id {
            return Err(AppError::not_found("Comment", comment_id));
        }
        self.store.delete(COMMENTS, comment_id).await?;
        log::info!("comment {} removed from thought {}", comment_id, thought_id);
        Ok(())
    }
}

fn into_comment(doc: Document) -> Result<Comment> {
    let record: CommentRecord = serde_json::from_value(doc.fields)
        .map_err(|e| AppError::Persistence(format!("comment {} is unreadable: {e}", doc.id)))?;
    Ok(Comment {
        id: doc.id,
        thought_id: record.thought_id,
        name: record.name,
        text: record.text,
        created_at: doc.created_at,
    })
}
