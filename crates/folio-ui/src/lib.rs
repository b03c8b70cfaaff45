//! # folio-ui
//!
//! Askama page templates and the small view models they render. Handlers
//! build these from core types; nothing here touches storage.

use askama::Template;
use chrono::{DateTime, Utc};
use folio_core::render::{excerpt, lead_media, render, RenderInstruction};
use folio_core::{Alignment, Block, Comment, ContactMessage, Post};

/// Characters of body text shown per feed entry.
pub const FEED_EXCERPT_CHARS: usize = 280;

/// Escapes paragraph text and keeps its line breaks.
pub fn paragraph_html(text: &str) -> String {
    text.lines()
        .map(|line| html_escape::encode_safe(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br />\n")
}

/// Inline style for a media block: its width plus the margins that place it.
pub fn media_style(alignment: Alignment, width_percent: u8) -> String {
    let margins = match alignment {
        Alignment::Left => "margin-left: 0; margin-right: auto;",
        Alignment::Center => "margin-left: auto; margin-right: auto;",
        Alignment::Right => "margin-left: auto; margin-right: 0;",
    };
    format!("width: {width_percent}%; {margins}")
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

pub struct MediaView {
    pub url: String,
    pub alignment: String,
    pub style: String,
}

/// One rendered body element. Paragraph HTML is already escaped.
pub enum BlockView {
    Paragraph(String),
    Quote(String),
    Divider,
    Image(MediaView),
    Video(MediaView),
    Audio(String),
}

impl From<RenderInstruction> for BlockView {
    fn from(instruction: RenderInstruction) -> Self {
        match instruction {
            RenderInstruction::Paragraph { text } => BlockView::Paragraph(paragraph_html(&text)),
            RenderInstruction::Quote { text } => BlockView::Quote(text),
            RenderInstruction::Divider => BlockView::Divider,
            RenderInstruction::Image { url, alignment, width_percent } => {
                BlockView::Image(MediaView {
                    url,
                    alignment: alignment.to_string(),
                    style: media_style(alignment, width_percent),
                })
            }
            RenderInstruction::Video { url, alignment, width_percent } => {
                BlockView::Video(MediaView {
                    url,
                    alignment: alignment.to_string(),
                    style: media_style(alignment, width_percent),
                })
            }
            RenderInstruction::Audio { url } => BlockView::Audio(url),
        }
    }
}

pub fn body_views(blocks: &[Block]) -> Vec<BlockView> {
    render("", blocks).body.into_iter().map(BlockView::from).collect()
}

pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub lead: Option<BlockView>,
    pub excerpt: Option<String>,
    pub like_count: u64,
}

impl From<&Post> for FeedEntry {
    fn from(post: &Post) -> Self {
        FeedEntry {
            id: post.id.clone(),
            title: post.title.clone(),
            date: format_date(&post.created_at),
            lead: lead_media(&post.blocks).map(BlockView::from),
            excerpt: excerpt(&post.blocks, FEED_EXCERPT_CHARS),
            like_count: post.like_count,
        }
    }
}

pub struct CommentView {
    pub id: String,
    pub name: String,
    pub text_html: String,
    pub date: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        CommentView {
            id: comment.id.clone(),
            name: comment.name.clone(),
            text_html: paragraph_html(&comment.text),
            date: format_date(&comment.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub is_admin: bool,
    pub latest: Vec<FeedEntry>,
}

#[derive(Template)]
#[template(path = "thoughts.html")]
pub struct ThoughtsTemplate {
    pub is_admin: bool,
    pub query: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Template)]
#[template(path = "thought.html")]
pub struct ThoughtTemplate {
    pub is_admin: bool,
    pub id: String,
    pub title: String,
    pub date: String,
    pub edited: Option<String>,
    pub like_count: u64,
    pub liked: bool,
    pub body: Vec<BlockView>,
    pub comments: Vec<CommentView>,
    pub comment_error: Option<String>,
}

impl ThoughtTemplate {
    pub fn new(post: &Post, comments: &[Comment], liked: bool, is_admin: bool) -> Self {
        ThoughtTemplate {
            is_admin,
            id: post.id.clone(),
            title: post.title.clone(),
            date: format_date(&post.created_at),
            edited: post.updated_at.as_ref().map(format_date),
            like_count: post.like_count,
            liked,
            body: body_views(&post.blocks),
            comments: comments.iter().map(CommentView::from).collect(),
            comment_error: None,
        }
    }
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub is_admin: bool,
    pub form: ContactMessage,
    pub error: Option<String>,
    pub sent: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub is_admin: bool,
    pub configured: bool,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub is_admin: bool,
    pub query: String,
    pub entries: Vec<FeedEntry>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub is_admin: bool,
    pub id: String,
    pub title: String,
    /// The migrated blocks as JSON, seeded into the editor.
    pub blocks_json: String,
}

impl EditTemplate {
    pub fn new(post: &Post) -> Result<Self, serde_json::Error> {
        Ok(EditTemplate {
            is_admin: true,
            id: post.id.clone(),
            title: post.title.clone(),
            blocks_json: serde_json::to_string(&post.blocks)?,
        })
    }
}
