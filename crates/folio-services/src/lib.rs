//! Application services for Folio. Everything here talks to the outside
//! world only through the ports defined in `folio-core`.

pub mod comments;
pub mod contact;
pub mod thoughts;
pub mod upload;

pub use comments::CommentService;
pub use contact::ContactService;
pub use thoughts::{ThoughtDraft, ThoughtService};
pub use upload::UploadPolicy;
