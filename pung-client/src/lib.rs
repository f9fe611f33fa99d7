pub mod comments;
pub mod error;
pub mod explode;
pub mod http;
pub mod listing;
pub mod login;
pub mod pace;
pub mod profile;
pub mod remove;
pub mod session;

pub use comments::ArticleComment;
pub use error::ClientError;
pub use http::ForumClient;
pub use listing::{CommentRef, PostRef};
pub use pace::Pacing;
pub use profile::Profile;
pub use remove::DeleteOutcome;
pub use session::Session;
