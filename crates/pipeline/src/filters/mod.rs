//! Rule implementations for the moderation pipeline.
//!
//! Each rule answers for one concern only and defers (`Next`) otherwise,
//! so precedence is decided purely by list order in the pipeline.

pub mod already_blocked;
pub mod blue_verified;
pub mod keyword;
pub mod language;
pub mod modlist;
pub mod spam;
pub mod trusted;

// Re-export for convenience
pub use already_blocked::AlreadyBlockedRule;
pub use blue_verified::BlueVerifiedRule;
pub use keyword::KeywordRule;
pub use language::LanguageRule;
pub use modlist::ModlistRule;
pub use spam::SpamRule;
pub use trusted::TrustedRule;

#[cfg(test)]
pub(crate) mod test_support {
    use entities::{Tweet, User};

    pub fn tweet(id: &str, text: &str, author: User) -> Tweet {
        Tweet {
            id: id.to_string(),
            text: text.to_string(),
            lang: "en".to_string(),
            media: Vec::new(),
            created_at: String::new(),
            conversation_id: id.to_string(),
            in_reply_to_id: None,
            quoted_status_id: None,
            author,
        }
    }
}
