//! Keywarden Attribute Sync — derives `classification` / `nationality` /
//! `needToKnow` user attributes from the username pattern
//! `{classification}-{nationality}-{needToKnow}` and applies them through
//! the admin API.
//!
//! A run plans first (one entry per user, in store order), then either
//! reports the plan (dry run) or ensures the user-profile schema and
//! applies the planned updates, collecting per-user results.

pub mod pattern;
pub mod plan;
pub mod report;
pub mod schema;
pub mod sync;
