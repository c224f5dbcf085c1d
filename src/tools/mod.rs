//! Follow-up tools that work on the corpus and shortlist files.

pub mod band_mods;
pub mod compare;
pub mod dedupe;
pub mod forum_post;
