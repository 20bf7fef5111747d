//! Rumor and news feed. Newest first, bounded.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One rumor or news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// The text as heard.
    pub text: String,
    /// Absolute world day it appeared.
    pub day: u32,
    /// Wall-clock time it was recorded.
    pub timestamp: Timestamp,
}

/// What the world is talking about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Information {
    /// Unconfirmed talk, newest first.
    #[serde(default)]
    pub rumors: VecDeque<FeedItem>,
    /// Confirmed happenings, newest first.
    #[serde(default)]
    pub news: VecDeque<FeedItem>,
}

impl Information {
    /// Prepend a rumor, keeping at most `limit`.
    pub fn add_rumor(&mut self, text: impl Into<String>, day: u32, limit: usize) {
        push_newest(&mut self.rumors, text.into(), day, limit);
    }

    /// Prepend a news item, keeping at most `limit`.
    pub fn add_news(&mut self, text: impl Into<String>, day: u32, limit: usize) {
        push_newest(&mut self.news, text.into(), day, limit);
    }
}

fn push_newest(feed: &mut VecDeque<FeedItem>, text: String, day: u32, limit: usize) {
    feed.push_front(FeedItem {
        text,
        day,
        timestamp: Utc::now(),
    });
    feed.truncate(limit);
}
