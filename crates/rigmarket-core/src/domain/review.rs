//! Reviews left after a chat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::identifiers::{ChatId, ReviewId, UserId};

/// Allowed star ratings
pub const REVIEW_RATING_RANGE: RangeInclusive<u8> = 1..=5;

/// A stored review of one chat participant by the other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier
    pub id: ReviewId,
    /// Chat the review was written for
    pub chat_id: ChatId,
    /// Author
    pub reviewer_id: UserId,
    /// Reviewed user
    pub reviewee_id: UserId,
    /// Star rating
    pub rating: u8,
    /// Optional comment
    pub comment: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A review as submitted by the client, before the backend assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    /// Chat the review is for
    pub chat_id: ChatId,
    /// Author
    pub reviewer_id: UserId,
    /// Reviewed user
    pub reviewee_id: UserId,
    /// Star rating
    pub rating: u8,
    /// Optional comment
    pub comment: Option<String>,
}
