//! Review Workflow - rating the other chat participant

use rigmarket_core::domain::{Review, ReviewDraft, REVIEW_RATING_RANGE};
use rigmarket_core::effects::MarketplaceEffects;

use crate::errors::{AppError, AppResult};
use crate::review::ReviewPromptWatcher;

/// Longest accepted review comment, in characters
pub const MAX_COMMENT_LEN: usize = 500;

/// Check rating range and comment length. Blank comments become `None`.
pub fn validate_review(mut draft: ReviewDraft) -> AppResult<ReviewDraft> {
    if !REVIEW_RATING_RANGE.contains(&draft.rating) {
        return Err(AppError::input(format!(
            "rating must be between {} and {}",
            REVIEW_RATING_RANGE.start(),
            REVIEW_RATING_RANGE.end()
        )));
    }
    if draft.reviewer_id == draft.reviewee_id {
        return Err(AppError::input("you cannot review yourself"));
    }

    draft.comment = match draft.comment.take() {
        Some(comment) if comment.trim().is_empty() => None,
        Some(comment) => {
            let comment = comment.trim().to_string();
            if comment.chars().count() > MAX_COMMENT_LEN {
                return Err(AppError::input(format!(
                    "comment is longer than {MAX_COMMENT_LEN} characters"
                )));
            }
            Some(comment)
        }
        None => None,
    };
    Ok(draft)
}

/// Validate and store a review, then hide the prompt on `watcher`.
pub async fn submit_review(
    marketplace: &dyn MarketplaceEffects,
    draft: ReviewDraft,
    watcher: Option<&ReviewPromptWatcher>,
) -> AppResult<Review> {
    let draft = validate_review(draft)?;
    let review = marketplace.submit_review(&draft).await?;
    tracing::info!(chat = %review.chat_id, rating = review.rating, "review submitted");

    if let Some(watcher) = watcher {
        watcher.dismiss();
    }
    Ok(review)
}
