//! Display rules for reviews, prices, and scores.

use crate::titles::TitleBook;
use crate::upstream::types::ReviewItem;

/// A review as listed to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    /// Sanitized feed title; the key corrections are recorded under.
    pub feed_title: String,
    /// Title shown and searched with, after corrections.
    pub title: String,
    pub item: ReviewItem,
}

/// Drop the first "Review" from a feed title ("Portal 2 Review" -> "Portal 2").
pub fn sanitize_title(raw: &str) -> String {
    raw.replacen("Review", "", 1).trim().to_string()
}

/// Only the first half of the feed is shown, capped at `max`. Odd lengths
/// round up.
pub fn visible_review_count(total: usize, max: usize) -> usize {
    total.div_ceil(2).min(max)
}

pub fn build_entries(items: &[ReviewItem], max: usize, book: &TitleBook) -> Vec<ReviewEntry> {
    items
        .iter()
        .take(visible_review_count(items.len(), max))
        .map(|item| {
            let feed_title = sanitize_title(&item.title);
            let title = book.resolve(&feed_title).to_string();
            ReviewEntry {
                feed_title,
                title,
                item: item.clone(),
            }
        })
        .collect()
}

/// Re-apply corrections after the book changed.
pub fn apply_corrections(entries: &mut [ReviewEntry], book: &TitleBook) {
    for entry in entries {
        entry.title = book.resolve(&entry.feed_title).to_string();
    }
}

/// Integer cents as dollars. No price means the storefront lists it as free.
pub fn format_price(cents: Option<u32>) -> String {
    match cents {
        Some(c) => format!("${}.{:02}", c / 100, c % 100),
        None => "Free".to_string(),
    }
}

pub fn format_metacritic(score: Option<u32>) -> String {
    score.map_or_else(|| "?".to_string(), |s| s.to_string())
}
