//! Derived views over a loaded event list. Inputs are never reordered in place;
//! every view borrows from the slice it is given.

use chrono::{DateTime, Utc};
use civic_core::{Event, Membership};

pub const EVENTS_PER_PAGE: usize = 12;
pub const FEATURED_COUNT: usize = 3;

const ALL_CATEGORIES: &str = "All";

/// The `n` events with the most members. Ties keep list order. When fewer
/// than `n` events have members, the rest is filled with member-less events
/// in list order.
pub fn top_by_members(events: &[Event], n: usize) -> Vec<&Event> {
    let mut ranked: Vec<&Event> = events.iter().filter(|e| e.member_count() > 0).collect();
    ranked.sort_by(|a, b| b.member_count().cmp(&a.member_count()));
    ranked.truncate(n);

    let missing = n - ranked.len();
    ranked.extend(
        events
            .iter()
            .filter(|e| e.member_count() == 0)
            .take(missing),
    );
    ranked
}

/// Distinct non-empty categories in first-seen order.
pub fn categories(events: &[Event]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for event in events {
        let kind = event.kind.as_str();
        if !kind.is_empty() && !seen.contains(&kind) {
            seen.push(kind);
        }
    }
    seen
}

fn category_matches(event: &Event, category: Option<&str>) -> bool {
    match category {
        None | Some("") | Some(ALL_CATEGORIES) => true,
        Some(category) => event.kind == category,
    }
}

/// `None`, an empty string and `"All"` select every event.
pub fn filter_by_category<'a>(events: &'a [Event], category: Option<&str>) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|e| category_matches(e, category))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventQuery<'q> {
    /// Case-insensitive text matched against title, location and description.
    pub search: &'q str,
    pub category: Option<&'q str>,
}

/// Upcoming events that match the search text and category.
pub fn search_upcoming<'a>(
    events: &'a [Event],
    query: &EventQuery<'_>,
    now: DateTime<Utc>,
) -> Vec<&'a Event> {
    let needle = query.search.to_lowercase();
    events
        .iter()
        .filter(|e| e.is_upcoming(now))
        .filter(|e| {
            e.title.to_lowercase().contains(&needle)
                || e.location.to_lowercase().contains(&needle)
                || e.description.to_lowercase().contains(&needle)
        })
        .filter(|e| category_matches(e, query.category))
        .collect()
}

/// Events `email` has joined, earliest first.
pub fn joined_events<'a>(events: &'a [Event], email: &str) -> Vec<&'a Event> {
    let mut joined: Vec<&Event> = events
        .iter()
        .filter(|e| e.membership(email) == Membership::Joined)
        .collect();
    joined.sort_by_key(|e| e.event_date);
    joined
}

pub fn created_events<'a>(events: &'a [Event], email: &str) -> Vec<&'a Event> {
    events.iter().filter(|e| e.is_owned_by(email)).collect()
}

#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based, clamped to the available pages.
    pub page: usize,
    pub total_pages: usize,
}

pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = ((page - 1) * per_page).min(items.len());
    let end = (start + per_page).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
    }
}
