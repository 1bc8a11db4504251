//! Fixed search-category plan for a city import.
//!
//! Categories are processed one per invocation, highest priority first. The
//! remaining work for a session is this list minus the session's completed
//! types, in plan order.

const HIGH_PRIORITY: &[&str] = &["cafe", "coffee shop", "coworking space"];
const MEDIUM_PRIORITY: &[&str] = &["library", "bookstore", "hotel lobby"];
const LOW_PRIORITY: &[&str] = &["restaurant", "bakery", "community center"];

pub fn full_plan() -> Vec<&'static str> {
    HIGH_PRIORITY
        .iter()
        .chain(MEDIUM_PRIORITY)
        .chain(LOW_PRIORITY)
        .copied()
        .collect()
}

pub fn total_count() -> usize {
    HIGH_PRIORITY.len() + MEDIUM_PRIORITY.len() + LOW_PRIORITY.len()
}

pub fn remaining(completed: &[String]) -> Vec<&'static str> {
    full_plan()
        .into_iter()
        .filter(|category| !completed.iter().any(|done| done == category))
        .collect()
}
