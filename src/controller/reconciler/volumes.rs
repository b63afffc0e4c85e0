use std::collections::HashSet;

/// Volumes to attach and detach to get from `current` to `desired`
///
/// Membership based: order and duplicates in either list do not matter, and each id
/// appears at most once in the output, in first-seen order.
#[must_use]
pub fn diff(desired: &[String], current: &[String]) -> (Vec<String>, Vec<String>) {
    let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();

    let to_attach = missing_from(desired, &current_set);
    let to_detach = missing_from(current, &desired_set);
    (to_attach, to_detach)
}

fn missing_from(ids: &[String], other: &HashSet<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !other.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}
