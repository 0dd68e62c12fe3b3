//! Hashtag Extraction
//!
//! Derives the hashtag set of a story from its content.

use std::collections::HashSet;

/// Extract hashtags from story content.
///
/// A hashtag is any whitespace-separated token that starts with `#` and has
/// at least one character after it. Tags are lower-cased and de-duplicated,
/// keeping first-occurrence order.
///
/// # Examples
/// ```
/// use story_service::services::extract_hashtags;
///
/// let tags = extract_hashtags("hello #Love #love world");
/// assert_eq!(tags, vec!["love"]);
/// ```
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .split_whitespace()
        .filter_map(|word| word.strip_prefix('#'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_lowercase)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
