//! Tag merge policy for audience labels

use crate::model::AudienceLabel;

/// How existing audience labels on an item are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagPolicy {
    /// Replace existing audience labels instead of skipping the item
    pub overwrite_existing: bool,
}

impl TagPolicy {
    pub fn new(overwrite_existing: bool) -> Self {
        Self { overwrite_existing }
    }

    /// Whether an item with these tags should be sent to the classifier
    pub fn should_classify(&self, tags: &[String]) -> bool {
        self.overwrite_existing || !has_audience_label(tags)
    }

    /// Merge a new label into the tag set, returning whether the set changed
    ///
    /// With overwrite on, every existing audience label is removed first. The
    /// new label is appended only if no tag with the same value (ignoring
    /// case) remains, so repeating a classification never duplicates it.
    pub fn apply(&self, tags: &mut Vec<String>, label: AudienceLabel) -> bool {
        let before = tags.clone();

        if self.overwrite_existing {
            tags.retain(|tag| !AudienceLabel::is_audience_tag(tag));
        }

        if !contains_tag(tags, label.as_str()) {
            tags.push(label.as_str().to_string());
        }

        *tags != before
    }
}

/// Whether any tag is one of the three audience labels
pub fn has_audience_label(tags: &[String]) -> bool {
    tags.iter().any(|tag| AudienceLabel::is_audience_tag(tag))
}

/// Existing audience labels, in tag order
pub fn audience_labels(tags: &[String]) -> Vec<AudienceLabel> {
    tags.iter()
        .filter_map(|tag| AudienceLabel::from_tag(tag))
        .collect()
}

fn contains_tag(tags: &[String], value: &str) -> bool {
    tags.iter().any(|tag| tag.trim().eq_ignore_ascii_case(value))
}
