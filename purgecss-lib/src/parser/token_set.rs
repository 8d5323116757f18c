use std::collections::{HashMap, HashSet};

/// Every identifier found across the content sources of one run.
///
/// Structured dialects fill the typed buckets. The text extractor cannot
/// tell a class from a tag, so its tokens land in `undetermined` and
/// satisfy any kind of lookup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedTokenSet {
    /// Lowercase tag names.
    pub tags: HashSet<String>,
    pub classes: HashSet<String>,
    pub ids: HashSet<String>,
    /// Lowercase attribute name => every value seen for it.
    pub attributes: HashMap<String, HashSet<String>>,
    pub undetermined: HashSet<String>,
}

impl ExtractedTokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.classes.is_empty()
            && self.ids.is_empty()
            && self.attributes.is_empty()
            && self.undetermined.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
            + self.classes.len()
            + self.ids.len()
            + self.attributes.len()
            + self.undetermined.len()
    }

    pub fn insert_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_ascii_lowercase());
    }

    pub fn insert_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn insert_id(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn insert_attribute(&mut self, name: &str, value: &str) {
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .insert(value.to_string());
    }

    pub fn insert_undetermined(&mut self, token: &str) {
        if !token.is_empty() {
            self.undetermined.insert(token.to_string());
        }
    }

    /// Fold `other` into `self`. Tokens only accumulate.
    pub fn merge(&mut self, other: ExtractedTokenSet) {
        self.tags.extend(other.tags);
        self.classes.extend(other.classes);
        self.ids.extend(other.ids);
        for (name, values) in other.attributes {
            self.attributes.entry(name).or_default().extend(values);
        }
        self.undetermined.extend(other.undetermined);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let lower = tag.to_ascii_lowercase();
        self.tags.contains(&lower)
            || self.undetermined.contains(tag)
            || self.undetermined.contains(&lower)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class) || self.undetermined.contains(class)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id) || self.undetermined.contains(id)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_ascii_lowercase()) || self.undetermined.contains(name)
    }

    /// True if some value extracted for attribute `name` satisfies `pred`.
    /// Undetermined tokens stand in for values when the name itself was
    /// only seen as an undetermined token.
    pub fn any_attribute_value<F>(&self, name: &str, pred: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        if let Some(values) = self.attributes.get(&name.to_ascii_lowercase()) {
            if values.iter().any(|v| pred(v)) {
                return true;
            }
        }
        self.undetermined.contains(name) && self.undetermined.iter().any(|v| pred(v))
    }
}
