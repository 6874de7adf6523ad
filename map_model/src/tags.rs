use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// OSM key/value metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Tags {
        Tags(BTreeMap::new())
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key).map(|v| v == value).unwrap_or(false)
    }

    pub fn is_any(&self, key: &str, values: Vec<&str>) -> bool {
        self.get(key).map(|v| values.contains(&v.as_str())).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let mut tags = Tags::new();
        tags.insert("railway", "station");
        assert!(tags.is("railway", "station"));
        assert!(!tags.is("railway", "halt"));
        assert!(tags.is_any("railway", vec!["station", "halt"]));
        assert!(!tags.is("usage", "tourism"));
    }
}
