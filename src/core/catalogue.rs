// src/core/catalogue.rs
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display label for one value of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueClass {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub classes: Option<Vec<ValueClass>>,
}

/// Optional per-feature display metadata. Only consulted for naming, never for computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureCatalogue {
    entries: HashMap<String, CatalogueEntry>,
}

impl FeatureCatalogue {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, feature: impl Into<String>, entry: CatalogueEntry) {
        self.entries.insert(feature.into(), entry);
    }

    /// The feature's label, or the feature name itself.
    pub fn feature_label<'a>(&'a self, feature: &'a str) -> &'a str {
        self.entries
            .get(feature)
            .and_then(|e| e.label.as_deref())
            .unwrap_or(feature)
    }

    /// The label of a value class, or the value rendered as text. Missing values read "null".
    pub fn value_label(&self, feature: &str, value: f64) -> String {
        if value.is_nan() {
            return "null".to_string();
        }
        self.entries
            .get(feature)
            .and_then(|e| e.classes.as_ref())
            .and_then(|classes| classes.iter().find(|c| c.value == value))
            .map(|c| c.label.clone())
            .unwrap_or_else(|| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_to_raw_names() -> Result<()> {
        let catalogue = FeatureCatalogue::from_json_str(
            r#"{"sex": {"label": "Sex", "classes": [{"value": 1, "label": "female"}]},
                "age": {}}"#,
        )?;
        assert_eq!(catalogue.feature_label("sex"), "Sex");
        assert_eq!(catalogue.feature_label("age"), "age");
        assert_eq!(catalogue.feature_label("income"), "income");
        assert_eq!(catalogue.value_label("sex", 1.0), "female");
        assert_eq!(catalogue.value_label("sex", 2.0), "2");
        assert_eq!(catalogue.value_label("age", f64::NAN), "null");
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(FeatureCatalogue::from_json_str("{not json").is_err());
    }
}
