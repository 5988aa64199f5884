use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    utils::classes::invert_map,
};

/// The closed, ordered set of class labels a classifier predicts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    /// A mapping from class ids to class name labels
    id2label: BTreeMap<usize, String>,

    /// A mapping from class name labels to class ids
    label2id: BTreeMap<String, usize>,
}

impl LabelSet {
    /// Create a label set from labels in class id order
    pub fn new<I, T>(labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut seen = BTreeSet::new();

        let id2label: BTreeMap<usize, String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|label: &String| seen.insert(label.clone()))
            .enumerate()
            .collect();

        let label2id = invert_map(id2label.clone());

        Self { id2label, label2id }
    }

    /// Collect the distinct labels of a training set, sorted so class ids are reproducible
    pub fn from_labels<I, T>(labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let sorted: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();

        Self::new(sorted)
    }

    /// The class id for a label name
    pub fn id(&self, label: &str) -> Result<usize> {
        self.label2id
            .get(label)
            .copied()
            .ok_or_else(|| Error::invalid(format!("label outside the label set: {label}")))
    }

    /// The label name for a class id
    pub fn name(&self, id: usize) -> Option<&str> {
        self.id2label.get(&id).map(String::as_str)
    }

    /// Label names in class id order
    pub fn names(&self) -> Vec<String> {
        self.id2label.values().cloned().collect()
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.id2label.len()
    }

    /// True when no classes are defined
    pub fn is_empty(&self) -> bool {
        self.id2label.is_empty()
    }
}

impl From<Vec<String>> for LabelSet {
    fn from(labels: Vec<String>) -> Self {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(labels: LabelSet) -> Self {
        labels.id2label.into_values().collect()
    }
}
