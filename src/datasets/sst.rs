use std::{collections::HashSet, path::Path};

use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification::{self, Example};

use super::LoadableDataset;

/// The name of the SST dataset
pub static DATASET: &str = "sst";

/// The label dropped by the binary scheme
pub static NEUTRAL: &str = "neutral";

/// A row of an SST CSV file
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// Identifier of the row
    #[serde(default)]
    pub example_id: String,

    /// The (tokenized) sentence or phrase
    pub sentence: String,

    /// The sentiment class name
    pub label: String,

    /// 1 when the row is a phrase from inside a full sentence's parse tree
    #[serde(default)]
    pub is_subtree: u8,
}

impl text_classification::Item for Item {
    fn input(&self) -> &str {
        &self.sentence
    }

    fn class_label(&self) -> &str {
        &self.label
    }
}

/// How many sentiment classes to keep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelScheme {
    /// negative, neutral and positive
    #[default]
    Ternary,

    /// negative and positive; neutral rows are dropped
    Binary,
}

/// Row filters applied while reading
#[derive(Clone, Debug, Default, PartialEq, Eq, new)]
pub struct ReaderOptions {
    /// Keep the phrase-level rows as well as the full sentences
    pub include_subtrees: bool,

    /// Keep only the first row for each sentence
    pub dedup: bool,

    /// Which labels to keep
    pub scheme: LabelScheme,
}

impl ReaderOptions {
    fn keep(&self, item: &Item, seen: &mut HashSet<String>) -> bool {
        if !self.include_subtrees && item.is_subtree != 0 {
            return false;
        }

        if self.scheme == LabelScheme::Binary && item.label == NEUTRAL {
            return false;
        }

        !self.dedup || seen.insert(item.sentence.clone())
    }
}

/// Struct for the SST dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the SST dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Item> for Dataset {
    async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self> {
        Self::load_with(data_dir, mode, &ReaderOptions::default())
    }
}

// Implement methods for constructing the SST dataset
impl Dataset {
    /// The CSV file for a split (`train`, `dev` or `test`)
    pub fn path(data_dir: &str, mode: &str) -> String {
        format!("{data_dir}/datasets/{DATASET}/sst3-{mode}.csv")
    }

    /// Constructs the dataset for a split, filtering rows as configured
    pub fn load_with(data_dir: &str, mode: &str, options: &ReaderOptions) -> std::io::Result<Self> {
        Self::from_csv(Self::path(data_dir, mode), options)
    }

    /// Reads any CSV file with the SST columns
    pub fn from_csv(path: impl AsRef<Path>, options: &ReaderOptions) -> std::io::Result<Self> {
        let reader = csv::ReaderBuilder::new();

        let raw: InMemDataset<Item> = InMemDataset::from_csv(path.as_ref(), &reader)?;

        let mut seen = HashSet::new();
        let items: Vec<Item> = raw
            .iter()
            .filter(|item| options.keep(item, &mut seen))
            .collect();

        log::info!(
            "Read {} of {} rows from {}",
            items.len(),
            raw.len(),
            path.as_ref().display()
        );

        Ok(Self {
            dataset: InMemDataset::new(items),
        })
    }

    /// The rows as tokenized examples
    pub fn examples(&self) -> Vec<Example> {
        self.dataset.iter().map(|item| Example::from_item(&item)).collect()
    }
}
