use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single candidate hyperparameter value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A flag
    Bool(bool),

    /// An integer, such as a dimension or a batch size
    Int(i64),

    /// A real number, such as a learning rate
    Float(f64),

    /// A name, such as a model kind
    Text(String),
}

impl ParamValue {
    /// The value as a non-negative integer
    pub fn as_usize(&self) -> Result<usize> {
        match self {
            ParamValue::Int(value) if *value >= 0 => Ok(*value as usize),
            _ => Err(Error::invalid(format!(
                "expected a non-negative integer, found {self}"
            ))),
        }
    }

    /// The value as a real number; integers are widened
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            ParamValue::Int(value) => Ok(*value as f64),
            ParamValue::Float(value) => Ok(*value),
            _ => Err(Error::invalid(format!("expected a number, found {self}"))),
        }
    }

    /// The value as a flag
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            ParamValue::Bool(value) => Ok(*value),
            _ => Err(Error::invalid(format!("expected a boolean, found {self}"))),
        }
    }

    /// The value as a string
    pub fn as_str(&self) -> Result<&str> {
        match self {
            ParamValue::Text(value) => Ok(value),
            _ => Err(Error::invalid(format!("expected a string, found {self}"))),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// One combination of hyperparameter values, in grid declaration order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSet(Vec<(String, ParamValue)>);

impl ParamSet {
    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of parameters set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the single combination of an empty grid
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{{}}");
        }

        let pairs: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();

        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// A mapping from hyperparameter names to ordered candidate values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamGrid(Vec<(String, Vec<ParamValue>)>);

impl ParamGrid {
    /// An empty grid, which enumerates a single empty combination
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and its candidate values
    pub fn with<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.0
            .push((name.to_string(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Parse a YAML mapping of parameter names to a candidate list (or a single value)
    pub fn from_yaml(source: &str) -> Result<Self> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(source)?;

        let mut grid = Self::new();
        for (key, value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| Error::invalid(format!("grid keys must be strings: {key:?}")))?
                .to_string();

            let values: Vec<ParamValue> = match value {
                serde_yaml::Value::Sequence(_) => serde_yaml::from_value(value)?,
                scalar => vec![serde_yaml::from_value(scalar)?],
            };

            grid.0.push((name, values));
        }

        Ok(grid)
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.0.iter().map(|(_, values)| values.len()).product()
    }

    /// True when some parameter has no candidates, so nothing can be enumerated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that names are unique and every parameter has at least one candidate
    pub fn validate(&self) -> Result<()> {
        for (i, (name, values)) in self.0.iter().enumerate() {
            if values.is_empty() {
                return Err(Error::invalid(format!(
                    "parameter {name} has no candidate values"
                )));
            }

            if self.0[..i].iter().any(|(other, _)| other == name) {
                return Err(Error::invalid(format!("parameter {name} is listed twice")));
            }
        }

        Ok(())
    }

    /// The Cartesian product of all candidates, the last parameter varying fastest
    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combinations = vec![ParamSet::default()];

        for (name, values) in &self.0 {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut set = prefix.clone();
                        set.0.push((name.clone(), value.clone()));
                        set
                    })
                })
                .collect();
        }

        combinations
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_combinations_enumerate_in_declaration_order() {
        let grid = ParamGrid::new()
            .with("embed_dim", [50, 100, 200])
            .with("eta", [0.001, 0.01]);

        let combinations = grid.combinations();

        assert_eq!(grid.len(), 6);
        assert_eq!(combinations.len(), 6);
        assert_eq!(combinations[0].to_string(), "{embed_dim=50, eta=0.001}");
        assert_eq!(combinations[1].to_string(), "{embed_dim=50, eta=0.01}");
        assert_eq!(combinations[5].to_string(), "{embed_dim=200, eta=0.01}");
    }

    #[test]
    fn test_empty_grid_has_one_empty_combination() {
        let combinations = ParamGrid::new().combinations();

        assert_eq!(combinations, vec![ParamSet::default()]);
    }

    #[test]
    fn test_validate_rejects_empty_candidates_and_duplicates() {
        let empty: Vec<i64> = Vec::new();
        assert!(ParamGrid::new().with("embed_dim", empty).validate().is_err());

        let duplicate = ParamGrid::new().with("eta", [0.1]).with("eta", [0.2]);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_from_yaml_preserves_order_and_types() {
        let grid = ParamGrid::from_yaml(
            "model: [averaging, recurrent]\nembed_dim: [50, 100]\neta: 0.01\nearly_stopping: true\n",
        )
        .unwrap();

        assert_eq!(
            grid.names(),
            vec!["model", "embed_dim", "eta", "early_stopping"]
        );
        assert_eq!(grid.len(), 4);

        let first = &grid.combinations()[0];
        assert_eq!(first.get("model"), Some(&ParamValue::from("averaging")));
        assert_eq!(first.get("embed_dim").unwrap().as_usize().unwrap(), 50);
        assert_eq!(first.get("eta").unwrap().as_f64().unwrap(), 0.01);
        assert!(first.get("early_stopping").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParamValue::Int(3).as_f64().unwrap(), 3.0);
        assert!(ParamValue::Int(-1).as_usize().is_err());
        assert!(ParamValue::Float(0.5).as_bool().is_err());
        assert_eq!(ParamValue::from("lstm").as_str().unwrap(), "lstm");
    }
}
