use std::fmt::{self, Display};

/// Precision, recall and F1 for a single class
#[derive(Clone, Debug, PartialEq)]
pub struct ClassScores {
    /// The class label
    pub label: String,

    /// True positives over predicted positives, 0 when nothing was predicted
    pub precision: f64,

    /// True positives over gold positives, 0 when the class is absent
    pub recall: f64,

    /// Harmonic mean of precision and recall, 0 when both are 0
    pub f1: f64,

    /// Number of gold examples of this class
    pub support: usize,
}

/// A per-class classification report with macro and weighted averages
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationReport {
    /// Scores for each class, in label order
    pub classes: Vec<ClassScores>,

    /// Fraction of exact matches
    pub accuracy: f64,

    /// Unweighted mean precision
    pub macro_precision: f64,

    /// Unweighted mean recall
    pub macro_recall: f64,

    /// Unweighted mean F1
    pub macro_f1: f64,

    /// Support-weighted mean F1
    pub weighted_f1: f64,

    /// Total number of examples
    pub support: usize,
}

impl ClassificationReport {
    /// Score predictions against gold labels
    ///
    /// Classes are `labels` followed by any label seen in `gold` or `predicted` that is missing
    /// from it, so every prediction is accounted for.
    ///
    /// # Panics
    ///
    /// When `gold` and `predicted` differ in length.
    pub fn new<G, P>(gold: &[G], predicted: &[P], labels: &[String]) -> Self
    where
        G: AsRef<str>,
        P: AsRef<str>,
    {
        assert_eq!(
            gold.len(),
            predicted.len(),
            "gold and predicted labels must pair up"
        );

        let mut names: Vec<String> = labels.to_vec();
        for label in gold
            .iter()
            .map(AsRef::as_ref)
            .chain(predicted.iter().map(AsRef::as_ref))
        {
            if !names.iter().any(|name| name == label) {
                names.push(label.to_string());
            }
        }

        let pairs: Vec<(&str, &str)> = gold
            .iter()
            .map(AsRef::as_ref)
            .zip(predicted.iter().map(AsRef::as_ref))
            .collect();

        let total = pairs.len();
        let correct = pairs.iter().filter(|(g, p)| g == p).count();

        let classes: Vec<ClassScores> = names
            .into_iter()
            .map(|label| {
                let tp = pairs
                    .iter()
                    .filter(|(g, p)| *g == label && *p == label)
                    .count();
                let predicted = pairs.iter().filter(|(_, p)| *p == label).count();
                let support = pairs.iter().filter(|(g, _)| *g == label).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassScores {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let n = classes.len().max(1) as f64;
        let macro_precision = classes.iter().map(|c| c.precision).sum::<f64>() / n;
        let macro_recall = classes.iter().map(|c| c.recall).sum::<f64>() / n;
        let macro_f1 = classes.iter().map(|c| c.f1).sum::<f64>() / n;
        let weighted_f1 = if total > 0 {
            classes
                .iter()
                .map(|c| c.f1 * c.support as f64)
                .sum::<f64>()
                / total as f64
        } else {
            0.0
        };

        Self {
            classes,
            accuracy: ratio(correct, total),
            macro_precision,
            macro_recall,
            macro_f1,
            weighted_f1,
            support: total,
        }
    }
}

impl Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for class in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.3} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        writeln!(
            f,
            "{:>width$} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, self.support
        )?;
        write!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.3} {:>9}",
            "weighted avg", "", "", self.weighted_f1, self.support
        )
    }
}

/// Macro-averaged F1 over the labels present in either list
pub fn macro_f1<G, P>(gold: &[G], predicted: &[P]) -> f64
where
    G: AsRef<str>,
    P: AsRef<str>,
{
    ClassificationReport::new(gold, predicted, &[]).macro_f1
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
