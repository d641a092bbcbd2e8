//! Binary classification seam and the default random forest
//!
//! The grid-probability model only needs `fit` and `predict_proba`; keeping that
//! behind [`Classifier`]/[`ProbabilityModel`] lets tests swap in a deterministic
//! stub and keeps the forest internals private.
//!
//! # Forest
//!
//! - Bootstrap sample per tree (drawn with replacement, same size as the input)
//! - CART splits minimising weighted Gini impurity
//! - `⌊√features⌋` candidate features per split, drawn without replacement;
//!   further features are examined only while no valid split has been found
//! - Leaves store the positive fraction; the forest averages leaf fractions
//!
//! Each tree owns a `StdRng` seeded from `seed + tree_index`, so trees can be
//! fit in parallel with rayon and still come out identical on every run.

use crate::config::ClassifierParams;
use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

/// Number of features per sample
pub const FEATURE_COUNT: usize = 4;

/// Feature vector: `[latitude, longitude, month (1-12), weekday (Monday = 0)]`
pub type Features = [f64; FEATURE_COUNT];

/// A fitted binary model
pub trait ProbabilityModel: Send + Sync {
    /// Probability that `sample` belongs to the positive class, in [0, 1]
    fn predict_proba(&self, sample: &Features) -> f64;

    /// Hard label; a probability of exactly 0.5 is negative
    fn predict(&self, sample: &Features) -> bool {
        self.predict_proba(sample) > 0.5
    }
}

/// Fits a [`ProbabilityModel`] to labelled samples
pub trait Classifier: Send + Sync {
    /// Fit a model
    ///
    /// # Errors
    ///
    /// `ModelTrainingFailure` when the data cannot support a model (mismatched
    /// lengths, no samples, a single class).
    fn fit(&self, samples: &[Features], labels: &[bool]) -> Result<Box<dyn ProbabilityModel>>;
}

/// Check the shape every classifier relies on
pub(crate) fn check_training_data(samples: &[Features], labels: &[bool]) -> Result<()> {
    if samples.len() != labels.len() {
        return Err(EngineError::ModelTrainingFailure(format!(
            "{} samples but {} labels",
            samples.len(),
            labels.len()
        )));
    }
    if samples.is_empty() {
        return Err(EngineError::ModelTrainingFailure(
            "no training samples".into(),
        ));
    }
    let positives = labels.iter().filter(|&&l| l).count();
    if positives == 0 || positives == labels.len() {
        return Err(EngineError::ModelTrainingFailure(
            "training labels contain a single class".into(),
        ));
    }
    Ok(())
}

/// Random forest classifier
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: usize,
    min_samples_split: usize,
    seed: u64,
}

impl RandomForest {
    /// Build from classifier parameters
    pub fn new(params: &ClassifierParams) -> Self {
        Self {
            n_trees: params.n_trees.max(1),
            max_depth: params.max_depth.max(1),
            min_samples_split: params.min_samples_split.max(2),
            seed: params.seed,
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(&ClassifierParams::default())
    }
}

impl Classifier for RandomForest {
    fn fit(&self, samples: &[Features], labels: &[bool]) -> Result<Box<dyn ProbabilityModel>> {
        check_training_data(samples, labels)?;

        let trees: Vec<DecisionTree> = (0..self.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(tree_index as u64));
                let mut indices: Vec<usize> = (0..samples.len())
                    .map(|_| rng.random_range(0..samples.len()))
                    .collect();
                let mut builder = TreeBuilder {
                    samples,
                    labels,
                    max_depth: self.max_depth,
                    min_samples_split: self.min_samples_split,
                    rng,
                    nodes: Vec::new(),
                };
                builder.grow(&mut indices, 0);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        debug!(
            trees = trees.len(),
            nodes = trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            samples = samples.len(),
            "fitted random forest"
        );

        Ok(Box::new(FittedForest { trees }))
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        probability: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    /// Root is node 0
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn predict_proba(&self, sample: &Features) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { probability } => return probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if sample[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

struct FittedForest {
    trees: Vec<DecisionTree>,
}

impl ProbabilityModel for FittedForest {
    fn predict_proba(&self, sample: &Features) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(sample)).sum();
        total / self.trees.len() as f64
    }
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

struct TreeBuilder<'a> {
    samples: &'a [Features],
    labels: &'a [bool],
    max_depth: usize,
    min_samples_split: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `indices`, returning its node index
    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let total = indices.len();
        let positives = indices.iter().filter(|&&i| self.labels[i]).count();
        let probability = positives as f64 / total as f64;

        let pure = positives == 0 || positives == total;
        if pure || depth >= self.max_depth || total < self.min_samples_split {
            return self.push(Node::Leaf { probability });
        }

        let Some(split) = self.best_split(indices, positives) else {
            return self.push(Node::Leaf { probability });
        };

        // Reserve this node's slot before children are appended
        let node_index = self.push(Node::Leaf { probability });

        let mut boundary = 0;
        for i in 0..indices.len() {
            if self.samples[indices[i]][split.feature] <= split.threshold {
                indices.swap(i, boundary);
                boundary += 1;
            }
        }
        let (left_indices, right_indices) = indices.split_at_mut(boundary);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);

        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_index
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn best_split(&mut self, indices: &[usize], positives: usize) -> Option<SplitCandidate> {
        let max_features = ((FEATURE_COUNT as f64).sqrt() as usize).max(1);
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<SplitCandidate> = None;
        for (examined, &feature) in features.iter().enumerate() {
            if examined >= max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(indices, positives, feature) {
                let better = match &best {
                    None => true,
                    Some(current) => candidate.impurity < current.impurity,
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Lowest weighted Gini threshold on one feature, or `None` if the feature is constant
    fn best_split_on(
        &self,
        indices: &[usize],
        positives: usize,
        feature: usize,
    ) -> Option<SplitCandidate> {
        let mut values: Vec<(f64, bool)> = indices
            .iter()
            .map(|&i| (self.samples[i][feature], self.labels[i]))
            .collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = values.len();
        let mut left_positives = 0;
        let mut best: Option<SplitCandidate> = None;

        for i in 0..total - 1 {
            if values[i].1 {
                left_positives += 1;
            }
            let (current, next) = (values[i].0, values[i + 1].0);
            if current >= next {
                continue;
            }

            let left_total = i + 1;
            let right_total = total - left_total;
            let impurity = (left_total as f64 * gini(left_positives, left_total)
                + right_total as f64 * gini(positives - left_positives, right_total))
                / total as f64;

            let better = match &best {
                None => true,
                Some(current_best) => impurity < current_best.impurity,
            };
            if better {
                let mut threshold = current / 2.0 + next / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}
