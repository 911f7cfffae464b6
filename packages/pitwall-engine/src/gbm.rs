//! gbm.rs — Gradient-boosted regression trees
//!
//! Small ensemble fitted on residuals: start from the target mean, then
//! repeatedly fit a shallow variance-reduction tree to what the current
//! ensemble still gets wrong and add it at the learning rate. Enough model
//! for re-weighting a handful of numeric features over a few dozen rows;
//! deterministic given identical inputs.

/// Minimum sum-of-squared-error reduction for a split to be worth taking.
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Axis-aligned regression tree stored as a node arena.
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

impl RegressionTree {
    fn fit(features: &[Vec<f64>], targets: &[f64], max_depth: usize) -> Self {
        let indices: Vec<usize> = (0..targets.len()).collect();
        let mut nodes = Vec::new();
        let root = Self::build(features, targets, &indices, max_depth, &mut nodes);
        Self { nodes, root }
    }

    fn build(
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        let node_mean =
            indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len().max(1) as f64;

        let split = if depth == 0 || indices.len() < 2 {
            None
        } else {
            best_split(features, targets, indices)
        };

        match split {
            None => {
                nodes.push(TreeNode::Leaf { value: node_mean });
                nodes.len() - 1
            }
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| features[i][feature] <= threshold);
                let left = Self::build(features, targets, &left_idx, depth - 1, nodes);
                let right = Self::build(features, targets, &right_idx, depth - 1, nodes);
                nodes.push(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                });
                nodes.len() - 1
            }
        }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = self.root;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Best (feature, midpoint threshold) by sum-of-squared-error reduction,
/// evaluated with prefix sums over each feature's sorted values.
fn best_split(features: &[Vec<f64>], targets: &[f64], indices: &[usize]) -> Option<(usize, f64)> {
    let n = indices.len();
    let n_features = features[indices[0]].len();

    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64)> = None;
    let mut best_sse = parent_sse - MIN_SPLIT_GAIN;

    for feature in 0..n_features {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (features[i][feature], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            left_sum += pairs[k - 1].1;
            left_sq += pairs[k - 1].1 * pairs[k - 1].1;
            if pairs[k].0 <= pairs[k - 1].0 {
                continue; // no boundary between equal feature values
            }
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / k as f64)
                + (right_sq - right_sum * right_sum / (n - k) as f64);
            if sse < best_sse {
                best_sse = sse;
                best = Some((feature, (pairs[k - 1].0 + pairs[k].0) / 2.0));
            }
        }
    }

    best
}

/// Boosted ensemble: prediction = base + learning_rate * Σ tree(x).
#[derive(Debug, Clone)]
pub struct GradientBoostedTrees {
    learning_rate: f64,
    base_prediction: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        n_trees: usize,
        learning_rate: f64,
        max_depth: usize,
    ) -> Self {
        let n = targets.len();
        let base_prediction = if n == 0 {
            0.0
        } else {
            targets.iter().sum::<f64>() / n as f64
        };

        let mut predictions = vec![base_prediction; n];
        let mut trees = Vec::with_capacity(n_trees);

        for _ in 0..n_trees {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&predictions)
                .map(|(y, p)| y - p)
                .collect();
            let tree = RegressionTree::fit(features, &residuals, max_depth);
            for (i, pred) in predictions.iter_mut().enumerate() {
                *pred += learning_rate * tree.predict(&features[i]);
            }
            trees.push(tree);
        }

        Self {
            learning_rate,
            base_prediction,
            trees,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base_prediction
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_target_predicts_the_constant() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let targets = vec![3.5; 10];
        let model = GradientBoostedTrees::fit(&features, &targets, 50, 0.1, 3);
        for row in &features {
            assert!((model.predict(row) - 3.5).abs() < 1e-9);
        }
    }

    #[test]
    fn boosting_fits_a_smooth_target() {
        let features: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let targets: Vec<f64> = (0..20).map(|i| 2.0 * i as f64 + 1.0).collect();
        let model = GradientBoostedTrees::fit(&features, &targets, 200, 0.05, 3);

        let mae: f64 = features
            .iter()
            .zip(&targets)
            .map(|(f, y)| (model.predict(f) - y).abs())
            .sum::<f64>()
            / targets.len() as f64;
        assert!(mae < 1.0, "training mae {mae} too high");
    }

    #[test]
    fn splits_order_a_step_function() {
        let features: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..12).map(|i| if i < 6 { -1.0 } else { 1.0 }).collect();
        let model = GradientBoostedTrees::fit(&features, &targets, 100, 0.1, 2);
        assert!(model.predict(&[2.0]) < model.predict(&[9.0]));
    }
}
