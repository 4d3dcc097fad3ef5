//! Per-group orchestration.
//!
//! Responsibilities:
//!
//! - build the condition-value → observations map in a single grouping pass
//! - apply eligibility filtering (minimum observations, minimum distinct ages)
//! - run the full pipeline for each eligible group: weights, transform,
//!   fit, dense band, bucket summaries
//! - evaluate groups in parallel and merge results in group-key order, so
//!   repeated runs produce identical tables
//!
//! Failures are scoped to one group and one complexity: a skipped group
//! contributes zero rows and a recorded reason, never an aborted run.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::domain::{BucketSummary, CeilingPolicy, EffectScale, Observation, PredictionPoint};
use crate::fit::fitter::fit_group_curve;
use crate::fit::weights::regression_weights;
use crate::summary::band::prediction_band;
use crate::summary::buckets::summarize_buckets;

/// Minimum observations for a group to be analyzable.
pub const MIN_OBSERVATIONS: usize = 6;

/// Minimum distinct age values for a group to be analyzable.
pub const MIN_DISTINCT_AGES: usize = 4;

/// Everything computed for one fitted (group, complexity) pair.
#[derive(Debug, Clone)]
pub struct GroupFit {
    /// The condition value, treated as an opaque label.
    pub label: String,
    pub scale: EffectScale,
    /// Raw effect-type label, passed through to the curve export.
    pub effect_label: String,
    /// Figure-merge identifier, passed through unchanged.
    pub merge_figure: String,
    /// The group's observations (kept for chart rendering).
    pub observations: Vec<Observation>,
    /// Dense prediction grid on the reporting scale.
    pub band: Vec<PredictionPoint>,
    pub buckets: Vec<BucketSummary>,
    pub age_min: f64,
    pub age_max: f64,
    pub df_used: usize,
}

/// Output of one (condition column, complexity) run.
#[derive(Debug, Clone)]
pub struct GroupRun {
    pub fits: Vec<GroupFit>,
    /// Skipped groups and why (for diagnostics).
    pub skipped: Vec<(String, String)>,
    pub groups_total: usize,
}

/// Build the group map in one pass, excluding rows with a missing label.
pub fn group_observations(
    observations: &[Observation],
    labels: &[Option<String>],
) -> BTreeMap<String, Vec<Observation>> {
    let mut groups: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for (obs, label) in observations.iter().zip(labels.iter()) {
        if let Some(label) = label {
            groups.entry(label.clone()).or_default().push(obs.clone());
        }
    }
    groups
}

/// Run the pipeline for every group at one smoothing complexity.
pub fn run_groups(
    groups: &BTreeMap<String, Vec<Observation>>,
    complexity: usize,
    ceilings: &CeilingPolicy,
    extend_years: f64,
    age_cap: f64,
    grid_points: usize,
) -> GroupRun {
    let entries: Vec<(&String, &Vec<Observation>)> = groups.iter().collect();

    // Each (group, complexity) unit reads only its own rows and emits a
    // self-contained result; order is restored by collecting positionally.
    let results: Vec<Result<GroupFit, (String, String)>> = entries
        .par_iter()
        .map(|&(label, observations)| {
            process_group(
                label,
                observations,
                complexity,
                ceilings,
                extend_years,
                age_cap,
                grid_points,
            )
        })
        .collect();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(fit) => fits.push(fit),
            Err(skip) => skipped.push(skip),
        }
    }

    for (label, reason) in &skipped {
        log::warn!("skipping group '{label}' (k={complexity}): {reason}");
    }

    GroupRun {
        fits,
        skipped,
        groups_total: entries.len(),
    }
}

fn process_group(
    label: &str,
    observations: &[Observation],
    complexity: usize,
    ceilings: &CeilingPolicy,
    extend_years: f64,
    age_cap: f64,
    grid_points: usize,
) -> Result<GroupFit, (String, String)> {
    let skip = |reason: String| Err((label.to_string(), reason));

    if observations.len() < MIN_OBSERVATIONS {
        return skip(format!(
            "too few observations: {} < {MIN_OBSERVATIONS}",
            observations.len()
        ));
    }
    let mut distinct: Vec<f64> = observations.iter().map(|o| o.age).collect();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup();
    if distinct.len() < MIN_DISTINCT_AGES {
        return skip(format!(
            "too few distinct ages: {} < {MIN_DISTINCT_AGES}",
            distinct.len()
        ));
    }

    let effect_label = observations[0].effect_label.clone();
    let scale = EffectScale::from_label(&effect_label);
    if observations
        .iter()
        .any(|o| EffectScale::from_label(&o.effect_label) != scale)
    {
        log::warn!("group '{label}' mixes effect-type labels; using '{effect_label}'");
    }

    let weights = regression_weights(observations);
    let curve = match fit_group_curve(observations, &weights, scale, complexity) {
        Ok(curve) => curve,
        Err(err) => return skip(format!("fit failure: {err}")),
    };

    let band = prediction_band(&curve, ceilings, extend_years, age_cap, grid_points);
    let buckets = summarize_buckets(&curve, ceilings, extend_years);

    let merge_figure = observations
        .iter()
        .find_map(|o| o.merge_figure.clone())
        .unwrap_or_default();

    Ok(GroupFit {
        label: label.to_string(),
        scale,
        effect_label,
        merge_figure,
        observations: observations.to_vec(),
        band,
        buckets,
        age_min: curve.age_min,
        age_max: curve.age_max,
        df_used: curve.df_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(age: f64, effect: f64, label: &str) -> Observation {
        Observation {
            age,
            effect,
            std_err: Some(0.1),
            case_n: Some(20.0),
            total_n: Some(50.0),
            effect_label: label.to_string(),
            merge_figure: Some("fig-1".to_string()),
        }
    }

    fn eligible_group(effect_label: &str) -> Vec<Observation> {
        (1..=10)
            .map(|i| obs(5.0 * i as f64, 2.0, effect_label))
            .collect()
    }

    #[test]
    fn grouping_excludes_missing_labels() {
        let observations = vec![obs(10.0, 1.0, "ratio"), obs(20.0, 1.0, "ratio")];
        let labels = vec![Some("a".to_string()), None];
        let groups = group_observations(&observations, &labels);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["a"].len(), 1);
    }

    #[test]
    fn undersized_groups_emit_zero_rows() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "small".to_string(),
            (1..=5).map(|i| obs(5.0 * i as f64, 2.0, "ratio")).collect(),
        );
        // Six observations but only three distinct ages.
        groups.insert(
            "clumped".to_string(),
            vec![
                obs(10.0, 2.0, "ratio"),
                obs(10.0, 2.1, "ratio"),
                obs(20.0, 2.0, "ratio"),
                obs(20.0, 1.9, "ratio"),
                obs(30.0, 2.0, "ratio"),
                obs(30.0, 2.2, "ratio"),
            ],
        );

        let run = run_groups(&groups, 3, &CeilingPolicy::default(), 10.0, 80.0, 50);
        assert_eq!(run.groups_total, 2);
        assert!(run.fits.is_empty());
        assert_eq!(run.skipped.len(), 2);
        let reasons: Vec<&str> = run.skipped.iter().map(|(_, r)| r.as_str()).collect();
        assert!(reasons.iter().any(|r| r.contains("too few observations")));
        assert!(reasons.iter().any(|r| r.contains("too few distinct ages")));
    }

    #[test]
    fn fit_failure_skips_only_the_broken_group() {
        let mut groups = BTreeMap::new();
        let mut broken = eligible_group("ratio");
        broken[2].effect = -1.0;
        groups.insert("broken".to_string(), broken);
        groups.insert("healthy".to_string(), eligible_group("ratio"));

        let run = run_groups(&groups, 3, &CeilingPolicy::default(), 10.0, 80.0, 50);
        assert_eq!(run.fits.len(), 1);
        assert_eq!(run.fits[0].label, "healthy");
        assert_eq!(run.skipped.len(), 1);
        assert_eq!(run.skipped[0].0, "broken");
        assert!(run.skipped[0].1.contains("fit failure"));
    }

    #[test]
    fn flat_ratio_group_exports_the_expected_band() {
        let mut groups = BTreeMap::new();
        groups.insert("flat".to_string(), eligible_group("ratio"));

        let run = run_groups(&groups, 3, &CeilingPolicy::default(), 10.0, 80.0, 400);
        assert_eq!(run.fits.len(), 1);
        let fit = &run.fits[0];
        assert_eq!(fit.scale, EffectScale::Ratio);
        assert_eq!(fit.merge_figure, "fig-1");
        assert_eq!(fit.band.len(), 400);
        for p in &fit.band {
            assert!((p.fit - 2.0).abs() < 1e-6, "band at {} was {}", p.age, p.fit);
            assert!(p.upper - p.lower < 1e-6, "interval should be tight");
            assert_eq!(p.extrapolated, p.age > 50.0);
        }
        assert!(!fit.buckets.is_empty());
    }

    #[test]
    fn results_are_ordered_by_group_key() {
        let mut groups = BTreeMap::new();
        groups.insert("zeta".to_string(), eligible_group("ratio"));
        groups.insert("alpha".to_string(), eligible_group("ratio"));
        let run = run_groups(&groups, 3, &CeilingPolicy::default(), 10.0, 80.0, 10);
        let labels: Vec<&str> = run.fits.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "zeta"]);
    }
}
