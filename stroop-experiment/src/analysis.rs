//! Reaction-time statistics over correct trials: per-block descriptives, Welch's
//! t-test between the congruent and incongruent block of each framing, and the
//! five-number summaries behind the box plot.
//!
//! Every function here is pure; summarizing the same trials twice gives identical
//! numbers.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use stroop_core::{BlockKind, ExperimentError, Framing, TrialResult};
use tracing::{info, warn};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator).
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted(values);
    quantile(&sorted, 0.5)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Linear interpolation between closest ranks, `q` in [0, 1].
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Reaction times (seconds) of the correct trials of `kind`, in trial order.
pub fn correct_reaction_times(trials: &[TrialResult], kind: BlockKind) -> Vec<f64> {
    trials
        .iter()
        .filter(|t| t.block == kind && t.correct)
        .map(|t| t.reaction_time)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    pub t: f64,
    pub df: f64,
    /// Two-sided.
    pub p_value: f64,
}

/// Welch's unequal-variance t-test of `a` against `b`.
///
/// `None` when either sample has fewer than two values or both are constant.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<WelchTest> {
    let (mean_a, var_a) = (mean(a)?, variance(a)?);
    let (mean_b, var_b) = (mean(b)?, variance(b)?);
    let se_a = var_a / a.len() as f64;
    let se_b = var_b / b.len() as f64;
    let se = (se_a + se_b).sqrt();
    if !(se > 0.0) {
        return None;
    }

    let t = (mean_a - mean_b) / se;
    // Welch-Satterthwaite
    let df = (se_a + se_b).powi(2)
        / (se_a.powi(2) / (a.len() - 1) as f64 + se_b.powi(2) / (b.len() - 1) as f64);
    let p_value = student_t_two_sided(t, df);
    Some(WelchTest { t, df, p_value })
}

/// P(|T| >= |t|) for Student's t with `df` degrees of freedom.
fn student_t_two_sided(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    regularized_incomplete_beta(df * 0.5, 0.5, x).clamp(0.0, 1.0)
}

const LANCZOS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

/// ln Γ(x) for x > 0 (Lanczos, g = 5).
fn ln_gamma(x: f64) -> f64 {
    let t = x + 5.5;
    let series = LANCZOS
        .iter()
        .enumerate()
        .fold(1.000_000_000_190_015, |acc, (i, c)| acc + c / (x + i as f64 + 1.0));
    (x + 0.5) * t.ln() - t + (2.506_628_274_631_000_5 * series / x).ln()
}

fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln())
        .exp();
    // The continued fraction converges fast only below the mean.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Modified Lentz evaluation.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };
    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub block: BlockKind,
    pub trials: usize,
    pub correct: usize,
    pub accuracy: Option<f64>,
    /// Seconds, correct trials only. `None` is "no data".
    pub mean_rt: Option<f64>,
    pub sd_rt: Option<f64>,
    pub median_rt: Option<f64>,
}

impl BlockSummary {
    pub fn of(trials: &[TrialResult], block: BlockKind) -> Self {
        let total = trials.iter().filter(|t| t.block == block).count();
        let rts = correct_reaction_times(trials, block);
        Self {
            block,
            trials: total,
            correct: rts.len(),
            accuracy: (total > 0).then(|| rts.len() as f64 / total as f64),
            mean_rt: mean(&rts),
            sd_rt: std_dev(&rts),
            median_rt: median(&rts),
        }
    }
}

/// Congruent against incongruent within one framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramingComparison {
    pub framing: Framing,
    pub congruent_mean: Option<f64>,
    pub incongruent_mean: Option<f64>,
    /// Incongruent mean minus congruent mean, seconds.
    pub interference: Option<f64>,
    pub test: Option<WelchTest>,
}

impl FramingComparison {
    pub fn of(trials: &[TrialResult], framing: Framing) -> Self {
        let congruent = correct_reaction_times(trials, framing.congruent_block());
        let incongruent = correct_reaction_times(trials, framing.incongruent_block());
        let congruent_mean = mean(&congruent);
        let incongruent_mean = mean(&incongruent);
        let test = welch_t_test(&congruent, &incongruent);
        if test.is_none() {
            warn!(
                framing = framing.label(),
                congruent = congruent.len(),
                incongruent = incongruent.len(),
                "significance test skipped, not enough correct trials"
            );
        }
        Self {
            framing,
            congruent_mean,
            incongruent_mean,
            interference: congruent_mean.zip(incongruent_mean).map(|(c, i)| i - c),
            test,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        self.test.map(|t| t.p_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub correct: usize,
    pub blocks: Vec<BlockSummary>,
    pub comparisons: Vec<FramingComparison>,
}

pub fn summarize(trials: &[TrialResult]) -> SessionSummary {
    SessionSummary {
        trials: trials.len(),
        correct: trials.iter().filter(|t| t.correct).count(),
        blocks: BlockKind::ALL
            .iter()
            .map(|kind| BlockSummary::of(trials, *kind))
            .collect(),
        comparisons: Framing::ALL
            .iter()
            .map(|framing| FramingComparison::of(trials, *framing))
            .collect(),
    }
}

fn fmt_ms(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) => format!("{:.1} ms", s * 1_000.0),
        None => "no data".to_string(),
    }
}

impl SessionSummary {
    pub fn block(&self, kind: BlockKind) -> Option<&BlockSummary> {
        self.blocks.iter().find(|b| b.block == kind)
    }

    pub fn comparison(&self, framing: Framing) -> Option<&FramingComparison> {
        self.comparisons.iter().find(|c| c.framing == framing)
    }

    pub fn to_json(&self) -> Result<String, ExperimentError> {
        serde_json::to_string_pretty(self).map_err(|e| ExperimentError::Serialization {
            what: "session summary",
            message: e.to_string(),
        })
    }

    /// Human-readable report, "no data" where a statistic is undefined.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} trials, {} correct", self.trials, self.correct);
        for block in &self.blocks {
            let _ = writeln!(
                out,
                "{:<20} mean {:>10}  median {:>10}  correct {}/{}",
                block.block.label(),
                fmt_ms(block.mean_rt),
                fmt_ms(block.median_rt),
                block.correct,
                block.trials,
            );
        }
        for cmp in &self.comparisons {
            let test = match cmp.test {
                Some(t) => format!("t = {:.3}, df = {:.1}, p = {:.4}", t.t, t.df, t.p_value),
                None => "p = no data".to_string(),
            };
            let _ = writeln!(
                out,
                "{:<7} interference {:>10}  {}",
                cmp.framing.label(),
                fmt_ms(cmp.interference),
                test
            );
        }
        out
    }

    pub fn log(&self) {
        for block in &self.blocks {
            info!(
                block = block.block.label(),
                trials = block.trials,
                correct = block.correct,
                mean_rt_ms = block.mean_rt.map(|s| s * 1_000.0),
                "block statistics"
            );
        }
        for cmp in &self.comparisons {
            info!(
                framing = cmp.framing.label(),
                interference_ms = cmp.interference.map(|s| s * 1_000.0),
                p_value = cmp.p_value(),
                "congruency comparison"
            );
        }
    }
}

/// Five-number summary with Tukey whiskers (furthest points within 1.5 IQR).
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sorted = sorted(values);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let reach = 1.5 * (q3 - q1);
    let (low_fence, high_fence) = (q1 - reach, q3 + reach);

    let fenced = low_fence..=high_fence;
    let (inside, outliers): (Vec<f64>, Vec<f64>) =
        sorted.iter().partition(|v| fenced.contains(*v));
    Some(BoxStats {
        lower_whisker: inside.first().copied().unwrap_or(q1),
        q1,
        median,
        q3,
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn result(block: BlockKind, correct: bool, rt: f64) -> TrialResult {
        TrialResult {
            block,
            target: "RED".to_string(),
            response: if correct { "RED" } else { "GREEN" }.to_string(),
            correct,
            reaction_time: rt,
        }
    }

    #[test]
    fn descriptives() {
        let xs = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(mean(&xs).unwrap(), 2.5);
        assert_relative_eq!(variance(&xs).unwrap(), 5.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(median(&xs).unwrap(), 2.5);
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn ln_gamma_matches_factorials() {
        assert_relative_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-10);
        assert_relative_eq!(ln_gamma(5.0), 24f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(ln_gamma(0.5), PI.sqrt().ln(), epsilon = 1e-10);
    }

    #[test]
    fn student_t_critical_values() {
        assert_relative_eq!(student_t_two_sided(2.228138852, 10.0), 0.05, epsilon = 1e-6);
        // df = 1 is Cauchy: P(|T| >= 1) = 1/2
        assert_relative_eq!(student_t_two_sided(1.0, 1.0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(student_t_two_sided(0.0, 7.0), 1.0);
    }

    #[test]
    fn welch_against_reference() {
        let test = welch_t_test(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert_relative_eq!(test.t, -1.897_366_596, epsilon = 1e-6);
        assert_relative_eq!(test.df, 5.882_352_941, epsilon = 1e-6);
        assert_relative_eq!(test.p_value, 0.107_531, epsilon = 1e-4);

        let test = welch_t_test(
            &[0.61, 0.55, 0.72, 0.58, 0.66],
            &[0.81, 0.93, 0.77, 0.88, 1.02, 0.85],
        )
        .unwrap();
        assert_relative_eq!(test.t, -5.342_003_6, epsilon = 1e-5);
        assert_relative_eq!(test.p_value, 0.000_477_2, epsilon = 1e-5);
    }

    #[test]
    fn welch_needs_two_values_and_spread() {
        assert!(welch_t_test(&[1.0], &[1.0, 2.0]).is_none());
        assert!(welch_t_test(&[], &[1.0, 2.0]).is_none());
        assert!(welch_t_test(&[1.0, 1.0], &[2.0, 2.0]).is_none());
    }

    #[test]
    fn empty_partitions_report_no_data() {
        let trials = vec![
            result(BlockKind::TextCongruent, true, 0.5),
            result(BlockKind::TextCongruent, true, 0.7),
            result(BlockKind::TextIncongruent, false, 0.9),
        ];
        let summary = summarize(&trials);
        let congruent = summary.block(BlockKind::TextCongruent).unwrap();
        assert_relative_eq!(congruent.mean_rt.unwrap(), 0.6, epsilon = 1e-12);
        let incongruent = summary.block(BlockKind::TextIncongruent).unwrap();
        assert_eq!(incongruent.mean_rt, None);
        assert_eq!(incongruent.accuracy, Some(0.0));
        assert_eq!(summary.block(BlockKind::SwatchCongruent).unwrap().accuracy, None);

        let text = summary.comparison(Framing::Text).unwrap();
        assert_eq!(text.p_value(), None);
        assert_eq!(text.interference, None);
        assert!(summary.report().contains("no data"));
    }

    #[test]
    fn incorrect_trials_are_left_out_of_reaction_times() {
        let trials = vec![
            result(BlockKind::SwatchCongruent, true, 0.4),
            result(BlockKind::SwatchCongruent, false, 3.0),
            result(BlockKind::SwatchIncongruent, true, 0.6),
            result(BlockKind::SwatchIncongruent, true, 0.8),
        ];
        let summary = summarize(&trials);
        let swatch = summary.comparison(Framing::Swatch).unwrap();
        assert_relative_eq!(swatch.congruent_mean.unwrap(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(swatch.interference.unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(summary.correct, 3);
    }

    #[test]
    fn summarizing_twice_is_identical() {
        let trials: Vec<_> = (0..40)
            .map(|i| {
                let kind = BlockKind::ALL[i % 4];
                result(kind, i % 7 != 0, 0.4 + (i as f64 * 0.37).sin().abs() * 0.3)
            })
            .collect();
        assert_eq!(summarize(&trials), summarize(&trials));
    }

    #[test]
    fn box_stats_flag_outliers() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 5.0, 30.0]).unwrap();
        assert_relative_eq!(stats.median, 3.5);
        assert_relative_eq!(stats.q1, 2.25);
        assert_relative_eq!(stats.q3, 4.75);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.outliers, vec![30.0]);
        assert!(box_stats(&[]).is_none());
    }
}
