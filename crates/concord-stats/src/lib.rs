// SPDX-License-Identifier: Apache-2.0
//! Small, dependency-free statistics used by the Mutator's acceptance gate
//! (§4.6 Phase C): a mean, a lower confidence bound, and a two-sample
//! Mann-Whitney U test. No statistics crate appears anywhere in this
//! codebase's dependency stack, so these are hand-rolled the way the rest
//! of this engine hand-rolls small, self-contained utility modules rather
//! than pull in a crate for three formulas.

/// Arithmetic mean. Returns `0.0` for an empty slice rather than `NaN`,
/// since every caller treats "no samples yet" the same as "no signal".
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation (Bessel's correction, n-1 denominator).
/// Returns `0.0` for fewer than two samples — there is no variance to
/// speak of with a single observation.
pub fn stddev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let sum_sq: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / (samples.len() as f64 - 1.0)).sqrt()
}

/// `mean(samples) - lambda * stddev(samples)`, the acceptance gate's
/// variance-aware score for one candidate's shadow trials.
pub fn lower_confidence_bound(samples: &[f64], lambda: f64) -> f64 {
    mean(samples) - lambda * stddev(samples)
}

/// Two-sided p-value from a two-sample Mann-Whitney U test, normal
/// approximation with a tie correction. `a` is conventionally the
/// candidate's shadow scores, `b` the baseline's. Returns `1.0` (no
/// evidence of a difference) whenever either sample has fewer than 2
/// observations — too small a sample to say anything, and the acceptance
/// gate is built to fail closed (reject the candidate) in that case.
pub fn mann_whitney_u_test(a: &[f64], b: &[f64]) -> f64 {
    let n1 = a.len();
    let n2 = b.len();
    if n1 < 2 || n2 < 2 {
        return 1.0;
    }

    let mut combined: Vec<(f64, u8)> = a.iter().map(|&v| (v, 0u8)).chain(b.iter().map(|&v| (v, 1u8))).collect();
    combined.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap());

    let n = combined.len();
    let mut ranks = vec![0.0; n];
    let mut tie_correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && combined[j + 1].0 == combined[i].0 {
            j += 1;
        }
        // Ranks are 1-based; tied values share the average rank of their span.
        let avg_rank = ((i + 1) + (j + 1)) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j + 1).skip(i) {
            *rank = avg_rank;
        }
        let t = (j - i + 1) as f64;
        tie_correction += t.powi(3) - t;
        i = j + 1;
    }

    let r1: f64 = ranks.iter().zip(combined.iter()).filter(|(_, (_, g))| *g == 0).map(|(r, _)| r).sum();

    let n1 = n1 as f64;
    let n2 = n2 as f64;
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let u = u1.min(u2);

    let mean_u = n1 * n2 / 2.0;
    let total = n1 + n2;
    let variance = (n1 * n2 / 12.0) * ((total + 1.0) - tie_correction / (total * (total - 1.0)));
    if variance <= 0.0 {
        return 1.0;
    }
    let sigma_u = variance.sqrt();

    let z = (u - mean_u) / sigma_u;
    let p = 2.0 * (1.0 - standard_normal_cdf(z.abs()));
    p.clamp(0.0, 1.0)
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation
/// (max error ~1.5e-7), adequate for a p-value threshold comparison.
fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}
