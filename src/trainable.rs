use crate::error::{Result, SolverError};
use crate::sliceop::*;

/// Discounted-CFR schedule coefficients.
///
/// Positive running regrets are discounted by `n^alpha / (1 + n^alpha)`,
/// negative ones multiplied by `beta`; the average-strategy numerator is
/// scaled by `theta` and fed with the current strategy weighted by
/// `(n / (n + 1))^gamma`, where `n` is the one-based iteration number.
#[derive(Debug, Clone, Copy)]
pub struct DcfrParams {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
    pub theta: f32,
}

impl Default for DcfrParams {
    fn default() -> Self {
        Self {
            alpha: 1.5,
            beta: 0.0,
            gamma: 2.0,
            theta: 1.0,
        }
    }
}

/// Regret and average-strategy accumulator of one (action node, abstract
/// deal) pair.
///
/// All per-(action, hand) tables are stored action-major: entry
/// `action * num_hands + hand`.
pub struct DcfrTrainable {
    num_actions: usize,
    num_hands: usize,
    /// Running regrets; may go negative before clipping in strategy
    /// derivation.
    r_plus: Vec<f32>,
    /// Per-hand sum of `max(0, r_plus)`.
    r_plus_sum: Vec<f32>,
    /// Average-strategy numerator.
    cum_r_plus: Vec<f32>,
    /// Last recorded per-action EVs and equities.
    evs: Vec<f32>,
    equities: Vec<f32>,
}

impl DcfrTrainable {
    pub fn new(num_actions: usize, num_hands: usize) -> Self {
        Self {
            num_actions,
            num_hands,
            r_plus: vec![0.0; num_actions * num_hands],
            r_plus_sum: vec![0.0; num_hands],
            cum_r_plus: vec![0.0; num_actions * num_hands],
            evs: vec![0.0; num_actions * num_hands],
            equities: vec![0.0; num_actions * num_hands],
        }
    }

    #[inline]
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    #[inline]
    pub fn num_hands(&self) -> usize {
        self.num_hands
    }

    /// Derives the current strategy by regret matching over the clipped
    /// running regrets; hands with no positive regret play uniformly.
    pub fn current_strategy(&self) -> Vec<f32> {
        let mut strategy = vec![0.0; self.num_actions * self.num_hands];
        let uniform = 1.0 / self.num_actions as f32;
        for action in 0..self.num_actions {
            for hand in 0..self.num_hands {
                let index = action * self.num_hands + hand;
                strategy[index] = if self.r_plus_sum[hand] != 0.0 {
                    self.r_plus[index].max(0.0) / self.r_plus_sum[hand]
                } else {
                    uniform
                };
            }
        }
        strategy
    }

    /// Derives the average strategy from the accumulated numerators;
    /// hands with an empty accumulator play uniformly.
    pub fn average_strategy(&self) -> Vec<f32> {
        let mut denom = vec![0.0f32; self.num_hands];
        for action in 0..self.num_actions {
            add_slice(&mut denom, chunk(&self.cum_r_plus, action, self.num_hands));
        }

        let uniform = 1.0 / self.num_actions as f32;
        let mut strategy = vec![0.0; self.num_actions * self.num_hands];
        for action in 0..self.num_actions {
            for hand in 0..self.num_hands {
                let index = action * self.num_hands + hand;
                strategy[index] = if denom[hand] != 0.0 {
                    self.cum_r_plus[index] / denom[hand]
                } else {
                    uniform
                };
            }
        }
        strategy
    }

    /// Folds one iteration of regrets into the accumulator.
    /// `iteration_number` is one-based. A NaN regret is a hard error.
    pub fn update_regrets(
        &mut self,
        regrets: &[f32],
        iteration_number: usize,
        params: &DcfrParams,
    ) -> Result<()> {
        if regrets.len() != self.r_plus.len() {
            return Err(SolverError::LengthMismatch {
                expected: self.r_plus.len(),
                actual: regrets.len(),
            });
        }

        let alpha_pow = (iteration_number as f64).powf(params.alpha as f64);
        let alpha_coef = (alpha_pow / (1.0 + alpha_pow)) as f32;

        self.r_plus_sum.fill(0.0);
        for action in 0..self.num_actions {
            for hand in 0..self.num_hands {
                let index = action * self.num_hands + hand;
                let regret = regrets[index];
                if regret.is_nan() {
                    return Err(SolverError::NanRegret { action, hand });
                }

                self.r_plus[index] += regret;
                self.r_plus[index] *= if self.r_plus[index] > 0.0 {
                    alpha_coef
                } else {
                    params.beta
                };
                self.r_plus_sum[hand] += self.r_plus[index].max(0.0);
            }
        }

        let strategy = self.current_strategy();
        let ratio = iteration_number as f64 / (iteration_number as f64 + 1.0);
        let strategy_coef = ratio.powf(params.gamma as f64) as f32;
        for (cum, sigma) in self.cum_r_plus.iter_mut().zip(strategy.iter()) {
            *cum = *cum * params.theta + sigma * strategy_coef;
        }

        Ok(())
    }

    /// Adopts another trainable's regrets and average-strategy numerator.
    /// Used to synchronize the members of a deal equivalence class at the
    /// warmup boundary.
    pub fn copy_strategy_from(&mut self, other: &Self) {
        self.r_plus.copy_from_slice(&other.r_plus);
        self.cum_r_plus.copy_from_slice(&other.cum_r_plus);
    }

    /// Records per-action EVs; NaN entries keep the previous value.
    pub fn set_evs(&mut self, evs: &[f32]) -> Result<()> {
        if evs.len() != self.evs.len() {
            return Err(SolverError::LengthMismatch {
                expected: self.evs.len(),
                actual: evs.len(),
            });
        }
        for (dst, &src) in self.evs.iter_mut().zip(evs) {
            if !src.is_nan() {
                *dst = src;
            }
        }
        Ok(())
    }

    /// Records per-action equities; NaN entries keep the previous value.
    pub fn set_equities(&mut self, equities: &[f32]) -> Result<()> {
        if equities.len() != self.equities.len() {
            return Err(SolverError::LengthMismatch {
                expected: self.equities.len(),
                actual: equities.len(),
            });
        }
        for (dst, &src) in self.equities.iter_mut().zip(equities) {
            if !src.is_nan() {
                *dst = src;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn evs(&self) -> &[f32] {
        &self.evs
    }

    #[inline]
    pub fn equities(&self) -> &[f32] {
        &self.equities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_before_any_update() {
        let trainable = DcfrTrainable::new(3, 2);
        assert!(trainable.current_strategy().iter().all(|&p| p == 1.0 / 3.0));
        assert!(trainable.average_strategy().iter().all(|&p| p == 1.0 / 3.0));
    }

    #[test]
    fn single_action_absorbs_everything() {
        let mut trainable = DcfrTrainable::new(1, 2);
        trainable
            .update_regrets(&[0.25, -0.5], 1, &DcfrParams::default())
            .unwrap();
        assert_eq!(trainable.average_strategy(), vec![1.0, 1.0]);
    }

    #[test]
    fn r_plus_sum_matches_clipped_regrets() {
        let mut trainable = DcfrTrainable::new(2, 2);
        let params = DcfrParams::default();
        trainable
            .update_regrets(&[1.0, -2.0, 3.0, 0.5], 1, &params)
            .unwrap();
        trainable
            .update_regrets(&[-0.5, 1.5, -4.0, 0.25], 2, &params)
            .unwrap();

        for hand in 0..2 {
            let expected: f32 = (0..2)
                .map(|action| trainable.r_plus[action * 2 + hand].max(0.0))
                .sum();
            let diff = (trainable.r_plus_sum[hand] - expected).abs();
            assert!(diff <= 1e-6 * expected.max(1.0));
        }
    }

    #[test]
    fn discount_schedule_follows_the_recurrence() {
        // constant regret of 1.0 over ten iterations; alpha = 1.5, beta = 0
        let mut trainable = DcfrTrainable::new(1, 1);
        let params = DcfrParams::default();

        let mut expected = 0.0f64;
        for t in 1..=10usize {
            trainable.update_regrets(&[1.0], t, &params).unwrap();
            let coef = (t as f64).powf(1.5);
            expected = (expected + 1.0) * (coef / (1.0 + coef));
            assert!(
                (trainable.r_plus[0] as f64 - expected).abs() < 1e-5,
                "iteration {t}"
            );
        }
    }

    #[test]
    fn average_strategy_sums_to_one() {
        let mut trainable = DcfrTrainable::new(3, 2);
        let params = DcfrParams::default();
        trainable
            .update_regrets(&[1.0, 0.0, -1.0, 2.0, 0.5, -0.25], 1, &params)
            .unwrap();
        trainable
            .update_regrets(&[0.0, 1.0, 2.0, -1.0, 0.25, 0.5], 2, &params)
            .unwrap();

        let average = trainable.average_strategy();
        for hand in 0..2 {
            let total: f32 = (0..3).map(|action| average[action * 2 + hand]).sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn nan_regret_is_rejected() {
        let mut trainable = DcfrTrainable::new(2, 1);
        let result = trainable.update_regrets(&[f32::NAN, 0.0], 1, &DcfrParams::default());
        assert!(matches!(result, Err(SolverError::NanRegret { .. })));
    }

    #[test]
    fn copy_strategy_synchronizes() {
        let params = DcfrParams::default();
        let mut a = DcfrTrainable::new(2, 1);
        let mut b = DcfrTrainable::new(2, 1);
        a.update_regrets(&[1.0, -1.0], 1, &params).unwrap();
        b.copy_strategy_from(&a);
        assert_eq!(a.r_plus, b.r_plus);
        assert_eq!(a.cum_r_plus, b.cum_r_plus);
        assert_eq!(a.current_strategy(), b.current_strategy());
    }
}
