use anyhow::{ensure, Result};

/// Linear-interpolation resampling of mono PCM.
///
/// The output holds `ceil(len * target / source)` samples; positions past
/// the last input sample repeat it.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let step = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / step).ceil().max(1.0) as usize;
    let last = samples.len() - 1;
    Ok((0..output_len)
        .map(|index| {
            let position = index as f64 * step;
            let left = (position.floor() as usize).min(last);
            let right = (left + 1).min(last);
            let t = (position - left as f64) as f32;
            samples[left] + (samples[right] - samples[left]) * t
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::linear_resample;
    use approx::assert_abs_diff_eq;

    #[test]
    fn downsampling_keeps_constant_level() {
        let input = vec![0.5; 44_100];
        let output = linear_resample(&input, 44_100, 22_050).unwrap();
        assert_eq!(output.len(), 22_050);
        assert!(output.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn upsampling_interpolates_between_samples() {
        let output = linear_resample(&[0.0, 1.0], 1, 2).unwrap();
        assert_eq!(output.len(), 4);
        assert_abs_diff_eq!(output[1], 0.5);
        assert_abs_diff_eq!(output[2], 1.0);
    }

    #[test]
    fn rejects_zero_rates() {
        assert!(linear_resample(&[0.1], 0, 22_050).is_err());
        assert!(linear_resample(&[0.1], 22_050, 0).is_err());
    }
}
