use crate::types::AudioData;

/// Linearly resample `samples` from `source_rate` to `target_rate`.
///
/// Returns `None` when either rate is zero.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Option<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return None;
    }
    if samples.is_empty() || source_rate == target_rate {
        return Some(samples.to_vec());
    }
    let step = source_rate as f64 / target_rate as f64;
    let output_len = ((samples.len() as f64) / step).ceil().max(1.0) as usize;
    let last_index = samples.len() - 1;
    let output = (0..output_len)
        .map(|i| {
            let position = i as f64 * step;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = (position - left as f64) as f32;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect();
    Some(output)
}

/// Bring a decoded waveform to `target_rate`, leaving it untouched if it already matches.
pub fn to_sample_rate(audio: AudioData, target_rate: u32) -> Option<AudioData> {
    if audio.sample_rate == target_rate {
        return Some(audio);
    }
    let samples = linear_resample(&audio.samples, audio.sample_rate, target_rate)?;
    Some(AudioData::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::{linear_resample, to_sample_rate};
    use crate::types::AudioData;

    #[test]
    fn preserves_constant_signal_after_downsample() {
        let input = vec![0.5; 441];
        let resampled = linear_resample(&input, 44_100, 22_050).unwrap();
        assert_eq!(resampled.len(), 221);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn upsample_interpolates_between_neighbours() {
        let resampled = linear_resample(&[0.0, 1.0], 1, 2).unwrap();
        assert_eq!(resampled, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(linear_resample(&[0.1], 0, 22_050).is_none());
        assert!(to_sample_rate(AudioData::new(vec![0.1], 22_050), 0).is_none());
    }

    #[test]
    fn matching_rate_is_passthrough() {
        let audio = AudioData::new(vec![0.1, 0.2, 0.3], 22_050);
        let same = to_sample_rate(audio, 22_050).unwrap();
        assert_eq!(same.samples, vec![0.1, 0.2, 0.3]);
    }
}
