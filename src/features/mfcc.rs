use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

pub const FFT_SIZE: usize = 2048;
pub const HOP_SIZE: usize = 512;
pub const MEL_BANDS: usize = 128;
pub const MFCC_COUNT: usize = 20;
const MIN_FREQ: f64 = 0.0;
const MEL_FLOOR: f64 = 1e-10;

/// Compute the MFCC matrix of a mono waveform, laid out as coefficient × frame.
///
/// Frames are centered: the signal is zero-padded by half a window on each
/// side. The STFT can emit one trailing partial frame past the end of the
/// signal; it is dropped so a waveform of `n` samples yields exactly
/// [`frame_count`]`(n)` frames.
pub fn mfcc_matrix(samples: &[f32], sample_rate: u32) -> Array2<f32> {
    let centered = center_pad(samples, FFT_SIZE / 2);

    let stft = spectrum::rstft(&centered, FFT_SIZE, HOP_SIZE, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);

    let freqs = spectrum::rfftfreq(FFT_SIZE, sample_rate);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (sample_rate as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mut mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    for frame in mel.iter_mut() {
        for energy in frame.iter_mut() {
            *energy = energy.max(MEL_FLOOR);
        }
    }

    let mut frames = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);
    frames.truncate(frame_count(samples.len()));
    coefficient_major(&frames)
}

/// Number of centered frames whose start lies inside `sample_count` samples.
pub fn frame_count(sample_count: usize) -> usize {
    1 + sample_count / HOP_SIZE
}

fn center_pad(samples: &[f32], pad: usize) -> Vec<f64> {
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, 0.0);
    padded.extend(samples.iter().map(|&s| s as f64));
    padded.resize(padded.len() + pad, 0.0);
    padded
}

/// Transpose frame-major rows into a coefficient × frame matrix.
fn coefficient_major(frames: &[Vec<f64>]) -> Array2<f32> {
    let coeffs = frames.first().map_or(0, Vec::len);
    Array2::from_shape_fn((coeffs, frames.len()), |(c, f)| {
        frames[f].get(c).copied().unwrap_or(0.0) as f32
    })
}
