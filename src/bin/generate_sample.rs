//! Writes a synthetic test image whose spectrum has obvious peaks to carve:
//! a smooth scene (soft blobs) overlaid with periodic stripe noise and a
//! little Gaussian grain.
//!
//! Usage: `generate_sample [output.png] [--gray]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

const SIZE: u32 = 256;

fn gaussian_blob(x: f64, y: f64, cx: f64, cy: f64, sigma: f64, amplitude: f64) -> f64 {
    let d2 = (x - cx).powi(2) + (y - cy).powi(2);
    amplitude * (-d2 / (2.0 * sigma.powi(2))).exp()
}

/// Scene value in roughly [0, 1] for one channel.
fn scene(x: f64, y: f64, channel: usize) -> f64 {
    let blobs: [(f64, f64, f64, [f64; 3]); 3] = [
        (80.0, 90.0, 40.0, [0.9, 0.3, 0.2]),
        (170.0, 120.0, 55.0, [0.2, 0.7, 0.4]),
        (120.0, 200.0, 35.0, [0.3, 0.4, 0.9]),
    ];
    0.15 + blobs
        .iter()
        .map(|&(cx, cy, sigma, amp)| gaussian_blob(x, y, cx, cy, sigma, amp[channel]))
        .sum::<f64>()
}

/// Two sinusoidal gratings: each shows up as a symmetric pair of spectral
/// peaks away from the centre.
fn stripes(x: f64, y: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    0.12 * (tau * x / 8.0).sin() + 0.08 * (tau * (x + y) / 12.0).sin()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn main() -> Result<()> {
    env_logger::init();

    let mut output = PathBuf::from("sample_stripes.png");
    let mut gray = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--gray" => gray = true,
            other => output = PathBuf::from(other),
        }
    }

    let mut rng = SimpleRng::new(42);

    let img = if gray {
        DynamicImage::ImageLuma8(GrayImage::from_fn(SIZE, SIZE, |x, y| {
            let (fx, fy) = (x as f64, y as f64);
            let luma = (0..3).map(|c| scene(fx, fy, c)).sum::<f64>() / 3.0;
            Luma([to_u8(luma + stripes(fx, fy) + rng.gauss(0.0, 0.02))])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(SIZE, SIZE, |x, y| {
            let (fx, fy) = (x as f64, y as f64);
            let noise = stripes(fx, fy);
            let mut px = [0u8; 3];
            for (c, slot) in px.iter_mut().enumerate() {
                *slot = to_u8(scene(fx, fy, c) + noise + rng.gauss(0.0, 0.02));
            }
            Rgb(px)
        }))
    };

    img.save(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    log::info!("Generated {}x{} sample", SIZE, SIZE);
    println!("Wrote {}", output.display());
    Ok(())
}
