//! Uniform partitioned FFT convolution.

use rustfft::{FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Processing block size in samples. The convolver introduces exactly one
/// block of latency.
pub const BLOCK_SIZE: usize = 512;

/// Mono convolver using uniform partitioned overlap-add.
///
/// The impulse response is split into [`BLOCK_SIZE`] partitions which are
/// convolved in the frequency domain against a delay line of recent input
/// spectra. Cost per block is one forward FFT, one multiply-accumulate per
/// partition, and one inverse FFT, so long reverb tails stay affordable.
pub struct FftConvolver {
    fft: Arc<dyn rustfft::Fft<f32>>,
    ifft: Arc<dyn rustfft::Fft<f32>>,
    /// Spectra of the impulse-response partitions, oldest lag last.
    partitions: Vec<Vec<Complex<f32>>>,
    /// Ring of input-block spectra, one per partition.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_pos: usize,
    input: Vec<f32>,
    input_pos: usize,
    output: Vec<f32>,
    overlap: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
}

impl FftConvolver {
    /// Build a convolver for the given impulse response.
    ///
    /// An empty impulse response yields a convolver that outputs silence.
    pub fn new(impulse: &[f32]) -> Self {
        let fft_size = BLOCK_SIZE * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let partition_count = impulse.len().div_ceil(BLOCK_SIZE).max(1);
        let mut partitions = Vec::with_capacity(partition_count);
        for part in 0..partition_count {
            let start = part * BLOCK_SIZE;
            let end = (start + BLOCK_SIZE).min(impulse.len());
            let mut spectrum = vec![Complex::new(0.0, 0.0); fft_size];
            for (bin, &h) in spectrum.iter_mut().zip(&impulse[start.min(impulse.len())..end]) {
                *bin = Complex::new(h, 0.0);
            }
            fft.process(&mut spectrum);
            partitions.push(spectrum);
        }

        let fdl = vec![vec![Complex::new(0.0, 0.0); fft_size]; partition_count];

        Self {
            fft,
            ifft,
            partitions,
            fdl,
            fdl_pos: 0,
            input: vec![0.0; BLOCK_SIZE],
            input_pos: 0,
            output: vec![0.0; BLOCK_SIZE],
            overlap: vec![0.0; BLOCK_SIZE],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            accum: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    /// Total impulse-response length covered, in samples.
    pub fn tail_len(&self) -> usize {
        self.partitions.len() * BLOCK_SIZE
    }

    /// Feed one input sample and return one output sample.
    ///
    /// Output lags input by [`BLOCK_SIZE`] samples.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let out = self.output[self.input_pos];
        self.input[self.input_pos] = sample;
        self.input_pos += 1;
        if self.input_pos == BLOCK_SIZE {
            self.process_block();
            self.input_pos = 0;
        }
        out
    }

    fn process_block(&mut self) {
        let fft_size = BLOCK_SIZE * 2;

        for (bin, &x) in self.scratch.iter_mut().zip(&self.input) {
            *bin = Complex::new(x, 0.0);
        }
        for bin in &mut self.scratch[BLOCK_SIZE..] {
            *bin = Complex::new(0.0, 0.0);
        }
        self.fft.process(&mut self.scratch);
        self.fdl[self.fdl_pos].copy_from_slice(&self.scratch);

        self.accum.fill(Complex::new(0.0, 0.0));
        let slots = self.fdl.len();
        for (lag, partition) in self.partitions.iter().enumerate() {
            let slot = (self.fdl_pos + slots - lag) % slots;
            for ((acc, &x), &h) in self.accum.iter_mut().zip(&self.fdl[slot]).zip(partition) {
                *acc += x * h;
            }
        }
        self.fdl_pos = (self.fdl_pos + 1) % slots;

        self.ifft.process(&mut self.accum);

        // rustfft leaves the inverse transform unnormalized
        let scale = 1.0 / fft_size as f32;
        for i in 0..BLOCK_SIZE {
            self.output[i] = self.accum[i].re * scale + self.overlap[i];
            self.overlap[i] = self.accum[BLOCK_SIZE + i].re * scale;
        }
    }

    /// Clear all buffered input, output, and tail state.
    pub fn reset(&mut self) {
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.overlap.fill(0.0);
        for slot in &mut self.fdl {
            slot.fill(Complex::new(0.0, 0.0));
        }
        self.fdl_pos = 0;
        self.input_pos = 0;
    }
}

impl std::fmt::Debug for FftConvolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftConvolver")
            .field("partitions", &self.partitions.len())
            .field("input_pos", &self.input_pos)
            .finish_non_exhaustive()
    }
}
