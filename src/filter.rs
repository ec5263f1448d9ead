use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Neg, Sub};

use heapless::Vec;
use nalgebra::DMatrix;

use crate::error::ConfigError;

/// Fixed capacity of coefficient and history storage.
pub const MAX_ORDER: usize = 10;

/// Mantissa width below which a filter must be low-order and well conditioned.
const DOUBLE_PRECISION_BITS: u32 = 53;
/// Smallest denominator degree that requires double precision.
const PRECISION_DEGREE: usize = 3;
/// Largest pole radius a reduced-precision filter may carry.
const PRECISION_POLE_RADIUS: f64 = 0.95;

/// Arithmetic a [`DigitalFilter`] can run in.
pub trait Sample:
    Copy
    + Debug
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const MANTISSA_BITS: u32;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
}

impl Sample for f64 {
    const ZERO: Self = 0.0;
    const MANTISSA_BITS: u32 = f64::MANTISSA_DIGITS;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
    const MANTISSA_BITS: u32 = f32::MANTISSA_DIGITS;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// A stateful direct-form digital filter with symmetric output saturation.
///
/// The filter evaluates the difference equation
///
/// y[k] = ( Σ b[i]·x[k-i] − Σ_{i≥1} a[i]·y[k-i] ) / a[0]
///
/// over `n` numerator and denominator coefficients, clamps the result to
/// `[-limit, +limit]` and feeds the clamped value back into its output
/// history. Coefficients are fixed at construction; only [`update`] and
/// [`reset`] mutate the filter afterwards.
///
/// Coefficient and history storage is a fixed-capacity [`heapless::Vec`], so a
/// filter never allocates and never truncates: an order beyond [`MAX_ORDER`]
/// is rejected by [`initialize`].
///
/// The nominal sample rate is informational. Coefficients are designed for one
/// sample period and the filter assumes it is stepped at exactly that period.
///
/// # Numeric policy
///
/// `DigitalFilter<f64>` accepts any valid coefficient set. Reduced-precision
/// instantiations (`DigitalFilter<f32>`) are refused for denominators of degree
/// three or more, or with a pole radius above 0.95, because single precision
/// drifts and biases such filters.
///
/// [`update`]: DigitalFilter::update
/// [`reset`]: DigitalFilter::reset
/// [`initialize`]: DigitalFilter::initialize
#[derive(Debug, Clone)]
pub struct DigitalFilter<T: Sample = f64> {
    numerator: Vec<T, MAX_ORDER>,
    denominator: Vec<T, MAX_ORDER>,
    output_limit: T,
    sample_rate_hz: f64,
    /// Newest first, `inputs[0]` is the latest sample.
    inputs: Vec<T, MAX_ORDER>,
    /// Newest first, `outputs[0]` is the latest clamped output.
    outputs: Vec<T, MAX_ORDER>,
    pole_radius: f64,
}

impl<T: Sample> DigitalFilter<T> {
    /// Builds a filter at rest from a numerator/denominator pair.
    ///
    /// # Arguments
    ///
    /// * `numerator` - b coefficients, index 0 weights the current input
    /// * `denominator` - a coefficients, index 0 normalizes the output (usually 1.0)
    /// * `output_limit` - symmetric saturation bound
    /// * `sample_rate_hz` - rate the coefficients were designed for
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the order is zero or above [`MAX_ORDER`],
    /// the two arrays differ in length, a coefficient is not finite, `a[0]` is
    /// zero, the limit is negative or not finite, or `T` is too narrow for the
    /// denominator under the numeric policy.
    pub fn initialize(
        numerator: &[f64],
        denominator: &[f64],
        output_limit: f64,
        sample_rate_hz: f64,
    ) -> Result<Self, ConfigError> {
        if denominator.is_empty() {
            return Err(ConfigError::EmptyFilter);
        }
        let order = denominator.len().max(numerator.len());
        if order > MAX_ORDER {
            return Err(ConfigError::OrderTooLarge {
                order,
                capacity: MAX_ORDER,
            });
        }
        if numerator.len() != denominator.len() {
            return Err(ConfigError::LengthMismatch {
                numerator: numerator.len(),
                denominator: denominator.len(),
            });
        }
        if let Some(index) = numerator
            .iter()
            .chain(denominator)
            .position(|c| !c.is_finite())
        {
            return Err(ConfigError::NonFiniteCoefficient { index });
        }
        if denominator[0] == 0.0 {
            return Err(ConfigError::ZeroLeadingDenominator);
        }
        if !output_limit.is_finite() || output_limit < 0.0 {
            return Err(ConfigError::InvalidOutputLimit(output_limit));
        }

        let degree = denominator_degree(denominator);
        let pole_radius = pole_radius(denominator);
        if T::MANTISSA_BITS < DOUBLE_PRECISION_BITS
            && (degree >= PRECISION_DEGREE || pole_radius > PRECISION_POLE_RADIUS)
        {
            return Err(ConfigError::InsufficientPrecision {
                degree,
                pole_radius,
                mantissa_bits: T::MANTISSA_BITS,
            });
        }

        let zeros = [0.0; MAX_ORDER];
        Ok(Self {
            numerator: to_samples(numerator)?,
            denominator: to_samples(denominator)?,
            output_limit: T::from_f64(output_limit),
            sample_rate_hz,
            inputs: to_samples(&zeros[..order])?,
            outputs: to_samples(&zeros[..order])?,
            pole_radius,
        })
    }

    /// Advances the filter by one sample and returns the clamped output.
    ///
    /// `input` must be finite. Inputs come from validated estimator outputs;
    /// a NaN would pass the saturation unchanged and poison the output
    /// history until the next [`reset`](Self::reset).
    ///
    /// # Panics
    ///
    /// In debug builds, when `input` is NaN or infinite.
    pub fn update(&mut self, input: T) -> T {
        debug_assert!(input.to_f64().is_finite(), "non-finite input {input:?}");
        self.inputs.rotate_right(1);
        self.inputs[0] = input;
        // After the shift outputs[1..] holds y[k-1], y[k-2], ...
        self.outputs.rotate_right(1);

        let forward = self
            .numerator
            .iter()
            .zip(self.inputs.iter())
            .fold(T::ZERO, |acc, (b, x)| acc + *b * *x);
        let feedback = self
            .denominator
            .iter()
            .zip(self.outputs.iter())
            .skip(1)
            .fold(T::ZERO, |acc, (a, y)| acc + *a * *y);

        let unclamped = (forward - feedback) / self.denominator[0];
        let output = saturate(unclamped, self.output_limit);
        self.outputs[0] = output;
        output
    }

    /// Zeroes both histories. Coefficients and limit are kept.
    pub fn reset(&mut self) {
        self.inputs.iter_mut().for_each(|x| *x = T::ZERO);
        self.outputs.iter_mut().for_each(|y| *y = T::ZERO);
    }

    /// Number of coefficients `n`.
    pub fn order(&self) -> usize {
        self.denominator.len()
    }

    /// b coefficients, index 0 weights the current input.
    pub fn numerator(&self) -> &[T] {
        &self.numerator
    }

    /// a coefficients, index 0 normalizes the output.
    pub fn denominator(&self) -> &[T] {
        &self.denominator
    }

    /// Symmetric saturation bound.
    pub fn output_limit(&self) -> T {
        self.output_limit
    }

    /// Rate the coefficients were designed for. Never used to rescale them.
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Most recent clamped output, zero at rest.
    pub fn last_output(&self) -> T {
        self.outputs[0]
    }

    /// Input history, newest first.
    pub fn input_history(&self) -> &[T] {
        &self.inputs
    }

    /// Output history, newest first.
    pub fn output_history(&self) -> &[T] {
        &self.outputs
    }

    /// True when every retained sample is zero.
    pub fn is_at_rest(&self) -> bool {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .all(|s| s.to_f64() == 0.0)
    }

    /// Largest pole magnitude of the denominator.
    pub fn pole_radius(&self) -> f64 {
        self.pole_radius
    }

    /// True when every pole lies strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.pole_radius < 1.0
    }

    /// Steady-state gain `Σb / Σa`, or `None` for a pole at z = 1.
    pub fn dc_gain(&self) -> Option<f64> {
        let b: f64 = self.numerator.iter().map(|c| c.to_f64()).sum();
        let a: f64 = self.denominator.iter().map(|c| c.to_f64()).sum();
        (a.abs() > f64::EPSILON).then(|| b / a)
    }
}

fn saturate<T: Sample>(value: T, limit: T) -> T {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

fn to_samples<T: Sample>(values: &[f64]) -> Result<Vec<T, MAX_ORDER>, ConfigError> {
    let mut samples = Vec::new();
    for value in values {
        samples
            .push(T::from_f64(*value))
            .map_err(|_| ConfigError::OrderTooLarge {
                order: values.len(),
                capacity: MAX_ORDER,
            })?;
    }
    Ok(samples)
}

/// Index of the last non-zero denominator coefficient.
fn denominator_degree(denominator: &[f64]) -> usize {
    denominator.iter().rposition(|a| *a != 0.0).unwrap_or(0)
}

/// Largest pole magnitude of `a[0] z^d + a[1] z^(d-1) + ... + a[d]`.
///
/// The poles are the eigenvalues of the polynomial's companion matrix.
pub fn pole_radius(denominator: &[f64]) -> f64 {
    let degree = denominator_degree(denominator);
    if degree == 0 {
        return 0.0;
    }
    let lead = denominator[0];

    let mut companion = DMatrix::<f64>::zeros(degree, degree);
    for (j, a) in denominator[1..=degree].iter().enumerate() {
        companion[(0, j)] = -*a / lead;
    }
    for i in 1..degree {
        companion[(i, i - 1)] = 1.0;
    }

    companion
        .complex_eigenvalues()
        .iter()
        .map(|pole| pole.norm())
        .fold(0.0, f64::max)
}
