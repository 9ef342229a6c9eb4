//! Submodule providing the random initializer descriptors.

use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};

use crate::{error::TensorError, math::Real};

/// How lazily materialized rows and freshly allocated tensors are
/// filled.
///
/// Each variant has a stable wire tag used when an initializer is
/// embedded in a serialized sparse row matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Initializer<T> {
    /// Leave the storage as is.
    #[default]
    None,
    /// Fill with zero.
    Zeros,
    /// Fill with one.
    Ones,
    /// Fill with a constant.
    Constant(T),
    /// Uniform distribution over `[min, max)`.
    Rand {
        /// Lower bound, inclusive.
        min: T,
        /// Upper bound, exclusive.
        max: T,
    },
    /// Normal distribution.
    Randn {
        /// Mean of the distribution.
        mean: T,
        /// Standard deviation of the distribution.
        stddev: T,
    },
    /// LeCun uniform initializer (fan-in scaled).
    RandLecun,
    /// LeCun normal initializer.
    RandnLecun,
    /// Xavier/Glorot uniform initializer (fan-average scaled).
    RandXavier,
    /// Xavier/Glorot normal initializer.
    RandnXavier,
    /// He uniform initializer (fan-in scaled, gain 2).
    RandHe,
    /// He normal initializer.
    RandnHe,
    /// Uniform integers over `[min, max)`.
    RandInt {
        /// Lower bound, inclusive.
        min: T,
        /// Upper bound, exclusive.
        max: T,
    },
    /// Fill with 0, 1, 2, ...
    Arange,
}

impl<T: Real> Initializer<T> {
    /// Returns the wire tag of the initializer.
    #[must_use]
    pub fn kind(&self) -> i32 {
        match self {
            Self::None => 0,
            Self::Zeros => 1,
            Self::Ones => 2,
            Self::Constant(_) => 3,
            Self::Rand { .. } => 4,
            Self::Randn { .. } => 5,
            Self::RandLecun => 6,
            Self::RandnLecun => 7,
            Self::RandXavier => 8,
            Self::RandnXavier => 9,
            Self::RandHe => 10,
            Self::RandnHe => 11,
            Self::RandInt { .. } => 12,
            Self::Arange => 13,
        }
    }

    /// Returns the two wire parameters of the initializer.
    #[must_use]
    pub fn params(&self) -> (T, T) {
        match *self {
            Self::Constant(c) => (c, T::zero()),
            Self::Rand { min, max } | Self::RandInt { min, max } => (min, max),
            Self::Randn { mean, stddev } => (mean, stddev),
            _ => (T::zero(), T::zero()),
        }
    }

    /// Rebuilds an initializer from its wire triple.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidInitializer`] on an unknown tag or
    /// inconsistent parameters.
    pub fn from_parts(kind: i32, param1: T, param2: T) -> Result<Self, TensorError> {
        let init = match kind {
            0 => Self::None,
            1 => Self::Zeros,
            2 => Self::Ones,
            3 => Self::Constant(param1),
            4 => Self::Rand { min: param1, max: param2 },
            5 => Self::Randn { mean: param1, stddev: param2 },
            6 => Self::RandLecun,
            7 => Self::RandnLecun,
            8 => Self::RandXavier,
            9 => Self::RandnXavier,
            10 => Self::RandHe,
            11 => Self::RandnHe,
            12 => Self::RandInt { min: param1, max: param2 },
            13 => Self::Arange,
            _ => {
                return Err(TensorError::InvalidInitializer {
                    kind,
                    param1: param1.to_f64().unwrap_or(f64::NAN),
                    param2: param2.to_f64().unwrap_or(f64::NAN),
                })
            }
        };
        init.validate()?;
        Ok(init)
    }

    /// Checks the parameters for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidInitializer`] when `Rand`/`RandInt`
    /// has `min > max` or `Randn` has a negative standard deviation.
    pub fn validate(&self) -> Result<(), TensorError> {
        let invalid = || {
            let (p1, p2) = self.params();
            TensorError::InvalidInitializer {
                kind: self.kind(),
                param1: p1.to_f64().unwrap_or(f64::NAN),
                param2: p2.to_f64().unwrap_or(f64::NAN),
            }
        };
        match *self {
            Self::Rand { min, max } | Self::RandInt { min, max } if min > max => Err(invalid()),
            Self::Randn { stddev, .. } if stddev < T::zero() => Err(invalid()),
            _ => Ok(()),
        }
    }
}

pub(crate) fn fill_constant<T: Copy>(data: &mut [T], c: T) {
    for v in data.iter_mut() {
        *v = c;
    }
}

pub(crate) fn fill_arange<T: Real>(data: &mut [T]) {
    for (i, v) in data.iter_mut().enumerate() {
        *v = T::from_usize(i);
    }
}

pub(crate) fn fill_rand<T: Real, R: Rng + ?Sized>(rng: &mut R, data: &mut [T], min: T, max: T) {
    assert!(min <= max, "invalid uniform range [{min}, {max})");
    if min == max {
        fill_constant(data, min);
        return;
    }
    let dist = Uniform::new(min, max);
    for v in data.iter_mut() {
        *v = dist.sample(rng);
    }
}

pub(crate) fn fill_randn<T: Real, R: Rng + ?Sized>(rng: &mut R, data: &mut [T], mean: T, stddev: T) {
    assert!(stddev >= T::zero(), "invalid standard deviation {stddev}");
    for v in data.iter_mut() {
        *v = mean + stddev * T::standard_normal(rng);
    }
}

/// Normal samples redrawn until they fall within two standard
/// deviations of the mean.
pub(crate) fn fill_randn_truncated<T: Real, R: Rng + ?Sized>(
    rng: &mut R,
    data: &mut [T],
    mean: T,
    stddev: T,
) {
    assert!(stddev >= T::zero(), "invalid standard deviation {stddev}");
    let two = T::from_i32(2);
    let lower = mean - two * stddev;
    let upper = mean + two * stddev;
    for v in data.iter_mut() {
        loop {
            let x = mean + stddev * T::standard_normal(rng);
            if x >= lower && x <= upper {
                *v = x;
                break;
            }
        }
    }
}

pub(crate) fn fill_rand_int<T: Real, R: Rng + ?Sized>(rng: &mut R, data: &mut [T], min: i32, max: i32) {
    assert!(min <= max, "invalid integer range [{min}, {max})");
    if min == max {
        fill_constant(data, T::from_i32(min));
        return;
    }
    let dist = Uniform::new(min, max);
    for v in data.iter_mut() {
        *v = T::from_i32(dist.sample(rng));
    }
}
