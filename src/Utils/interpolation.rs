//! One-dimensional interpolants over tabulated data.
//!
//! Both interpolants sort their nodes on construction (so a decreasing
//! temperature column can be fed directly) and both extrapolate outside the
//! node range by continuing the boundary segment. Out-of-range queries are
//! never an error.
//!
//! | type | order | continuity | minimal nodes |
//! |------|-------|------------|---------------|
//! | [`LinearInterpolator`] | 1 | C0 | 2 |
//! | [`QuadraticSpline`]    | 2 | C1 | 3 (falls back to linear with 2) |
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InterpolationError {
    #[error("x and y have different lengths ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("at least {required} distinct nodes are required, got {got}")]
    TooFewNodes { required: usize, got: usize },
    #[error("non-finite node at position {0}")]
    NonFinite(usize),
}

/// sorts (x, y) pairs by x and drops repeated abscissas
fn sorted_nodes(x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>), InterpolationError> {
    if x.len() != y.len() {
        return Err(InterpolationError::LengthMismatch(x.len(), y.len()));
    }
    if let Some(i) = x
        .iter()
        .zip(y)
        .position(|(xi, yi)| !xi.is_finite() || !yi.is_finite())
    {
        return Err(InterpolationError::NonFinite(i));
    }
    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);
    Ok(pairs.into_iter().unzip())
}

/// index of the segment [x_i, x_{i+1}] used for `xq`, boundary segments for extrapolation
fn segment(x: &[f64], xq: f64) -> usize {
    let idx = x.partition_point(|&v| v <= xq);
    idx.saturating_sub(1).min(x.len() - 2)
}

/// Piecewise-linear interpolant with linear extrapolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LinearInterpolator {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, InterpolationError> {
        let (x, y) = sorted_nodes(x, y)?;
        if x.len() < 2 {
            return Err(InterpolationError::TooFewNodes {
                required: 2,
                got: x.len(),
            });
        }
        Ok(Self { x, y })
    }

    pub fn eval(&self, xq: f64) -> f64 {
        let i = segment(&self.x, xq);
        let slope = (self.y[i + 1] - self.y[i]) / (self.x[i + 1] - self.x[i]);
        self.y[i] + slope * (xq - self.x[i])
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }
}

/// C1 piecewise-quadratic interpolating spline with knots at the nodes.
///
/// On segment `i`: `q(x) = y_i + d_i (x - x_i) + c_i (x - x_i)^2`.
/// Slopes obey `d_{i+1} = 2 s_i - d_i` (s_i = secant slope) and the first two
/// segments share one parabola, i.e. `d_0` is the slope at `x_0` of the parabola
/// through the first three nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadraticSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
    c: Vec<f64>,
}

impl QuadraticSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, InterpolationError> {
        let (x, y) = sorted_nodes(x, y)?;
        let n = x.len();
        if n < 2 {
            return Err(InterpolationError::TooFewNodes {
                required: 2,
                got: n,
            });
        }
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let s: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        let mut d = vec![0.0; n];
        let mut c = vec![0.0; n - 1];
        if n == 2 {
            d[0] = s[0];
            d[1] = s[0];
        } else {
            d[0] = (s[0] * (2.0 * h[0] + h[1]) - s[1] * h[0]) / (h[0] + h[1]);
            for i in 0..n - 1 {
                d[i + 1] = 2.0 * s[i] - d[i];
                c[i] = (s[i] - d[i]) / h[i];
            }
        }
        Ok(Self { x, y, d, c })
    }

    pub fn eval(&self, xq: f64) -> f64 {
        let i = segment(&self.x, xq);
        let dx = xq - self.x[i];
        self.y[i] + self.d[i] * dx + self.c[i] * dx * dx
    }

    pub fn derivative(&self, xq: f64) -> f64 {
        let i = segment(&self.x, xq);
        self.d[i] + 2.0 * self.c[i] * (xq - self.x[i])
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }
}

/// `n` points spaced evenly in log10 between `start` and `stop`, endpoints exact.
/// Works for decreasing ranges as well.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (a, b) = (start.log10(), stop.log10());
            let step = (b - a) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| 10f64.powf(a + step * i as f64)).collect();
            v[0] = start;
            v[n - 1] = stop;
            v
        }
    }
}
