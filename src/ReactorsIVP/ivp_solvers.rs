//! # Initial value problem solvers
//!
//! Adaptive one-step integrators for `dy/dt = f(t, y)` behind one strategy
//! interface:
//!
//! - [`Rosenbrock23`]: linearly implicit Rosenbrock 2(3) pair (the `ode23s`
//!   scheme). L-stable, uses the Jacobian directly and needs no Newton
//!   iteration. Default back-end for the stiff background and network eras.
//! - [`Sdirk2`]: L-stable singly diagonally implicit RK 2(1) with simplified
//!   Newton iterations. Alternate stiff back-end.
//! - [`DormandPrince45`]: explicit 5(4) pair from `ode_solvers` for the
//!   non-stiff n↔p era.
//!
//! All of them produce a [`Trajectory`] at exactly the requested output
//! times. Without output times the implicit methods store every accepted
//! step and Dormand–Prince stores the start and end points. The implicit
//! methods interpolate with cubic Hermite polynomials on the accepted steps.
//!
//! ```rust, ignore
//! struct Decay;
//! impl OdeSystem for Decay {
//!     fn ndim(&self) -> usize { 1 }
//!     fn rhs(&self, _t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>) { dydt[0] = -y[0]; }
//! }
//! let solver = create_solver(SolverBackend::Default);
//! let traj = solver.solve(&Decay, &DVector::from_element(1, 1.0), (0.0, 1.0), &[], 1e-6, 1e-9)?;
//! ```
use crate::settings::SolverBackend;
use enum_dispatch::enum_dispatch;
use log::debug;
use nalgebra::{DMatrix, DVector};
use ode_solvers::{Dopri5, System};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IvpError {
    #[error("initial state has {got} components, the system has {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("invalid time span ({0}, {1}): need finite t0 < t1")]
    InvalidSpan(f64, f64),
    #[error("invalid tolerances: rtol = {rtol}, atol = {atol}")]
    InvalidTolerance { rtol: f64, atol: f64 },
    #[error("output times must be sorted and inside the time span")]
    InvalidOutputTimes,
    #[error("step size {h:.3e} underflow at t = {t:.6e}")]
    StepSizeTooSmall { t: f64, h: f64 },
    #[error("{max_steps} steps exceeded at t = {t:.6e}")]
    MaxSteps { max_steps: usize, t: f64 },
    #[error("singular iteration matrix at t = {t:.6e}")]
    SingularMatrix { t: f64 },
    #[error("non-finite right-hand side at t = {t:.6e}")]
    NonFinite { t: f64 },
    #[error("integration failed at t = {t:.6e}: {reason}")]
    Backend { t: f64, reason: String },
}

/// Right-hand side of `dy/dt = f(t, y)`.
pub trait OdeSystem {
    fn ndim(&self) -> usize;

    fn rhs(&self, t: f64, y: &DVector<f64>, dydt: &mut DVector<f64>);

    /// ∂f/∂y. The default uses central differences; networks override it
    /// with their analytic Jacobian.
    fn jacobian(&self, t: f64, y: &DVector<f64>, jac: &mut DMatrix<f64>) {
        let n = self.ndim();
        let mut yp = y.clone();
        let mut fp = DVector::zeros(n);
        let mut fm = DVector::zeros(n);
        for j in 0..n {
            let orig = yp[j];
            let h = 1e-7 * orig.abs().max(1e-8);
            yp[j] = orig + h;
            self.rhs(t, &yp, &mut fp);
            yp[j] = orig - h;
            self.rhs(t, &yp, &mut fm);
            yp[j] = orig;
            for i in 0..n {
                jac[(i, j)] = (fp[i] - fm[i]) / (2.0 * h);
            }
        }
    }

    /// ∂f/∂t by a forward difference, zero for autonomous systems.
    fn time_derivative(&self, t: f64, y: &DVector<f64>, f0: &DVector<f64>, dfdt: &mut DVector<f64>) {
        let dt = f64::EPSILON.sqrt() * t.abs().max(1e-10);
        let mut f1 = DVector::zeros(self.ndim());
        self.rhs(t + dt, y, &mut f1);
        dfdt.copy_from(&((f1 - f0) / dt));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub y: Vec<DVector<f64>>,
    pub n_steps: usize,
    pub n_rejected: usize,
}

impl Trajectory {
    fn new() -> Self {
        Trajectory {
            t: Vec::new(),
            y: Vec::new(),
            n_steps: 0,
            n_rejected: 0,
        }
    }
    /// state at the last stored time
    pub fn last(&self) -> Option<&DVector<f64>> {
        self.y.last()
    }
    /// time series of one component
    pub fn component(&self, i: usize) -> Vec<f64> {
        self.y.iter().map(|y| y[i]).collect()
    }
    pub fn len(&self) -> usize {
        self.t.len()
    }
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Step-control settings shared by all methods.
#[derive(Debug, Clone, PartialEq)]
pub struct StepControl {
    /// first step; 0 chooses it from the initial derivative
    pub h0: f64,
    pub h_max: f64,
    pub max_steps: usize,
}

impl Default for StepControl {
    fn default() -> Self {
        StepControl {
            h0: 0.0,
            h_max: f64::INFINITY,
            max_steps: 1_000_000,
        }
    }
}

#[enum_dispatch]
pub trait IvpSolve {
    fn name(&self) -> &'static str;
    /// Integrates from `t_span.0` to `t_span.1`. With empty `t_eval` the
    /// method decides which steps are stored, otherwise exactly the
    /// requested times are.
    fn solve(
        &self,
        system: &dyn OdeSystem,
        y0: &DVector<f64>,
        t_span: (f64, f64),
        t_eval: &[f64],
        rtol: f64,
        atol: f64,
    ) -> Result<Trajectory, IvpError>;
}

#[derive(Debug, Clone)]
#[enum_dispatch(IvpSolve)]
pub enum IvpSolver {
    Rosenbrock23(Rosenbrock23),
    Sdirk2(Sdirk2),
    DormandPrince45(DormandPrince45),
}

/// stiff solver for the configured back-end
pub fn create_solver(backend: SolverBackend) -> IvpSolver {
    match backend {
        SolverBackend::Default => IvpSolver::Rosenbrock23(Rosenbrock23::default()),
        SolverBackend::Alternate => IvpSolver::Sdirk2(Sdirk2::default()),
    }
}

////////////////////////////////////////// SHARED MACHINERY //////////////////////////////////////////

fn check_problem(
    system: &dyn OdeSystem,
    y0: &DVector<f64>,
    t_span: (f64, f64),
    t_eval: &[f64],
    rtol: f64,
    atol: f64,
) -> Result<(), IvpError> {
    let n = system.ndim();
    if y0.len() != n {
        return Err(IvpError::DimensionMismatch {
            expected: n,
            got: y0.len(),
        });
    }
    let (t0, t1) = t_span;
    if !t0.is_finite() || !t1.is_finite() || t1 <= t0 {
        return Err(IvpError::InvalidSpan(t0, t1));
    }
    if !(rtol > 0.0 && atol > 0.0 && rtol.is_finite() && atol.is_finite()) {
        return Err(IvpError::InvalidTolerance { rtol, atol });
    }
    // output grids often come from exp(ln t) round trips, allow a few ulps
    let slack = 1e-12 * (t0.abs() + t1.abs());
    let sorted = t_eval.windows(2).all(|w| w[0] <= w[1]);
    let inside = t_eval.iter().all(|&t| t >= t0 - slack && t <= t1 + slack);
    if !sorted || !inside {
        return Err(IvpError::InvalidOutputTimes);
    }
    Ok(())
}

/// weighted RMS norm of a local error estimate
fn error_norm(err: &DVector<f64>, y: &DVector<f64>, y_new: &DVector<f64>, rtol: f64, atol: f64) -> f64 {
    let n = err.len() as f64;
    let sum: f64 = err
        .iter()
        .zip(y.iter().zip(y_new.iter()))
        .map(|(e, (a, b))| {
            let sc = atol + rtol * a.abs().max(b.abs());
            (e / sc).powi(2)
        })
        .sum();
    (sum / n).sqrt()
}

/// Hairer's starting step from the scale of y0 and f(t0, y0), capped by the span.
fn initial_step(control: &StepControl, y0: &DVector<f64>, f0: &DVector<f64>, span: f64, rtol: f64, atol: f64) -> f64 {
    if control.h0 > 0.0 {
        return control.h0.min(span);
    }
    let zero = DVector::zeros(y0.len());
    let d0 = error_norm(y0, y0, &zero, rtol, atol);
    let d1 = error_norm(f0, y0, &zero, rtol, atol);
    let h = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6 * span
    } else {
        0.01 * d0 / d1
    };
    h.min(span).min(control.h_max)
}

fn min_step(t: f64) -> f64 {
    16.0 * f64::EPSILON * t.abs().max(f64::MIN_POSITIVE)
}

fn finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Collects the solution either at every accepted step or at requested times.
struct DenseOutput<'a> {
    t_eval: &'a [f64],
    next: usize,
    traj: Trajectory,
}

impl<'a> DenseOutput<'a> {
    fn new(t_eval: &'a [f64], t0: f64, y0: &DVector<f64>) -> Self {
        let mut out = DenseOutput {
            t_eval,
            next: 0,
            traj: Trajectory::new(),
        };
        if t_eval.is_empty() {
            out.traj.t.push(t0);
            out.traj.y.push(y0.clone());
        } else {
            while out.next < t_eval.len() && t_eval[out.next] <= t0 {
                out.traj.t.push(t_eval[out.next]);
                out.traj.y.push(y0.clone());
                out.next += 1;
            }
        }
        out
    }

    /// Records an accepted step [ta, tb] given states and slopes at both ends.
    fn push_step(
        &mut self,
        (ta, ya, fa): (f64, &DVector<f64>, &DVector<f64>),
        (tb, yb, fb): (f64, &DVector<f64>, &DVector<f64>),
        last: bool,
    ) {
        self.traj.n_steps += 1;
        if self.t_eval.is_empty() {
            self.traj.t.push(tb);
            self.traj.y.push(yb.clone());
            return;
        }
        let h = tb - ta;
        while self.next < self.t_eval.len() && (self.t_eval[self.next] <= tb || last) {
            let tq = self.t_eval[self.next];
            let s = ((tq - ta) / h).clamp(0.0, 1.0);
            let s2 = s * s;
            let s3 = s2 * s;
            let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
            let h10 = s3 - 2.0 * s2 + s;
            let h01 = -2.0 * s3 + 3.0 * s2;
            let h11 = s3 - s2;
            let y = ya * h00 + fa * (h10 * h) + yb * h01 + fb * (h11 * h);
            self.traj.t.push(tq);
            self.traj.y.push(y);
            self.next += 1;
        }
    }

    fn reject(&mut self) {
        self.traj.n_rejected += 1;
    }

    fn finish(self, name: &str) -> Trajectory {
        debug!(
            "{}: {} accepted, {} rejected steps",
            name, self.traj.n_steps, self.traj.n_rejected
        );
        self.traj
    }
}

/// Next step size from an error norm of a method with error exponent `1/(q+1)`.
fn step_factor(err: f64, q: f64) -> f64 {
    if err == 0.0 {
        5.0
    } else {
        (0.9 * err.powf(-1.0 / (q + 1.0))).clamp(0.2, 5.0)
    }
}

////////////////////////////////////////// ROSENBROCK 2(3) //////////////////////////////////////////

/// Shampine–Reichelt Rosenbrock pair, W = I − h d J with d = 1/(2 + √2).
#[derive(Debug, Clone, Default)]
pub struct Rosenbrock23 {
    pub control: StepControl,
}

impl IvpSolve for Rosenbrock23 {
    fn name(&self) -> &'static str {
        "Rosenbrock23"
    }

    fn solve(
        &self,
        system: &dyn OdeSystem,
        y0: &DVector<f64>,
        t_span: (f64, f64),
        t_eval: &[f64],
        rtol: f64,
        atol: f64,
    ) -> Result<Trajectory, IvpError> {
        check_problem(system, y0, t_span, t_eval, rtol, atol)?;
        let n = system.ndim();
        let d = 1.0 / (2.0 + 2f64.sqrt());
        let e32 = 6.0 + 2f64.sqrt();
        let (t0, t1) = t_span;

        let mut t = t0;
        let mut y = y0.clone();
        let mut f0 = DVector::zeros(n);
        system.rhs(t, &y, &mut f0);
        if !finite(&f0) {
            return Err(IvpError::NonFinite { t });
        }
        let mut h = initial_step(&self.control, &y, &f0, t1 - t0, rtol, atol);
        let mut out = DenseOutput::new(t_eval, t0, y0);

        let mut jac = DMatrix::zeros(n, n);
        let mut dfdt = DVector::zeros(n);
        let mut f1 = DVector::zeros(n);
        let mut f2 = DVector::zeros(n);
        let mut fresh_jacobian = false;

        for _ in 0..self.control.max_steps {
            if !fresh_jacobian {
                system.jacobian(t, &y, &mut jac);
                system.time_derivative(t, &y, &f0, &mut dfdt);
                fresh_jacobian = true;
            }
            h = h.min(self.control.h_max);
            let last = t + h >= t1;
            if last {
                h = t1 - t;
            }
            if h < min_step(t) {
                return Err(IvpError::StepSizeTooSmall { t, h });
            }

            let w = DMatrix::identity(n, n) - &jac * (h * d);
            let lu = w.lu();
            let solve = |b: DVector<f64>| lu.solve(&b).ok_or(IvpError::SingularMatrix { t });

            let k1 = solve(&f0 + &dfdt * (h * d))?;
            system.rhs(t + 0.5 * h, &(&y + &k1 * (0.5 * h)), &mut f1);
            let k2 = solve(&f1 - &k1)? + &k1;
            let y_new = &y + &k2 * h;
            let t_new = if last { t1 } else { t + h };
            system.rhs(t_new, &y_new, &mut f2);
            let k3 = solve(&f2 - (&k2 - &f1) * e32 - (&k1 - &f0) * 2.0 + &dfdt * (h * d))?;
            let err = (&k1 - &k2 * 2.0 + &k3) * (h / 6.0);
            let err_norm = error_norm(&err, &y, &y_new, rtol, atol);

            if !err_norm.is_finite() || !finite(&f2) {
                out.reject();
                h *= 0.25;
                continue;
            }
            if err_norm <= 1.0 {
                out.push_step((t, &y, &f0), (t_new, &y_new, &f2), last);
                t = t_new;
                y = y_new;
                f0.copy_from(&f2);
                fresh_jacobian = false;
                if last {
                    return Ok(out.finish(self.name()));
                }
            } else {
                out.reject();
            }
            h *= step_factor(err_norm, 2.0);
        }
        Err(IvpError::MaxSteps {
            max_steps: self.control.max_steps,
            t,
        })
    }
}

////////////////////////////////////////// SDIRK 2(1) //////////////////////////////////////////

/// Two-stage L-stable SDIRK with γ = 1 − 1/√2 and an embedded first order
/// solution; stages are solved by simplified Newton with a frozen Jacobian.
#[derive(Debug, Clone)]
pub struct Sdirk2 {
    pub control: StepControl,
    pub max_newton: usize,
    /// Newton convergence threshold relative to the error weights
    pub newton_tol: f64,
}

impl Default for Sdirk2 {
    fn default() -> Self {
        Sdirk2 {
            control: StepControl::default(),
            max_newton: 10,
            newton_tol: 0.01,
        }
    }
}

impl Sdirk2 {
    /// Solves k = f(tc, base + hg k) starting from `k`; returns false if Newton stalls.
    #[allow(clippy::too_many_arguments)]
    fn newton_stage(
        &self,
        system: &dyn OdeSystem,
        lu: &nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
        tc: f64,
        base: &DVector<f64>,
        hg: f64,
        k: &mut DVector<f64>,
        scale: &DVector<f64>,
    ) -> Result<bool, IvpError> {
        let n = base.len();
        let mut residual = DVector::zeros(n);
        for _ in 0..self.max_newton {
            let stage = base + &*k * hg;
            system.rhs(tc, &stage, &mut residual);
            residual -= &*k;
            let delta = lu.solve(&residual).ok_or(IvpError::SingularMatrix { t: tc })?;
            *k += &delta;
            let norm = ((&delta * hg).component_div(scale).norm_squared() / n as f64).sqrt();
            if !norm.is_finite() {
                return Ok(false);
            }
            if norm < self.newton_tol {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl IvpSolve for Sdirk2 {
    fn name(&self) -> &'static str {
        "SDIRK2"
    }

    fn solve(
        &self,
        system: &dyn OdeSystem,
        y0: &DVector<f64>,
        t_span: (f64, f64),
        t_eval: &[f64],
        rtol: f64,
        atol: f64,
    ) -> Result<Trajectory, IvpError> {
        check_problem(system, y0, t_span, t_eval, rtol, atol)?;
        let n = system.ndim();
        let gamma = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
        let (t0, t1) = t_span;

        let mut t = t0;
        let mut y = y0.clone();
        let mut f0 = DVector::zeros(n);
        system.rhs(t, &y, &mut f0);
        if !finite(&f0) {
            return Err(IvpError::NonFinite { t });
        }
        let mut h = initial_step(&self.control, &y, &f0, t1 - t0, rtol, atol);
        let mut out = DenseOutput::new(t_eval, t0, y0);
        let mut jac = DMatrix::zeros(n, n);
        let mut f_end = DVector::zeros(n);

        for _ in 0..self.control.max_steps {
            h = h.min(self.control.h_max);
            let last = t + h >= t1;
            if last {
                h = t1 - t;
            }
            if h < min_step(t) {
                return Err(IvpError::StepSizeTooSmall { t, h });
            }
            let hg = h * gamma;
            system.jacobian(t, &y, &mut jac);
            let lu = (DMatrix::identity(n, n) - &jac * hg).lu();
            let scale = y.map(|v| atol + rtol * v.abs());

            let mut k1 = f0.clone();
            let ok1 = self.newton_stage(system, &lu, t + gamma * h, &y, hg, &mut k1, &scale)?;
            let mut k2 = k1.clone();
            let base2 = &y + &k1 * (h * (1.0 - gamma));
            let ok2 = ok1 && self.newton_stage(system, &lu, t + h, &base2, hg, &mut k2, &scale)?;
            if !ok2 {
                out.reject();
                h *= 0.5;
                continue;
            }

            let y_new = &y + (&k1 * (1.0 - gamma) + &k2 * gamma) * h;
            let err = (&k2 - &k1) * (h * gamma);
            let err_norm = error_norm(&err, &y, &y_new, rtol, atol);
            if !err_norm.is_finite() {
                out.reject();
                h *= 0.25;
                continue;
            }
            if err_norm <= 1.0 {
                let t_new = if last { t1 } else { t + h };
                system.rhs(t_new, &y_new, &mut f_end);
                out.push_step((t, &y, &f0), (t_new, &y_new, &f_end), last);
                t = t_new;
                y = y_new;
                f0.copy_from(&f_end);
                if last {
                    return Ok(out.finish(self.name()));
                }
            } else {
                out.reject();
            }
            h *= step_factor(err_norm, 1.0).min(4.0);
        }
        Err(IvpError::MaxSteps {
            max_steps: self.control.max_steps,
            t,
        })
    }
}

////////////////////////////////////////// DORMAND–PRINCE 4(5) //////////////////////////////////////////

/// Explicit Dormand–Prince 5(4) from `ode_solvers`. Its dense output runs on a
/// uniform grid, so the span is integrated segment by segment between output
/// times; with no output times only the start and end points are stored.
#[derive(Debug, Clone, Default)]
pub struct DormandPrince45;

/// Exposes an [`OdeSystem`] to the `ode_solvers` steppers.
struct OdeSolversAdapter<'a> {
    system: &'a dyn OdeSystem,
}

impl System<f64, DVector<f64>> for OdeSolversAdapter<'_> {
    fn system(&self, t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        self.system.rhs(t, y, dy);
    }
}

impl DormandPrince45 {
    /// Advances `ya` from `ta` to `tb`, returning y(tb).
    #[allow(clippy::too_many_arguments)]
    fn segment(
        &self,
        system: &dyn OdeSystem,
        ta: f64,
        tb: f64,
        ya: &DVector<f64>,
        rtol: f64,
        atol: f64,
        traj: &mut Trajectory,
    ) -> Result<DVector<f64>, IvpError> {
        // the dense point ta + (tb - ta) may round past tb
        let t_end = tb + 8.0 * f64::EPSILON * tb.abs().max(f64::MIN_POSITIVE);
        let mut stepper = Dopri5::new(OdeSolversAdapter { system }, ta, t_end, tb - ta, ya.clone(), rtol, atol);
        let stats = stepper.integrate().map_err(|e| IvpError::Backend {
            t: ta,
            reason: format!("{:?}", e),
        })?;
        traj.n_steps += stats.accepted_steps as usize;
        traj.n_rejected += stats.rejected_steps as usize;
        let (ts, ys) = stepper.results().get();
        // outputs are ta and tb only
        match ys.last() {
            Some(y) if ts.len() > 1 && finite(y) => Ok(y.clone()),
            Some(_) if ts.len() > 1 => Err(IvpError::NonFinite { t: tb }),
            _ => Err(IvpError::Backend {
                t: ta,
                reason: format!("no dense output at t = {:.6e}", tb),
            }),
        }
    }
}

impl IvpSolve for DormandPrince45 {
    fn name(&self) -> &'static str {
        "DormandPrince45"
    }

    fn solve(
        &self,
        system: &dyn OdeSystem,
        y0: &DVector<f64>,
        t_span: (f64, f64),
        t_eval: &[f64],
        rtol: f64,
        atol: f64,
    ) -> Result<Trajectory, IvpError> {
        check_problem(system, y0, t_span, t_eval, rtol, atol)?;
        let (t0, t1) = t_span;
        let mut f0 = DVector::zeros(system.ndim());
        system.rhs(t0, y0, &mut f0);
        if !finite(&f0) {
            return Err(IvpError::NonFinite { t: t0 });
        }

        let mut traj = Trajectory::new();
        let mut targets = Vec::new();
        if t_eval.is_empty() {
            traj.t.push(t0);
            traj.y.push(y0.clone());
            targets.push(t1);
        }
        for &te in t_eval {
            if te <= t0 {
                traj.t.push(te);
                traj.y.push(y0.clone());
            } else {
                targets.push(te);
            }
        }

        let mut t = t0;
        let mut y = y0.clone();
        for tb in targets {
            if tb > t {
                y = self.segment(system, t, tb, &y, rtol, atol, &mut traj)?;
                t = tb;
            }
            traj.t.push(tb);
            traj.y.push(y.clone());
        }
        debug!(
            "{}: {} accepted, {} rejected steps",
            self.name(),
            traj.n_steps,
            traj.n_rejected
        );
        Ok(traj)
    }
}
