use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use indicatif::ProgressBar;
use nalgebra::{DMatrix, DVector};

use argmin::{
    core::{
        observers::{Observe, ObserverMode},
        Error as ArgminError, Executor, Operator, State, KV,
    },
    solver::conjugategradient::ConjugateGradient,
};

/// Runs multiplication for Conjugate Gradient Solver
struct StiffnessOperator<'a> {
    kk: &'a DMatrix<f64>,
}

impl<'a> Operator for StiffnessOperator<'a> {
    type Param = Vec<f64>;
    type Output = Vec<f64>;

    fn apply(&self, x: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        Ok((self.kk * DVector::from_column_slice(x)).data.as_vec().clone())
    }
}

/// Reports solver iterations to `tracing` and, optionally, a progress bar
struct IterationObserver {
    bar: ProgressBar,
}

impl IterationObserver {
    fn new(max_iters: u64, show_progress: bool) -> IterationObserver {
        let bar = if show_progress {
            ProgressBar::new(max_iters)
        } else {
            ProgressBar::hidden()
        };
        IterationObserver { bar }
    }
}

impl<I> Observe<I> for IterationObserver
where
    I: State<Float = f64>,
{
    fn observe_init(
        &mut self,
        _name: &str,
        _state: &I,
        _kv: &KV,
    ) -> std::result::Result<(), ArgminError> {
        Ok(())
    }

    fn observe_iter(&mut self, state: &I, _kv: &KV) -> std::result::Result<(), ArgminError> {
        tracing::trace!(iter = state.get_iter(), cost = state.get_cost(), "conjugate gradient");
        self.bar.set_position(state.get_iter());
        Ok(())
    }

    fn observe_final(&mut self, state: &I) -> std::result::Result<(), ArgminError> {
        tracing::debug!(
            iters = state.get_iter(),
            cost = state.get_cost(),
            "conjugate gradient finished"
        );
        self.bar.finish_and_clear();
        Ok(())
    }
}

/// Solves `K u = f` for the displacements with the conjugate gradient method
///
/// # Arguments
/// * `kk` - The assembled global stiffness (symmetric positive definite)
/// * `ff` - The global load vector
/// * `config` - Iteration limit and tolerance
///
/// # Returns
/// The displacement vector; entry `eq - 1` belongs to equation `eq`
pub fn solve(
    kk: &DMatrix<f64>,
    ff: &DVector<f64>,
    config: &AnalysisConfig,
) -> Result<DVector<f64>> {
    if kk.nrows() != ff.len() || kk.ncols() != ff.len() {
        return Err(Error::Solver(format!(
            "stiffness is {}x{} but the load vector has {} entries",
            kk.nrows(),
            kk.ncols(),
            ff.len()
        )));
    }
    let ff_norm = ff.norm();
    if ff_norm == 0.0 {
        return Ok(DVector::zeros(ff.len()));
    }

    let b: Vec<f64> = ff.iter().copied().collect();
    let cg: ConjugateGradient<_, f64> = ConjugateGradient::new(b);
    let initial_guess: Vec<f64> = vec![0.0; ff.len()];

    let operator = StiffnessOperator { kk };
    let observer = IterationObserver::new(config.max_cg_iterations, config.show_progress);

    let res = Executor::new(operator, cg)
        .configure(|state| {
            state
                .param(initial_guess)
                .max_iters(config.max_cg_iterations)
                .target_cost(config.target_cg_cost * ff_norm)
        })
        .add_observer(observer, ObserverMode::Always)
        .run()
        .map_err(|err| Error::Solver(format!("Conjugate Gradient error: {err}")))?;

    let best_param = match &res.state().best_param {
        Some(vec) => DVector::from_vec(vec.clone()),
        None => {
            return Err(Error::Solver(
                "Conjugate Gradient could not produce best parameter".to_owned(),
            ))
        }
    };

    if best_param.iter().any(|u| !u.is_finite()) {
        return Err(Error::Solver(
            "Conjugate Gradient diverged; is the structure properly supported?".to_owned(),
        ));
    }

    Ok(best_param)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
