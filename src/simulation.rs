//! Functionality for running the rolling-horizon simulation.
//!
//! Days are solved strictly in sequence. Each day's problem covers `H` hours, but only the first
//! 24 are kept: the rest act as look-ahead. The on/off state of every generator at the end of the
//! day becomes the initial state of the next.
use crate::error::{SolveFailure, SolveFailureCause, ValidationError};
use crate::formulation::Formulation;
use crate::formulation::variables::VariableMap;
use crate::generator::GeneratorID;
use crate::model::{Model, SolveFailurePolicy};
use crate::solver::{Assignment, SolveError, Solver};
use crate::time_series::{DayContext, HOURS_PER_DAY, HorizonWindow};
use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, error, info, warn};

pub mod results;
use results::{DayResults, GeneratorSeries, NodeSeries, ResultSink};

/// How far a binary variable may stray from 0 or 1 before it is rejected
const BINARY_TOLERANCE: f64 = 1e-6;

/// The stateful day-by-day driver.
///
/// Owns the horizon window and the generators' initial state, which only change between solves.
pub struct RollingHorizon<'a, S: Solver> {
    model: &'a Model,
    formulation: Formulation<'a>,
    solver: S,
    window: HorizonWindow,
    initial_on: IndexMap<GeneratorID, bool>,
    day: u32,
}

impl<'a, S: Solver> RollingHorizon<'a, S> {
    /// Create a driver positioned at the model's first day
    pub fn new(model: &'a Model, solver: S) -> Result<Self> {
        let formulation = Formulation::new(&model.topology, (&model.parameters).into())?;
        let window = HorizonWindow::new(&model.topology, model.parameters.horizon_hours);
        let initial_on = model
            .topology
            .generators
            .values()
            .map(|generator| (generator.id.clone(), generator.initial_on))
            .collect();

        Ok(Self {
            model,
            formulation,
            solver,
            window,
            initial_on,
            day: model.parameters.start_day,
        })
    }

    /// The next day to be simulated
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Whether every day has been simulated
    pub fn is_finished(&self) -> bool {
        self.day > self.model.parameters.last_day
    }

    /// Each generator's on/off state at the start of the next day
    pub fn initial_on(&self) -> &IndexMap<GeneratorID, bool> {
        &self.initial_on
    }

    /// Simulate the current day, pass its results to the sink and move on to the next.
    ///
    /// Results are only passed on once the day has fully succeeded, so a failed day leaves nothing
    /// behind in the sink.
    pub fn step(&mut self, sink: &mut dyn ResultSink) -> Result<()> {
        let day = self.day;
        info!("Simulating day {day}");

        self.window.bind(&self.model.time_series, day)?;
        let ctx = DayContext::new(day, &self.window, &self.initial_on);
        match self.solve(&ctx) {
            Ok((variables, assignment)) => {
                let results = harvest(&ctx, &variables, &assignment);
                let next_state = carry_state(&ctx, &variables, &assignment)?;
                debug!("Day {day}: objective value {}", results.objective);
                results.record(sink)?;
                self.initial_on = next_state;
            }
            Err(failure) => match self.model.parameters.on_solve_failure {
                SolveFailurePolicy::Abort => Err(failure)?,
                SolveFailurePolicy::HoldPreviousState => {
                    error!("{failure}. No results recorded; keeping previous unit states.");
                }
            },
        }

        self.window.advance();
        self.day += 1;

        Ok(())
    }

    /// Simulate every remaining day
    pub fn run_to_end(&mut self, sink: &mut dyn ResultSink) -> Result<()> {
        while !self.is_finished() {
            self.step(sink)?;
        }

        Ok(())
    }

    /// Solve the day, retrying with a fresh instance whenever the solver times out
    fn solve(&self, ctx: &DayContext) -> Result<(VariableMap, Assignment), SolveFailure> {
        let attempts = self.model.parameters.solver.timeout_retries + 1;
        let failure = |cause| SolveFailure {
            day: ctx.day,
            cause,
            diagnostics: ctx.diagnostics(),
        };

        for attempt in 1..=attempts {
            debug!("Day {}: solve attempt {attempt} of {attempts}", ctx.day);
            let (instance, variables) = self.formulation.build_instance(ctx);
            match self.solver.solve(&instance) {
                Ok(assignment) => return Ok((variables, assignment)),
                Err(SolveError::Timeout) => {
                    warn!("Day {}: solver timed out on attempt {attempt}", ctx.day);
                }
                Err(SolveError::Infeasible) => return Err(failure(SolveFailureCause::Infeasible)),
                Err(SolveError::Other(msg)) => return Err(failure(SolveFailureCause::Solver(msg))),
            }
        }

        Err(failure(SolveFailureCause::Timeout { attempts }))
    }
}

/// Read the first 24 hours of every decision variable, keyed by absolute hour
fn harvest(ctx: &DayContext, variables: &VariableMap, assignment: &Assignment) -> DayResults {
    let hours = 1..=HOURS_PER_DAY;
    let mut results = DayResults {
        day: ctx.day,
        objective: assignment.objective(),
        ..Default::default()
    };

    for (id, vars) in &variables.generators {
        for (series, column) in [
            (GeneratorSeries::Dispatch, &vars.dispatch),
            (GeneratorSeries::On, &vars.on),
            (GeneratorSeries::Switch, &vars.switch),
            (GeneratorSeries::SpinningReserve, &vars.spinning_reserve),
            (GeneratorSeries::NonSpinningReserve, &vars.non_spinning_reserve),
        ] {
            results.generators.extend(hours.clone().map(|hour| {
                let value = assignment.value(column[hour]);
                (series, id.clone(), ctx.absolute_hour(hour), value)
            }));
        }
    }

    let resources = variables
        .resources
        .iter()
        .map(|(id, vars)| (NodeSeries::Resource(vars.kind), id, &vars.dispatch));
    let angles = variables
        .angles
        .iter()
        .map(|(id, vars)| (NodeSeries::VoltageAngle, id, vars));
    for (series, id, column) in resources.chain(angles) {
        results.nodes.extend(hours.clone().map(|hour| {
            let value = assignment.value(column[hour]);
            (series, id.clone(), ctx.absolute_hour(hour), value)
        }));
    }

    results
}

/// Read each generator's state at the end of the day, to become the next day's initial state
fn carry_state(
    ctx: &DayContext,
    variables: &VariableMap,
    assignment: &Assignment,
) -> Result<IndexMap<GeneratorID, bool>> {
    variables
        .generators
        .iter()
        .map(|(id, vars)| -> Result<(GeneratorID, bool)> {
            let value = assignment.value(vars.on[HOURS_PER_DAY]);
            if (value - value.round()).abs() > BINARY_TOLERANCE
                || !(0.0..=1.0).contains(&value.round())
            {
                Err(ValidationError::NonBinaryState {
                    day: ctx.day,
                    id: id.to_string(),
                    hour: HOURS_PER_DAY,
                    value,
                })?;
            }

            Ok((id.clone(), value.round() > 0.5))
        })
        .collect()
}

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `solver` - Solves each day's instance
/// * `sink` - Receives the results of each day
pub fn run<S: Solver>(model: &Model, solver: S, sink: &mut dyn ResultSink) -> Result<()> {
    info!(
        "Simulating days {} to {} with a {}-hour horizon",
        model.parameters.start_day, model.parameters.last_day, model.parameters.horizon_hours
    );

    let mut driver = RollingHorizon::new(model, solver)?;
    driver.run_to_end(sink)?;
    sink.finish()
}
