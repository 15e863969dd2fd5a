//! Code for solving the optimisation problem defined by a model's blocks.
//!
//! Each indexed variable becomes one column per time step and each constraint one row per time
//! step. Port connections between blocks are not modelled here.
use crate::block::{Block, Domain};
use crate::id::{BlockID, TimeStepID};
use crate::model::EnergySystemModel;
use anyhow::{Result, anyhow};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::debug;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
type Variable = highs::Col;

/// A key for a [`VariableMap`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VariableMapKey {
    block_id: BlockID,
    variable: String,
    time_step: TimeStepID,
}

impl VariableMapKey {
    /// Create a new [`VariableMapKey`]
    fn new(block_id: &BlockID, variable: &str, time_step: &TimeStepID) -> Self {
        Self {
            block_id: block_id.clone(),
            variable: variable.to_string(),
            time_step: time_step.clone(),
        }
    }
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]), in the same order as the problem's columns.
#[derive(Default)]
struct VariableMap(IndexMap<VariableMapKey, Variable>);

impl VariableMap {
    /// Get the [`Variable`] corresponding to the given parameters.
    fn get(&self, block_id: &BlockID, variable: &str, time_step: &TimeStepID) -> Variable {
        let key = VariableMapKey::new(block_id, variable, time_step);

        *self
            .0
            .get(&key)
            .expect("No variable found for given params")
    }
}

/// The solution to the optimisation problem
pub struct Solution {
    columns: Vec<f64>,
    variables: VariableMap,
}

impl Solution {
    /// Get the value of `variable` in block `block_id` at `time_step`
    pub fn get(&self, block_id: &str, variable: &str, time_step: &str) -> Option<f64> {
        let key = VariableMapKey::new(&block_id.into(), variable, &time_step.into());
        let index = self.variables.0.get_index_of(&key)?;
        Some(self.columns[index])
    }

    /// Iterate over the values of every variable in the problem.
    ///
    /// # Returns
    ///
    /// An iterator of tuples containing a block ID, variable name, time step and value.
    pub fn iter_variable_values(
        &self,
    ) -> impl Iterator<Item = (&BlockID, &str, &TimeStepID, f64)> {
        self.variables
            .0
            .keys()
            .zip(self.columns.iter().copied())
            .map(|(key, value)| (&key.block_id, key.variable.as_str(), &key.time_step, value))
    }
}

/// Solve the optimisation problem made up of all the model's blocks.
///
/// Every column has a zero cost, so the solution is any point satisfying the constraints.
///
/// # Returns
///
/// The values of all block variables, or an error if no optimal solution was found.
pub fn solve(model: &EnergySystemModel) -> Result<Solution> {
    // Set up problem
    let mut problem = Problem::default();
    let mut variables = VariableMap::default();
    for block in model.iter_blocks() {
        add_variables(&mut problem, &mut variables, block);
    }

    // Add constraints
    for block in model.iter_blocks() {
        add_constraints(&mut problem, &variables, block);
    }

    // HiGHS reports an empty problem as `ModelEmpty` rather than `Optimal`
    if problem.num_cols() == 0 {
        debug!("No variables to solve for");
        return Ok(Solution {
            columns: Vec::new(),
            variables,
        });
    }

    debug!(
        "Solving problem with {} columns and {} rows",
        problem.num_cols(),
        problem.num_rows()
    );

    // Solve model
    let highs_model = problem.optimise(Sense::Minimise);
    let solution = highs_model.solve();
    match solution.status() {
        HighsModelStatus::Optimal => Ok(Solution {
            columns: solution.get_solution().columns().to_vec(),
            variables,
        }),
        status => Err(anyhow!("Could not solve: {status:?}")),
    }
}

/// Add a column to the problem for every variable in the block at every time step
fn add_variables(problem: &mut Problem, variables: &mut VariableMap, block: &Block) {
    for (name, variable) in block.iter_variables() {
        for time_step in &variable.index {
            let var = match variable.domain {
                Domain::Binary => problem.add_integer_column(0.0, 0.0..=1.0),
                Domain::NonNegativeReals => problem.add_column(0.0, 0.0..),
            };

            let key = VariableMapKey::new(&block.id, name, time_step);
            let existing = variables.0.insert(key, var).is_some();
            assert!(!existing, "Duplicate entry for var");
        }
    }
}

/// Add a row to the problem for every constraint in the block at every time step
fn add_constraints(problem: &mut Problem, variables: &VariableMap, block: &Block) {
    for (_, constraint) in block.iter_constraints() {
        for row in constraint.values() {
            let terms = row.terms.iter().map(|(var, coeff)| {
                (variables.get(&block.id, &var.variable, &var.time_step), *coeff)
            });
            problem.add_row(row.bounds.clone(), terms);
        }
    }
}
