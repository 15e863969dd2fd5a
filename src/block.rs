//! Block descriptors for the optimisation model.
//!
//! A [`Block`] is a named, self-contained group of variables, ports and constraints. Blocks are
//! built by assets (see [`crate::collector`]) and then merged into an
//! [`EnergySystemModel`](crate::model::EnergySystemModel), which owns them from then on.
use crate::id::{BlockID, TimeStepID};
use crate::time_index::TimeIndex;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use std::ops::RangeInclusive;

/// The set of values a variable may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Either 0 or 1
    Binary,
    /// Any real number >= 0
    NonNegativeReals,
}

/// A variable defined for every time step in the model's time index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedVariable {
    /// The domain of the variable
    pub domain: Domain,
    /// Initial value for every time step, if any
    pub initial: Option<f64>,
    /// The time steps for which the variable is defined
    pub index: TimeIndex,
}

/// How a port member's flows are combined when ports are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Flows from several connected blocks are summed
    Extensive,
}

/// A variable exposed through a port
#[derive(Debug, Clone, PartialEq)]
pub struct PortMember {
    /// Name of the block variable exposed
    pub variable: String,
    /// How the flow is combined with others
    pub kind: PortKind,
    /// Whether a split fraction is created for each outgoing connection
    pub include_split_frac: bool,
}

/// A connection point on a block. Members are keyed by the label they are exposed under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Port {
    members: IndexMap<String, PortMember>,
}

impl Port {
    /// Expose a variable under `label`
    pub fn add(&mut self, variable: &str, label: &str, kind: PortKind, include_split_frac: bool) {
        self.members.insert(
            label.to_string(),
            PortMember {
                variable: variable.to_string(),
                kind,
                include_split_frac,
            },
        );
    }

    /// Get the member exposed under `label`
    pub fn get(&self, label: &str) -> Option<&PortMember> {
        self.members.get(label)
    }

    /// Iterate over labels and members
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, PortMember> {
        self.members.iter()
    }
}

/// A reference to one entry of an indexed variable in the same block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    /// Name of the variable
    pub variable: String,
    /// The time step
    pub time_step: TimeStepID,
}

/// A linear constraint of the form `lower <= sum(coeff * var) <= upper`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    /// Terms on the left-hand side
    pub terms: Vec<(VariableRef, f64)>,
    /// Allowed range for the sum of terms
    pub bounds: RangeInclusive<f64>,
}

impl LinearConstraint {
    /// A constraint fixing `coeff * var` to `rhs`
    pub fn fix(variable: VariableRef, coeff: f64, rhs: f64) -> Self {
        Self {
            terms: vec![(variable, coeff)],
            bounds: rhs..=rhs,
        }
    }

    /// Whether the constraint is an equality
    #[allow(clippy::float_cmp)]
    pub fn is_equality(&self) -> bool {
        self.bounds.start() == self.bounds.end()
    }
}

/// A constraint defined for every time step
pub type IndexedConstraint = IndexMap<TimeStepID, LinearConstraint>;

/// A named group of variables, ports and constraints
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The block's name in the model
    pub id: BlockID,
    variables: IndexMap<String, IndexedVariable>,
    ports: IndexMap<String, Port>,
    constraints: IndexMap<String, IndexedConstraint>,
}

impl Block {
    /// Create a new, empty block
    pub fn new(id: BlockID) -> Self {
        Self {
            id,
            variables: IndexMap::new(),
            ports: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Declare a variable over every time step in `index`
    pub fn add_variable(
        &mut self,
        name: &str,
        index: &TimeIndex,
        domain: Domain,
        initial: Option<f64>,
    ) -> Result<()> {
        self.check_name_free(name)?;
        self.variables.insert(
            name.to_string(),
            IndexedVariable {
                domain,
                initial,
                index: index.clone(),
            },
        );

        Ok(())
    }

    /// Declare a port
    pub fn add_port(&mut self, name: &str, port: Port) -> Result<()> {
        self.check_name_free(name)?;
        for (label, member) in port.iter() {
            ensure!(
                self.variables.contains_key(&member.variable),
                "Port {name} exposes unknown variable {} as {label}",
                member.variable
            );
        }
        self.ports.insert(name.to_string(), port);

        Ok(())
    }

    /// Declare a constraint with one row per time step in `index`.
    ///
    /// `rule` is called for each time step and returns the constraint for that step.
    pub fn add_constraint<F>(&mut self, name: &str, index: &TimeIndex, mut rule: F) -> Result<()>
    where
        F: FnMut(&TimeStepID) -> Result<LinearConstraint>,
    {
        self.check_name_free(name)?;

        let mut rows = IndexedConstraint::new();
        for time_step in index {
            let constraint = rule(time_step)?;
            for (var, _) in &constraint.terms {
                let variable = self.variables.get(&var.variable).with_context(|| {
                    format!("Constraint {name} uses unknown variable {}", var.variable)
                })?;
                ensure!(
                    variable.index.contains(&var.time_step),
                    "Constraint {name} uses {}[{}], which is outside its index",
                    var.variable,
                    var.time_step
                );
            }
            rows.insert(time_step.clone(), constraint);
        }
        self.constraints.insert(name.to_string(), rows);

        Ok(())
    }

    /// Component names must be unique within a block
    fn check_name_free(&self, name: &str) -> Result<()> {
        ensure!(
            !self.variables.contains_key(name)
                && !self.ports.contains_key(name)
                && !self.constraints.contains_key(name),
            "Block {} already has a component named {name}",
            self.id
        );

        Ok(())
    }

    /// Get a variable by name
    pub fn variable(&self, name: &str) -> Option<&IndexedVariable> {
        self.variables.get(name)
    }

    /// Get a port by name
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    /// Get a constraint by name
    pub fn constraint(&self, name: &str) -> Option<&IndexedConstraint> {
        self.constraints.get(name)
    }

    /// Iterate over the block's variables in declaration order
    pub fn iter_variables(&self) -> indexmap::map::Iter<'_, String, IndexedVariable> {
        self.variables.iter()
    }

    /// Iterate over the block's constraints in declaration order
    pub fn iter_constraints(&self) -> indexmap::map::Iter<'_, String, IndexedConstraint> {
        self.constraints.iter()
    }
}
