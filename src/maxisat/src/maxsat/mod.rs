//! MaxSAT on top of the CDCL solver.
//!
//! A `MaxSatSolver` holds hard clauses and weighted soft clauses over
//! DIMACS-style variables. `search` looks for an assignment satisfying
//! every hard clause while minimizing the weight of the falsified soft
//! clauses, using one of several algorithms.

use {
    self::base::{Context, Formula, SoftClause, Step, Strategy},
    crate::{
        callbacks::{Computation, Event, Handler, NoHandler},
        clause::{Lit, Var},
        error::{Error, Result},
    },
};

#[macro_use]
mod base;
mod config;
mod linear_su;
mod linear_us;
mod msu3;
mod oll;
mod wbo;
mod wmsu3;

pub use self::config::{
    Algorithm, AmoEncoding, CardinalityEncoding, IncrementalStrategy, MaxSatConfig, PbEncoding,
    WeightStrategy,
};

/// Outcome of a MaxSAT search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaxSatResult {
    /// `model[i]` is the value of variable `i+1`
    Optimum { cost: u64, model: Vec<bool> },
    /// The hard clauses are unsatisfiable
    Unsatisfiable,
    /// The handler stopped the search at this event
    Canceled(Event),
}

impl MaxSatResult {
    pub fn cost(&self) -> Option<u64> {
        match self {
            MaxSatResult::Optimum { cost, .. } => Some(*cost),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&[bool]> {
        match self {
            MaxSatResult::Optimum { model, .. } => Some(model),
            _ => None,
        }
    }
}

/// Counters of one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaxSatStats {
    /// Cost of the best model found
    pub ub_cost: Option<u64>,
    /// Best proved lower bound
    pub lb_cost: u64,
    pub sat_calls: u64,
    pub unsat_calls: u64,
    pub cores: u64,
    pub avg_core_size: f64,
    pub symmetry_clauses: u64,
}

/// The result of a search, along with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSatOutcome {
    pub result: MaxSatResult,
    pub stats: MaxSatStats,
}

/// A checkpoint of a `MaxSatSolver`, see `MaxSatSolver::save_state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxSatState {
    id: u32,
    n_vars: u32,
    n_hard: usize,
    n_at_most: usize,
    /// Weight, number of relaxation literals, and assumption of each soft clause
    soft: Vec<(u64, usize, Lit)>,
}

impl MaxSatState {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// A MaxSAT problem and the configuration used to solve it.
pub struct MaxSatSolver {
    config: MaxSatConfig,
    formula: Formula,
    valid_states: Vec<u32>,
    next_state_id: u32,
}

impl Default for MaxSatSolver {
    fn default() -> Self {
        MaxSatSolver::new(MaxSatConfig::default())
    }
}

impl MaxSatSolver {
    pub fn new(config: MaxSatConfig) -> Self {
        MaxSatSolver {
            config,
            formula: Formula::default(),
            valid_states: vec![],
            next_state_id: 0,
        }
    }

    pub fn config(&self) -> &MaxSatConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MaxSatConfig {
        &mut self.config
    }

    pub fn num_vars(&self) -> u32 {
        self.formula.n_vars
    }

    pub fn num_hard(&self) -> usize {
        self.formula.hard.len()
    }

    pub fn num_soft(&self) -> usize {
        self.formula.soft.len()
    }

    /// Sum of the soft clause weights.
    pub fn total_weight(&self) -> u64 {
        self.formula.sum_weights()
    }

    pub fn is_weighted(&self) -> bool {
        self.formula.is_weighted()
    }

    /// A fresh variable, as a positive DIMACS literal.
    pub fn new_var(&mut self) -> i32 {
        self.formula.new_lit().to_dimacs()
    }

    /// Convert a DIMACS literal, declaring its variable if needed.
    pub fn lit(&mut self, dimacs: i32) -> Result<Lit> {
        if dimacs == 0 {
            return Err(Error::InvalidLiteral);
        }
        let v = Var::from_idx(dimacs.unsigned_abs() - 1);
        self.formula.reserve_var(v);
        Ok(Lit::new(v, dimacs > 0))
    }

    fn lits(&mut self, clause: &[i32]) -> Result<Vec<Lit>> {
        clause.iter().map(|&d| self.lit(d)).collect()
    }

    pub fn add_hard_clause(&mut self, clause: &[i32]) -> Result<()> {
        let c = self.lits(clause)?;
        self.formula.hard.push(c);
        Ok(())
    }

    /// Add a soft clause: falsifying it costs `weight`.
    pub fn add_soft_clause(&mut self, clause: &[i32], weight: u64) -> Result<()> {
        if weight == 0 || weight > i64::MAX as u64 {
            return Err(Error::InvalidWeight(weight as i64));
        }
        let c = self.lits(clause)?;
        self.formula.soft.push(SoftClause::new(c, weight));
        Ok(())
    }

    /// Add a clause, hard if `weight` is `-1`, soft otherwise.
    pub fn add_clause(&mut self, clause: &[i32], weight: i64) -> Result<()> {
        match weight {
            -1 => self.add_hard_clause(clause),
            w if w > 0 => self.add_soft_clause(clause, w as u64),
            w => Err(Error::InvalidWeight(w)),
        }
    }

    /// Checkpoint the clauses and variables.
    pub fn save_state(&mut self) -> MaxSatState {
        let id = self.next_state_id;
        self.next_state_id += 1;
        self.valid_states.push(id);
        MaxSatState {
            id,
            n_vars: self.formula.n_vars,
            n_hard: self.formula.hard.len(),
            n_at_most: self.formula.at_most.len(),
            soft: self
                .formula
                .soft
                .iter()
                .map(|s| (s.weight, s.relaxation.len(), s.assumption))
                .collect(),
        }
    }

    /// Roll back to a checkpoint, invalidating the checkpoints taken after it.
    pub fn load_state(&mut self, state: &MaxSatState) -> Result<()> {
        let pos = self
            .valid_states
            .iter()
            .position(|&id| id == state.id)
            .ok_or(Error::InvalidState(state.id))?;
        self.valid_states.truncate(pos + 1);
        let f = &mut self.formula;
        f.n_vars = state.n_vars;
        f.hard.truncate(state.n_hard);
        f.at_most.truncate(state.n_at_most);
        f.soft.truncate(state.soft.len());
        for (s, &(weight, n_relax, assumption)) in f.soft.iter_mut().zip(&state.soft) {
            s.weight = weight;
            s.relaxation.truncate(n_relax);
            s.assumption = assumption;
        }
        Ok(())
    }

    /// Solve to optimality.
    pub fn search(&mut self) -> Result<MaxSatOutcome> {
        self.search_with(&mut NoHandler)
    }

    /// Solve to optimality, or until `handler` cancels.
    ///
    /// The clauses the algorithm adds are removed afterwards, so the
    /// problem can be extended and searched again.
    pub fn search_with<H: Handler>(&mut self, handler: &mut H) -> Result<MaxSatOutcome> {
        let weighted = self.formula.is_weighted();
        self.config.check(weighted)?;
        let start = Event::ComputationStarted(Computation::MaxSatCall);
        if !handler.should_resume(&start) {
            return Ok(MaxSatOutcome {
                result: MaxSatResult::Canceled(start),
                stats: MaxSatStats::default(),
            });
        }
        info!(
            "maxsat.search algorithm={:?} vars={} hard={} soft={} weighted={}",
            self.config.algorithm,
            self.num_vars(),
            self.num_hard(),
            self.num_soft(),
            weighted
        );

        let state = self.save_state();
        let res = self.run(handler, weighted);
        self.load_state(&state)?;
        let outcome = res?;

        handler.should_resume(&Event::ComputationFinished(Computation::MaxSatCall));
        Ok(outcome)
    }

    fn run(&mut self, handler: &mut dyn Handler, weighted: bool) -> Result<MaxSatOutcome> {
        let mut ctx = Context::new(&mut self.formula, &self.config);
        let mut strategy: Box<dyn Strategy> = match ctx.config.algorithm {
            Algorithm::Wbo => Box::new(wbo::Wbo::new(&mut ctx, false)?),
            Algorithm::IncWbo => Box::new(wbo::Wbo::new(&mut ctx, true)?),
            Algorithm::LinearSu => Box::new(linear_su::LinearSu::new(&mut ctx, weighted)?),
            Algorithm::LinearUs => Box::new(linear_us::LinearUs::new(&mut ctx)?),
            Algorithm::Msu3 => Box::new(msu3::Msu3::new(&mut ctx)?),
            Algorithm::Wmsu3 => Box::new(wmsu3::Wmsu3::new(&mut ctx)?),
            Algorithm::Oll => Box::new(oll::Oll::new(&mut ctx)?),
        };
        let result = loop {
            match strategy.step(&mut ctx, handler)? {
                Step::Continue => (),
                Step::Done(r) => break r,
            }
        };
        Ok(MaxSatOutcome {
            result,
            stats: ctx.into_stats(),
        })
    }
}
