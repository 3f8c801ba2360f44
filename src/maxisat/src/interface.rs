/* Main Interface */

use crate::{
    callbacks::{Handler, NoHandler},
    clause::{lbool, Lit, Var},
    core::{SolveResult, SolverState},
    error::Result,
};

/// Main interface for a solver: it makes it possible to add clauses,
/// allocate variables, and check for satisfiability
pub trait SolverInterface {
    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_learnts(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// `false` once the clause set is known to be unsatisfiable (without
    /// assumptions). Only a state restore can turn it back to `true`.
    fn is_ok(&self) -> bool;

    /// Creates a new SAT variable in the solver. If 'decision' is cleared, variable will not be
    /// used as a decision variable (NOTE! This has effects on the meaning of a SATISFIABLE result).
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var;

    /// Create a new variable with the default polarity
    fn new_var_default(&mut self) -> Var;

    /// Add a clause to the solver. Returns `false` if the solver is in
    /// an `UNSAT` state.
    ///
    /// The vector is used as scratch space and its content is unspecified afterwards.
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool;

    /// Add a clause to the solver. Returns `false` if the solver is in
    /// an `UNSAT` state.
    fn add_clause(&mut self, clause: &[Lit]) -> bool {
        let mut c = clause.to_vec();
        self.add_clause_reuse(&mut c)
    }

    /// Add the constraint "at most `k` of `lits` are true".
    ///
    /// Fails if a proof is being recorded, since DRUP cannot express it.
    fn add_at_most(&mut self, lits: &[Lit], k: u32) -> Result<bool>;

    /// Simplify the clause database according to the current top-level assigment.
    fn simplify(&mut self) -> bool;

    /// Search for a model that respects a given set of assumptions.
    ///
    /// `handler` is polled at the start and end of the call and after
    /// every conflict.
    fn solve_with<H: Handler + ?Sized>(&mut self, assumps: &[Lit], handler: &mut H)
        -> Result<SolveResult>;

    /// Search for a model that respects a given set of assumptions.
    fn solve(&mut self, assumps: &[Lit]) -> Result<SolveResult> {
        self.solve_with(assumps, &mut NoHandler)
    }

    /// Obtain the slice of literals that are proved at level 0.
    ///
    /// These literals will keep this value until the next state restore.
    fn proved_at_lvl_0(&self) -> &[Lit];

    /// Query whole model
    ///
    /// Precondition: last result was `Sat`
    fn get_model(&self) -> &[lbool];

    /// Query model for var
    ///
    /// Precondition: last result was `Sat`
    fn value_var(&self, v: Var) -> lbool;

    /// Query model for lit
    fn value_lit(&self, lit: Lit) -> lbool {
        self.value_var(lit.var()) ^ !lit.sign()
    }

    /// Value of this literal if it's assigned at level 0, or `UNDEF` otherwise
    fn value_lvl_0(&self, lit: Lit) -> lbool;

    /// Return unsat core (as a subset of assumptions).
    ///
    /// Precondition: last result was `Unsat`
    fn unsat_core(&self) -> &[Lit];

    /// Does this literal occur in the unsat-core?
    ///
    /// Precondition: last result was `Unsat`
    fn unsat_core_contains_lit(&self, lit: Lit) -> bool;

    /// Does this variable occur in the unsat-core?
    ///
    /// Precondition: last result was `Unsat`
    fn unsat_core_contains_var(&self, v: Var) -> bool {
        let lit = Lit::new(v, true);
        self.unsat_core_contains_lit(lit) || self.unsat_core_contains_lit(!lit)
    }

    /// Checkpoint the clause database, variables and unit facts.
    fn save_state(&mut self) -> SolverState;

    /// Roll back to a checkpoint. Every checkpoint taken after `state`
    /// becomes invalid.
    fn load_state(&mut self, state: &SolverState) -> Result<()>;
}
