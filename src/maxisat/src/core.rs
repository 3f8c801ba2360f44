/****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2009-2018, Gilles Audemard, Laurent Simon (Glucose)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::{
        callbacks::{Computation, Event, Handler},
        clause::{lbool, CRef, ClauseAllocator, DeletePred, LSet, Lit, OccListsData, VMap, Var},
        drat::Proof,
        error::{Error, Result},
        interface::SolverInterface,
        intmap::{Comparator, Heap, HeapData},
    },
    std::{cmp, collections::HashMap, f64, mem},
};

#[cfg(feature = "logging")]
use crate::clause::display::Print;

/// Outcome of a call to `solve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    Sat,
    Unsat,
    /// The handler stopped the search at this event
    Canceled(Event),
}

impl SolveResult {
    pub fn is_sat(&self) -> bool {
        *self == SolveResult::Sat
    }
    pub fn is_unsat(&self) -> bool {
        *self == SolveResult::Unsat
    }
    pub fn is_canceled(&self) -> bool {
        match self {
            SolveResult::Canceled(_) => true,
            _ => false,
        }
    }
}

/// A checkpoint of the solver, see `SolverInterface::save_state`.
///
/// Restoring is a truncation of the clause, variable and unit-fact
/// arrays to the recorded sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverState {
    id: u32,
    ok: bool,
    n_vars: u32,
    ca_len: u32,
    n_clauses: usize,
    n_units: usize,
    proof_len: usize,
}

impl SolverState {
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT solver, including
/// a clause allocator, literals, clauses, statistics, and the checkpoints
/// used for incremental solving.
pub struct Solver {
    // Extra results: (read-only member variable)
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,
    /// If problem is unsatisfiable under assumptions, the subset of
    /// assumptions responsible for it.
    conflict: LSet,

    /// List of problem clauses (including at-most-k constraints).
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,
    /// Facts asserted at level 0 (original or learnt units), in order.
    unit_clauses: Vec<Lit>,

    v: SolverV,

    in_call: bool,
    canceled: Option<Event>,

    /// Ids of the checkpoints that can still be restored.
    valid_states: Vec<u32>,
    next_state_id: u32,
    names: HashMap<String, Var>,
    proof: Option<Proof>,

    tmp_learnt: Vec<Lit>,
    tmp_selectors: Vec<Lit>,
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    reduce_dbs: u64,
    max_literals: u64,
    tot_literals: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    max_var_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    restart_policy: RestartPolicy,
    ccmin_mode: ClauseMinimization,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// Remove satisfied problem clauses during simplification.
    remove_satisfied: bool,
    /// Keep selector literals out of the LBD and out of minimization.
    incremental: bool,

    /// The initial restart limit in Luby mode. (default 100)
    restart_first: i32,
    /// The factor of the Luby sequence. (default 2)
    restart_inc: f64,
    factor_k: f64,
    factor_r: f64,
    inc_reduce_db: u64,
    special_inc_reduce_db: u64,
    lb_lbd_frozen_clause: u32,
    lb_size_minimizing_clause: u32,
    lb_lbd_minimizing_clause: u32,

    /// The preferred polarity of each variable.
    polarity: VMap<bool>,
    /// The users preferred polarity of each variable.
    user_pol: VMap<lbool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// Variables standing for assumptions (set aside in learnt clauses).
    selector: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// Same as `watches`, for binary clauses only.
    watches_bin_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail -- no more explicit propagation queue in MiniSat).
    qhead: i32,
    /// Number of top-level assignments since last execution of 'simplify()'.
    simp_db_assigns: i32,
    /// Remaining number of propagations that must be made before next execution of 'simplify()'.
    simp_db_props: i64,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    /// Current set of assumptions provided to solve by the user.
    assumptions: Vec<Lit>,
    /// Literals decided before the activity heap is consulted.
    selection_order: Vec<Lit>,
    selection_order_idx: usize,

    // Glucose restarts and clause database reduction
    lbd_queue: utils::BoundedQueue,
    trail_queue: utils::BoundedQueue,
    sum_lbd: f64,
    conflicts_restarts: u64,
    cur_restart: u64,
    nb_clauses_before_reduce: u64,

    // Temporaries (to reduce allocation overhead). Each variable is prefixed by the method in which it is
    // used, except `seen` wich is used in several places.
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,
    last_decision_level: Vec<Lit>,
    /// Stamps indexed by level (LBD) or by variable (binary minimization).
    perm_diff: Vec<u64>,
    my_flag: u64,
}

// public API
impl SolverInterface for Solver {
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        self.v.new_var(upol, dvar)
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(lbool::UNDEF, true)
    }

    // in the API, we can only add clauses at level 0
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(
            self.v.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        clause.sort_unstable();
        self.add_clause_(clause)
    }

    fn add_at_most(&mut self, lits: &[Lit], k: u32) -> Result<bool> {
        if self.proof.is_some() {
            return Err(Error::ProofUnsupported);
        }
        debug_assert_eq!(self.v.decision_level(), 0);
        if !self.v.ok {
            return Ok(false);
        }
        let mut ps = lits.to_vec();
        ps.sort_unstable();
        if ps.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::DuplicateLiteral);
        }
        debug!("add at-most {} {:?}", k, ps);

        // drop literals fixed at level 0 and complementary pairs
        let mut k = k as i64;
        let mut j = 0;
        let mut last = Lit::UNDEF;
        for i in 0..ps.len() {
            let lit = ps[i];
            let value = self.v.value_lit(lit);
            if value == lbool::TRUE {
                k -= 1;
            } else if value == lbool::FALSE {
                continue;
            } else if lit == !last {
                // exactly one of `lit, !lit` is true
                j -= 1;
                k -= 1;
                last = Lit::UNDEF;
            } else {
                ps[j] = lit;
                j += 1;
                last = lit;
            }
        }
        ps.truncate(j);

        if k < 0 {
            self.v.ok = false;
            return Ok(false);
        } else if k as usize >= ps.len() {
            return Ok(true);
        } else if k == 0 {
            for &lit in &ps {
                self.v.vars.unchecked_enqueue(!lit, CRef::UNDEF);
                self.unit_clauses.push(!lit);
            }
            self.v.ok = self.v.propagate().is_none();
            return Ok(self.v.ok);
        }

        let cr = self.v.ca.alloc_at_most(&ps, k as u32);
        self.clauses.push(cr);
        self.v.attach_clause(cr);
        Ok(true)
    }

    fn solve_with<H: Handler + ?Sized>(
        &mut self,
        assumps: &[Lit],
        handler: &mut H,
    ) -> Result<SolveResult> {
        if self.in_call {
            return Err(Error::SolveInProgress);
        }
        self.in_call = true;
        self.v.assumptions.clear();
        self.v.assumptions.extend_from_slice(assumps);
        let res = self.solve_internal(handler);
        self.in_call = false;
        Ok(res)
    }

    fn simplify(&mut self) -> bool {
        self.simplify_internal()
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&v| v)
    }
    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    fn num_learnts(&self) -> u64 {
        self.v.num_learnts
    }
    fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn unsat_core(&self) -> &[Lit] {
        self.conflict.as_slice()
    }

    fn unsat_core_contains_lit(&self, lit: Lit) -> bool {
        self.conflict.has(lit)
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }

    fn save_state(&mut self) -> SolverState {
        debug_assert_eq!(self.v.decision_level(), 0);
        let id = self.next_state_id;
        self.next_state_id += 1;
        self.valid_states.push(id);
        debug!("save_state {}", id);
        SolverState {
            id,
            ok: self.v.ok,
            n_vars: self.v.num_vars(),
            ca_len: self.v.ca.len(),
            n_clauses: self.clauses.len(),
            n_units: self.unit_clauses.len(),
            proof_len: self.proof.as_ref().map_or(0, |p| p.len()),
        }
    }

    fn load_state(&mut self, state: &SolverState) -> Result<()> {
        let pos = self
            .valid_states
            .iter()
            .position(|&id| id == state.id)
            .ok_or(Error::InvalidState(state.id))?;
        self.valid_states.truncate(pos + 1);
        debug!("load_state {}", state.id);

        self.v.complete_backtrack();
        self.v.ok = state.ok;

        // clauses added after the checkpoint, or learnt after it
        for &cr in &self.clauses[state.n_clauses..] {
            self.v.remove_clause(cr);
        }
        self.clauses.truncate(state.n_clauses);
        {
            let self_v = &mut self.v;
            self.learnts.retain(|&cr| {
                let keep = self_v.ca.get_ref(cr).learnt_on_state() <= state.id;
                if !keep {
                    self_v.remove_clause(cr);
                }
                keep
            });
        }
        self.v.clean_all_watches();
        self.v.ca.truncate(state.ca_len);

        self.v.shrink_vars(state.n_vars);
        self.names.retain(|_, v| v.idx() < state.n_vars);

        self.unit_clauses.truncate(state.n_units);
        if self.v.ok {
            for i in 0..self.unit_clauses.len() {
                let lit = self.unit_clauses[i];
                let value = self.v.value_lit(lit);
                if value == lbool::UNDEF {
                    self.v.vars.unchecked_enqueue(lit, CRef::UNDEF);
                    if self.v.propagate().is_some() {
                        self.v.ok = false;
                        break;
                    }
                } else if value == lbool::FALSE {
                    self.v.ok = false;
                    break;
                }
            }
        }

        if let Some(proof) = self.proof.as_mut() {
            proof.truncate(state.proof_len);
        }
        self.model.clear();
        self.conflict.clear();
        self.v.simp_db_assigns = -1;
        self.v.simp_db_props = 0;
        Ok(())
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::build(&SolverOpts::default())
    }
}

// main algorithm
impl Solver {
    /// Create a new solver with the given options.
    pub fn new(opts: SolverOpts) -> Result<Self> {
        opts.check()?;
        Ok(Solver::build(&opts))
    }

    fn build(opts: &SolverOpts) -> Self {
        Self {
            model: vec![],
            conflict: LSet::new(),
            clauses: vec![],
            learnts: vec![],
            unit_clauses: vec![],
            v: SolverV::new(opts),
            in_call: false,
            canceled: None,
            valid_states: vec![],
            next_state_id: 0,
            names: HashMap::new(),
            proof: if opts.produce_proof {
                Some(Proof::new())
            } else {
                None
            },
            tmp_learnt: vec![],
            tmp_selectors: vec![],
        }
    }

    /// Give `v` a name, replacing any variable previously known by it.
    pub fn name_var(&mut self, v: Var, name: &str) {
        self.names.insert(name.to_string(), v);
    }

    /// Variable previously named `name`, if it still exists.
    pub fn var_by_name(&self, name: &str) -> Option<Var> {
        self.names.get(name).cloned()
    }

    /// Mark `v` as a selector: a variable only used in assumptions to
    /// switch groups of clauses on and off.
    pub fn set_selector(&mut self, v: Var) {
        self.v.selector[v] = true;
    }

    /// Decide these literals, in order, before consulting the activity heap.
    pub fn set_selection_order(&mut self, lits: &[Lit]) {
        self.v.selection_order.clear();
        self.v.selection_order.extend_from_slice(lits);
        self.v.selection_order_idx = 0;
    }

    pub fn reset_selection_order(&mut self) {
        self.v.selection_order.clear();
        self.v.selection_order_idx = 0;
    }

    /// The DRUP proof recorded so far, if proof production is enabled.
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Number of calls to `solve` so far.
    pub fn num_solves(&self) -> u64 {
        self.v.solves
    }

    /// Number of clause database reductions so far.
    pub fn num_reduce_db(&self) -> u64 {
        self.v.reduce_dbs
    }

    fn simplify_internal(&mut self) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok || self.v.propagate().is_some() {
            self.set_unsat();
            return false;
        }

        if self.v.num_assigns() as i32 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.remove_satisfied(ClauseSetSelect::Learnt); // Remove satisfied learnt clauses
        if self.v.remove_satisfied && self.valid_states.is_empty() {
            // original clauses are needed by every live checkpoint, and
            // the removed ones may be the only reasons of level 0 facts
            self.unit_clauses.clear();
            self.unit_clauses.extend_from_slice(&self.v.vars.trail);
            self.remove_satisfied(ClauseSetSelect::Original);
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i32;
        // (shouldn't depend on stats really, but it will do for now)
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;

        true
    }

    fn set_unsat(&mut self) {
        if self.v.ok {
            if let Some(proof) = self.proof.as_mut() {
                proof.create_clause(&Vec::<Lit>::new());
            }
        }
        self.v.ok = false;
    }

    /// Search for a model the specified number of conflicts.
    ///
    /// Use negative value for `nof_conflicts` to let the Glucose restart
    /// policy decide.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a partial assigment that is consistent with respect to the clauseset is found. If
    ///    all variables are decision variables, this means that the clause set is satisfiable.
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - 'lbool::UNDEF` on restart, or if the handler canceled the search
    ///   (`self.canceled` is then set).
    fn search<H: Handler + ?Sized>(&mut self, handler: &mut H, nof_conflicts: i32) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;
        let mut learnt = mem::replace(&mut self.tmp_learnt, vec![]);
        let mut selectors = mem::replace(&mut self.tmp_selectors, vec![]);

        let res = loop {
            // boolean propagation
            let confl = self.v.propagate();

            if let Some(confl) = confl {
                // conflict analysis
                self.v.conflicts += 1;
                self.v.conflicts_restarts += 1;
                conflict_c += 1;
                if self.v.conflicts % 5000 == 0 && self.v.vars.var_decay < self.v.max_var_decay {
                    self.v.vars.var_decay += 0.01;
                }
                if self.v.decision_level() == 0 {
                    break lbool::FALSE;
                }
                let event = Event::ConflictDetected;
                if !handler.should_resume(&event) {
                    self.canceled = Some(event);
                    break lbool::UNDEF;
                }

                self.v.trail_queue.push(self.v.vars.trail.len() as u32);
                if self.v.restart_policy == RestartPolicy::Glucose
                    && self.v.conflicts_restarts > LB_BLOCKING_RESTART
                    && self.v.lbd_queue.is_valid()
                    && self.v.vars.trail.len() as f64 > self.v.factor_r * self.v.trail_queue.avg()
                {
                    // the trail is unusually large: we may be close to a model
                    self.v.lbd_queue.fast_clear();
                }

                let (backtrack_lvl, lbd) =
                    self.v
                        .analyze(confl, &self.learnts, &mut learnt, &mut selectors);
                self.v.lbd_queue.push(lbd);
                self.v.sum_lbd += lbd as f64;
                self.add_learnt_and_backtrack(&learnt, backtrack_lvl, lbd);

                self.v.vars.var_decay_activity();
                self.v.cla_decay_activity();
            } else {
                // no boolean conflict
                let restart = match self.v.restart_policy {
                    RestartPolicy::Glucose => {
                        self.v.lbd_queue.is_valid()
                            && self.v.lbd_queue.avg() * self.v.factor_k
                                > self.v.sum_lbd / self.v.conflicts_restarts as f64
                    }
                    RestartPolicy::Luby => nof_conflicts >= 0 && conflict_c >= nof_conflicts,
                };
                if restart {
                    self.v.lbd_queue.fast_clear();
                    let lvl = if self.v.incremental {
                        cmp::min(self.v.decision_level(), self.v.assumptions.len() as u32)
                    } else {
                        0
                    };
                    self.v.cancel_until(lvl);
                    break lbool::UNDEF;
                }

                // Simplify the set of problem clauses:
                if self.v.decision_level() == 0 && !self.simplify_internal() {
                    break lbool::FALSE;
                }

                if self.v.conflicts >= self.v.cur_restart * self.v.nb_clauses_before_reduce
                    && self.learnts.len() > 0
                {
                    // Reduce the set of learnt clauses:
                    self.v.cur_restart = self.v.conflicts / self.v.nb_clauses_before_reduce + 1;
                    self.reduce_db();
                    self.v.nb_clauses_before_reduce += self.v.inc_reduce_db;
                }

                // select the next decision (using assumptions, or variable heap)
                let mut next = Lit::UNDEF;
                while (self.v.decision_level() as usize) < self.v.assumptions.len() {
                    // Perform user provided assumption:
                    let p = self.v.assumptions[self.v.decision_level() as usize];
                    if self.v.value_lit(p) == lbool::TRUE {
                        // Dummy decision level, since `p` is true already:
                        self.v.vars.new_decision_level();
                    } else if self.v.value_lit(p) == lbool::FALSE {
                        // `p` cannot hold under the previous assumptions
                        let mut conflict = mem::replace(&mut self.conflict, LSet::new());
                        self.v.analyze_final(p, &mut conflict);
                        self.conflict = conflict;
                        debug!("assumption conflict {:?}", self.conflict.as_slice());
                        break;
                    } else {
                        next = p;
                        break;
                    }
                }
                if self.conflict.len() > 0 {
                    break lbool::FALSE;
                }

                if next == Lit::UNDEF {
                    // new variable decision:
                    next = self.v.pick_branch_lit();

                    if next == Lit::UNDEF {
                        // Model found
                        break lbool::TRUE;
                    }
                    self.v.decisions += 1;
                }

                debug_assert_ne!(next, Lit::UNDEF);

                // Increase decision level and enqueue `next`
                // with no justification since it's a decision
                self.v.vars.new_decision_level();
                trace!("pick-next {:?}", next);
                self.v.vars.unchecked_enqueue(next, CRef::UNDEF);
            }
        };

        self.tmp_learnt = learnt;
        self.tmp_selectors = selectors;
        res
    }

    /// Add a learnt clause and backtrack/propagate as necessary
    fn add_learnt_and_backtrack(&mut self, learnt: &[Lit], backtrack_lvl: u32, lbd: u32) {
        trace!("learnt {} (lbd {})", learnt.pp_dimacs(), lbd);
        if let Some(proof) = self.proof.as_mut() {
            proof.create_clause(&learnt);
        }
        self.v.cancel_until(backtrack_lvl);

        if learnt.len() == 1 {
            // directly propagate the unit clause at level 0
            self.v.vars.unchecked_enqueue(learnt[0], CRef::UNDEF);
            self.unit_clauses.push(learnt[0]);
        } else {
            // propagate the lit, justified by `cr`
            let cr = self.v.ca.alloc_with_learnt(learnt, true);
            {
                let mut c = self.v.ca.get_mut(cr);
                c.set_lbd(lbd);
                c.set_learnt_on_state(self.next_state_id);
            }
            self.learnts.push(cr);
            self.v.attach_clause(cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            self.v.vars.unchecked_enqueue(learnt[0], cr);
        }
    }

    /// Main solve method (assumptions given in `self.v.assumptions`).
    fn solve_internal<H: Handler + ?Sized>(&mut self, handler: &mut H) -> SolveResult {
        assert!(self.v.decision_level() == 0);
        self.model.clear();
        self.conflict.clear();
        self.canceled = None;

        let start = Event::ComputationStarted(Computation::SatCall);
        if !handler.should_resume(&start) {
            return SolveResult::Canceled(start);
        }
        if !self.v.ok {
            handler.should_resume(&Event::ComputationFinished(Computation::SatCall));
            return SolveResult::Unsat;
        }

        self.v.solves += 1;
        self.v.reset_restart_state();

        info!("search.start");

        // Search:
        let mut status = lbool::UNDEF;
        let mut curr_restarts: i32 = 0;
        while status == lbool::UNDEF {
            let nof_conflicts = match self.v.restart_policy {
                RestartPolicy::Luby => {
                    (utils::luby(self.v.restart_inc, curr_restarts) * self.v.restart_first as f64)
                        as i32
                }
                RestartPolicy::Glucose => -1,
            };
            status = self.search(handler, nof_conflicts);
            if self.canceled.is_some() {
                break;
            }
            if status == lbool::UNDEF {
                trace!("search.restart({})", curr_restarts);
                curr_restarts += 1;
            }
        }

        let res = if let Some(event) = self.canceled.take() {
            debug!("search canceled by {:?}", event);
            SolveResult::Canceled(event)
        } else if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.v.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
            SolveResult::Sat
        } else {
            if self.conflict.len() == 0 {
                // NOTE: with assumptions, `self.conflict` contains the unsat-core
                // and adding new clauses might succeed in their absence.
                self.set_unsat();
            }
            SolveResult::Unsat
        };

        self.v.cancel_until(0);
        info!("search.done {:?}", res);
        trace!(
            "proved at lvl 0: {:?}",
            self.v.vars.proved_at_lvl_0()
        );
        handler.should_resume(&Event::ComputationFinished(Computation::SatCall));
        res
    }

    /// Remove about half of the learnt clauses, keeping binary clauses, clauses
    /// with a small LBD, and clauses that are the reason of an assignment.
    fn reduce_db(&mut self) {
        debug!("reduce_db.start ({} learnts)", self.learnts.len());
        self.v.reduce_dbs += 1;

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                // worst clauses first
                Ord::cmp(&(x.size() == 2), &(y.size() == 2))
                    .then(Ord::cmp(&y.lbd(), &x.lbd()))
                    .then(
                        PartialOrd::partial_cmp(&x.activity(), &y.activity())
                            .unwrap_or(cmp::Ordering::Equal),
                    )
            });
        }

        let len = self.learnts.len();
        if len == 0 {
            return;
        }
        // many good clauses: wait longer before the next reduction
        if self.v.ca.get_ref(self.learnts[len / 2]).lbd() <= 3 {
            self.v.nb_clauses_before_reduce += self.v.special_inc_reduce_db;
        }
        if self.v.ca.get_ref(self.learnts[len - 1]).lbd() <= 5 {
            self.v.nb_clauses_before_reduce += self.v.special_inc_reduce_db;
        }

        let mut limit = len / 2;
        let mut j = 0;
        for i in 0..len {
            let cr = self.learnts[i];
            let (remove, can_be_del) = {
                let c = self.v.ca.get_ref(cr);
                let remove = c.lbd() > 2
                    && c.size() > 2
                    && c.can_be_del()
                    && !self.v.locked(cr)
                    && i < limit;
                (remove, c.can_be_del())
            };
            if remove {
                if let Some(proof) = self.proof.as_mut() {
                    proof.delete_clause(&self.v.ca.get_ref(cr));
                }
                self.v.remove_clause(cr);
            } else {
                if !can_be_del {
                    // frozen clause: protect it once, and keep the ratio
                    limit += 1;
                }
                self.v.ca.get_mut(cr).set_can_be_del(true);
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);

        debug!("reduce_db.done (deleted {})", len - j);

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, which: ClauseSetSelect) {
        assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = match which {
            ClauseSetSelect::Learnt => &mut self.learnts,
            ClauseSetSelect::Original => &mut self.clauses,
        };
        let self_v = &mut self.v;
        let proof = &mut self.proof;
        cs.retain(|&cr| {
            let satisfied = {
                let c = self_v.ca.get_ref(cr);
                !c.at_most() && self_v.satisfied(cr)
            };
            if satisfied {
                trace!("remove satisfied clause {}", self_v.ca.get_ref(cr).pp_dimacs());
                if let Some(proof) = proof.as_mut() {
                    proof.delete_clause(&self_v.ca.get_ref(cr));
                }
                self_v.remove_clause(cr);
            }
            !satisfied
        });
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        // Initialize the next region to a size corresponding to the estimated utilization degree. This
        // is not precise but should avoid some unnecessary reallocations for the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        debug!(
            "garbage_collect: {} -> {} slots",
            self.v.ca.len(),
            to.len()
        );
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator exceeds
    /// the threshold. Clause handles must stay stable while checkpoints exist.
    fn check_garbage(&mut self) {
        if self.valid_states.is_empty()
            && self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac
        {
            self.garbage_collect();
        }
    }

    /// Add clause.
    ///
    /// Precondition: `clause` is sorted for some ordering on `Lit`
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }

        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        // remove duplicates, true literals, etc.
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            if value == lbool::TRUE || lit_i == !last_lit {
                return true; // tauto or satisfied already at level 0
            } else if value != lbool::FALSE && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }

        clause.truncate(j);
        if clause.len() == 0 {
            self.set_unsat();
            return false;
        } else if clause.len() == 1 {
            self.v.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
            self.unit_clauses.push(clause[0]);
            if self.v.propagate().is_some() {
                self.set_unsat();
                return false;
            }
        } else {
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.clauses.push(cr);
            self.v.attach_clause(cr);
        }

        true
    }
}

impl SolverV {
    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    fn reset_restart_state(&mut self) {
        self.lbd_queue.fast_clear();
        self.trail_queue.fast_clear();
        self.sum_lbd = 0.0;
        self.conflicts_restarts = 0;
        self.selection_order_idx = 0;
    }

    /// Pick a literal to make a decision with
    fn pick_branch_lit(&mut self) -> Lit {
        // User-provided order comes first
        while self.selection_order_idx < self.selection_order.len() {
            let lit = self.selection_order[self.selection_order_idx];
            self.selection_order_idx += 1;
            if self.value_lit(lit) == lbool::UNDEF && self.decision[lit.var()] {
                return lit;
            }
        }

        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap().is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            match self.order_heap().remove_min() {
                None => {
                    next = Var::UNDEF;
                    break;
                }
                Some(v) => next = v,
            }
        }

        // Choose polarity based on different polarity modes (global or per-variable):
        if next == Var::UNDEF {
            Lit::UNDEF
        } else if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(v.idx() + 1);
        for &sign in &[false, true] {
            self.watches_data.init(Lit::new(v, sign));
            self.watches_bin_data.init(Lit::new(v, sign));
        }
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars
            .vardata
            .insert_default(v, VarData::new(CRef::UNDEF, 0));
        self.vars.activity.insert_default(v, 0.0);
        self.seen.insert_default(v, Seen::UNDEF);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, upol);
        self.decision.insert_default(v, false);
        self.selector.insert_default(v, false);
        self.perm_diff.push(0);
        let len = self.vars.trail.len();
        if v.idx() as usize > len {
            self.vars.trail.reserve(v.idx() as usize + 1 - len);
        }
        self.set_decision_var(v, dvar);
        v
    }

    /// Forget every variable `>= n`. Must be called with an empty trail,
    /// after every clause mentioning these variables has been removed.
    fn shrink_vars(&mut self, n: u32) {
        let cur = self.num_vars();
        if n >= cur {
            return;
        }
        for v in (n..cur).map(Var::from_idx) {
            if self.order_heap().in_heap(v) {
                self.order_heap().remove(v);
            }
            if self.decision[v] {
                self.dec_vars -= 1;
            }
        }
        let n_us = n as usize;
        self.order_heap_data.truncate(n_us);
        self.watches_data.truncate(2 * n_us);
        self.watches_bin_data.truncate(2 * n_us);
        self.vars.truncate(n_us);
        self.seen.truncate(n_us);
        self.polarity.truncate(n_us);
        self.user_pol.truncate(n_us);
        self.decision.truncate(n_us);
        self.selector.truncate(n_us);
        self.perm_diff.truncate(n_us + 1);
        self.selection_order.retain(|lit| lit.var().idx() < n);
        self.selection_order_idx = 0;
        self.assumptions.clear();
        self.next_var = Var::from_idx(n);
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    /// - `confl` is false in the current trail
    ///
    /// # Post-conditions:
    ///
    /// - `(btlevel, lbd)` is returned.
    /// - `out_learnt[0]` is the asserting literal at level `btlevel`.
    /// - if `out_learnt.size() > 1` then `out_learnt[1]` has the greatest decision level of the
    ///   rest of literals. There may be others from the same level though.
    /// - in incremental mode, the selector literals of lower levels are the
    ///   last ones of the clause, and do not count in the LBD.
    fn analyze(
        &mut self,
        confl: CRef,
        learnts: &[CRef],
        out_learnt: &mut Vec<Lit>,
        selectors: &mut Vec<Lit>,
    ) -> (u32, u32) {
        debug_assert!(self.decision_level() > 0);
        out_learnt.clear();
        selectors.clear();
        self.last_decision_level.clear();

        let conflict_level = self.decision_level() as i32;
        let mut path_c = 0;
        let mut p = Lit::UNDEF;
        let mut cr = confl;
        let mut index = self.vars.trail.len();

        // Generate conflict clause:
        out_learnt.push(Lit::UNDEF); // (leave room for the asserting literal)
        loop {
            debug_assert_ne!(cr, CRef::UNDEF, "analyze: reached a decision {:?}", p);
            if p != Lit::UNDEF {
                self.order_binary_reason(cr);
            }

            let (learnt, lbd) = {
                let c = self.ca.get_ref(cr);
                let learnt = c.learnt();
                (learnt, if learnt { c.lbd() } else { 0 })
            };
            if learnt {
                self.cla_bump_activity(learnts, cr);
                if lbd > 2 {
                    self.my_flag += 1;
                    let nblevels = compute_lbd(
                        &self.vars,
                        &self.selector,
                        self.incremental,
                        &mut self.perm_diff,
                        self.my_flag,
                        self.ca.get_ref(cr).lits(),
                    );
                    if nblevels + 1 < lbd {
                        // improve the LBD
                        let mut c = self.ca.get_mut(cr);
                        if lbd <= self.lb_lbd_frozen_clause {
                            c.set_can_be_del(false);
                        }
                        c.set_lbd(nblevels);
                    }
                }
            }

            {
                let c = self.ca.get_ref(cr);
                let at_most = c.at_most();
                let start = if at_most || p == Lit::UNDEF { 0 } else { 1 };
                for &lit in &c.lits()[start..] {
                    // the antecedents of an at-most constraint are its true literals
                    let q = if at_most {
                        if self.vars.value_lit(lit) != lbool::TRUE {
                            continue;
                        }
                        !lit
                    } else {
                        lit
                    };
                    let x = q.var();
                    let lvl = self.vars.level(x);
                    if !self.seen[x].is_seen() && lvl > 0 {
                        self.vars.var_bump_activity(&mut self.order_heap_data, x);
                        self.seen[x] = Seen::SOURCE;
                        if lvl >= conflict_level {
                            path_c += 1;
                            let r = self.vars.reason(x);
                            if r != CRef::UNDEF && self.ca.get_ref(r).learnt() {
                                self.last_decision_level.push(q);
                            }
                        } else if self.incremental && self.selector[x] {
                            selectors.push(q);
                        } else {
                            out_learnt.push(q);
                        }
                    }
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                index -= 1;
            }
            index -= 1;
            p = self.vars.trail[index];
            cr = self.reason(p.var());
            self.seen[p.var()] = Seen::UNDEF;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }
        out_learnt[0] = !p;

        self.minimize_conflict(out_learnt);

        if out_learnt.len() as u32 <= self.lb_size_minimizing_clause {
            self.my_flag += 1;
            let lbd = compute_lbd(
                &self.vars,
                &self.selector,
                self.incremental,
                &mut self.perm_diff,
                self.my_flag,
                out_learnt,
            );
            if lbd <= self.lb_lbd_minimizing_clause {
                self.minimize_with_binary_resolution(out_learnt);
            }
        }
        self.tot_literals += out_learnt.len() as u64;

        // selector literals stay out of the minimization
        out_learnt.extend_from_slice(selectors);
        self.analyze_toclear.extend_from_slice(selectors);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(1, max_i);
            max_level as u32
        };

        self.my_flag += 1;
        let lbd = compute_lbd(
            &self.vars,
            &self.selector,
            self.incremental,
            &mut self.perm_diff,
            self.my_flag,
            out_learnt,
        );

        // literals of the last level propagated by good clauses are worth more
        for i in 0..self.last_decision_level.len() {
            let lit = self.last_decision_level[i];
            let r = self.reason(lit.var());
            if self.ca.get_ref(r).lbd() < lbd {
                self.vars
                    .var_bump_activity(&mut self.order_heap_data, lit.var());
            }
        }
        self.last_decision_level.clear();

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = Seen::UNDEF; // (`seen[]` is now cleared)
        }
        debug_assert!(self.seen.iter().all(|(_, &s)| s == Seen::UNDEF));

        (btlevel, lbd)
    }

    /// Binary reasons are not kept ordered by propagation: make sure the
    /// implied literal comes first.
    fn order_binary_reason(&mut self, cr: CRef) {
        let (at_most, size, c0) = {
            let c = self.ca.get_ref(cr);
            (c.at_most(), c.size(), c[0])
        };
        if !at_most && size == 2 && self.vars.value_lit(c0) == lbool::FALSE {
            self.ca.get_mut(cr).swap(0, 1);
        }
    }

    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        self.max_literals += out_learnt.len() as u64;
        let new_size = match self.ccmin_mode {
            ClauseMinimization::Deep => {
                let mut abstract_levels = 0;
                for a in out_learnt[1..].iter() {
                    abstract_levels |= self.abstract_level(a.var())
                }

                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let lit = out_learnt[i];
                    // can eliminate `lit` only if it's redundant *and* not a decision
                    if self.reason(lit.var()) == CRef::UNDEF
                        || !self.lit_redundant(lit, abstract_levels)
                    {
                        out_learnt[j] = lit;
                        j += 1;
                    }
                }
                j
            }
            ClauseMinimization::Basic => {
                let mut j = 1;
                for i in 1..out_learnt.len() {
                    let lit = out_learnt[i];
                    let reason = self.reason(lit.var());

                    let retain = reason == CRef::UNDEF || {
                        self.order_binary_reason(reason);
                        let c = self.ca.get_ref(reason);
                        let at_most = c.at_most();
                        let start = if at_most { 0 } else { 1 };
                        c.lits()[start..].iter().any(|&l| {
                            if at_most && self.vars.value_lit(l) != lbool::TRUE {
                                return false;
                            }
                            let v = l.var();
                            v != lit.var() && !self.seen[v].is_seen() && self.level(v) > 0
                        })
                    };
                    if retain {
                        out_learnt[j] = lit;
                        j += 1;
                    }
                }
                j
            }
            ClauseMinimization::None => out_learnt.len(),
        };

        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Remove literals `l` of the learnt clause when a binary clause
    /// `(out_learnt[0] \/ !l)` exists.
    fn minimize_with_binary_resolution(&mut self, out_learnt: &mut Vec<Lit>) {
        let p = !out_learnt[0];
        self.my_flag += 1;
        let flag = self.my_flag;
        for lit in &out_learnt[1..] {
            self.perm_diff[lit.var().idx() as usize] = flag;
        }

        let mut nb = 0;
        {
            let ws = self
                .watches_bin_data
                .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });
            for w in ws.iter() {
                let imp = w.blocker;
                let x = imp.var().idx() as usize;
                if self.perm_diff[x] == flag && self.vars.value_lit(imp) == lbool::TRUE {
                    nb += 1;
                    self.perm_diff[x] = flag - 1;
                }
            }
        }

        if nb > 0 {
            let perm_diff = &self.perm_diff;
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                if perm_diff[lit.var().idx() as usize] == flag {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            trace!("binary resolution removed {} literals", out_learnt.len() - j);
            out_learnt.truncate(j);
        }
    }

    /// Specialized analysis procedure to express the final conflict in terms of assumptions.
    /// Calculates the set of assumptions that led to the assignment of `!p`
    /// (`p` being a false assumption), and stores them in `out_conflict`.
    fn analyze_final(&mut self, p: Lit, out_conflict: &mut LSet) {
        out_conflict.clear();
        out_conflict.insert(p);
        debug!("analyze_final lit={:?}", p);

        if self.decision_level() == 0 {
            return; // no assumptions
        }

        self.seen[p.var()] = Seen::SOURCE;

        let start = self.vars.trail_lim[0] as usize;
        for i in (start..self.vars.trail.len()).rev() {
            let lit = self.vars.trail[i];
            let x = lit.var();
            if self.seen[x].is_seen() {
                let reason = self.reason(x);
                if reason == CRef::UNDEF {
                    // only assumptions are decided at these levels
                    debug_assert!(self.level(x) > 0);
                    out_conflict.insert(lit);
                } else {
                    self.order_binary_reason(reason);
                    let c = self.ca.get_ref(reason);
                    let at_most = c.at_most();
                    let start = if at_most { 0 } else { 1 };
                    for &l in &c.lits()[start..] {
                        if at_most && self.vars.value_lit(l) != lbool::TRUE {
                            continue;
                        }
                        if self.vars.level(l.var()) > 0 {
                            self.seen[l.var()] = Seen::SOURCE;
                        }
                    }
                }
                self.seen[x] = Seen::UNDEF;
            }
        }

        self.seen[p.var()] = Seen::UNDEF;
        debug_assert!(self.seen.iter().all(|(_, &s)| s == Seen::UNDEF));
    }

    /// Check if `p` can be removed from a conflict clause `C`.
    ///
    /// It can be removed from `C` if it is propagation-implied
    /// by literals of level 0 exclusively or if `C x p.reason` subsumes `C`.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while let Some(q) = self.minimize_stack.pop() {
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);
            self.order_binary_reason(cr);

            let c = self.ca.get_ref(cr);
            let at_most = c.at_most();
            let start = if at_most { 0 } else { 1 };
            // `q` comes from some propagation with `c`, check if these lits can
            // also be eliminated or are already in the learnt clause
            for &lit in c.lits()[start..].iter() {
                let l = if at_most {
                    if self.vars.value_lit(lit) != lbool::TRUE {
                        continue;
                    }
                    !lit
                } else {
                    lit
                };
                // Variable at level 0 or previously removable: just skip
                if self.vars.level(l.var()) == 0 || self.seen[l.var()] == Seen::SOURCE {
                    continue;
                }

                if self.reason(l.var()) != CRef::UNDEF
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    // keep this literal.
                    // NOTE: if the level of `l` isn't in `abstract_levels`, it
                    // means it comes from propagations at a decision level
                    // unrelated to the learnt clause, and therefore is
                    // somehow implied by an unrelated decision, so there's no
                    // chance to eliminate `l` via resolutions from the learnt clause.
                    self.seen[l.var()] = Seen::SOURCE;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for a in self.analyze_toclear[top..].iter() {
                        self.seen[a.var()] = Seen::UNDEF;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            num_props += 1;

            // Binary clauses first, they need no clause inspection
            {
                let ws = self
                    .watches_bin_data
                    .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });
                for w in ws.iter() {
                    let imp = w.blocker;
                    let value = self.vars.value_lit(imp);
                    if value == lbool::FALSE {
                        confl = Some(w.cref);
                        break;
                    } else if value == lbool::UNDEF {
                        self.vars.unchecked_enqueue(imp, w.cref);
                    }
                }
            }
            if confl.is_some() {
                self.qhead = self.vars.trail.len() as i32;
                break;
            }

            // the list of `p` is not modified while we walk it: every new
            // watch goes to a literal that is not false
            let mut ws = mem::replace(
                self.watches_data
                    .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca }),
                vec![],
            );
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if blocker != Lit::UNDEF && self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                let cr = ws[i].cref;
                if self.ca.get_ref(cr).at_most() {
                    let w = ws[i];
                    i += 1;
                    match self.update_at_most_watch(cr, p) {
                        AtMostWatch::Moved(q) => self.watches_data[q].push(w),
                        AtMostWatch::Stale => (),
                        AtMostWatch::Propagate => {
                            ws[j] = w;
                            j += 1;
                            let c = self.ca.get_ref(cr);
                            for &lit in &c.lits()[..c.watched() as usize] {
                                if lit != p && self.vars.value_lit(lit) == lbool::UNDEF {
                                    self.vars.unchecked_enqueue(!lit, cr);
                                }
                            }
                        }
                        AtMostWatch::Conflict => {
                            ws[j] = w;
                            j += 1;
                            confl = Some(cr);
                            self.qhead = self.vars.trail.len() as i32;
                            // Copy the remaining watches:
                            while i < end {
                                ws[j] = ws[i];
                                j += 1;
                                i += 1;
                            }
                        }
                    }
                    continue;
                }

                // Make sure the false literal is data[1]:
                let mut c = self.ca.get_mut(cr);
                let false_lit = !p;
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;

                        debug_assert_ne!(!c[1], p);
                        self.watches_data[!c[1]].push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            ws.truncate(j);
            let slot = &mut self.watches_data[p];
            debug_assert!(slot.is_empty());
            *slot = ws;
        }
        self.propagations += num_props as u64;
        self.simp_db_props -= num_props as i64;

        confl
    }

    /// Watched literal `p` of the at-most constraint `cr` just became true.
    ///
    /// The first `watched = size-k+1` literals are watched: as long as one
    /// of them is not true, at most `k-1` literals of the rest can be true.
    fn update_at_most_watch(&mut self, cr: CRef, p: Lit) -> AtMostWatch {
        let (watched, size) = {
            let c = self.ca.get_ref(cr);
            (c.watched(), c.size())
        };
        let vars = &self.vars;
        let mut c = self.ca.get_mut(cr);
        let pos = match (0..watched).find(|&k| c[k] == p) {
            Some(pos) => pos,
            None => return AtMostWatch::Stale,
        };

        // Look for a replacement among the unwatched literals
        for k in watched..size {
            if vars.value_lit(c[k]) != lbool::TRUE {
                c.swap(pos, k);
                return AtMostWatch::Moved(c[pos]);
            }
        }

        // `p` and the `k-1` unwatched literals are true
        let other_true = (0..watched).any(|k| k != pos && vars.value_lit(c[k]) == lbool::TRUE);
        if other_true {
            AtMostWatch::Conflict
        } else {
            AtMostWatch::Propagate
        }
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    fn clean_all_watches(&mut self) {
        let pred = WatcherDeleted { ca: &self.ca };
        self.watches_data.clean_all_pred(&pred);
        self.watches_bin_data.clean_all_pred(&pred);
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.clean_all_watches();
        {
            let ca = &mut self.ca;
            self.watches_data
                .map_in_place(|w| ca.reloc(&mut w.cref, to));
            self.watches_bin_data
                .map_in_place(|w| ca.reloc(&mut w.cref, to));
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();

            // Note: it is not safe to call `locked()` on a relocated clause.
            let reason = self.reason(v);
            if reason != CRef::UNDEF {
                let reloced = self.ca.get_mut(reason).reloced();
                if reloced || self.locked(reason) {
                    debug_assert!(!is_removed!(self.ca, reason));
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                } else {
                    self.vars.vardata[v].reason = CRef::UNDEF;
                }
            }
        }

        // All learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.truncate(j);
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.truncate(j);
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause(&mut self, cr: CRef) {
        let (learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            if c.at_most() {
                for &lit in &c.lits()[..c.watched() as usize] {
                    self.watches_data[lit].push(Watcher::new(cr, Lit::UNDEF));
                }
            } else if c.size() == 2 {
                self.watches_bin_data[!c[0]].push(Watcher::new(cr, c[1]));
                self.watches_bin_data[!c[1]].push(Watcher::new(cr, c[0]));
            } else {
                self.watches_data[!c[0]].push(Watcher::new(cr, c[1]));
                self.watches_data[!c[1]].push(Watcher::new(cr, c[0]));
            }
            (c.learnt(), c.size())
        };
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let trail_lim_last = match self.vars.trail_lim.last() {
            Some(&lim) => lim as usize,
            None => return,
        };
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level as i32;
        self.vars.trail.truncate(trail_lim_level);
        self.vars.trail_lim.truncate(level as usize);
        self.selection_order_idx = 0;
    }

    /// Unassign everything, including level 0.
    fn complete_backtrack(&mut self) {
        for c in (0..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            self.insert_var_order(x);
        }
        self.vars.trail.clear();
        self.vars.trail_lim.clear();
        self.qhead = 0;
        self.selection_order_idx = 0;
    }

    /// Detach a clause from watcher lists. Watchers are removed lazily.
    fn detach_clause(&mut self, cr: CRef) {
        let c = self.ca.get_ref(cr);
        debug_assert!(c.size() > 1);
        if c.at_most() {
            for &lit in &c.lits()[..c.watched() as usize] {
                self.watches_data.smudge(lit);
            }
        } else if c.size() == 2 {
            self.watches_bin_data.smudge(!c[0]);
            self.watches_bin_data.smudge(!c[1]);
        } else {
            self.watches_data.smudge(!c[0]);
            self.watches_data.smudge(!c[1]);
        }

        if c.learnt() {
            self.num_learnts -= 1;
            self.learnts_literals -= c.size() as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= c.size() as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        {
            // Don't leave pointers to free'd memory!
            let c = self.ca.get_ref(cr);
            for &lit in c.lits() {
                let x = lit.var();
                if self.vars.ass[x] != lbool::UNDEF && self.vars.reason(x) == cr {
                    self.vars.vardata[x].reason = CRef::UNDEF;
                }
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    fn satisfied(&self, cr: CRef) -> bool {
        self.ca
            .get_ref(cr)
            .iter()
            .any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, cr: CRef) -> bool {
        let c = self.ca.get_ref(cr);
        if c.at_most() {
            // implied literals are the false ones
            return c
                .iter()
                .any(|&lit| self.value_lit(lit) == lbool::FALSE && self.reason(lit.var()) == cr);
        }
        // either literal of a binary clause can be the implied one
        let n = if c.size() == 2 { 2 } else { 1 };
        c.lits()[..n]
            .iter()
            .any(|&lit| self.value_lit(lit) == lbool::TRUE && self.reason(lit.var()) == cr)
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            max_var_decay: opts.max_var_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            restart_policy: opts.restart_policy,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            garbage_frac: opts.garbage_frac,
            remove_satisfied: opts.remove_satisfied,
            incremental: opts.incremental,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,
            factor_k: opts.factor_k,
            factor_r: opts.factor_r,
            inc_reduce_db: opts.inc_reduce_db,
            special_inc_reduce_db: opts.special_inc_reduce_db,
            lb_lbd_frozen_clause: opts.lb_lbd_frozen_clause,
            lb_size_minimizing_clause: opts.lb_size_minimizing_clause,
            lb_lbd_minimizing_clause: opts.lb_lbd_minimizing_clause,

            // Statistics:
            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            reduce_dbs: 0,
            max_literals: 0,
            tot_literals: 0,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            selector: VMap::new(),
            watches_data: OccListsData::new(),
            watches_bin_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            next_var: Var::from_idx(0),

            ca: ClauseAllocator::new(),
            assumptions: vec![],
            selection_order: vec![],
            selection_order_idx: 0,

            lbd_queue: utils::BoundedQueue::new(opts.lbd_queue_size),
            trail_queue: utils::BoundedQueue::new(opts.trail_queue_size),
            sum_lbd: 0.0,
            conflicts_restarts: 0,
            cur_restart: 1,
            nb_clauses_before_reduce: opts.first_reduce_db,

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            last_decision_level: vec![],
            perm_diff: vec![0],
            my_flag: 0,
        }
    }
}

/// Number of distinct decision levels among `lits` (selectors excluded in
/// incremental mode). `flag` must not have been used before.
fn compute_lbd(
    vars: &VarState,
    selector: &VMap<bool>,
    incremental: bool,
    perm_diff: &mut [u64],
    flag: u64,
    lits: &[Lit],
) -> u32 {
    let mut nblevels = 0;
    for &lit in lits {
        if incremental && selector[lit.var()] {
            continue;
        }
        let lvl = vars.level(lit.var()) as usize;
        if perm_diff[lvl] != flag {
            perm_diff[lvl] = flag;
            nblevels += 1;
        }
    }
    nblevels
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }

    /// Forget the variables `>= n`; the trail must be empty.
    fn truncate(&mut self, n: usize) {
        debug_assert!(self.trail.is_empty());
        self.ass.truncate(n);
        self.vardata.truncate(n);
        self.activity.truncate(n);
    }
}

#[derive(Debug, Clone, Copy)]
enum ClauseSetSelect {
    Original,
    Learnt,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    /// `Lit::UNDEF` for at-most constraints
    blocker: Lit,
}

/// What to do with the watcher of an at-most constraint whose watched
/// literal became true.
#[derive(Debug, Clone, Copy)]
enum AtMostWatch {
    /// Now watching this literal
    Moved(Lit),
    /// Every other watched literal must be false
    Propagate,
    Conflict,
    /// The literal is not watched anymore
    Stale,
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

/// Predicate to test whether a clause has been removed from some lit's watchlist
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Seen {
    UNDEF,
    SOURCE,
}

/// Conflicts after which restarts can be blocked.
const LB_BLOCKING_RESTART: u64 = 10000;

mod utils {
    use std::collections::VecDeque;

    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        return f64::powi(y, seq);
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        return *seed / 2147483647.0;
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }

    /// Sliding window over the last `max` values, with their running sum.
    #[derive(Debug, Clone)]
    pub(super) struct BoundedQueue {
        elems: VecDeque<u32>,
        max: usize,
        sum: u64,
    }

    impl BoundedQueue {
        pub(super) fn new(max: usize) -> Self {
            BoundedQueue {
                elems: VecDeque::with_capacity(max),
                max,
                sum: 0,
            }
        }

        pub(super) fn push(&mut self, x: u32) {
            if self.elems.len() == self.max {
                if let Some(old) = self.elems.pop_front() {
                    self.sum -= old as u64;
                }
            }
            self.elems.push_back(x);
            self.sum += x as u64;
        }

        /// Is the window full?
        pub(super) fn is_valid(&self) -> bool {
            self.elems.len() == self.max
        }

        pub(super) fn avg(&self) -> f64 {
            if self.elems.is_empty() {
                0.0
            } else {
                self.sum as f64 / self.elems.len() as f64
            }
        }

        pub(super) fn fast_clear(&mut self) {
            self.elems.clear();
            self.sum = 0;
        }
    }
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs])
            .unwrap_or(cmp::Ordering::Equal)
    }
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

impl Default for Seen {
    #[inline]
    fn default() -> Self {
        Seen::UNDEF
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::UNDEF
    }
}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

/// When to restart the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Restart when recent learnt clauses have a worse LBD than average,
    /// unless the trail is unusually large.
    Glucose,
    /// Restart after a budget of conflicts following the Luby sequence.
    Luby,
}

/// Conflict clause minimization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseMinimization {
    None,
    /// Drop literals whose reason is subsumed by the clause
    Basic,
    /// Recursive minimization
    Deep,
}

#[derive(Debug, Clone)]
pub struct SolverOpts {
    pub var_decay: f64,
    /// `var_decay` grows towards this value during search
    pub max_var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub ccmin_mode: ClauseMinimization,
    /// 0: no phase saving, 1: limited, 2: full
    pub phase_saving: i32,
    pub restart_policy: RestartPolicy,
    /// Luby only: conflicts before the first restart
    pub restart_first: i32,
    /// Luby only: base of the sequence
    pub restart_inc: f64,
    /// Size of the window of recent LBDs
    pub lbd_queue_size: usize,
    /// Size of the window of recent trail sizes
    pub trail_queue_size: usize,
    pub factor_k: f64,
    pub factor_r: f64,
    /// Conflicts before the first reduction of the learnt clauses
    pub first_reduce_db: u64,
    pub inc_reduce_db: u64,
    pub special_inc_reduce_db: u64,
    /// Learnt clauses whose LBD improves below this survive one more reduction
    pub lb_lbd_frozen_clause: u32,
    pub lb_size_minimizing_clause: u32,
    pub lb_lbd_minimizing_clause: u32,
    pub garbage_frac: f64,
    pub remove_satisfied: bool,
    /// Set selectors aside in learnt clauses and restart to the assumption level
    pub incremental: bool,
    /// Record a DRUP proof (incompatible with `add_at_most`)
    pub produce_proof: bool,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.8,
            max_var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: ClauseMinimization::Deep,
            phase_saving: 2,
            restart_policy: RestartPolicy::Glucose,
            restart_first: 100,
            restart_inc: 2.0,
            lbd_queue_size: 50,
            trail_queue_size: 5000,
            factor_k: 0.8,
            factor_r: 1.4,
            first_reduce_db: 2000,
            inc_reduce_db: 300,
            special_inc_reduce_db: 1000,
            lb_lbd_frozen_clause: 30,
            lb_size_minimizing_clause: 30,
            lb_lbd_minimizing_clause: 6,
            garbage_frac: 0.20,
            remove_satisfied: true,
            incremental: true,
            produce_proof: false,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> Result<()> {
        fn ensure(b: bool, name: &'static str) -> Result<()> {
            if b {
                Ok(())
            } else {
                Err(Error::InvalidOption(name))
            }
        }
        ensure(0.0 < self.var_decay && self.var_decay < 1.0, "var_decay")?;
        ensure(
            self.var_decay <= self.max_var_decay && self.max_var_decay < 1.0,
            "max_var_decay",
        )?;
        ensure(0.0 < self.clause_decay && self.clause_decay < 1.0, "clause_decay")?;
        ensure(
            0.0 <= self.random_var_freq && self.random_var_freq <= 1.0,
            "random_var_freq",
        )?;
        ensure(
            0.0 < self.random_seed && self.random_seed < f64::INFINITY,
            "random_seed",
        )?;
        ensure(0 <= self.phase_saving && self.phase_saving <= 2, "phase_saving")?;
        ensure(1 <= self.restart_first, "restart_first")?;
        ensure(
            1.0 < self.restart_inc && self.restart_inc < f64::INFINITY,
            "restart_inc",
        )?;
        ensure(self.lbd_queue_size > 0, "lbd_queue_size")?;
        ensure(self.trail_queue_size > 0, "trail_queue_size")?;
        ensure(0.0 < self.factor_k, "factor_k")?;
        ensure(0.0 < self.factor_r, "factor_r")?;
        ensure(self.first_reduce_db > 0, "first_reduce_db")?;
        ensure(
            0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY,
            "garbage_frac",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callbacks::{Basic, NoHandler};
    use std::panic::{self, AssertUnwindSafe};

    fn new_lits(s: &mut Solver, n: usize) -> Vec<Lit> {
        (0..n)
            .map(|_| Lit::new(s.new_var_default(), true))
            .collect()
    }

    #[test]
    fn test_luby() {
        let seq: Vec<f64> = (0..7).map(|i| utils::luby(2.0, i)).collect();
        assert_eq!(seq, vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_bounded_queue() {
        let mut q = utils::BoundedQueue::new(3);
        q.push(1);
        q.push(2);
        assert!(!q.is_valid());
        q.push(3);
        assert!(q.is_valid());
        q.push(7);
        assert_eq!(q.avg(), 4.0);
        q.fast_clear();
        assert!(!q.is_valid());
        assert_eq!(q.avg(), 0.0);
    }

    #[test]
    fn test_opts_check() {
        assert_eq!(SolverOpts::default().check(), Ok(()));
        let mut opts = SolverOpts::default();
        opts.var_decay = 1.5;
        assert_eq!(opts.check(), Err(Error::InvalidOption("var_decay")));
        assert!(Solver::new(opts).is_err());
    }

    #[test]
    fn test_at_most_propagates_at_level_0() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 4);
        assert_eq!(s.add_at_most(&x, 2), Ok(true));
        assert!(s.add_clause(&[x[0]]));
        assert!(s.add_clause(&[x[1]]));
        assert_eq!(s.value_lvl_0(x[2]), lbool::FALSE);
        assert_eq!(s.value_lvl_0(x[3]), lbool::FALSE);
        assert!(!s.add_clause(&[x[3]]));
        assert!(!s.is_ok());
    }

    #[test]
    fn test_at_most_trivial_cases() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 3);
        // k >= n: nothing to do
        assert_eq!(s.add_at_most(&x, 3), Ok(true));
        assert_eq!(s.num_clauses(), 0);
        // k = 0: everything false
        assert_eq!(s.add_at_most(&x[..2], 0), Ok(true));
        assert_eq!(s.value_lvl_0(x[0]), lbool::FALSE);
        assert_eq!(s.value_lvl_0(x[1]), lbool::FALSE);
        assert_eq!(s.add_at_most(&[x[2], x[2]], 1), Err(Error::DuplicateLiteral));
    }

    #[test]
    fn test_at_most_complementary_pair() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 2);
        // one of `x0, !x0` is always true, so x1 must be false
        assert_eq!(s.add_at_most(&[x[0], !x[0], x[1]], 1), Ok(true));
        assert_eq!(s.value_lvl_0(x[1]), lbool::FALSE);
    }

    #[test]
    fn test_at_most_search() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 3);
        assert_eq!(s.add_at_most(&x, 1), Ok(true));
        assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
        let n_true = x.iter().filter(|&&l| s.value_lit(l) == lbool::TRUE).count();
        assert!(n_true <= 1);

        // at least two of three
        s.add_clause(&[x[0], x[1]]);
        s.add_clause(&[x[1], x[2]]);
        s.add_clause(&[x[0], x[2]]);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Unsat));
    }

    #[test]
    fn test_conflicts_on_original_clauses() {
        // pigeon hole 5 into 4: every conflict goes through original clauses
        let mut s = Solver::default();
        let p: Vec<Vec<Lit>> = (0..5).map(|_| new_lits(&mut s, 4)).collect();
        for row in &p {
            s.add_clause(row);
        }
        for h in 0..4 {
            for i in 0..5 {
                for j in i + 1..5 {
                    s.add_clause(&[!p[i][h], !p[j][h]]);
                }
            }
        }
        assert_eq!(s.solve(&[]), Ok(SolveResult::Unsat));
        assert!(s.num_conflicts() > 0);
    }

    #[test]
    fn test_proof_refuses_at_most() {
        let mut opts = SolverOpts::default();
        opts.produce_proof = true;
        let mut s = Solver::new(opts).unwrap();
        let x = new_lits(&mut s, 3);
        assert_eq!(s.add_at_most(&x, 1), Err(Error::ProofUnsupported));
    }

    #[test]
    fn test_core_is_subset_of_assumptions() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 3);
        s.add_clause(&[!x[0], !x[1]]);
        let res = s.solve(&[x[0], x[2], x[1]]);
        assert_eq!(res, Ok(SolveResult::Unsat));
        let mut core = s.unsat_core().to_vec();
        core.sort();
        assert_eq!(core, vec![x[0], x[1]]);
        assert!(!s.unsat_core_contains_lit(x[2]));
        // the formula itself is still satisfiable
        assert!(s.is_ok());
        assert_eq!(s.solve(&[x[0]]), Ok(SolveResult::Sat));
        assert_eq!(s.value_lit(x[1]), lbool::FALSE);
    }

    #[test]
    fn test_contradictory_assumptions() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 1);
        assert_eq!(s.solve(&[x[0], !x[0]]), Ok(SolveResult::Unsat));
        assert_eq!(s.unsat_core().len(), 2);
    }

    #[test]
    fn test_save_load_state() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 2);
        s.add_clause(&[x[0], x[1]]);
        let st = s.save_state();

        let y = Lit::new(s.new_var_default(), true);
        s.name_var(y.var(), "y");
        s.add_clause(&[!x[0], y]);
        s.add_clause(&[!x[1], y]);
        s.add_clause(&[!y]);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Unsat));
        assert!(!s.is_ok());

        assert_eq!(s.load_state(&st), Ok(()));
        assert!(s.is_ok());
        assert_eq!(s.num_vars(), 2);
        assert_eq!(s.num_clauses(), 1);
        assert_eq!(s.var_by_name("y"), None);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
    }

    #[test]
    fn test_load_invalidates_later_states() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 1);
        let st1 = s.save_state();
        s.add_clause(&[x[0]]);
        let st2 = s.save_state();
        assert_eq!(s.load_state(&st1), Ok(()));
        assert_eq!(s.value_lvl_0(x[0]), lbool::UNDEF);
        assert_eq!(s.load_state(&st2), Err(Error::InvalidState(st2.id())));
        // still valid
        assert_eq!(s.load_state(&st1), Ok(()));
    }

    #[test]
    fn test_units_replayed_after_load() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 3);
        s.add_clause(&[x[0]]);
        s.add_clause(&[!x[0], x[1]]);
        let st = s.save_state();
        s.add_clause(&[x[2]]);
        assert_eq!(s.load_state(&st), Ok(()));
        assert_eq!(s.value_lvl_0(x[0]), lbool::TRUE);
        assert_eq!(s.value_lvl_0(x[1]), lbool::TRUE);
        assert_eq!(s.value_lvl_0(x[2]), lbool::UNDEF);
    }

    #[test]
    fn test_selection_order() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 2);
        s.set_selection_order(&[x[0], !x[1]]);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
        assert_eq!(s.value_lit(x[0]), lbool::TRUE);
        assert_eq!(s.value_lit(x[1]), lbool::FALSE);
        s.reset_selection_order();
        s.add_clause(&[!x[0], x[1]]);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
    }

    #[test]
    fn test_user_polarity() {
        let mut s = Solver::default();
        let v = s.new_var(lbool::TRUE, true);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Sat));
        assert_eq!(s.value_var(v), lbool::TRUE);
    }

    #[test]
    fn test_cancel_at_start() {
        let mut s = Solver::default();
        new_lits(&mut s, 2);
        let mut h = Basic::new();
        h.set_stop(|e| *e == Event::ComputationStarted(Computation::SatCall));
        let res = s.solve_with(&[], &mut h);
        assert_eq!(
            res,
            Ok(SolveResult::Canceled(Event::ComputationStarted(
                Computation::SatCall
            )))
        );
        // the solver is usable afterwards
        assert_eq!(s.solve_with(&[], &mut NoHandler), Ok(SolveResult::Sat));
    }

    struct Panicking;
    impl Handler for Panicking {
        fn should_resume(&mut self, _e: &Event) -> bool {
            panic!("handler failure")
        }
    }

    #[test]
    fn test_solve_in_progress() {
        let mut s = Solver::default();
        new_lits(&mut s, 1);
        let r = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = s.solve_with(&[], &mut Panicking);
        }));
        assert!(r.is_err());
        assert_eq!(s.solve(&[]), Err(Error::SolveInProgress));
    }

    #[test]
    fn test_proof_records_learnts() {
        let mut opts = SolverOpts::default();
        opts.produce_proof = true;
        let mut s = Solver::new(opts).unwrap();
        let x = new_lits(&mut s, 2);
        s.add_clause(&[x[0], x[1]]);
        s.add_clause(&[x[0], !x[1]]);
        s.add_clause(&[!x[0], x[1]]);
        s.add_clause(&[!x[0], !x[1]]);
        assert_eq!(s.solve(&[]), Ok(SolveResult::Unsat));
        let proof = s.proof().unwrap().to_string();
        assert!(proof.ends_with("0\n"));
        assert!(proof.lines().any(|l| l == "0"));
    }
}
