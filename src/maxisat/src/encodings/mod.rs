//! Cardinality and pseudo-Boolean encodings.
//!
//! Encoders never talk to a solver directly: they allocate literals and
//! emit clauses through a `ClauseSink`, which is either a `Solver` or the
//! hard part of a MaxSAT formula.

use {
    crate::{
        clause::Lit,
        core::Solver,
        interface::SolverInterface,
        maxsat::{AmoEncoding, CardinalityEncoding, PbEncoding},
    },
    thiserror::Error,
};

mod amo;
mod gte;
mod sequential;
mod swc;
mod totalizer;

pub use self::{gte::Gte, sequential::encode_at_most_k as sequential_at_most, swc::Swc, totalizer::Totalizer};

/// Destination of the clauses produced by an encoder.
pub trait ClauseSink {
    /// A literal over a fresh variable.
    fn fresh_lit(&mut self) -> Lit;

    /// Add a clause.
    fn emit(&mut self, clause: &[Lit]);

    /// Add "at most `k` of `lits`" natively, if the sink supports it.
    ///
    /// Returns `false` if the constraint was not added.
    fn at_most(&mut self, _lits: &[Lit], _k: u32) -> bool {
        false
    }
}

impl ClauseSink for Solver {
    fn fresh_lit(&mut self) -> Lit {
        Lit::new(self.new_var_default(), true)
    }

    fn emit(&mut self, clause: &[Lit]) {
        self.add_clause(clause);
    }

    fn at_most(&mut self, lits: &[Lit], k: u32) -> bool {
        self.add_at_most(lits, k).is_ok()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("no constraint has been encoded yet")]
    NotEncoded,
    #[error("cannot move the bound from {from} to {to}")]
    InvalidBoundUpdate { from: u64, to: u64 },
    #[error("{0} literals but {1} weights")]
    LengthMismatch(usize, usize),
    #[error("{0} does not support this operation")]
    Unsupported(&'static str),
}

/// The cardinality constraint currently maintained by an `Encoder`.
#[derive(Debug)]
enum Cardinality {
    Totalizer(Totalizer),
    Sequential { lits: Vec<Lit>, k: u64 },
}

/// The pseudo-Boolean constraint currently maintained by an `Encoder`.
#[derive(Debug)]
enum PseudoBoolean {
    Swc(Swc),
    Gte(Gte),
}

/// Keeps one cardinality constraint and one pseudo-Boolean constraint,
/// each encoded with the configured encoding, and updates their bounds.
#[derive(Debug)]
pub struct Encoder {
    cardinality: CardinalityEncoding,
    pb: PbEncoding,
    amo: AmoEncoding,
    card: Option<Cardinality>,
    pb_state: Option<PseudoBoolean>,
}

impl Encoder {
    pub fn new(cardinality: CardinalityEncoding, pb: PbEncoding, amo: AmoEncoding) -> Self {
        Encoder {
            cardinality,
            pb,
            amo,
            card: None,
            pb_state: None,
        }
    }

    pub fn has_cardinality_encoding(&self) -> bool {
        self.card.is_some()
    }

    pub fn has_pb_encoding(&self) -> bool {
        self.pb_state.is_some()
    }

    /// At most one of `lits` is true.
    pub fn encode_amo<S: ClauseSink + ?Sized>(&self, sink: &mut S, lits: &[Lit]) {
        match self.amo {
            AmoEncoding::Native if lits.len() > 1 && sink.at_most(lits, 1) => (),
            _ => amo::encode_ladder(sink, lits),
        }
    }

    /// At most `k` of `lits` are true.
    pub fn encode_cardinality<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        lits: &[Lit],
        k: u64,
    ) {
        match self.cardinality {
            CardinalityEncoding::Totalizer => {
                let mut tot = Totalizer::new();
                tot.build(sink, lits, k);
                if let Some(bound) = tot.bound_lit(k) {
                    sink.emit(&[bound]);
                }
                self.card = Some(Cardinality::Totalizer(tot));
            }
            CardinalityEncoding::Sequential => {
                sequential::encode_at_most_k(sink, lits, k);
                self.card = Some(Cardinality::Sequential {
                    lits: lits.to_vec(),
                    k,
                });
            }
        }
    }

    /// Tighten the bound of the cardinality constraint to `k`.
    pub fn update_cardinality<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        k: u64,
    ) -> Result<(), EncodingError> {
        match self.card.as_mut() {
            None => Err(EncodingError::NotEncoded),
            Some(Cardinality::Totalizer(tot)) => {
                if k > tot.bound() {
                    return Err(EncodingError::InvalidBoundUpdate {
                        from: tot.bound(),
                        to: k,
                    });
                }
                if let Some(bound) = tot.bound_lit(k) {
                    sink.emit(&[bound]);
                }
                Ok(())
            }
            Some(Cardinality::Sequential { lits, k: old_k }) => {
                if k > *old_k {
                    return Err(EncodingError::InvalidBoundUpdate { from: *old_k, to: k });
                }
                // the weaker counter stays, the new one is stronger
                sequential::encode_at_most_k(sink, lits, k);
                *old_k = k;
                Ok(())
            }
        }
    }

    /// Build the counting structure over `lits` up to `k`, without
    /// asserting any bound. Bounds are then given as assumptions by
    /// `inc_update_cardinality`.
    pub fn build_cardinality<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        lits: &[Lit],
        k: u64,
    ) -> Result<(), EncodingError> {
        match self.cardinality {
            CardinalityEncoding::Totalizer => {
                let mut tot = Totalizer::new();
                tot.build(sink, lits, k);
                self.card = Some(Cardinality::Totalizer(tot));
                Ok(())
            }
            CardinalityEncoding::Sequential => {
                Err(EncodingError::Unsupported("the sequential counter"))
            }
        }
    }

    /// Add the inputs `join` to the structure built by `build_cardinality`,
    /// extend it to bound `k`, and push the literals asserting
    /// "at most `k`" into `assumptions`.
    pub fn inc_update_cardinality<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        join: &[Lit],
        k: u64,
        assumptions: &mut Vec<Lit>,
    ) -> Result<(), EncodingError> {
        match self.card.as_mut() {
            Some(Cardinality::Totalizer(tot)) => {
                if !join.is_empty() {
                    tot.join(sink, join, k);
                }
                tot.extend(sink, k);
                assumptions.extend(tot.bound_lit(k));
                Ok(())
            }
            Some(Cardinality::Sequential { .. }) => {
                Err(EncodingError::Unsupported("the sequential counter"))
            }
            None => Err(EncodingError::NotEncoded),
        }
    }

    /// `Σ weights[i] * lits[i] <= k`
    pub fn encode_pb<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        lits: &[Lit],
        weights: &[u64],
        k: u64,
    ) -> Result<(), EncodingError> {
        if lits.len() != weights.len() {
            return Err(EncodingError::LengthMismatch(lits.len(), weights.len()));
        }
        let state = match self.pb {
            PbEncoding::Swc => {
                let swc = Swc::encode(sink, lits, weights, k);
                sink_bound(sink, swc.bound_lit(k));
                PseudoBoolean::Swc(swc)
            }
            PbEncoding::Gte => {
                let gte = Gte::encode(sink, lits, weights, k);
                for lit in gte.bound_lits(k) {
                    sink.emit(&[lit]);
                }
                PseudoBoolean::Gte(gte)
            }
        };
        self.pb_state = Some(state);
        Ok(())
    }

    /// Tighten the bound of the pseudo-Boolean constraint to `k`.
    pub fn update_pb<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        k: u64,
    ) -> Result<(), EncodingError> {
        match self.pb_state.as_ref() {
            None => Err(EncodingError::NotEncoded),
            Some(PseudoBoolean::Swc(swc)) => {
                check_bound(swc.bound(), k)?;
                sink_bound(sink, swc.bound_lit(k));
                Ok(())
            }
            Some(PseudoBoolean::Gte(gte)) => {
                check_bound(gte.bound(), k)?;
                for lit in gte.bound_lits(k) {
                    sink.emit(&[lit]);
                }
                Ok(())
            }
        }
    }

    /// Encode `Σ weights[i] * lits[i] <= k` with the bound given as
    /// assumptions, pushed into `assumptions`.
    pub fn inc_encode_pb<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        lits: &[Lit],
        weights: &[u64],
        k: u64,
        assumptions: &mut Vec<Lit>,
    ) -> Result<(), EncodingError> {
        if lits.len() != weights.len() {
            return Err(EncodingError::LengthMismatch(lits.len(), weights.len()));
        }
        let state = match self.pb {
            PbEncoding::Swc => PseudoBoolean::Swc(Swc::encode_assumed(sink, lits, weights, k)),
            PbEncoding::Gte => PseudoBoolean::Gte(Gte::encode_assumed(sink, lits, weights, k)),
        };
        self.pb_state = Some(state);
        self.inc_update_pb(k, assumptions)
    }

    /// Push the literals asserting the bound `k` (at most the encoded
    /// bound) into `assumptions`.
    pub fn inc_update_pb(&self, k: u64, assumptions: &mut Vec<Lit>) -> Result<(), EncodingError> {
        match self.pb_state.as_ref() {
            None => Err(EncodingError::NotEncoded),
            Some(PseudoBoolean::Swc(swc)) => {
                check_bound(swc.bound(), k)?;
                assumptions.extend(swc.bound_lit(k));
                Ok(())
            }
            Some(PseudoBoolean::Gte(gte)) => {
                check_bound(gte.bound(), k)?;
                assumptions.extend(gte.bound_lits(k));
                Ok(())
            }
        }
    }
}

fn check_bound(encoded: u64, k: u64) -> Result<(), EncodingError> {
    if k > encoded {
        Err(EncodingError::InvalidBoundUpdate {
            from: encoded,
            to: k,
        })
    } else {
        Ok(())
    }
}

fn sink_bound<S: ClauseSink + ?Sized>(sink: &mut S, lit: Option<Lit>) {
    if let Some(lit) = lit {
        sink.emit(&[lit]);
    }
}

/// Helpers for the encoder tests: count the true literals of a model.
#[cfg(test)]
pub(crate) mod testing {
    use crate::{
        clause::{lbool, Lit},
        core::{SolveResult, Solver},
        interface::SolverInterface,
    };

    pub fn new_lits(s: &mut Solver, n: usize) -> Vec<Lit> {
        (0..n)
            .map(|_| Lit::new(s.new_var_default(), true))
            .collect()
    }

    /// Is there a model where exactly the lits in `on` are true?
    pub fn allows(s: &mut Solver, lits: &[Lit], on: &[usize]) -> bool {
        let assumps: Vec<Lit> = lits
            .iter()
            .enumerate()
            .map(|(i, &l)| if on.contains(&i) { l } else { !l })
            .collect();
        match s.solve(&assumps) {
            Ok(SolveResult::Sat) => {
                debug_assert!(assumps.iter().all(|&l| s.value_lit(l) == lbool::TRUE));
                true
            }
            Ok(SolveResult::Unsat) => false,
            r => panic!("unexpected result {:?}", r),
        }
    }

    /// All subsets of `0..n`, as index lists.
    pub fn subsets(n: usize) -> Vec<Vec<usize>> {
        (0..1u32 << n)
            .map(|mask| (0..n).filter(|&i| mask & (1 << i) != 0).collect())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::testing::*;
    use super::*;
    use crate::core::SolveResult;

    #[test]
    fn test_encoder_cardinality_update() {
        for &enc in &[CardinalityEncoding::Totalizer, CardinalityEncoding::Sequential] {
            let mut s = Solver::default();
            let x = new_lits(&mut s, 5);
            let mut e = Encoder::new(enc, PbEncoding::Swc, AmoEncoding::Ladder);
            assert_eq!(e.update_cardinality(&mut s, 2), Err(EncodingError::NotEncoded));
            e.encode_cardinality(&mut s, &x, 3);
            assert!(allows(&mut s, &x, &[0, 2, 4]));
            assert!(!allows(&mut s, &x, &[0, 1, 2, 4]));
            assert_eq!(e.update_cardinality(&mut s, 1), Ok(()));
            assert!(allows(&mut s, &x, &[3]));
            assert!(!allows(&mut s, &x, &[0, 4]));
            assert!(e.update_cardinality(&mut s, 4).is_err());
        }
    }

    #[test]
    fn test_encoder_inc_cardinality() {
        let mut s = Solver::default();
        let x = new_lits(&mut s, 6);
        let mut e = Encoder::new(
            CardinalityEncoding::Totalizer,
            PbEncoding::Swc,
            AmoEncoding::Ladder,
        );
        e.build_cardinality(&mut s, &x[..3], 1).unwrap();
        let mut assumps = vec![];
        e.inc_update_cardinality(&mut s, &[], 1, &mut assumps).unwrap();
        assumps.extend_from_slice(&[x[0], x[1]]);
        assert_eq!(s.solve(&assumps), Ok(SolveResult::Unsat));

        // the bound is only assumed: it can be raised, and inputs added
        let mut assumps = vec![];
        e.inc_update_cardinality(&mut s, &x[3..], 2, &mut assumps).unwrap();
        let mut a2 = assumps.clone();
        a2.extend_from_slice(&[x[0], x[4]]);
        assert_eq!(s.solve(&a2), Ok(SolveResult::Sat));
        let mut a3 = assumps.clone();
        a3.extend_from_slice(&[x[0], x[4], x[5]]);
        assert_eq!(s.solve(&a3), Ok(SolveResult::Unsat));
    }

    #[test]
    fn test_encoder_pb() {
        for &enc in &[PbEncoding::Swc, PbEncoding::Gte] {
            let mut s = Solver::default();
            let x = new_lits(&mut s, 4);
            let w = [1, 2, 3, 4];
            let mut e = Encoder::new(CardinalityEncoding::Totalizer, enc, AmoEncoding::Ladder);
            assert!(e.encode_pb(&mut s, &x, &w[..3], 5).is_err());
            e.encode_pb(&mut s, &x, &w, 5).unwrap();
            for on in subsets(4) {
                let sum: u64 = on.iter().map(|&i| w[i]).sum();
                assert_eq!(allows(&mut s, &x, &on), sum <= 5, "{:?} {:?}", enc, on);
            }
            e.update_pb(&mut s, 3).unwrap();
            for on in subsets(4) {
                let sum: u64 = on.iter().map(|&i| w[i]).sum();
                assert_eq!(allows(&mut s, &x, &on), sum <= 3, "{:?} {:?}", enc, on);
            }
        }
    }

    #[test]
    fn test_encoder_inc_pb() {
        for &enc in &[PbEncoding::Swc, PbEncoding::Gte] {
            let mut s = Solver::default();
            let x = new_lits(&mut s, 3);
            let w = [2, 2, 3];
            let mut e = Encoder::new(CardinalityEncoding::Totalizer, enc, AmoEncoding::Ladder);
            let mut assumps = vec![];
            e.inc_encode_pb(&mut s, &x, &w, 4, &mut assumps).unwrap();
            let mut a = assumps.clone();
            a.extend_from_slice(&[x[0], x[2]]);
            assert_eq!(s.solve(&a), Ok(SolveResult::Unsat));

            let mut assumps = vec![];
            e.inc_update_pb(2, &mut assumps).unwrap();
            let mut a = assumps.clone();
            a.extend_from_slice(&[x[0], x[1]]);
            assert_eq!(s.solve(&a), Ok(SolveResult::Unsat));
            // without assumptions, everything is allowed
            assert_eq!(s.solve(&[x[0], x[1], x[2]]), Ok(SolveResult::Sat));
        }
    }

    #[test]
    fn test_encoder_native_amo() {
        for &amo in &[AmoEncoding::Ladder, AmoEncoding::Native] {
            let mut s = Solver::default();
            let x = new_lits(&mut s, 4);
            let e = Encoder::new(CardinalityEncoding::Totalizer, PbEncoding::Swc, amo);
            e.encode_amo(&mut s, &x);
            for on in subsets(4) {
                assert_eq!(allows(&mut s, &x, &on), on.len() <= 1);
            }
        }
    }
}
