use {super::ClauseSink, crate::clause::Lit};

/// Sequential weighted counter (Hölldobler, Manthey & Steinke) for
/// `Σ w_i x_i <= k`.
///
/// Register `s[i][j]` is implied by "the weight of the true inputs among
/// the first `i+1` is at least `j+1`". Only the last row is kept, it is
/// what bound updates talk about.
#[derive(Debug, Clone)]
pub struct Swc {
    last: Vec<Lit>,
    k: u64,
    /// Is `Σ <= k` enforced by the clauses themselves?
    asserted: bool,
}

impl Swc {
    /// Encode `Σ weights[i] * lits[i] <= k`.
    pub fn encode<S: ClauseSink + ?Sized>(sink: &mut S, lits: &[Lit], weights: &[u64], k: u64) -> Self {
        let last = counter(sink, lits, weights, k, true);
        Swc {
            last,
            k,
            asserted: true,
        }
    }

    /// Encode the counter for bounds up to `k` without enforcing any of
    /// them: bounds are given by the assumptions of `bound_lit`.
    pub fn encode_assumed<S: ClauseSink + ?Sized>(
        sink: &mut S,
        lits: &[Lit],
        weights: &[u64],
        k: u64,
    ) -> Self {
        let last = counter(sink, lits, weights, k + 1, false);
        Swc {
            last,
            k,
            asserted: false,
        }
    }

    pub fn bound(&self) -> u64 {
        self.k
    }

    /// The literal asserting `Σ <= k`, or `None` if it already holds.
    ///
    /// Precondition: `k <= self.bound()`
    pub fn bound_lit(&self, k: u64) -> Option<Lit> {
        debug_assert!(k <= self.k);
        if self.asserted && k >= self.k {
            return None;
        }
        self.last.get(k as usize).map(|&s| !s)
    }
}

/// Emit the registers for sums up to `regs`, return the last row.
///
/// With `overflow`, sums above `regs` are forbidden.
fn counter<S: ClauseSink + ?Sized>(
    sink: &mut S,
    lits: &[Lit],
    weights: &[u64],
    regs: u64,
    overflow: bool,
) -> Vec<Lit> {
    if regs == 0 {
        if overflow {
            for (&x, &w) in lits.iter().zip(weights) {
                if w > 0 {
                    sink.emit(&[!x]);
                }
            }
        }
        return vec![];
    }
    let k = regs as usize;
    let mut prev: Vec<Lit> = vec![];
    for (&x, &w) in lits.iter().zip(weights) {
        if w == 0 {
            continue;
        }
        if overflow && w > regs {
            sink.emit(&[!x]);
            continue;
        }
        // with `overflow` off, a heavy input saturates every register
        let w = std::cmp::min(w, regs) as usize;
        let cur: Vec<Lit> = (0..k).map(|_| sink.fresh_lit()).collect();
        for &s in &cur[..w] {
            sink.emit(&[!x, s]);
        }
        if !prev.is_empty() {
            for j in 0..k {
                sink.emit(&[!prev[j], cur[j]]);
            }
            for j in 0..k - w {
                sink.emit(&[!x, !prev[j], cur[j + w]]);
            }
            if overflow {
                sink.emit(&[!x, !prev[k - w]]);
            }
        }
        prev = cur;
    }
    prev
}

#[cfg(test)]
mod test {
    use super::super::testing::*;
    use super::*;
    use crate::{core::Solver, interface::SolverInterface};

    fn weight(w: &[u64], on: &[usize]) -> u64 {
        on.iter().map(|&i| w[i]).sum()
    }

    #[test]
    fn test_swc_asserted() {
        let w = [3, 1, 2, 5, 1];
        for k in 0..8 {
            let mut s = Solver::default();
            let x = new_lits(&mut s, w.len());
            let swc = Swc::encode(&mut s, &x, &w, k);
            assert_eq!(swc.bound_lit(k), None);
            for on in subsets(w.len()) {
                assert_eq!(allows(&mut s, &x, &on), weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }

    #[test]
    fn test_swc_tighten() {
        let w = [2, 2, 3, 1];
        let mut s = Solver::default();
        let x = new_lits(&mut s, w.len());
        let swc = Swc::encode(&mut s, &x, &w, 6);
        for k in (0..6).rev() {
            if let Some(l) = swc.bound_lit(k) {
                s.add_clause(&[l]);
            }
            for on in subsets(w.len()) {
                assert_eq!(allows(&mut s, &x, &on), weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }

    #[test]
    fn test_swc_assumed() {
        let w = [4, 1, 2, 3];
        let mut s = Solver::default();
        let x = new_lits(&mut s, w.len());
        let swc = Swc::encode_assumed(&mut s, &x, &w, 3);
        // nothing is enforced without assumptions
        assert!(allows(&mut s, &x, &[0, 1, 2, 3]));
        for k in 0..=3 {
            let bound: Vec<Lit> = swc.bound_lit(k).into_iter().collect();
            assert_eq!(bound.len(), 1);
            for on in subsets(w.len()) {
                let mut assumps = bound.clone();
                assumps.extend(x.iter().enumerate().map(|(i, &l)| if on.contains(&i) { l } else { !l }));
                let sat = s.solve(&assumps).unwrap().is_sat();
                assert_eq!(sat, weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }
}
