use {
    super::ClauseSink,
    crate::clause::Lit,
    std::collections::BTreeMap,
};

/// Generalized totalizer (Joshi, Martins & Manquinho) for `Σ w_i x_i <= k`.
///
/// Each node has one literal per partial sum its inputs can reach; the
/// literal of sum `s` is implied by "the true inputs below weigh at
/// least `s`". Sums above `k` are either forbidden, or merged into a
/// single `k+1` literal when the bound is only assumed.
#[derive(Debug, Clone)]
pub struct Gte {
    /// Partial sums of the root, by increasing weight
    root: Vec<(u64, Lit)>,
    k: u64,
}

impl Gte {
    /// Encode `Σ weights[i] * lits[i] <= k`.
    pub fn encode<S: ClauseSink + ?Sized>(sink: &mut S, lits: &[Lit], weights: &[u64], k: u64) -> Self {
        Gte {
            root: tree(sink, lits, weights, k, true),
            k,
        }
    }

    /// Encode the tree for bounds up to `k`, without enforcing any of them.
    pub fn encode_assumed<S: ClauseSink + ?Sized>(
        sink: &mut S,
        lits: &[Lit],
        weights: &[u64],
        k: u64,
    ) -> Self {
        Gte {
            root: tree(sink, lits, weights, k, false),
            k,
        }
    }

    pub fn bound(&self) -> u64 {
        self.k
    }

    /// Literals asserting `Σ <= k`: the negations of the root sums above `k`.
    pub fn bound_lits(&self, k: u64) -> Vec<Lit> {
        self.root
            .iter()
            .filter(|&&(w, _)| w > k)
            .map(|&(_, l)| !l)
            .collect()
    }
}

type Node = Vec<(u64, Lit)>;

fn tree<S: ClauseSink + ?Sized>(
    sink: &mut S,
    lits: &[Lit],
    weights: &[u64],
    k: u64,
    forbid: bool,
) -> Node {
    let mut inputs: Vec<(u64, Lit)> = vec![];
    for (&x, &w) in lits.iter().zip(weights) {
        if w == 0 {
            continue;
        } else if w <= k {
            inputs.push((w, x));
        } else if forbid {
            sink.emit(&[!x]);
        } else {
            inputs.push((k + 1, x));
        }
    }
    inputs.sort_by_key(|&(w, _)| w);

    let mut layer: Vec<Node> = inputs.into_iter().map(|i| vec![i]).collect();
    while layer.len() > 1 {
        let mut next = Vec::with_capacity((layer.len() + 1) / 2);
        let mut it = layer.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(merge(sink, &a, &b, k, forbid)),
                None => next.push(a),
            }
        }
        layer = next;
    }
    layer.pop().unwrap_or_default()
}

fn merge<S: ClauseSink + ?Sized>(sink: &mut S, a: &Node, b: &Node, k: u64, forbid: bool) -> Node {
    let mut sums: BTreeMap<u64, Lit> = BTreeMap::new();
    let mut out = |sink: &mut S, w: u64| *sums.entry(w).or_insert_with(|| sink.fresh_lit());

    for &(w, l) in a.iter().chain(b.iter()) {
        let o = out(sink, w);
        sink.emit(&[!l, o]);
    }
    for &(wa, la) in a {
        for &(wb, lb) in b {
            let s = wa + wb;
            if s <= k {
                let o = out(sink, s);
                sink.emit(&[!la, !lb, o]);
            } else if forbid {
                sink.emit(&[!la, !lb]);
            } else {
                let o = out(sink, k + 1);
                sink.emit(&[!la, !lb, o]);
            }
        }
    }
    sums.into_iter().collect()
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
    fn test_gte_asserted() {
        let w = [3, 1, 2, 5, 2];
        for k in 0..9 {
            let mut s = Solver::default();
            let x = new_lits(&mut s, w.len());
            let gte = Gte::encode(&mut s, &x, &w, k);
            assert!(gte.bound_lits(k).is_empty());
            for on in subsets(w.len()) {
                assert_eq!(allows(&mut s, &x, &on), weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }

    #[test]
    fn test_gte_strengthen() {
        let w = [2, 3, 3, 4];
        let mut s = Solver::default();
        let x = new_lits(&mut s, w.len());
        let gte = Gte::encode(&mut s, &x, &w, 9);
        for k in (0..9).rev() {
            for l in gte.bound_lits(k) {
                s.add_clause(&[l]);
            }
            for on in subsets(w.len()) {
                assert_eq!(allows(&mut s, &x, &on), weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }

    #[test]
    fn test_gte_assumed() {
        let w = [5, 1, 2, 3];
        let mut s = Solver::default();
        let x = new_lits(&mut s, w.len());
        let gte = Gte::encode_assumed(&mut s, &x, &w, 4);
        assert!(allows(&mut s, &x, &[0, 1, 2, 3]));
        for k in 0..=4 {
            let bound = gte.bound_lits(k);
            for on in subsets(w.len()) {
                let mut assumps = bound.clone();
                assumps.extend(x.iter().enumerate().map(|(i, &l)| if on.contains(&i) { l } else { !l }));
                let sat = s.solve(&assumps).unwrap().is_sat();
                assert_eq!(sat, weight(&w, &on) <= k, "k={} on={:?}", k, on);
            }
        }
    }
}
