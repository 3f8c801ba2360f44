use {super::ClauseSink, crate::clause::Lit, std::{cmp, convert::TryFrom}};

/// Totalizer over a set of input literals (Bailleux & Boufkhad).
///
/// Every node of the tree counts the true inputs below it in unary:
/// output `j` of a node is implied by "at least `j+1` of its inputs are
/// true". Outputs only exist up to the bound plus one, and the tree is
/// grown on demand when the bound increases.
#[derive(Debug, Clone, Default)]
pub struct Totalizer {
    nodes: Vec<Node>,
    root: Option<usize>,
    k: u64,
}

#[derive(Debug, Clone)]
struct Node {
    outputs: Vec<Lit>,
    /// Number of inputs below this node
    size: usize,
    children: Option<(usize, usize)>,
}

fn limit(k: u64) -> usize {
    usize::try_from(k.saturating_add(1)).unwrap_or(usize::MAX)
}

impl Totalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest bound the outputs currently support.
    pub fn bound(&self) -> u64 {
        self.k
    }

    pub fn num_inputs(&self) -> usize {
        self.root.map_or(0, |r| self.nodes[r].size)
    }

    /// Outputs of the root, output `j` meaning "at least `j+1` inputs".
    pub fn outputs(&self) -> &[Lit] {
        match self.root {
            Some(r) => &self.nodes[r].outputs,
            None => &[],
        }
    }

    /// Build the tree over `lits`, with outputs up to `k+1`.
    pub fn build<S: ClauseSink + ?Sized>(&mut self, sink: &mut S, lits: &[Lit], k: u64) {
        self.nodes.clear();
        self.k = k;
        self.root = if lits.is_empty() {
            None
        } else {
            Some(self.build_node(sink, lits, limit(k)))
        };
    }

    /// Grow the outputs so that bound `k` can be expressed.
    pub fn extend<S: ClauseSink + ?Sized>(&mut self, sink: &mut S, k: u64) {
        if k <= self.k {
            return;
        }
        self.k = k;
        if let Some(r) = self.root {
            self.grow(sink, r, limit(k));
        }
    }

    /// Add `lits` as new inputs, under a new root.
    pub fn join<S: ClauseSink + ?Sized>(&mut self, sink: &mut S, lits: &[Lit], k: u64) {
        if lits.is_empty() {
            return self.extend(sink, k);
        }
        self.k = cmp::max(self.k, k);
        let lim = limit(self.k);
        let sub = self.build_node(sink, lits, lim);
        self.root = Some(match self.root {
            None => sub,
            Some(r) => {
                self.grow(sink, r, lim);
                self.push_internal(sink, r, sub, lim)
            }
        });
    }

    /// The literal asserting "at most `k` inputs are true", or `None` if
    /// this always holds.
    ///
    /// Precondition: `k <= self.bound()`
    pub fn bound_lit(&self, k: u64) -> Option<Lit> {
        if k >= self.num_inputs() as u64 {
            return None;
        }
        debug_assert!(k <= self.k);
        self.outputs().get(k as usize).map(|&o| !o)
    }

    fn build_node<S: ClauseSink + ?Sized>(&mut self, sink: &mut S, lits: &[Lit], lim: usize) -> usize {
        if lits.len() == 1 {
            self.nodes.push(Node {
                outputs: vec![lits[0]],
                size: 1,
                children: None,
            });
            return self.nodes.len() - 1;
        }
        let mid = lits.len() / 2;
        let left = self.build_node(sink, &lits[..mid], lim);
        let right = self.build_node(sink, &lits[mid..], lim);
        self.push_internal(sink, left, right, lim)
    }

    fn push_internal<S: ClauseSink + ?Sized>(
        &mut self,
        sink: &mut S,
        left: usize,
        right: usize,
        lim: usize,
    ) -> usize {
        let size = self.nodes[left].size + self.nodes[right].size;
        self.nodes.push(Node {
            outputs: vec![],
            size,
            children: Some((left, right)),
        });
        let idx = self.nodes.len() - 1;
        self.grow(sink, idx, lim);
        idx
    }

    /// Give node `idx` its outputs up to `lim` (or its size), along with
    /// the clauses defining them.
    fn grow<S: ClauseSink + ?Sized>(&mut self, sink: &mut S, idx: usize, lim: usize) {
        let target = cmp::min(lim, self.nodes[idx].size);
        let old = self.nodes[idx].outputs.len();
        if target <= old {
            return;
        }
        let (left, right) = match self.nodes[idx].children {
            Some(c) => c,
            None => return,
        };
        self.grow(sink, left, lim);
        self.grow(sink, right, lim);
        for _ in old..target {
            let o = sink.fresh_lit();
            self.nodes[idx].outputs.push(o);
        }

        // sums up to `old` were encoded when the children had at most
        // `old` outputs each
        let lo = &self.nodes[left].outputs;
        let ro = &self.nodes[right].outputs;
        let out = &self.nodes[idx].outputs;
        let mut c = Vec::with_capacity(3);
        for i in 0..=lo.len() {
            for j in 0..=ro.len() {
                let s = i + j;
                if s <= old || s > target {
                    continue;
                }
                c.clear();
                if i > 0 {
                    c.push(!lo[i - 1]);
                }
                if j > 0 {
                    c.push(!ro[j - 1]);
                }
                c.push(out[s - 1]);
                sink.emit(&c);
            }
        }
    }
}
