//! DRUP proofs

use {
    crate::{clause::ClauseIterable, Lit},
    std::{fmt, i32},
};

/// A serialized DRUP proof: clause additions and deletions, in order.
#[derive(Debug, Clone, Default)]
pub struct Proof(Vec<i32>);

mod proof {
    use {super::*, std::fmt::Write};

    impl fmt::Display for Proof {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            let mut line_start = true;
            for &i in &self.0 {
                if i == i32::MAX {
                    out.write_char('d')?;
                    line_start = false;
                } else if i == 0 {
                    out.write_str(if line_start { "0\n" } else { " 0\n" })?;
                    line_start = true;
                } else {
                    if line_start {
                        write!(out, "{}", i)?;
                    } else {
                        write!(out, " {}", i)?;
                    }
                    line_start = false;
                }
            }
            Ok(())
        }
    }

    impl Proof {
        /// New proof recording structure.
        pub fn new() -> Self {
            Proof(Vec::new())
        }

        /// Length of the record, used to roll it back with `truncate`.
        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        /// Forget everything recorded after position `len`.
        pub fn truncate(&mut self, len: usize) {
            self.0.truncate(len)
        }

        fn push_lit(&mut self, lit: Lit) {
            self.0.push(lit.to_dimacs())
        }

        /// Register clause creation.
        pub fn create_clause<C>(&mut self, c: &C)
        where
            C: ClauseIterable,
        {
            for lit in c.items() {
                self.push_lit((*lit).into());
            }
            self.0.push(0);
        }

        /// Register clause deletion.
        pub fn delete_clause<C>(&mut self, c: &C)
        where
            C: ClauseIterable,
        {
            self.0.push(i32::MAX);
            for lit in c.items() {
                self.push_lit((*lit).into());
            }
            self.0.push(0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::clause::Var;

    #[test]
    fn test_display_and_truncate() {
        let a = Lit::new(Var::unsafe_from_idx(0), true);
        let b = Lit::new(Var::unsafe_from_idx(1), false);
        let mut p = Proof::new();
        p.create_clause(&vec![a, b]);
        let mark = p.len();
        p.delete_clause(&vec![a, b]);
        p.create_clause(&Vec::<Lit>::new());
        assert_eq!(format!("{}", p), "1 -2 0\nd 1 -2 0\n0\n");
        p.truncate(mark);
        assert_eq!(format!("{}", p), "1 -2 0\n");
    }
}
