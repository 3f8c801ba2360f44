use crate::{
    core::SolverOpts,
    encodings::Encoder,
    error::{Error, Result},
};

/// MaxSAT algorithm used by `MaxSatSolver::search`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Weighted Boolean optimization: core relaxation with a fresh SAT
    /// solver for every core
    Wbo,
    /// Same as `Wbo`, on a single incremental SAT solver
    IncWbo,
    /// Model-improving linear search (SAT-UNSAT)
    LinearSu,
    /// Lower-bound-raising linear search (UNSAT-SAT), unweighted only
    LinearUs,
    /// Core-guided search with a cardinality constraint over the relaxed
    /// clauses, unweighted only
    Msu3,
    /// Weighted `Msu3`, with a pseudo-Boolean constraint
    Wmsu3,
    /// Core-guided search with soft cardinality constraints
    Oll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalStrategy {
    None,
    /// Keep the encodings in the solver and move bounds through assumptions
    Iterative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityEncoding {
    Totalizer,
    Sequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbEncoding {
    /// Sequential weighted counter
    Swc,
    /// Generalized totalizer
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmoEncoding {
    Ladder,
    /// The solver's own at-most constraints
    Native,
}

/// Which soft clauses are active while weights are being stratified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightStrategy {
    /// Every soft clause from the start
    None,
    /// Lower the weight threshold one distinct weight at a time
    Normal,
    /// Lower the weight threshold until noticeably more clauses are active
    Diversify,
}

#[derive(Debug, Clone)]
pub struct MaxSatConfig {
    pub algorithm: Algorithm,
    pub incremental: IncrementalStrategy,
    pub cardinality: CardinalityEncoding,
    pub pb: PbEncoding,
    pub amo: AmoEncoding,
    pub weight_strategy: WeightStrategy,
    /// Symmetry breaking between relaxation variables (WBO)
    pub symmetry: bool,
    /// Maximum number of symmetry breaking clauses
    pub symmetry_limit: u64,
    /// Optimize lexicographically when the weights allow it
    pub bmo: bool,
    pub solver: SolverOpts,
}

impl Default for MaxSatConfig {
    fn default() -> Self {
        MaxSatConfig {
            algorithm: Algorithm::Oll,
            incremental: IncrementalStrategy::None,
            cardinality: CardinalityEncoding::Totalizer,
            pb: PbEncoding::Swc,
            amo: AmoEncoding::Ladder,
            weight_strategy: WeightStrategy::Normal,
            symmetry: true,
            symmetry_limit: 500_000,
            bmo: true,
            solver: SolverOpts::default(),
        }
    }
}

impl MaxSatConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        MaxSatConfig {
            algorithm,
            ..Self::default()
        }
    }

    /// An encoder with the configured encodings.
    pub(crate) fn encoder(&self) -> Encoder {
        Encoder::new(self.cardinality, self.pb, self.amo)
    }

    /// Check that this configuration can solve an instance, `weighted`
    /// or not.
    pub fn check(&self, weighted: bool) -> Result<()> {
        use self::Algorithm::*;
        self.solver.check()?;
        let iterative = self.incremental == IncrementalStrategy::Iterative;
        match self.algorithm {
            LinearUs | Msu3 if weighted => {
                return Err(Error::UnsupportedConfig(format!(
                    "{:?} does not support weighted instances",
                    self.algorithm
                )));
            }
            LinearUs | Msu3 if iterative && self.cardinality != CardinalityEncoding::Totalizer => {
                return Err(Error::UnsupportedConfig(format!(
                    "incremental {:?} requires the totalizer encoding",
                    self.algorithm
                )));
            }
            Wmsu3 if iterative && self.pb != PbEncoding::Swc => {
                return Err(Error::UnsupportedConfig(
                    "incremental Wmsu3 requires the SWC encoding".to_string(),
                ));
            }
            _ => (),
        }
        if self.amo == AmoEncoding::Native && self.solver.produce_proof {
            return Err(Error::UnsupportedConfig(
                "native at-most-one constraints cannot be used with proofs".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_weighted() {
        assert!(MaxSatConfig::new(Algorithm::Msu3).check(false).is_ok());
        assert!(MaxSatConfig::new(Algorithm::Msu3).check(true).is_err());
        assert!(MaxSatConfig::new(Algorithm::LinearUs).check(true).is_err());
        for &a in &[Algorithm::Wbo, Algorithm::IncWbo, Algorithm::LinearSu, Algorithm::Wmsu3, Algorithm::Oll] {
            assert_eq!(MaxSatConfig::new(a).check(true), Ok(()));
        }
    }

    #[test]
    fn test_check_incremental() {
        let mut c = MaxSatConfig::new(Algorithm::Msu3);
        c.incremental = IncrementalStrategy::Iterative;
        assert!(c.check(false).is_ok());
        c.cardinality = CardinalityEncoding::Sequential;
        assert!(matches!(c.check(false), Err(Error::UnsupportedConfig(_))));

        let mut c = MaxSatConfig::new(Algorithm::Wmsu3);
        c.incremental = IncrementalStrategy::Iterative;
        c.pb = PbEncoding::Gte;
        assert!(c.check(true).is_err());
    }

    #[test]
    fn test_check_native_amo_proof() {
        let mut c = MaxSatConfig::new(Algorithm::Wbo);
        c.amo = AmoEncoding::Native;
        assert!(c.check(false).is_ok());
        c.solver.produce_proof = true;
        assert!(c.check(false).is_err());
    }
}
