//! Molecular structure primitives: parsing, fingerprints, similarity and substructure matching.
//!
//! Searches reach these only through the [`Toolkit`] trait. [`BuiltinToolkit`] is the
//! implementation shipped with the crate.

pub mod element;
pub mod fingerprint;
pub mod maccs;
pub mod molecule;
pub mod ring;
pub mod smiles;
pub mod substructure;

use serde::{Deserialize, Serialize};

use crate::catalog::FingerprintType;
use crate::error::{Error, Result};

pub use fingerprint::Fingerprint;
pub use molecule::Molecule;

const MORGAN_RADIUS: usize = 2;
const TOPOLOGICAL_MAX_BONDS: usize = 7;
const PATTERN_MAX_BONDS: usize = 5;

/// How substructure matches are counted per compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// distinct matched atom sets, capped at [`substructure::MAX_MATCHES`]
    #[default]
    Occurrences,
    /// 1 if the pattern occurs at all
    Boolean,
}

impl CountMode {

    pub fn from_key(key: &str) -> Result<Self> {

        match key {
            "occurrences" => Ok(CountMode::Occurrences),
            "boolean" => Ok(CountMode::Boolean),
            other => Err(Error::InvalidArgument(format!("unknown count mode: {} (expected occurrences or boolean)", other))),
        }
    }
}

pub trait Toolkit: Send + Sync {

    fn parse_structure(&self, smiles: &str) -> Result<Molecule>;

    fn parse_pattern(&self, pattern: &str) -> Result<Molecule>;

    fn fingerprint(&self, mol: &Molecule, fp_type: FingerprintType, use_chirality: bool) -> Fingerprint;

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64;

    fn match_count(&self, target: &Molecule, pattern: &Molecule, use_chirality: bool, mode: CountMode) -> usize;

    /// Screening fingerprint for `pattern`, or `None` when the pattern cannot be screened.
    ///
    /// Any compound matching the pattern has a `FingerprintType::Pattern` fingerprint that
    /// contains every bit of the screen.
    fn screen(&self, pattern: &Molecule) -> Option<Fingerprint>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinToolkit;

impl Toolkit for BuiltinToolkit {

    fn parse_structure(&self, smiles: &str) -> Result<Molecule> {
        smiles::parse_smiles(smiles)
    }

    fn parse_pattern(&self, pattern: &str) -> Result<Molecule> {
        smiles::parse_smiles(pattern)
    }

    fn fingerprint(&self, mol: &Molecule, fp_type: FingerprintType, use_chirality: bool) -> Fingerprint {

        let width = fp_type.width();

        match fp_type {
            FingerprintType::MorganEcfp => fingerprint::morgan(mol, MORGAN_RADIUS, width, fingerprint::Invariants::Atom, use_chirality),
            FingerprintType::MorganFcfp => fingerprint::morgan(mol, MORGAN_RADIUS, width, fingerprint::Invariants::Feature, use_chirality),
            FingerprintType::RdkTopological => fingerprint::topological(mol, TOPOLOGICAL_MAX_BONDS, width),
            FingerprintType::AtomPair => fingerprint::atom_pair(mol, width),
            FingerprintType::TopologicalTorsion => fingerprint::torsion(mol, width),
            FingerprintType::Maccs => maccs::maccs(mol),
            FingerprintType::Pattern => fingerprint::pattern(mol, PATTERN_MAX_BONDS, width),
        }
    }

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        a.tanimoto(b)
    }

    fn match_count(&self, target: &Molecule, pattern: &Molecule, use_chirality: bool, mode: CountMode) -> usize {

        match mode {
            CountMode::Boolean => substructure::has_match(target, pattern, use_chirality) as usize,
            CountMode::Occurrences => substructure::count_unique_matches(target, pattern, use_chirality, substructure::MAX_MATCHES),
        }
    }

    fn screen(&self, pattern: &Molecule) -> Option<Fingerprint> {

        //a wildcard atom can stand for any element, so path labels through it are unknown
        if pattern.has_wildcard() {
            return None;
        }

        return Some(fingerprint::pattern(pattern, PATTERN_MAX_BONDS, FingerprintType::Pattern.width()));
    }
}
