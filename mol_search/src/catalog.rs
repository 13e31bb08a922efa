//! The fixed set of fingerprint types and their descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintType {
    MorganEcfp,
    MorganFcfp,
    RdkTopological,
    AtomPair,
    TopologicalTorsion,
    Maccs,
    Pattern,
}

impl FingerprintType {

    pub const ALL: [FingerprintType; 7] = [
        FingerprintType::MorganEcfp,
        FingerprintType::MorganFcfp,
        FingerprintType::RdkTopological,
        FingerprintType::AtomPair,
        FingerprintType::TopologicalTorsion,
        FingerprintType::Maccs,
        FingerprintType::Pattern,
    ];

    pub fn key(self) -> &'static str {

        match self {
            FingerprintType::MorganEcfp => "morgan_ecfp",
            FingerprintType::MorganFcfp => "morgan_fcfp",
            FingerprintType::RdkTopological => "rdk_topological",
            FingerprintType::AtomPair => "atom_pair",
            FingerprintType::TopologicalTorsion => "topological_torsion",
            FingerprintType::Maccs => "maccs",
            FingerprintType::Pattern => "pattern",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {

        return FingerprintType::ALL
            .iter()
            .copied()
            .find(|t| t.key() == key)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown fingerprint type: {}", key)));
    }

    pub fn width(self) -> usize {

        match self {
            FingerprintType::Maccs => crate::chem::maccs::NUM_KEYS,
            _ => 2048,
        }
    }

    ///Whether `use_chirality` changes the generated bits
    pub fn chirality_sensitive(self) -> bool {
        matches!(self, FingerprintType::MorganEcfp | FingerprintType::MorganFcfp)
    }
}

impl fmt::Display for FingerprintType {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FingerprintTypeDescriptor {
    pub fp_type: FingerprintType,
    pub key: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    /// how individual bits can be traced back to structure
    pub mechanism: &'static str,
    /// explainability level, from "low" to "very high"
    pub level: &'static str,
    pub limitations: &'static str,
    pub typical_explanations: &'static [&'static str],
    pub width: usize,
}

/// Enumerates the supported fingerprint types in a fixed order.
///
/// Built once at startup and handed to whoever needs it; the content never depends on loaded
/// data.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<FingerprintTypeDescriptor>,
}

impl Catalog {

    pub fn standard() -> Self {

        let entries = FingerprintType::ALL.iter().map(|t| describe(*t)).collect();
        return Self { entries };
    }

    pub fn entries(&self) -> &[FingerprintTypeDescriptor] {
        &self.entries
    }

    pub fn get(&self, fp_type: FingerprintType) -> Option<&FingerprintTypeDescriptor> {
        self.entries.iter().find(|e| e.fp_type == fp_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn describe(fp_type: FingerprintType) -> FingerprintTypeDescriptor {

    let (short_name, description, mechanism, level, limitations, typical_explanations): (_, _, _, _, _, &'static [&'static str]) = match fp_type {
        FingerprintType::MorganEcfp => (
            "ECFP",
            "Extended Connectivity Fingerprint (ECFP4). Encodes atom-centered circular environments up to radius 2. \
             Widely used for similarity search, clustering, and QSAR.",
            "Each bit corresponds to one or more atom-centered environments (center atom and radius).",
            "high",
            "Bits are hashed, so one bit may stand for several distinct environments.",
            &["Highlighted atom environments", "Similarity maps", "Per-atom importance aggregation"],
        ),
        FingerprintType::MorganFcfp => (
            "FCFP",
            "Functional-Class Fingerprint (FCFP4). Morgan fingerprint over pharmacophoric atom features instead of \
             exact atom types.",
            "Same as ECFP, but environments are built from functional roles (donor, acceptor, aromatic, halogen, \
             basic, acidic).",
            "high",
            "Chemical specificity is reduced compared to ECFP.",
            &["Functional similarity", "Scaffold hopping rationales"],
        ),
        FingerprintType::RdkTopological => (
            "RDK",
            "Topological (path-based) fingerprint. Encodes linear bond paths of up to seven bonds, similar to \
             Daylight fingerprints.",
            "Each bit corresponds to one or more linear bond paths labelled by element, degree and bond order.",
            "high",
            "Sensitive to small structural changes and less robust for scaffold hopping.",
            &["Exact substructure paths", "Bond-path highlighting"],
        ),
        FingerprintType::AtomPair => (
            "AP",
            "Atom Pair fingerprint. Encodes pairs of atoms along with their topological distance.",
            "Each feature represents a pair of atom types at a given bond distance.",
            "medium",
            "No connected subgraph, so explanations are relational rather than structural.",
            &["Activity cliff analysis", "Long-range interaction reasoning"],
        ),
        FingerprintType::TopologicalTorsion => (
            "TT",
            "Topological Torsion fingerprint. Encodes sequences of four bonded atoms.",
            "Each feature corresponds to a specific four-atom sequence A-B-C-D.",
            "medium",
            "Local view only, and torsions are hashed into the bit vector.",
            &["Linker characterization", "Conformation-sensitive similarity"],
        ),
        FingerprintType::Maccs => (
            "MACCS",
            "MACCS-style structural keys (166 bits). Each bit corresponds to a predefined chemical feature.",
            "Each bit has a fixed meaning from the structural key table.",
            "very high",
            "Low resolution, so many subtle SAR effects are not captured.",
            &["Human-readable feature presence", "Medicinal chemistry reports"],
        ),
        FingerprintType::Pattern => (
            "Pattern",
            "Pattern fingerprint. Designed for substructure screening.",
            "Bits correspond to small linear paths. Mainly used to pre-filter substructure matches.",
            "low",
            "High collision rate, screening only.",
            &["Substructure screening"],
        ),
    };

    return FingerprintTypeDescriptor {
        fp_type,
        key: fp_type.key(),
        short_name,
        description,
        mechanism,
        level,
        limitations,
        typical_explanations,
        width: fp_type.width(),
    };
}
