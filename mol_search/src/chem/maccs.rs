//! 166 structural keys in the style of MACCS.
//!
//! Each bit answers one yes/no question about the molecule: element presence and counts, bond
//! element pairs, hydrogen and degree environments, ring topology, and a set of functional groups
//! matched as substructures. The key order is fixed so bit positions are stable between runs, but
//! it is not the MDL numbering.

use std::sync::OnceLock;

use log::warn;

use crate::chem::element;
use crate::chem::fingerprint::Fingerprint;
use crate::chem::molecule::{BondOrder, Chirality, Molecule};
use crate::chem::smiles::parse_smiles;
use crate::chem::substructure;

pub const NUM_KEYS: usize = 166;

#[derive(Debug, Clone, Copy)]
enum Key {
    /// at least `n` atoms of the element
    Element(u8, usize),
    Halogens(usize),
    /// atoms other than carbon and hydrogen
    Hetero(usize),
    HeavyAtoms(usize),
    AnyCharge,
    Positive,
    Negative,
    Isotope,
    Fragments,
    ChiralCenter,
    Rings(usize),
    RingSize(usize),
    AromaticRings(usize),
    HeteroAromaticRing,
    HeteroRing,
    AromaticElement(u8),
    FusedRings,
    DoubleBonds(usize),
    TripleBond,
    NonRingDoubleBond,
    /// a bond of the given order between the two elements
    BondPair(u8, u8, BondOrder),
    /// at least `n` atoms of the element carrying exactly `h` hydrogens
    Hydrogens(u8, u8, usize),
    /// at least `n` atoms (of the element, if given) with exactly `d` neighbours
    Degree(Option<u8>, usize, usize),
    Pattern(&'static str),
}

use BondOrder::{Aromatic as Ar, Double as D, Single as S, Triple as T};
use Key::*;

static KEYS: [Key; NUM_KEYS] = [
    //element presence
    Element(5, 1), Element(9, 1), Element(14, 1), Element(15, 1), Element(16, 1),
    Element(17, 1), Element(35, 1), Element(53, 1), Element(34, 1), Element(33, 1),
    //element counts
    Element(7, 1), Element(7, 2), Element(7, 3), Element(8, 1), Element(8, 2),
    Element(8, 3), Element(8, 4), Element(16, 2), Element(9, 2), Element(17, 2),
    //halogens, charge, isotopes, fragments
    Halogens(1), Halogens(2), Halogens(3), AnyCharge, Positive,
    Negative, Isotope, Fragments, ChiralCenter, Hetero(1),
    //size
    Hetero(2), Hetero(3), Hetero(4), Hetero(5), HeavyAtoms(8),
    HeavyAtoms(16), HeavyAtoms(24), HeavyAtoms(32), Rings(1), Rings(2),
    //rings
    Rings(3), Rings(4), RingSize(3), RingSize(4), RingSize(5),
    RingSize(6), RingSize(7), RingSize(8), AromaticRings(1), AromaticRings(2),
    //ring composition and unsaturation
    HeteroAromaticRing, HeteroRing, AromaticElement(7), AromaticElement(8), AromaticElement(16),
    FusedRings, DoubleBonds(1), DoubleBonds(2), TripleBond, NonRingDoubleBond,
    //bond element pairs
    BondPair(6, 7, S), BondPair(6, 7, D), BondPair(6, 7, T), BondPair(6, 8, S), BondPair(6, 8, D),
    BondPair(6, 16, S), BondPair(6, 16, D), BondPair(7, 7, S), BondPair(7, 7, D), BondPair(7, 8, S),
    BondPair(7, 8, D), BondPair(8, 8, S), BondPair(16, 16, S), BondPair(8, 16, S), BondPair(8, 16, D),
    BondPair(8, 15, S), BondPair(8, 15, D), BondPair(6, 9, S), BondPair(6, 17, S), BondPair(6, 35, S),
    BondPair(6, 53, S), BondPair(6, 14, S), BondPair(6, 15, S), BondPair(7, 16, S), BondPair(6, 6, S),
    BondPair(6, 6, D), BondPair(6, 6, T), BondPair(6, 6, Ar), BondPair(6, 7, Ar), BondPair(7, 7, Ar),
    //hydrogen environments
    Hydrogens(6, 3, 1), Hydrogens(6, 3, 2), Hydrogens(6, 2, 1), Hydrogens(6, 2, 2), Hydrogens(6, 1, 1),
    Hydrogens(6, 0, 1), Hydrogens(7, 2, 1), Hydrogens(7, 1, 1), Hydrogens(8, 1, 1), Hydrogens(8, 1, 2),
    //branching
    Hydrogens(16, 1, 1), Degree(Some(6), 4, 1), Degree(Some(7), 3, 1), Degree(None, 3, 1), Degree(None, 3, 2),
    Degree(None, 3, 3), Degree(None, 4, 1), Degree(None, 1, 4), Degree(Some(8), 2, 1), Degree(Some(7), 2, 1),
    //carbonyl and related groups
    Pattern("C(=O)O"), Pattern("C(=O)N"), Pattern("C(=O)Cl"), Pattern("OC(=O)O"), Pattern("NC(=O)N"),
    Pattern("NC(=O)O"), Pattern("C(=O)OC"), Pattern("CC(=O)C"), Pattern("C(=O)C=O"), Pattern("CC=O"),
    //heteroatom chains
    Pattern("COC"), Pattern("OCO"), Pattern("CN(C)C"), Pattern("CNC"), Pattern("NC(=N)N"),
    Pattern("C(=N)N"), Pattern("S(=O)(=O)N"), Pattern("S(=O)(=O)O"), Pattern("CS(=O)(=O)C"), Pattern("P(=O)(O)O"),
    //nitrogen groups and conjugation
    Pattern("[N+](=O)[O-]"), Pattern("C=NO"), Pattern("C=NN"), Pattern("N=C=O"), Pattern("N=C=S"),
    Pattern("C=CC=C"), Pattern("C=CC=O"), Pattern("OCCO"), Pattern("OCCN"), Pattern("NCCN"),
    //aromatic systems
    Pattern("c1ccccc1"), Pattern("c1ccncc1"), Pattern("c1ccc2ccccc2c1"), Pattern("c1ccoc1"), Pattern("c1ccsc1"),
    Pattern("c1cc[nH]c1"), Pattern("c1cnc[nH]1"), Pattern("c1cncnc1"), Pattern("c1ccc2[nH]ccc2c1"), Pattern("c1ccccc1-c1ccccc1"),
    //aliphatic rings
    Pattern("C1CCCCC1"), Pattern("C1CCCC1"), Pattern("C1CCNCC1"), Pattern("C1COCCN1"), Pattern("C1CNCCN1"),
    Pattern("C1CCOC1"), Pattern("C1CC1"), Pattern("O=C1CCCN1"), Pattern("O=C1CCCO1"), Pattern("Oc1ccccc1"),
    //substituents
    Pattern("Nc1ccccc1"), Pattern("Clc1ccccc1"), Pattern("CC(C)C"), Pattern("CC(C)(C)C"), Pattern("C(F)(F)F"),
    Pattern("C[N+](C)(C)C"),
];

///Parsed functional-group patterns, indexed like `KEYS`
fn patterns() -> &'static Vec<Option<Molecule>> {

    static PATTERNS: OnceLock<Vec<Option<Molecule>>> = OnceLock::new();

    return PATTERNS.get_or_init(|| {
        KEYS.iter()
            .map(|key| match key {
                Pattern(smiles) => match parse_smiles(smiles) {
                    Ok(mol) => Some(mol),
                    Err(e) => {
                        warn!("structural key {} does not parse: {}", smiles, e);
                        None
                    },
                },
                _ => None,
            })
            .collect()
    });
}

pub fn maccs(mol: &Molecule) -> Fingerprint {

    let mut fp = Fingerprint::new(NUM_KEYS);

    if mol.atom_count() == 0 {
        return fp;
    }

    let mut counts = [0usize; 256];
    for atom in &mol.atoms {
        counts[atom.atomic_number as usize] += 1;
    }

    let patterns = patterns();

    for (bit, key) in KEYS.iter().enumerate() {
        let on = match key {
            Pattern(_) => match &patterns[bit] {
                Some(p) => substructure::has_match(mol, p, false),
                None => false,
            },
            other => evaluate(mol, &counts, *other),
        };
        if on {
            fp.set_bit(bit);
        }
    }

    return fp;
}

fn evaluate(mol: &Molecule, counts: &[usize; 256], key: Key) -> bool {

    let atoms = &mol.atoms;

    match key {
        Element(z, n) => counts[z as usize] >= n,
        Halogens(n) => atoms.iter().filter(|a| element::is_halogen(a.atomic_number)).count() >= n,
        Hetero(n) => atoms.iter().filter(|a| !matches!(a.atomic_number, 0 | 1 | 6)).count() >= n,
        HeavyAtoms(n) => mol.heavy_atom_count() >= n,
        AnyCharge => atoms.iter().any(|a| a.formal_charge != 0),
        Positive => atoms.iter().any(|a| a.formal_charge > 0),
        Negative => atoms.iter().any(|a| a.formal_charge < 0),
        Isotope => atoms.iter().any(|a| a.isotope.is_some()),
        Fragments => mol.fragment_count() > 1,
        ChiralCenter => atoms.iter().any(|a| a.chirality != Chirality::None),
        Rings(n) => mol.rings.len() >= n,
        RingSize(size) => mol.rings.iter().any(|r| r.len() == size),
        AromaticRings(n) => mol.rings.iter().filter(|r| r.iter().all(|a| atoms[*a].is_aromatic)).count() >= n,
        HeteroAromaticRing => mol.rings.iter().any(|r| {
            r.iter().all(|a| atoms[*a].is_aromatic) && r.iter().any(|a| atoms[*a].atomic_number != 6)
        }),
        HeteroRing => mol.rings.iter().any(|r| r.iter().any(|a| atoms[*a].atomic_number != 6)),
        AromaticElement(z) => atoms.iter().any(|a| a.is_aromatic && a.atomic_number == z),
        FusedRings => (0..mol.atom_count()).any(|a| mol.rings.iter().filter(|r| r.contains(&a)).count() > 1),
        DoubleBonds(n) => mol.bonds.iter().filter(|b| b.order == D).count() >= n,
        TripleBond => mol.bonds.iter().any(|b| b.order == T),
        NonRingDoubleBond => mol.bonds.iter().enumerate().any(|(i, b)| b.order == D && !mol.ring_bonds[i]),
        BondPair(z1, z2, order) => mol.bonds.iter().any(|b| {
            let a = atoms[b.atom1].atomic_number;
            let c = atoms[b.atom2].atomic_number;
            b.order == order && ((a == z1 && c == z2) || (a == z2 && c == z1))
        }),
        Hydrogens(z, h, n) => atoms.iter().filter(|a| a.atomic_number == z && a.hydrogens == h).count() >= n,
        Degree(z, d, n) => (0..mol.atom_count())
            .filter(|a| z.map_or(true, |z| atoms[*a].atomic_number == z) && mol.degree(*a) == d)
            .count() >= n,
        Pattern(_) => false,
    }
}
