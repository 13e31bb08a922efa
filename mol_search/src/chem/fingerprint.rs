//! Bit-vector fingerprints, Tanimoto similarity, and the hashed fingerprint generators.
//!
//! Every generator hashes a structural feature with FNV-1a and folds it onto the bit width, so
//! the same molecule always produces the same bits.

use crate::chem::element;
use crate::chem::molecule::{odd_permutation, BondOrder, Chirality, Molecule, StereoSlot};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: Vec<u64>,
    nbits: usize,
}

impl Fingerprint {

    pub fn new(nbits: usize) -> Self {

        let words = (nbits + 63) / 64;
        return Self { bits: vec![0u64; words], nbits };
    }

    pub fn set_bit(&mut self, pos: usize) {

        if self.nbits == 0 {
            return;
        }
        let pos = pos % self.nbits;
        self.bits[pos / 64] |= 1u64 << (pos % 64);
    }

    pub fn get_bit(&self, pos: usize) -> bool {

        if pos >= self.nbits {
            return false;
        }
        return (self.bits[pos / 64] >> (pos % 64)) & 1 == 1;
    }

    pub fn count_ones(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    ///True when every bit set in `probe` is also set here
    pub fn contains_all(&self, probe: &Fingerprint) -> bool {

        if self.nbits != probe.nbits {
            return false;
        }

        return self.bits.iter().zip(probe.bits.iter()).all(|(s, p)| s & p == *p);
    }

    /// Tanimoto coefficient `|A & B| / |A | B|`.
    ///
    /// Two empty fingerprints are identical and score 1.0. Fingerprints of different widths come
    /// from different generators and score 0.0.
    pub fn tanimoto(&self, other: &Fingerprint) -> f64 {

        if self.nbits != other.nbits {
            return 0.0;
        }

        let mut both: u32 = 0;
        let mut either: u32 = 0;
        for (a, b) in self.bits.iter().zip(other.bits.iter()) {
            both += (a & b).count_ones();
            either += (a | b).count_ones();
        }

        match either {
            0 => 1.0,
            _ => both as f64 / either as f64,
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Hasher(u64);

impl Hasher {

    pub(crate) fn seeded(seed: u64) -> Self {
        Self(FNV_OFFSET).update(seed)
    }

    pub(crate) fn update(self, value: u64) -> Self {

        let mut h = self.0;
        for b in value.to_le_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        return Self(h);
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

fn fold(hash: u64, nbits: usize) -> usize {
    (hash % nbits as u64) as usize
}

//distinct seeds keep generators that share feature shapes from colliding on the same bits
const SEED_MORGAN: u64 = 1;
const SEED_FEATURE_MORGAN: u64 = 2;
const SEED_TOPOLOGICAL: u64 = 3;
const SEED_ATOM_PAIR: u64 = 4;
const SEED_TORSION: u64 = 5;
const SEED_PATTERN: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Invariants {
    /// element, degree, hydrogens, charge, ring membership, aromaticity
    Atom,
    /// donor, acceptor, aromatic, halogen, basic, acidic flags
    Feature,
}

/// Morgan circular fingerprint.
///
/// Radius 2 corresponds to ECFP4/FCFP4. With `chirality` set, each stereocentre's tag enters its
/// initial invariant, taken relative to its neighbours ranked by environment so the bits do not
/// depend on how the SMILES was written.
pub fn morgan(mol: &Molecule, radius: usize, nbits: usize, invariants: Invariants, chirality: bool) -> Fingerprint {

    let mut fp = Fingerprint::new(nbits);
    let n = mol.atom_count();

    let seed = match invariants {
        Invariants::Atom => SEED_MORGAN,
        Invariants::Feature => SEED_FEATURE_MORGAN,
    };

    let initial: Vec<Hasher> = (0..n)
        .map(|i| match invariants {
            Invariants::Atom => atom_invariant(mol, i, seed),
            Invariants::Feature => Hasher::seeded(seed).update(feature_flags(mol, i) as u64),
        })
        .collect();

    let mut identifiers: Vec<u64> = initial.iter().map(|h| h.finish()).collect();

    if chirality {
        let codes = stereo_codes(mol, &identifiers, radius, seed);
        identifiers = initial
            .iter()
            .zip(codes)
            .map(|(h, code)| h.update(code).finish())
            .collect();
    }

    for id in &identifiers {
        fp.set_bit(fold(*id, nbits));
    }

    for iteration in 0..radius {
        identifiers = refine(mol, &identifiers, seed, iteration);
        for id in &identifiers {
            fp.set_bit(fold(*id, nbits));
        }
    }

    return fp;
}

///One Morgan iteration: every atom hashes its identifier with its sorted bonded neighbours
fn refine(mol: &Molecule, identifiers: &[u64], seed: u64, iteration: usize) -> Vec<u64> {

    return (0..mol.atom_count())
        .map(|i| {
            let mut neighbors: Vec<(u64, u64)> = mol.adjacency[i]
                .iter()
                .map(|(a, b)| (mol.bonds[*b].order.code(), identifiers[*a]))
                .collect();
            neighbors.sort();

            let mut h = Hasher::seeded(seed)
                .update(iteration as u64 + 1)
                .update(identifiers[i]);
            for (order, id) in neighbors {
                h = h.update(order).update(id);
            }
            h.finish()
        })
        .collect();
}

fn atom_invariant(mol: &Molecule, i: usize, seed: u64) -> Hasher {

    let atom = &mol.atoms[i];

    return Hasher::seeded(seed)
        .update(atom.atomic_number as u64)
        .update(mol.degree(i) as u64)
        .update(atom.hydrogens as u64)
        .update(atom.formal_charge as i64 as u64)
        .update(mol.ring_atoms[i] as u64)
        .update(atom.is_aromatic as u64);
}

/// Per-atom stereo code: 0 for no tag, 1 (`@`) or 2 (`@@`) for the tag with neighbours ordered
/// by their Morgan environment, 3 when tied neighbours leave that order undefined.
fn stereo_codes(mol: &Molecule, initial: &[u64], radius: usize, seed: u64) -> Vec<u64> {

    let mut rank = initial.to_vec();
    for iteration in 0..radius.max(1) {
        rank = refine(mol, &rank, seed, iteration);
    }

    let key = |slot: &StereoSlot| match slot {
        StereoSlot::Atom(a) => (0u8, rank[*a]),
        StereoSlot::Hydrogen => (1, 0),
        StereoSlot::Vacant => (2, 0),
    };

    return (0..mol.atom_count())
        .map(|i| {
            let tag = mol.atoms[i].chirality;
            if tag == Chirality::None {
                return 0;
            }

            let slots = mol.stereo_neighbors(i);
            let mut ranked = slots.clone();
            ranked.sort_by_key(|s| key(s));
            if ranked.windows(2).any(|w| key(&w[0]) == key(&w[1])) {
                return 3;
            }

            match odd_permutation(&slots, &ranked).map(|odd| tag.permuted(odd)) {
                Some(Chirality::CounterClockwise) => 1,
                Some(Chirality::Clockwise) => 2,
                _ => 3,
            }
        })
        .collect();
}

const DONOR: u8 = 1;
const ACCEPTOR: u8 = 2;
const AROMATIC: u8 = 4;
const HALOGEN: u8 = 8;
const BASIC: u8 = 16;
const ACIDIC: u8 = 32;

///Pharmacophoric roles used by the functional-class Morgan variant
pub(crate) fn feature_flags(mol: &Molecule, i: usize) -> u8 {

    let atom = &mol.atoms[i];
    let z = atom.atomic_number;
    let mut flags = 0u8;

    if matches!(z, 7 | 8) && atom.hydrogens > 0 {
        flags |= DONOR;
    }

    if (z == 8 && atom.formal_charge <= 0)
        || (z == 7 && atom.formal_charge <= 0 && atom.hydrogens == 0 && !atom.is_aromatic && mol.degree(i) < 3)
        || (z == 7 && atom.is_aromatic && atom.hydrogens == 0 && mol.degree(i) == 2) {
        flags |= ACCEPTOR;
    }

    if atom.is_aromatic {
        flags |= AROMATIC;
    }

    if element::is_halogen(z) {
        flags |= HALOGEN;
    }

    let all_single = mol.adjacency[i].iter().all(|(_, b)| mol.bonds[*b].order == BondOrder::Single);
    if z == 7 && (atom.formal_charge > 0 || (!atom.is_aromatic && all_single && !next_to_carbonyl(mol, i))) {
        flags |= BASIC;
    }

    if (matches!(z, 8 | 16) && atom.formal_charge < 0)
        || (z == 8 && atom.hydrogens > 0 && next_to_carbonyl(mol, i)) {
        flags |= ACIDIC;
    }

    return flags;
}

///Bonded to a carbon that carries a C=O
fn next_to_carbonyl(mol: &Molecule, i: usize) -> bool {

    return mol.adjacency[i].iter().any(|(c, _)| {
        mol.atoms[*c].atomic_number == 6
            && mol.adjacency[*c].iter().any(|(o, b)| {
                *o != i && mol.atoms[*o].atomic_number == 8 && mol.bonds[*b].order == BondOrder::Double
            })
    });
}

///Pi electrons an atom contributes, counted from its bonds
pub(crate) fn pi_electrons(mol: &Molecule, i: usize) -> u64 {

    let mut pi = 0u64;
    let mut aromatic = false;
    for (_, b) in &mol.adjacency[i] {
        match mol.bonds[*b].order {
            BondOrder::Double => pi += 1,
            BondOrder::Triple => pi += 2,
            BondOrder::Aromatic => aromatic = true,
            BondOrder::Single => {},
        }
    }

    if aromatic {
        pi += 1;
    }

    return pi;
}

fn heavy_degree(mol: &Molecule, i: usize) -> u64 {

    return mol.adjacency[i]
        .iter()
        .filter(|(n, _)| mol.atoms[*n].atomic_number != 1)
        .count() as u64;
}

///Calls `visit` with the atoms and bonds of every simple path of `min_bonds..=max_bonds` bonds.
///
///Each path is visited once from each end.
pub(crate) fn for_each_path<F: FnMut(&[usize], &[usize])>(mol: &Molecule, min_bonds: usize, max_bonds: usize, mut visit: F) {

    let mut atoms: Vec<usize> = Vec::with_capacity(max_bonds + 1);
    let mut bonds: Vec<usize> = Vec::with_capacity(max_bonds);
    let mut on_path = vec![false; mol.atom_count()];

    fn extend<F: FnMut(&[usize], &[usize])>(
        mol: &Molecule,
        min_bonds: usize,
        max_bonds: usize,
        atoms: &mut Vec<usize>,
        bonds: &mut Vec<usize>,
        on_path: &mut Vec<bool>,
        visit: &mut F,
    ) {

        if bonds.len() >= min_bonds {
            visit(atoms, bonds);
        }

        if bonds.len() == max_bonds {
            return;
        }

        let Some(last) = atoms.last().copied() else {
            return;
        };

        for (next, b) in &mol.adjacency[last] {
            if on_path[*next] {
                continue;
            }
            on_path[*next] = true;
            atoms.push(*next);
            bonds.push(*b);

            extend(mol, min_bonds, max_bonds, atoms, bonds, on_path, visit);

            bonds.pop();
            atoms.pop();
            on_path[*next] = false;
        }
    }

    for start in 0..mol.atom_count() {
        on_path[start] = true;
        atoms.push(start);

        extend(mol, min_bonds, max_bonds, &mut atoms, &mut bonds, &mut on_path, &mut visit);

        atoms.pop();
        on_path[start] = false;
    }
}

///Hash of a path's label sequence, read in whichever direction sorts first
fn path_hash(seed: u64, atom_labels: &[u64], bond_labels: &[u64]) -> u64 {

    let forward = atom_labels.iter().copied().lt(atom_labels.iter().rev().copied())
        || (atom_labels.iter().eq(atom_labels.iter().rev())
            && bond_labels.iter().copied().le(bond_labels.iter().rev().copied()));

    let mut h = Hasher::seeded(seed).update(bond_labels.len() as u64);

    match forward {
        true => {
            for k in 0..atom_labels.len() {
                h = h.update(atom_labels[k]);
                if k < bond_labels.len() {
                    h = h.update(bond_labels[k]);
                }
            }
        },
        false => {
            let n = atom_labels.len();
            let m = bond_labels.len();
            for k in 0..n {
                h = h.update(atom_labels[n - 1 - k]);
                if k < m {
                    h = h.update(bond_labels[m - 1 - k]);
                }
            }
        },
    }

    return h.finish();
}

fn labelled_paths<A, B>(mol: &Molecule, seed: u64, min_bonds: usize, max_bonds: usize, nbits: usize, atom_label: A, bond_label: B) -> Fingerprint
where A: Fn(&Molecule, usize) -> u64, B: Fn(&Molecule, usize) -> u64 {

    let mut fp = Fingerprint::new(nbits);

    for_each_path(mol, min_bonds, max_bonds, |atoms, bonds| {
        let atom_labels: Vec<u64> = atoms.iter().map(|a| atom_label(mol, *a)).collect();
        let bond_labels: Vec<u64> = bonds.iter().map(|b| bond_label(mol, *b)).collect();
        fp.set_bit(fold(path_hash(seed, &atom_labels, &bond_labels), nbits));
    });

    return fp;
}

fn element_label(mol: &Molecule, a: usize) -> u64 {

    let atom = &mol.atoms[a];
    return (atom.atomic_number as u64) << 1 | atom.is_aromatic as u64;
}

fn order_label(mol: &Molecule, b: usize) -> u64 {
    mol.bonds[b].order.code()
}

/// Daylight-style topological fingerprint: every linear path of up to `max_bonds` bonds.
pub fn topological(mol: &Molecule, max_bonds: usize, nbits: usize) -> Fingerprint {

    return labelled_paths(mol, SEED_TOPOLOGICAL, 0, max_bonds, nbits, |m, a| {
        element_label(m, a) << 4 | heavy_degree(m, a).min(15)
    }, order_label);
}

/// Screening fingerprint for substructure search.
///
/// Labels are exactly what the matcher compares (element, aromaticity, bond order), so the
/// pattern bits of a substructure are always a subset of the pattern bits of the molecule that
/// contains it.
pub fn pattern(mol: &Molecule, max_bonds: usize, nbits: usize) -> Fingerprint {

    return labelled_paths(mol, SEED_PATTERN, 0, max_bonds, nbits, element_label, order_label);
}

/// Topological torsions: four-atom linear paths labelled by element, branching and pi electrons.
pub fn torsion(mol: &Molecule, nbits: usize) -> Fingerprint {

    let mut fp = Fingerprint::new(nbits);

    for_each_path(mol, 3, 3, |atoms, _| {
        let labels: Vec<u64> = atoms.iter().enumerate().map(|(k, a)| {
            let terminal = k == 0 || k == atoms.len() - 1;
            let branches = heavy_degree(mol, *a).saturating_sub(if terminal { 1 } else { 2 });
            (mol.atoms[*a].atomic_number as u64) << 8 | branches.min(7) << 4 | pi_electrons(mol, *a).min(3)
        }).collect();
        fp.set_bit(fold(path_hash(SEED_TORSION, &labels, &[]), nbits));
    });

    return fp;
}

pub const ATOM_PAIR_MAX_DISTANCE: usize = 30;

/// Atom pairs: every pair of atoms with their topological distance.
pub fn atom_pair(mol: &Molecule, nbits: usize) -> Fingerprint {

    let mut fp = Fingerprint::new(nbits);
    let distances = mol.distance_matrix();

    let codes: Vec<u64> = (0..mol.atom_count())
        .map(|a| {
            (mol.atoms[a].atomic_number as u64) << 8 | heavy_degree(mol, a).min(7) << 4 | pi_electrons(mol, a).min(3)
        })
        .collect();

    for i in 0..mol.atom_count() {
        for j in (i + 1)..mol.atom_count() {
            let d = distances[i][j];
            if d == usize::MAX || d > ATOM_PAIR_MAX_DISTANCE {
                continue;
            }
            let (lo, hi) = match codes[i] <= codes[j] {
                true => (codes[i], codes[j]),
                false => (codes[j], codes[i]),
            };
            let h = Hasher::seeded(SEED_ATOM_PAIR).update(lo).update(d as u64).update(hi).finish();
            fp.set_bit(fold(h, nbits));
        }
    }

    return fp;
}
