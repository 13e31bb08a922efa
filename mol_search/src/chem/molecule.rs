//! Molecular graph as produced by the SMILES parser.

use crate::chem::ring;

/// Tetrahedral tag of a stereocentre.
///
/// After parsing, the tag refers to the order given by [`Molecule::stereo_neighbors`], not to the
/// order the neighbours were written in, so two spellings of one stereoisomer carry equal tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

impl Chirality {

    pub fn flipped(self) -> Self {

        match self {
            Chirality::None => Chirality::None,
            Chirality::CounterClockwise => Chirality::Clockwise,
            Chirality::Clockwise => Chirality::CounterClockwise,
        }
    }

    ///Tag for the same centre with its neighbours listed in an order `odd` permutations away
    pub fn permuted(self, odd: bool) -> Self {

        match odd {
            true => self.flipped(),
            false => self,
        }
    }
}

/// One of the four positions around a stereocentre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoSlot {
    Atom(usize),
    /// the single implicit hydrogen
    Hydrogen,
    /// the free position of a three-coordinate centre
    Vacant,
}

/// Whether `to` is an odd permutation of `from`, or `None` when the lists hold different slots.
pub fn odd_permutation(from: &[StereoSlot], to: &[StereoSlot]) -> Option<bool> {

    if from.len() != to.len() {
        return None;
    }

    let mut positions = Vec::with_capacity(to.len());
    for slot in to {
        positions.push(from.iter().position(|s| s == slot)?);
    }

    let mut sorted = positions.clone();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() != positions.len() {
        return None;
    }

    let mut inversions = 0;
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }

    return Some(inversions % 2 == 1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {

    ///Valence contribution, aromatic bonds counted as 1.5
    pub fn as_f32(self) -> f32 {

        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    pub fn code(self) -> u64 {

        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// 0 for the `*` wildcard
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub is_aromatic: bool,
    /// Implicit hydrogens for organic subset atoms, the written count for bracket atoms
    pub hydrogens: u8,
    pub chirality: Chirality,
    pub bracket: bool,
}

impl Atom {

    pub fn new(atomic_number: u8, is_aromatic: bool) -> Self {

        return Self {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            is_aromatic,
            hydrogens: 0,
            chirality: Chirality::None,
            bracket: false,
        };
    }

    pub fn is_wildcard(&self) -> bool {
        self.atomic_number == crate::chem::element::WILDCARD
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {

    pub fn other(&self, atom: usize) -> usize {

        match self.atom1 == atom {
            true => self.atom2,
            false => self.atom1,
        }
    }
}

/// Atoms, bonds and the derived adjacency and ring membership.
///
/// Ring information is computed once on construction so fingerprint generators and the matcher
/// can share it.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom] = [(neighbor, bond index)]
    pub adjacency: Vec<Vec<(usize, usize)>>,
    pub rings: Vec<Vec<usize>>,
    pub ring_atoms: Vec<bool>,
    pub ring_bonds: Vec<bool>,
}

impl Molecule {

    pub fn new(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {

        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (i, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, i));
            adjacency[bond.atom2].push((bond.atom1, i));
        }

        let mut mol = Self {
            atoms,
            bonds,
            adjacency,
            rings: Vec::new(),
            ring_atoms: Vec::new(),
            ring_bonds: Vec::new(),
        };

        mol.refresh_rings();

        return mol;
    }

    ///Recomputes ring data after bonds changed order (aromaticity perception)
    pub(crate) fn refresh_rings(&mut self) {

        let ring_bonds = ring::ring_bonds(self);
        let mut ring_atoms = vec![false; self.atoms.len()];
        for (i, bond) in self.bonds.iter().enumerate() {
            if ring_bonds[i] {
                ring_atoms[bond.atom1] = true;
                ring_atoms[bond.atom2] = true;
            }
        }

        self.ring_bonds = ring_bonds;
        self.ring_atoms = ring_atoms;
        self.rings = ring::smallest_rings(self);
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn get_bond(&self, a1: usize, a2: usize) -> Option<&Bond> {

        return self.adjacency[a1]
            .iter()
            .find(|(n, _)| *n == a2)
            .map(|(_, b)| &self.bonds[*b]);
    }

    ///Sum of bond orders around an atom, aromatic bonds counted as 1.5
    pub fn bond_order_sum(&self, atom: usize) -> f32 {

        return self.adjacency[atom]
            .iter()
            .map(|(_, b)| self.bonds[*b].order.as_f32())
            .sum();
    }

    /// Reference order for the chirality tag of `atom`: bonded atoms in adjacency order, then a
    /// single implicit hydrogen, then [`StereoSlot::Vacant`] when only three positions are filled.
    pub fn stereo_neighbors(&self, atom: usize) -> Vec<StereoSlot> {

        let mut slots: Vec<StereoSlot> = self.adjacency[atom].iter().map(|(n, _)| StereoSlot::Atom(*n)).collect();
        if self.atoms[atom].hydrogens == 1 {
            slots.push(StereoSlot::Hydrogen);
        }
        if slots.len() == 3 {
            slots.push(StereoSlot::Vacant);
        }

        return slots;
    }

    pub fn has_wildcard(&self) -> bool {
        self.atoms.iter().any(|a| a.is_wildcard())
    }

    ///Number of disconnected fragments
    pub fn fragment_count(&self) -> usize {

        let mut seen = vec![false; self.atoms.len()];
        let mut count = 0;

        for start in 0..self.atoms.len() {
            if seen[start] {
                continue;
            }
            count += 1;
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(curr) = stack.pop() {
                for (n, _) in &self.adjacency[curr] {
                    if !seen[*n] {
                        seen[*n] = true;
                        stack.push(*n);
                    }
                }
            }
        }

        return count;
    }

    ///All-pairs topological distances by BFS, `usize::MAX` between fragments
    pub fn distance_matrix(&self) -> Vec<Vec<usize>> {

        let n = self.atoms.len();
        let mut matrix = vec![vec![usize::MAX; n]; n];

        for start in 0..n {
            let row = &mut matrix[start];
            row[start] = 0;
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(start);
            while let Some(curr) = queue.pop_front() {
                let d = row[curr];
                for (next, _) in &self.adjacency[curr] {
                    if row[*next] == usize::MAX {
                        row[*next] = d + 1;
                        queue.push_back(*next);
                    }
                }
            }
        }

        return matrix;
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn ethane() -> Molecule {

        let mut c1 = Atom::new(6, false);
        c1.hydrogens = 3;
        let c2 = c1.clone();

        let bonds = vec![Bond { atom1: 0, atom2: 1, order: BondOrder::Single }];

        return Molecule::new(vec![c1, c2], bonds);
    }

    #[test]
    fn adjacency_is_symmetric() {

        let mol = ethane();
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.degree(1), 1);
        assert!(mol.get_bond(1, 0).is_some());
        assert!(mol.rings.is_empty());
    }

    #[test]
    fn distances_and_fragments() {

        let mol = ethane();
        let d = mol.distance_matrix();
        assert_eq!(d[0][1], 1);
        assert_eq!(mol.fragment_count(), 1);

        let lone = Molecule::new(vec![Atom::new(8, false), Atom::new(8, false)], vec![]);
        assert_eq!(lone.fragment_count(), 2);
        assert_eq!(lone.distance_matrix()[0][1], usize::MAX);
    }

    #[test]
    fn permutation_parity() {

        use StereoSlot::*;
        let base = [Atom(0), Atom(2), Atom(3), Hydrogen];

        assert_eq!(odd_permutation(&base, &base), Some(false));
        assert_eq!(odd_permutation(&base, &[Atom(2), Atom(0), Atom(3), Hydrogen]), Some(true));
        //rotating three positions is even
        assert_eq!(odd_permutation(&base, &[Atom(0), Atom(3), Hydrogen, Atom(2)]), Some(false));
        assert_eq!(odd_permutation(&base, &[Atom(0), Atom(2), Atom(3), Vacant]), None);
        assert_eq!(odd_permutation(&base, &[Atom(0), Atom(0), Atom(3), Hydrogen]), None);
        assert_eq!(Chirality::Clockwise.permuted(true), Chirality::CounterClockwise);
    }
}
