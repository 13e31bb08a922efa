//! Substructure matching by VF2-style backtracking.
//!
//! Pattern atoms are mapped in breadth-first order so every atom after the first of each
//! fragment only has to be tried against neighbours of already mapped target atoms.

use std::collections::HashSet;

use crate::chem::molecule::{odd_permutation, Chirality, Molecule, StereoSlot};

/// Upper bound on distinct matches counted per molecule.
pub const MAX_MATCHES: usize = 1000;

/// Atom mapping rules.
///
/// A `*` pattern atom matches any atom. Otherwise element and aromaticity must agree, a charged
/// pattern atom requires the same charge, and bond orders must be equal. With `use_chirality`,
/// a pattern stereocentre only maps onto a target stereocentre with the same handedness once
/// its neighbours are mapped.
struct Matcher<'a> {
    target: &'a Molecule,
    pattern: &'a Molecule,
    use_chirality: bool,
    order: Vec<usize>,
    core_pattern: Vec<Option<usize>>,
    core_target: Vec<Option<usize>>,
}

impl<'a> Matcher<'a> {

    fn new(target: &'a Molecule, pattern: &'a Molecule, use_chirality: bool) -> Self {

        return Self {
            target,
            pattern,
            use_chirality,
            order: bfs_order(pattern),
            core_pattern: vec![None; pattern.atom_count()],
            core_target: vec![None; target.atom_count()],
        };
    }

    fn plausible(&self) -> bool {

        if self.pattern.atom_count() > self.target.atom_count() {
            return false;
        }
        if self.pattern.bond_count() > self.target.bond_count() {
            return false;
        }

        let mut pattern_counts = [0u16; 256];
        let mut target_counts = [0u16; 256];
        for atom in self.pattern.atoms.iter().filter(|a| !a.is_wildcard()) {
            pattern_counts[atom.atomic_number as usize] += 1;
        }
        for atom in &self.target.atoms {
            target_counts[atom.atomic_number as usize] += 1;
        }

        return pattern_counts.iter().zip(target_counts.iter()).all(|(p, t)| p <= t);
    }

    ///Runs the search, handing every complete mapping to `visit`; stops when `visit` returns false
    fn run<F: FnMut(&[Option<usize>]) -> bool>(&mut self, mut visit: F) {

        if !self.plausible() {
            return;
        }

        self.extend(0, &mut visit);
    }

    fn extend<F: FnMut(&[Option<usize>]) -> bool>(&mut self, depth: usize, visit: &mut F) -> bool {

        if depth == self.order.len() {
            if self.use_chirality && !self.stereo_consistent() {
                return true;
            }
            return visit(&self.core_pattern);
        }

        let pattern_atom = self.order[depth];

        for target_atom in self.candidates(pattern_atom) {
            if !self.feasible(pattern_atom, target_atom) {
                continue;
            }

            self.core_pattern[pattern_atom] = Some(target_atom);
            self.core_target[target_atom] = Some(pattern_atom);

            let keep_going = self.extend(depth + 1, visit);

            self.core_pattern[pattern_atom] = None;
            self.core_target[target_atom] = None;

            if !keep_going {
                return false;
            }
        }

        return true;
    }

    fn candidates(&self, pattern_atom: usize) -> Vec<usize> {

        let anchor = self.pattern.adjacency[pattern_atom]
            .iter()
            .find_map(|(p, _)| self.core_pattern[*p]);

        match anchor {
            Some(t) => self.target.adjacency[t]
                .iter()
                .map(|(n, _)| *n)
                .filter(|n| self.core_target[*n].is_none())
                .collect(),
            None => (0..self.target.atom_count())
                .filter(|n| self.core_target[*n].is_none())
                .collect(),
        }
    }

    fn feasible(&self, pattern_atom: usize, target_atom: usize) -> bool {

        let p = &self.pattern.atoms[pattern_atom];
        let t = &self.target.atoms[target_atom];

        if !p.is_wildcard() {
            if p.atomic_number != t.atomic_number || p.is_aromatic != t.is_aromatic {
                return false;
            }
            if p.formal_charge != 0 && p.formal_charge != t.formal_charge {
                return false;
            }
        }

        if self.use_chirality && p.chirality != Chirality::None && t.chirality == Chirality::None {
            return false;
        }

        if self.pattern.degree(pattern_atom) > self.target.degree(target_atom) {
            return false;
        }

        for (p_neighbor, p_bond) in &self.pattern.adjacency[pattern_atom] {
            let Some(t_mapped) = self.core_pattern[*p_neighbor] else {
                continue;
            };
            match self.target.get_bond(target_atom, t_mapped) {
                Some(t_bond) if t_bond.order == self.pattern.bonds[*p_bond].order => {},
                _ => return false,
            }
        }

        return true;
    }

    fn stereo_consistent(&self) -> bool {

        return (0..self.pattern.atom_count())
            .filter(|p| self.pattern.atoms[*p].chirality != Chirality::None)
            .all(|p| match self.core_pattern[p] {
                Some(t) => self.same_handedness(p, t),
                None => false,
            });
    }

    /// Compares tags once the pattern neighbours are carried onto the target.
    ///
    /// Mapped neighbours land on their images. The pattern's implicit hydrogen takes the target's
    /// hydrogen when it is still free, and the remaining pattern slots take the remaining target
    /// slots in reference order. An odd permutation between that image and the target's own
    /// reference order flips the target tag.
    fn same_handedness(&self, pattern_atom: usize, target_atom: usize) -> bool {

        let pattern_slots = self.pattern.stereo_neighbors(pattern_atom);
        let target_slots = self.target.stereo_neighbors(target_atom);

        let mut remaining = target_slots.clone();
        for slot in &pattern_slots {
            if let StereoSlot::Atom(a) = slot {
                let image = self.core_pattern[*a].map(StereoSlot::Atom);
                remaining.retain(|s| Some(*s) != image);
            }
        }

        let mut image = Vec::with_capacity(pattern_slots.len());
        for slot in &pattern_slots {
            let mapped = match slot {
                StereoSlot::Atom(a) => match self.core_pattern[*a] {
                    Some(t) => StereoSlot::Atom(t),
                    None => return false,
                },
                StereoSlot::Hydrogen if remaining.contains(&StereoSlot::Hydrogen) => {
                    remaining.retain(|s| *s != StereoSlot::Hydrogen);
                    StereoSlot::Hydrogen
                },
                _ => match remaining.is_empty() {
                    true => return false,
                    false => remaining.remove(0),
                },
            };
            image.push(mapped);
        }

        return match odd_permutation(&target_slots, &image) {
            Some(odd) => self.target.atoms[target_atom].chirality.permuted(odd) == self.pattern.atoms[pattern_atom].chirality,
            None => false,
        };
    }
}

///Pattern atoms in breadth-first order, one traversal per fragment
fn bfs_order(mol: &Molecule) -> Vec<usize> {

    let mut order = Vec::with_capacity(mol.atom_count());
    let mut seen = vec![false; mol.atom_count()];

    for start in 0..mol.atom_count() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(curr) = queue.pop_front() {
            order.push(curr);
            for (n, _) in &mol.adjacency[curr] {
                if !seen[*n] {
                    seen[*n] = true;
                    queue.push_back(*n);
                }
            }
        }
    }

    return order;
}

pub fn has_match(target: &Molecule, pattern: &Molecule, use_chirality: bool) -> bool {

    let mut found = false;
    Matcher::new(target, pattern, use_chirality).run(|_| {
        found = true;
        false
    });

    return found;
}

/// Number of distinct target atom sets `pattern` maps onto, capped at `cap`.
///
/// Symmetric mappings of the same atoms (the twelve automorphisms of benzene onto one ring, say)
/// count once.
pub fn count_unique_matches(target: &Molecule, pattern: &Molecule, use_chirality: bool, cap: usize) -> usize {

    if cap == 0 {
        return 0;
    }

    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    Matcher::new(target, pattern, use_chirality).run(|mapping| {
        let mut atoms: Vec<usize> = mapping.iter().flatten().copied().collect();
        atoms.sort_unstable();
        seen.insert(atoms);
        seen.len() < cap
    });

    return seen.len();
}
