//! Ring perception
//!
//! Ring bonds are the bonds whose removal keeps their two atoms connected. The ring set is built
//! from the shortest cycle through each ring bond and trimmed to the cyclomatic number, which is
//! the usual SSSR approximation.

use std::collections::VecDeque;

use crate::chem::molecule::Molecule;

pub fn ring_bonds(mol: &Molecule) -> Vec<bool> {

    return (0..mol.bonds.len())
        .map(|b| shortest_path_without(mol, b).is_some())
        .collect();
}

///Expects `mol.ring_bonds` to be current
pub fn smallest_rings(mol: &Molecule) -> Vec<Vec<usize>> {

    let components = mol.fragment_count() as isize;
    let expected = mol.bond_count() as isize - mol.atom_count() as isize + components;

    if expected <= 0 {
        return Vec::new();
    }

    let mut rings: Vec<Vec<usize>> = Vec::new();

    for (b, in_ring) in mol.ring_bonds.iter().enumerate() {
        if !in_ring {
            continue;
        }

        if let Some(mut ring) = shortest_path_without(mol, b) {
            normalize(&mut ring);
            if !rings.contains(&ring) {
                rings.push(ring);
            }
        }
    }

    //stable, so equal-sized rings keep bond order
    rings.sort_by_key(|r| r.len());
    rings.truncate(expected as usize);

    return rings;
}

///Atoms on the shortest path between the ends of `bond` that does not use `bond` itself
fn shortest_path_without(mol: &Molecule, bond: usize) -> Option<Vec<usize>> {

    let start = mol.bonds[bond].atom1;
    let goal = mol.bonds[bond].atom2;

    let mut parent: Vec<Option<usize>> = vec![None; mol.atom_count()];
    let mut seen = vec![false; mol.atom_count()];
    let mut queue = VecDeque::new();

    seen[start] = true;
    queue.push_back(start);

    while let Some(curr) = queue.pop_front() {
        if curr == goal {
            let mut path = vec![goal];
            let mut node = goal;
            while let Some(p) = parent[node] {
                path.push(p);
                node = p;
            }
            return Some(path);
        }

        for (next, b) in &mol.adjacency[curr] {
            if *b == bond || seen[*next] {
                continue;
            }
            seen[*next] = true;
            parent[*next] = Some(curr);
            queue.push_back(*next);
        }
    }

    return None;
}

///Rotate to start at the smallest atom index and pick the direction with the smaller second atom
fn normalize(ring: &mut Vec<usize>) {

    let Some(min_pos) = ring.iter().enumerate().min_by_key(|(_, a)| **a).map(|(i, _)| i) else {
        return;
    };
    ring.rotate_left(min_pos);

    if ring.len() > 2 && ring[ring.len() - 1] < ring[1] {
        ring[1..].reverse();
    }
}
