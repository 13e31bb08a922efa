//! SMILES parser
//!
//! Covers the organic subset, bracket atoms (isotope, chirality, hydrogen count, charge, atom
//! class), branches, ring closures including `%nn`, explicit bond symbols, `.` fragments and the
//! `*` wildcard. Kekulé six-membered rings of carbon and nitrogen, and five-membered rings with
//! one O, S or N lone-pair donor, are perceived as aromatic so `C1=CC=CC=C1` and `c1ccccc1` parse
//! to the same graph. Plain `[H]` atoms are folded into their neighbour's hydrogen count and
//! chirality tags are rewritten against the parsed neighbour order.

use std::collections::BTreeMap;

use crate::chem::element;
use crate::chem::molecule::{odd_permutation, Atom, Bond, BondOrder, Chirality, Molecule, StereoSlot};
use crate::error::{Error, Result};

pub fn parse_smiles(smiles: &str) -> Result<Molecule> {

    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(Error::Parse("empty SMILES".to_string()));
    }

    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.check_closed()?;
    parser.merge_explicit_hydrogens();

    let mut mol = Molecule::new(parser.atoms, parser.bonds);

    normalize_chirality(&mut mol, &parser.written, &parser.from);
    demote_chain_aromatic_bonds(&mut mol);
    assign_implicit_hydrogens(&mut mol);
    perceive_kekule_rings(&mut mol);

    return Ok(mol);
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    //ring number -> (opening atom, bond written at the opening, slot in the opening atom's order)
    ring_closures: BTreeMap<u16, (usize, Option<BondOrder>, usize)>,
    //neighbours of each atom in the order written, which is what a chirality tag refers to
    written: Vec<Vec<StereoSlot>>,
    //whether the atom was bonded to a preceding atom
    from: Vec<bool>,
    branches: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> SmilesParser<'a> {

    fn new(input: &'a str) -> Self {

        return Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            ring_closures: BTreeMap::new(),
            written: Vec::new(),
            from: Vec::new(),
            branches: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        };
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {

        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        return ch;
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse(format!("{} at position {}", message, self.pos))
    }

    fn parse(&mut self) -> Result<()> {

        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    self.advance();
                    match self.prev_atom {
                        Some(prev) => self.branches.push(prev),
                        None => return Err(self.error("branch without preceding atom")),
                    }
                },
                b')' => {
                    self.advance();
                    match self.branches.pop() {
                        Some(prev) => self.prev_atom = Some(prev),
                        None => return Err(self.error("unmatched ')'")),
                    }
                    self.pending_bond = None;
                },
                b'-' | b'/' | b'\\' => self.bond_symbol(BondOrder::Single)?,
                b'=' => self.bond_symbol(BondOrder::Double)?,
                b'#' => self.bond_symbol(BondOrder::Triple)?,
                b':' => self.bond_symbol(BondOrder::Aromatic)?,
                b'.' => {
                    self.advance();
                    self.prev_atom = None;
                    self.pending_bond = None;
                },
                b'%' => {
                    self.advance();
                    let ring_number = self.two_digit_ring_number()?;
                    self.ring_closure(ring_number)?;
                },
                b'0'..=b'9' => {
                    self.advance();
                    self.ring_closure((ch - b'0') as u16)?;
                },
                b'[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom);
                },
                _ => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom);
                },
            }
        }

        return Ok(());
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<()> {

        if self.pending_bond.is_some() {
            return Err(self.error("two bond symbols in a row"));
        }

        self.advance();
        self.pending_bond = Some(order);

        return Ok(());
    }

    fn organic_atom(&mut self) -> Result<Atom> {

        let start = self.pos;
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Err(self.error("unexpected end of input")),
        };

        let atom = match ch {
            b'*' => Atom::new(element::WILDCARD, false),
            b'B' if self.peek() == Some(b'r') => { self.advance(); Atom::new(35, false) },
            b'C' if self.peek() == Some(b'l') => { self.advance(); Atom::new(17, false) },
            b'B' => Atom::new(5, false),
            b'C' => Atom::new(6, false),
            b'N' => Atom::new(7, false),
            b'O' => Atom::new(8, false),
            b'P' => Atom::new(15, false),
            b'S' => Atom::new(16, false),
            b'F' => Atom::new(9, false),
            b'I' => Atom::new(53, false),
            b'b' => Atom::new(5, true),
            b'c' => Atom::new(6, true),
            b'n' => Atom::new(7, true),
            b'o' => Atom::new(8, true),
            b'p' => Atom::new(15, true),
            b's' => Atom::new(16, true),
            _ => {
                self.pos = start;
                return Err(self.error(&format!("unexpected character '{}'", ch as char)));
            },
        };

        return Ok(atom);
    }

    fn bracket_atom(&mut self) -> Result<Atom> {

        self.advance();

        let isotope = self.number().map(|n| n as u16);

        let first = match self.advance() {
            Some(ch) => ch,
            None => return Err(self.error("unterminated bracket atom")),
        };

        let (atomic_number, is_aromatic) = match first {
            b'*' => (element::WILDCARD, false),
            ch if ch.is_ascii_uppercase() => {
                //two-letter symbols win when they exist, so Cl is chlorine and not C + l
                let one = (ch as char).to_string();
                let two = self.peek()
                    .filter(|n| n.is_ascii_lowercase())
                    .map(|n| format!("{}{}", ch as char, n as char));

                match two.as_deref().and_then(element::atomic_number) {
                    Some(n) => { self.advance(); (n, false) },
                    None => match element::atomic_number(&one) {
                        Some(n) => (n, false),
                        None => return Err(self.error(&format!("unknown element '{}'", one))),
                    },
                }
            },
            ch if ch.is_ascii_lowercase() => {
                let upper = (ch as char).to_ascii_uppercase();
                let two = self.peek()
                    .filter(|n| n.is_ascii_lowercase())
                    .map(|n| format!("{}{}", upper, n as char));

                let aromatic_two = two.filter(|s| matches!(s.as_str(), "Se" | "As" | "Te"));

                match aromatic_two {
                    Some(symbol) => {
                        self.advance();
                        (element::atomic_number(&symbol).unwrap_or(0), true)
                    },
                    _ => match upper {
                        'B' | 'C' | 'N' | 'O' | 'P' | 'S' => {
                            (element::atomic_number(&upper.to_string()).unwrap_or(0), true)
                        },
                        _ => return Err(self.error(&format!("'{}' cannot be aromatic", ch as char))),
                    },
                }
            },
            ch => return Err(self.error(&format!("unexpected character '{}' in bracket atom", ch as char))),
        };

        let mut atom = Atom::new(atomic_number, is_aromatic);
        atom.bracket = true;
        atom.isotope = isotope;

        if self.peek() == Some(b'@') {
            self.advance();
            atom.chirality = Chirality::CounterClockwise;
            if self.peek() == Some(b'@') {
                self.advance();
                atom.chirality = Chirality::Clockwise;
            }
        }

        if self.peek() == Some(b'H') {
            self.advance();
            atom.hydrogens = self.number().map(|n| n as u8).unwrap_or(1);
        }

        atom.formal_charge = self.charge();

        if self.peek() == Some(b':') {
            self.advance();
            if self.number().is_none() {
                return Err(self.error("expected atom class after ':'"));
            }
        }

        match self.advance() {
            Some(b']') => Ok(atom),
            _ => Err(self.error("expected ']'")),
        }
    }

    fn charge(&mut self) -> i8 {

        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return 0,
        };
        let symbol = self.advance();

        if let Some(n) = self.number() {
            return sign * n.min(15) as i8;
        }

        let mut count: i8 = 1;
        while self.peek() == symbol && count < 15 {
            self.advance();
            count += 1;
        }

        return sign * count;
    }

    fn number(&mut self) -> Option<u32> {

        let mut found = false;
        let mut n: u32 = 0;
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.advance();
            n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
            found = true;
        }

        match found {
            true => Some(n),
            false => None,
        }
    }

    fn two_digit_ring_number(&mut self) -> Result<u16> {

        let d1 = self.advance();
        let d2 = self.advance();

        match (d1, d2) {
            (Some(a), Some(b)) if a.is_ascii_digit() && b.is_ascii_digit() => {
                Ok((a - b'0') as u16 * 10 + (b - b'0') as u16)
            },
            _ => Err(self.error("expected two digits after '%'")),
        }
    }

    fn ring_closure(&mut self, ring_number: u16) -> Result<()> {

        let current = match self.prev_atom {
            Some(atom) => atom,
            None => return Err(self.error("ring closure without preceding atom")),
        };

        match self.ring_closures.remove(&ring_number) {
            Some((open_atom, open_bond, slot)) => {
                if open_atom == current || self.bond_exists(open_atom, current) {
                    return Err(self.error("ring closure onto an already bonded atom"));
                }
                let order = match self.pending_bond.take().or(open_bond) {
                    Some(order) => order,
                    None => self.implicit_order(open_atom, current),
                };
                self.bonds.push(Bond { atom1: open_atom, atom2: current, order });
                self.written[open_atom][slot] = StereoSlot::Atom(current);
                self.written[current].push(StereoSlot::Atom(open_atom));
            },
            None => {
                let bond = self.pending_bond.take();
                //placeholder until the ring closes
                let slot = self.written[current].len();
                self.written[current].push(StereoSlot::Vacant);
                self.ring_closures.insert(ring_number, (current, bond, slot));
            },
        }

        return Ok(());
    }

    fn bond_exists(&self, a1: usize, a2: usize) -> bool {

        return self.bonds.iter().any(|b| {
            (b.atom1 == a1 && b.atom2 == a2) || (b.atom1 == a2 && b.atom2 == a1)
        });
    }

    fn implicit_order(&self, a1: usize, a2: usize) -> BondOrder {

        match self.atoms[a1].is_aromatic && self.atoms[a2].is_aromatic {
            true => BondOrder::Aromatic,
            false => BondOrder::Single,
        }
    }

    fn push_atom(&mut self, atom: Atom) {

        let idx = self.atoms.len();
        let implicit_h = atom.chirality != Chirality::None && atom.hydrogens == 1;
        self.atoms.push(atom);
        self.written.push(Vec::new());
        self.from.push(self.prev_atom.is_some());

        if let Some(prev) = self.prev_atom {
            let order = match self.pending_bond.take() {
                Some(order) => order,
                None => self.implicit_order(prev, idx),
            };
            self.bonds.push(Bond { atom1: prev, atom2: idx, order });
            self.written[prev].push(StereoSlot::Atom(idx));
            self.written[idx].push(StereoSlot::Atom(prev));
        }

        //a bracket hydrogen sits right after the preceding atom
        if implicit_h {
            self.written[idx].push(StereoSlot::Hydrogen);
        }

        self.pending_bond = None;
        self.prev_atom = Some(idx);
    }

    fn check_closed(&self) -> Result<()> {

        if let Some(open) = self.ring_closures.keys().next() {
            return Err(Error::Parse(format!("unclosed ring {}", open)));
        }

        if !self.branches.is_empty() {
            return Err(Error::Parse(format!("{} unclosed branch(es)", self.branches.len())));
        }

        if self.pending_bond.is_some() {
            return Err(Error::Parse("bond symbol without a following atom".to_string()));
        }

        return Ok(());
    }

    ///Folds neutral, unlabelled `[H]` atoms singly bonded to one heavy atom into that atom
    fn merge_explicit_hydrogens(&mut self) {

        let n = self.atoms.len();
        let mut removable = vec![false; n];

        for i in 0..n {
            let atom = &self.atoms[i];
            let plain = atom.atomic_number == 1
                && atom.bracket
                && atom.formal_charge == 0
                && atom.isotope.is_none()
                && atom.hydrogens == 0;
            if !plain {
                continue;
            }

            let bonds: Vec<&Bond> = self.bonds.iter().filter(|b| b.atom1 == i || b.atom2 == i).collect();
            removable[i] = bonds.len() == 1
                && bonds[0].order == BondOrder::Single
                && self.atoms[bonds[0].other(i)].atomic_number != 1;
        }

        if !removable.iter().any(|r| *r) {
            return;
        }

        //organic subset parents get their hydrogens from valence later
        for bond in &self.bonds {
            for (h, parent) in [(bond.atom1, bond.atom2), (bond.atom2, bond.atom1)] {
                if removable[h] && self.atoms[parent].bracket {
                    self.atoms[parent].hydrogens = self.atoms[parent].hydrogens.saturating_add(1);
                }
            }
        }

        let mut remap: Vec<Option<usize>> = vec![None; n];
        let mut next = 0;
        for i in 0..n {
            if !removable[i] {
                remap[i] = Some(next);
                next += 1;
            }
        }

        self.bonds = std::mem::take(&mut self.bonds)
            .into_iter()
            .filter_map(|b| Some(Bond { atom1: remap[b.atom1]?, atom2: remap[b.atom2]?, order: b.order }))
            .collect();

        let atoms = std::mem::take(&mut self.atoms);
        let written = std::mem::take(&mut self.written);
        let from = std::mem::take(&mut self.from);

        for (i, ((atom, order), from)) in atoms.into_iter().zip(written).zip(from).enumerate() {
            if removable[i] {
                continue;
            }
            let order = order
                .into_iter()
                .map(|slot| match slot {
                    StereoSlot::Atom(a) => match remap[a] {
                        Some(a) => StereoSlot::Atom(a),
                        None => StereoSlot::Hydrogen,
                    },
                    other => other,
                })
                .collect();

            self.atoms.push(atom);
            self.written.push(order);
            self.from.push(from);
        }
    }
}

/// Rewrites every chirality tag against [`Molecule::stereo_neighbors`].
///
/// The free position of a three-coordinate centre counts as written right after the preceding
/// atom. Tags on atoms that are not tetrahedral centres are dropped.
fn normalize_chirality(mol: &mut Molecule, written: &[Vec<StereoSlot>], from: &[bool]) {

    for i in 0..mol.atom_count() {

        let tag = mol.atoms[i].chirality;
        if tag == Chirality::None {
            continue;
        }

        let mut order = written[i].clone();
        if order.len() == 3 {
            order.insert(from[i] as usize, StereoSlot::Vacant);
        }

        let reference = mol.stereo_neighbors(i);
        let odd = match reference.len() == 4 {
            true => odd_permutation(&order, &reference),
            false => None,
        };

        mol.atoms[i].chirality = match odd {
            Some(odd) => tag.permuted(odd),
            None => Chirality::None,
        };
    }
}

///Two aromatic atoms written next to each other outside a ring are joined by a single bond
fn demote_chain_aromatic_bonds(mol: &mut Molecule) {

    for (i, bond) in mol.bonds.iter_mut().enumerate() {
        if bond.order == BondOrder::Aromatic && !mol.ring_bonds[i] {
            bond.order = BondOrder::Single;
        }
    }
}

fn assign_implicit_hydrogens(mol: &mut Molecule) {

    for i in 0..mol.atom_count() {

        let atom = &mol.atoms[i];
        if atom.bracket || atom.is_wildcard() {
            continue;
        }

        let valences = element::default_valences(atom.atomic_number);
        if valences.is_empty() {
            continue;
        }

        let mut used: u32 = 0;
        for (_, b) in &mol.adjacency[i] {
            used += match mol.bonds[*b].order {
                BondOrder::Single | BondOrder::Aromatic => 1,
                BondOrder::Double => 2,
                BondOrder::Triple => 3,
            };
        }

        //aromatic c, n, p and b give one electron to the ring, o and s give a lone pair
        if atom.is_aromatic {
            if matches!(atom.atomic_number, 8 | 16) {
                continue;
            }
            used += 1;
        }

        let hydrogens = match valences.iter().find(|v| **v as u32 >= used) {
            Some(v) => *v as u32 - used,
            None => 0,
        };

        mol.atoms[i].hydrogens = hydrogens as u8;
    }
}

///Marks Kekulé rings as aromatic.
///
///A six-membered C/N ring needs a ring double bond on every atom. A five-membered ring needs one
///neutral O, S or N without a double bond as the lone-pair donor and a ring double bond on each of
///the other four atoms. Repeated until stable so fused rings written in Kekulé form are picked up
///once a neighbour ring has been converted.
fn perceive_kekule_rings(mol: &mut Molecule) {

    let rings = mol.rings.clone();
    let mut changed = true;

    while changed {
        changed = false;

        for ring in rings.iter().filter(|r| r.len() == 5 || r.len() == 6) {

            if ring.iter().all(|a| mol.atoms[*a].is_aromatic) {
                continue;
            }

            let ring_bond_indices: Vec<usize> = (0..ring.len())
                .filter_map(|k| {
                    let a1 = ring[k];
                    let a2 = ring[(k + 1) % ring.len()];
                    mol.adjacency[a1].iter().find(|(n, _)| *n == a2).map(|(_, b)| *b)
                })
                .collect();

            if ring_bond_indices.len() != ring.len() {
                continue;
            }

            let donors: Vec<usize> = match ring.len() {
                5 => ring.iter().copied().filter(|a| is_lone_pair_donor(mol, *a)).collect(),
                _ => Vec::new(),
            };
            if ring.len() == 5 && donors.len() != 1 {
                continue;
            }

            let eligible = ring.iter().all(|a| {
                let atom = &mol.atoms[*a];
                donors.contains(a) || (matches!(atom.atomic_number, 6 | 7) && atom.formal_charge == 0)
            });
            if !eligible {
                continue;
            }

            let conjugated = ring.iter().all(|a| {
                if mol.atoms[*a].is_aromatic || donors.contains(a) {
                    return true;
                }
                let doubles: Vec<usize> = mol.adjacency[*a]
                    .iter()
                    .filter(|(_, b)| mol.bonds[*b].order == BondOrder::Double)
                    .map(|(_, b)| *b)
                    .collect();
                doubles.len() == 1 && ring_bond_indices.contains(&doubles[0])
            });

            if !conjugated {
                continue;
            }

            for a in ring {
                mol.atoms[*a].is_aromatic = true;
            }
            for b in &ring_bond_indices {
                mol.bonds[*b].order = BondOrder::Aromatic;
            }
            changed = true;
        }
    }
}

///Neutral O, S or N with only single bonds, as in furan, thiophene and pyrrole
fn is_lone_pair_donor(mol: &Molecule, atom: usize) -> bool {

    let a = &mol.atoms[atom];
    if a.is_aromatic || a.formal_charge != 0 {
        return false;
    }

    let single_only = mol.adjacency[atom].iter().all(|(_, b)| mol.bonds[*b].order == BondOrder::Single);

    return match a.atomic_number {
        8 | 16 => single_only && mol.degree(atom) == 2,
        7 => single_only && mol.degree(atom) + a.hydrogens as usize == 3,
        _ => false,
    };
}
