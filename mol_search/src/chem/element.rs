//! Element symbols and the default valences of the SMILES organic subset.

/// Symbols indexed by atomic number, with `*` standing in for the wildcard atom 0.
static SYMBOLS: [&str; 87] = [
    "*",
    "H", "He",
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe",
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy",
    "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt",
    "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
];

pub const WILDCARD: u8 = 0;

pub fn atomic_number(symbol: &str) -> Option<u8> {

    return SYMBOLS.iter().position(|s| *s == symbol).map(|n| n as u8);
}

pub fn symbol(atomic_number: u8) -> Option<&'static str> {

    return SYMBOLS.get(atomic_number as usize).copied();
}

///Allowed valences for atoms written without brackets, lowest first
pub fn default_valences(atomic_number: u8) -> &'static [u8] {

    match atomic_number {
        5 => &[3],
        6 => &[4],
        7 => &[3, 5],
        8 => &[2],
        15 => &[3, 5],
        16 => &[2, 4, 6],
        9 | 17 | 35 | 53 => &[1],
        _ => &[],
    }
}

pub fn is_halogen(atomic_number: u8) -> bool {

    return matches!(atomic_number, 9 | 17 | 35 | 53);
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn symbol_lookup_round_trips() {

        assert_eq!(atomic_number("C"), Some(6));
        assert_eq!(atomic_number("Cl"), Some(17));
        assert_eq!(atomic_number("Pt"), Some(78));
        assert_eq!(symbol(8), Some("O"));
        assert_eq!(atomic_number("Zz"), None);
        assert_eq!(atomic_number("*"), Some(WILDCARD));
    }

    #[test]
    fn organic_subset_valences() {

        assert_eq!(default_valences(7), &[3, 5]);
        assert!(default_valences(26).is_empty());
    }
}
