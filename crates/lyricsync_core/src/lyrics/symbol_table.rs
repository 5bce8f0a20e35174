//! Shorthand symbol table.
//!
//! # Responsibility
//! - Resolve a 1-2 character shorthand group to an element descriptor.
//! - Own the single canonical alias table for the process.
//!
//! # Invariants
//! - Lookup is exact and case-sensitive on the authored key.
//! - Keys have the shape `[A-Z][a-z]?`; atomic numbers are positive.
//! - Aliases map to whatever descriptor they were authored with, even when
//!   that is not the chemically matching element.
//! - Tables are read-only after construction.

use crate::model::element::ElementDescriptor;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version of the canonical alias table.
///
/// Version 1 was the compact script table; version 2 is the union with the
/// expanded table (the two agree on every shared key).
pub const SYMBOL_TABLE_VERSION: u32 = 2;

/// `(key, symbol, name, atomic_number)`
const CANONICAL_ENTRIES: &[(&str, &str, &str, u32)] = &[
    // Standard symbols.
    ("H", "H", "Hydrogen", 1),
    ("He", "He", "Helium", 2),
    ("Li", "Li", "Lithium", 3),
    ("Be", "Be", "Beryllium", 4),
    ("B", "B", "Boron", 5),
    ("C", "C", "Carbon", 6),
    ("N", "N", "Nitrogen", 7),
    ("O", "O", "Oxygen", 8),
    ("F", "F", "Fluorine", 9),
    ("Ne", "Ne", "Neon", 10),
    ("Na", "Na", "Sodium", 11),
    ("Mg", "Mg", "Magnesium", 12),
    ("Al", "Al", "Aluminum", 13),
    ("Si", "Si", "Silicon", 14),
    ("P", "P", "Phosphorus", 15),
    ("S", "S", "Sulfur", 16),
    ("Cl", "Cl", "Chlorine", 17),
    ("Ar", "Ar", "Argon", 18),
    ("K", "K", "Potassium", 19),
    ("Ca", "Ca", "Calcium", 20),
    ("Ti", "Ti", "Titanium", 22),
    ("V", "V", "Vanadium", 23),
    ("Cr", "Cr", "Chromium", 24),
    ("Mn", "Mn", "Manganese", 25),
    ("Fe", "Fe", "Iron", 26),
    ("Co", "Co", "Cobalt", 27),
    ("Ni", "Ni", "Nickel", 28),
    ("Cu", "Cu", "Copper", 29),
    ("Zn", "Zn", "Zinc", 30),
    ("Ga", "Ga", "Gallium", 31),
    ("Ge", "Ge", "Germanium", 32),
    ("As", "As", "Arsenic", 33),
    ("Se", "Se", "Selenium", 34),
    ("Br", "Br", "Bromine", 35),
    ("Kr", "Kr", "Krypton", 36),
    ("Y", "Y", "Yttrium", 39),
    ("Zr", "Zr", "Zirconium", 40),
    ("Mo", "Mo", "Molybdenum", 42),
    ("Ag", "Ag", "Silver", 47),
    ("In", "In", "Indium", 49),
    ("Sn", "Sn", "Tin", 50),
    ("I", "I", "Iodine", 53),
    ("Ba", "Ba", "Barium", 56),
    ("La", "La", "Lanthanum", 57),
    ("Nd", "Nd", "Neodymium", 60),
    ("Eu", "Eu", "Europium", 63),
    ("Dy", "Dy", "Dysprosium", 66),
    ("Ho", "Ho", "Holmium", 67),
    ("Er", "Er", "Erbium", 68),
    ("Lu", "Lu", "Lutetium", 71),
    ("W", "W", "Tungsten", 74),
    ("Re", "Re", "Rhenium", 75),
    ("Os", "Os", "Osmium", 76),
    ("Pt", "Pt", "Platinum", 78),
    ("Au", "Au", "Gold", 79),
    ("Pb", "Pb", "Lead", 82),
    ("Bi", "Bi", "Bismuth", 83),
    ("At", "At", "Astatine", 85),
    ("Rn", "Rn", "Radon", 86),
    ("Ra", "Ra", "Radium", 88),
    ("Th", "Th", "Thorium", 90),
    ("Pa", "Pa", "Protactinium", 91),
    ("U", "U", "Uranium", 92),
    ("Bh", "Bh", "Bohrium", 107),
    ("Ds", "Ds", "Darmstadtium", 110),
    ("Es", "Es", "Einsteinium", 99),
    ("Md", "Md", "Mendelevium", 101),
    ("No", "No", "Nobelium", 102),
    ("Te", "Te", "Tellurium", 52),
    ("Ta", "Ta", "Tantalum", 73),
    ("Am", "Am", "Americium", 95),
    ("Ir", "Ir", "Iridium", 77),
    // Authoring aliases.
    ("Kh", "Kr", "Krypton", 36),
    ("Ph", "P", "Phosphorus", 15),
    ("De", "Ds", "Darmstadtium", 110),
    ("So", "S", "Sulfur", 16),
    ("Ro", "Rn", "Radon", 86),
    ("Jo", "Y", "Yttrium", 39),
    ("Di", "Dy", "Dysprosium", 66),
    ("To", "Th", "Thorium", 90),
    ("Je", "Ge", "Germanium", 32),
    ("Sa", "S", "Sulfur", 16),
    ("Ma", "Mg", "Magnesium", 12),
    ("Ka", "K", "Potassium", 19),
    ("Wa", "W", "Tungsten", 74),
    ("Ha", "H", "Hydrogen", 1),
    ("Su", "S", "Sulfur", 16),
    ("Gu", "Ga", "Gallium", 31),
    ("Mu", "Mo", "Molybdenum", 42),
    ("Tu", "Te", "Tellurium", 52),
    ("Ri", "Re", "Rheium", 75),
    ("Mi", "Md", "Mendelevium", 101),
    ("Ki", "K", "Potassium", 19),
    ("Ya", "Y", "Yttrium", 39),
    ("Ul", "U", "Uranium", 92),
    ("Hi", "I", "Iodine", 53),
    ("Yo", "Y", "Yttrium", 39),
    ("Yu", "Y", "Yttrium", 39),
    ("Ku", "K", "Potassium", 19),
    ("Me", "Md", "Mendelevium", 101),
    ("Wo", "W", "Tungsten", 74),
    ("Wh", "W", "Tungsten", 74),
    ("J", "Y", "Yttrium", 39),
    ("E", "Es", "Einsteinium", 99),
];

static CANONICAL: Lazy<SymbolTable> = Lazy::new(|| SymbolTable {
    version: SYMBOL_TABLE_VERSION,
    entries: CANONICAL_ENTRIES
        .iter()
        .map(|(key, symbol, name, number)| {
            (
                (*key).to_string(),
                ElementDescriptor::new(*symbol, *name, *number),
            )
        })
        .collect(),
});

/// Errors raised while building a custom table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolTableError {
    /// Key is not one uppercase letter optionally followed by one lowercase letter.
    InvalidKey(String),
    DuplicateKey(String),
    /// Atomic number must be a positive integer.
    InvalidAtomicNumber { key: String, atomic_number: u32 },
}

impl Display for SymbolTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => {
                write!(f, "symbol key `{key}` must match [A-Z][a-z]?")
            }
            Self::DuplicateKey(key) => write!(f, "symbol key `{key}` is declared twice"),
            Self::InvalidAtomicNumber { key, atomic_number } => write!(
                f,
                "symbol key `{key}` has non-positive atomic number {atomic_number}"
            ),
        }
    }
}

impl Error for SymbolTableError {}

/// Read-only mapping from shorthand keys to element descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    version: u32,
    entries: HashMap<String, ElementDescriptor>,
}

impl SymbolTable {
    /// Returns the process-wide canonical table.
    ///
    /// Built on first use; every caller shares the same instance.
    pub fn canonical() -> &'static SymbolTable {
        &CANONICAL
    }

    /// Builds a custom table from `(key, descriptor)` pairs.
    ///
    /// # Errors
    /// - `InvalidKey` for keys outside `[A-Z][a-z]?`.
    /// - `DuplicateKey` when a key appears twice.
    /// - `InvalidAtomicNumber` for a zero atomic number.
    pub fn from_entries<I, K>(version: u32, entries: I) -> Result<Self, SymbolTableError>
    where
        I: IntoIterator<Item = (K, ElementDescriptor)>,
        K: Into<String>,
    {
        let mut map = HashMap::new();
        for (key, descriptor) in entries {
            let key = key.into();
            if !is_valid_key(&key) {
                return Err(SymbolTableError::InvalidKey(key));
            }
            if descriptor.atomic_number == 0 {
                return Err(SymbolTableError::InvalidAtomicNumber {
                    key,
                    atomic_number: descriptor.atomic_number,
                });
            }
            if map.contains_key(&key) {
                return Err(SymbolTableError::DuplicateKey(key));
            }
            map.insert(key, descriptor);
        }

        Ok(Self {
            version,
            entries: map,
        })
    }

    /// Resolves one shorthand group; `None` is a lookup miss, not an error.
    pub fn lookup(&self, group: &str) -> Option<&ElementDescriptor> {
        self.entries.get(group)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.entries.contains_key(group)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries
            .keys()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), None, None) => first.is_ascii_uppercase(),
        (Some(first), Some(second), None) => {
            first.is_ascii_uppercase() && second.is_ascii_lowercase()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_key, SymbolTable, SymbolTableError, CANONICAL_ENTRIES};
    use crate::model::element::ElementDescriptor;

    #[test]
    fn canonical_table_has_no_duplicate_keys() {
        assert_eq!(SymbolTable::canonical().len(), CANONICAL_ENTRIES.len());
    }

    #[test]
    fn canonical_keys_are_well_formed_with_positive_numbers() {
        let table = SymbolTable::canonical();
        for key in table.keys() {
            assert!(is_valid_key(key), "bad key {key}");
            let descriptor = table.lookup(key).unwrap();
            assert!(descriptor.atomic_number > 0, "bad number for {key}");
        }
    }

    #[test]
    fn aliases_resolve_to_authored_descriptor() {
        let table = SymbolTable::canonical();
        for key in ["K", "Ka", "Ki", "Ku"] {
            let descriptor = table.lookup(key).unwrap();
            assert_eq!(descriptor.name, "Potassium");
            assert_eq!(descriptor.symbol, "K");
        }
        assert_eq!(table.lookup("Kh").unwrap().symbol, "Kr");
        assert_eq!(table.lookup("Ri").unwrap().name, "Rheium");
        assert_eq!(table.lookup("J").unwrap().symbol, "Y");
        assert_eq!(table.lookup("E").unwrap().symbol, "Es");
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let table = SymbolTable::canonical();
        assert!(table.contains("Zn"));
        assert!(!table.contains("zn"));
        assert!(!table.contains("ZN"));
        assert!(!table.contains("Xy"));
    }

    #[test]
    fn repeated_lookups_return_same_descriptor() {
        let first = SymbolTable::canonical().lookup("U").cloned();
        let second = SymbolTable::canonical().lookup("U").cloned();
        assert_eq!(first, second);
        assert_eq!(first, Some(ElementDescriptor::new("U", "Uranium", 92)));
    }

    #[test]
    fn from_entries_rejects_bad_keys_duplicates_and_zero_numbers() {
        let err = SymbolTable::from_entries(1, [("zn", ElementDescriptor::new("Zn", "Zinc", 30))])
            .unwrap_err();
        assert_eq!(err, SymbolTableError::InvalidKey("zn".to_string()));

        let err = SymbolTable::from_entries(
            1,
            [
                ("Zn", ElementDescriptor::new("Zn", "Zinc", 30)),
                ("Zn", ElementDescriptor::new("Zn", "Zinc", 30)),
            ],
        )
        .unwrap_err();
        assert_eq!(err, SymbolTableError::DuplicateKey("Zn".to_string()));

        let err = SymbolTable::from_entries(1, [("Q", ElementDescriptor::new("Q", "Nothing", 0))])
            .unwrap_err();
        assert!(matches!(err, SymbolTableError::InvalidAtomicNumber { .. }));
    }
}
