//! Bank name to sort code lookup.
//!
//! A [`BankCodeTable`] is built once at startup (the built-in Nigerian table, or
//! a substitute loaded from JSON) and handed to the transformer by reference.
//! It is never mutated afterwards.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{BankCodeError, BankCodeResult};

/// Length of a sort code.
pub const CODE_LEN: usize = 6;

/// Built-in table. Several banks appear under more than one name.
const DEFAULT_CODES: &[(&str, &str)] = &[
    ("ACCESS BANK", "000014"),
    ("ACCESS BANK PLC (DIAMOND)", "000005"),
    ("ECO BANK", "000010"),
    ("ECOBANK", "000010"),
    ("FCMB", "000003"),
    ("FIDELITY BANK", "000007"),
    ("FIRST BANK OF NIGERIA", "000016"),
    ("FIRST CITY MONUMENT BANK", "000003"),
    ("GTBANK PLC", "000013"),
    ("GTBANK", "000013"),
    ("HERITAGE BANK", "000020"),
    ("JAIZ BANK", "000006"),
    ("KEYSTONE BANK", "000002"),
    ("POLARIS BANK", "000008"),
    ("PROVIDUS BANK", "000023"),
    ("STANBICIBTC BANK", "000012"),
    ("STANDARDCHARTERED", "000021"),
    ("STERLING BANK", "000001"),
    ("UNION BANK", "000018"),
    ("UNITED BANK FOR AFRICA", "000004"),
    ("UBA", "000004"),
    ("UNITY BANK", "000011"),
    ("WEMA BANK", "000017"),
    ("ZENITH BANK", "000015"),
];

/// Immutable mapping from uppercased bank name to a 6-digit sort code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BankCodeTable {
    codes: BTreeMap<String, String>,
}

impl BankCodeTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        let codes = DEFAULT_CODES
            .iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect();
        Self { codes }
    }

    /// Build a table from `(bank name, code)` pairs.
    ///
    /// Names are uppercased; every code must be exactly six ASCII digits.
    pub fn from_entries<I, K, V>(entries: I) -> BankCodeResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut codes = BTreeMap::new();
        for (name, code) in entries {
            let name = name.as_ref().trim().to_uppercase();
            let code = code.as_ref().trim();
            if !is_sort_code(code) {
                return Err(BankCodeError::InvalidCode {
                    bank: name,
                    code: code.to_string(),
                });
            }
            codes.insert(name, code.to_string());
        }
        Ok(Self { codes })
    }

    /// Parse a JSON object of `"BANK NAME": "000014"` pairs.
    pub fn from_json_str(json: &str) -> BankCodeResult<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load a JSON table from disk.
    pub fn load(path: impl AsRef<Path>) -> BankCodeResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Sort code for a bank name, compared case-insensitively.
    ///
    /// A miss is not an error: the caller decides what an absent code means.
    pub fn lookup(&self, bank_name: &str) -> Option<&str> {
        self.codes.get(&bank_name.to_uppercase()).map(String::as_str)
    }

    /// Number of names (synonyms count separately).
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for BankCodeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_sort_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
