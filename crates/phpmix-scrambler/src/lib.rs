//! A family of deterministic, reversible string→string renaming maps, one per
//! identifier category, with rejection-sampled fresh-name generation and
//! JSON persistence.

mod category;
mod error;
mod reserved;

pub use category::{Category, Mode};
pub use error::ScramblerError;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::Path;

const IDENT_START: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const IDENT_CONTINUE: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";
const HEX_DIGITS: &[u8] = b"0123456789abcdef";
const DIGITS: &[u8] = b"0123456789";

#[derive(Debug, Clone)]
pub struct Scrambler {
    category: Category,
    length: usize,
    mode: Mode,
    ignore_set: HashSet<String>,
    reserved_set: HashSet<String>,
    forward: HashMap<String, String>,
    inverse: HashMap<String, String>,
    counter: u64,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedScrambler {
    category: Category,
    counter: u64,
    forward: HashMap<String, String>,
}

impl Scrambler {
    pub fn new(category: Category, length: usize, mode: Mode, ignore_set: HashSet<String>, reserved_set: HashSet<String>) -> Self {
        let length = length.clamp(3, 32);
        Self { category, length, mode, ignore_set, reserved_set, forward: HashMap::new(), inverse: HashMap::new(), counter: 0 }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// True if `name` must never be inserted into the forward map: either it's on the
    /// user-configured ignore list for this category, or it's one of the fixed,
    /// non-configurable always-ignored names.
    pub fn should_ignore(&self, name: &str) -> bool {
        self.ignore_set.contains(name)
            || reserved::is_magic_name(name)
            || (self.category == Category::Variable && reserved::is_superglobal(name))
    }

    /// Idempotent: repeated calls with the same `original` return the same scrambled
    /// name; ignored names pass through unchanged and are never recorded.
    pub fn scramble(&mut self, original: &str) -> String {
        if let Some(existing) = self.forward.get(original) {
            return existing.clone();
        }
        if self.should_ignore(original) {
            return original.to_string();
        }

        let mut rng = StdRng::seed_from_u64(seed_for(self.category, self.counter));
        let candidate = loop {
            let candidate = self.generate_candidate(&mut rng);
            if !self.inverse.contains_key(&candidate)
                && !self.reserved_set.contains(&candidate)
                && !reserved::is_reserved_word(&candidate)
            {
                break candidate;
            }
        };

        self.forward.insert(original.to_string(), candidate.clone());
        self.inverse.insert(candidate.clone(), original.to_string());
        self.counter += 1;
        candidate
    }

    pub fn unscramble(&self, scrambled: &str) -> Option<&str> {
        self.inverse.get(scrambled).map(String::as_str)
    }

    fn generate_candidate(&self, rng: &mut StdRng) -> String {
        match self.mode {
            Mode::Identifier => {
                let mut s = String::with_capacity(self.length);
                s.push(pick(rng, IDENT_START) as char);
                for _ in 1..self.length {
                    s.push(pick(rng, IDENT_CONTINUE) as char);
                }
                s
            }
            Mode::Hex => legalize(random_string(rng, HEX_DIGITS, self.length)),
            Mode::Numeric => legalize(random_string(rng, DIGITS, self.length)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ScramblerError> {
        let persisted = PersistedScrambler { category: self.category, counter: self.counter, forward: self.forward.clone() };
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| ScramblerError::Corrupt { path: path.to_path_buf(), message: e.to_string() })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ScramblerError::Io { path: parent.to_path_buf(), source })?;
        }
        std::fs::write(path, json).map_err(|source| ScramblerError::Io { path: path.to_path_buf(), source })
    }

    /// Missing file is a no-op; a corrupt file fails and leaves the scrambler untouched.
    pub fn load(&mut self, path: &Path) -> Result<(), ScramblerError> {
        if !path.exists() {
            return Ok(());
        }
        let contents =
            std::fs::read_to_string(path).map_err(|source| ScramblerError::Io { path: path.to_path_buf(), source })?;
        let persisted: PersistedScrambler = serde_json::from_str(&contents)
            .map_err(|e| ScramblerError::Corrupt { path: path.to_path_buf(), message: e.to_string() })?;

        self.counter = persisted.counter;
        self.inverse = persisted.forward.iter().map(|(k, v)| (v.clone(), k.clone())).collect();
        self.forward = persisted.forward;
        Ok(())
    }
}

fn seed_for(category: Category, counter: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    category.hash(&mut hasher);
    counter.hash(&mut hasher);
    hasher.finish()
}

fn pick(rng: &mut StdRng, alphabet: &[u8]) -> u8 {
    alphabet[rng.random_range(0..alphabet.len())]
}

fn random_string(rng: &mut StdRng, alphabet: &[u8], length: usize) -> String {
    (0..length).map(|_| pick(rng, alphabet) as char).collect()
}

/// `hex` and `numeric` candidates may start with a digit, which is not a legal PHP
/// identifier lead character; prefix with `_` when that happens.
fn legalize(mut candidate: String) -> String {
    if candidate.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        candidate.insert(0, '_');
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrambler(mode: Mode) -> Scrambler {
        Scrambler::new(Category::Variable, 8, mode, HashSet::new(), HashSet::new())
    }

    #[test]
    fn scramble_is_idempotent() {
        let mut s = scrambler(Mode::Identifier);
        let first = s.scramble("counter");
        let second = s.scramble("counter");
        assert_eq!(first, second);
    }

    #[test]
    fn scramble_is_reversible() {
        let mut s = scrambler(Mode::Identifier);
        let scrambled = s.scramble("counter");
        assert_ne!(scrambled, "counter");
        assert_eq!(s.unscramble(&scrambled), Some("counter"));
    }

    #[test]
    fn distinct_names_get_distinct_scrambles() {
        let mut s = scrambler(Mode::Identifier);
        let a = s.scramble("alpha");
        let b = s.scramble("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn always_ignored_names_pass_through() {
        let mut s = Scrambler::new(Category::Method, 8, Mode::Identifier, HashSet::new(), HashSet::new());
        assert_eq!(s.scramble("__construct"), "__construct");
        assert!(s.is_empty());
    }

    #[test]
    fn superglobals_are_ignored_only_for_variables() {
        let mut variables = Scrambler::new(Category::Variable, 8, Mode::Identifier, HashSet::new(), HashSet::new());
        assert_eq!(variables.scramble("_SERVER"), "_SERVER");

        let mut functions = Scrambler::new(Category::Function, 8, Mode::Identifier, HashSet::new(), HashSet::new());
        assert_ne!(functions.scramble("_SERVER"), "_SERVER");
    }

    #[test]
    fn hex_and_numeric_candidates_are_legal_identifiers() {
        let mut hex = scrambler(Mode::Hex);
        let mut numeric = scrambler(Mode::Numeric);
        for name in ["a", "b", "c", "d", "e"] {
            let candidate = hex.scramble(name);
            assert!(candidate.chars().next().unwrap().is_ascii_alphabetic() || candidate.starts_with('_'));
            let candidate = numeric.scramble(name);
            assert!(candidate.chars().next().unwrap().is_ascii_alphabetic() || candidate.starts_with('_'));
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variable.scramble");

        let mut original = scrambler(Mode::Identifier);
        let scrambled = original.scramble("counter");
        original.save(&path).unwrap();

        let mut loaded = Scrambler::new(Category::Variable, 8, Mode::Identifier, HashSet::new(), HashSet::new());
        loaded.load(&path).unwrap();

        assert_eq!(loaded.unscramble(&scrambled), Some("counter"));
        assert_eq!(loaded.scramble("counter"), scrambled);
    }

    #[test]
    fn load_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.scramble");
        let mut s = scrambler(Mode::Identifier);
        s.load(&path).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn load_corrupt_file_fails_and_leaves_scrambler_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.scramble");
        std::fs::write(&path, "not json").unwrap();

        let mut s = scrambler(Mode::Identifier);
        s.scramble("keep-me");
        assert!(s.load(&path).is_err());
        assert_eq!(s.len(), 1);
    }
}
