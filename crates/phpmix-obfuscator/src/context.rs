//! The Obfuscation Context: owns the configuration and the set of
//! scramblers keyed by category, and persists them under `on_disk_dir`.

use crate::config::ObfuscatorConfig;
use phpmix_scrambler::{Category, Mode, Scrambler, ScramblerError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct ObfuscationContext {
    pub config: ObfuscatorConfig,
    scramblers: HashMap<Category, Scrambler>,
    on_disk_dir: Option<PathBuf>,
    /// Set by passes that emitted a call to a guarded helper, consumed by the
    /// orchestrator when assembling the helper prelude.
    needs_xor_helper: bool,
    needs_array_access_helper: bool,
}

impl ObfuscationContext {
    pub fn new(config: ObfuscatorConfig) -> Self {
        let scramblers = Category::ALL
            .into_iter()
            .map(|category| {
                let name = category.as_str();
                let ignore = config.scrambler.ignore.get(name).cloned().unwrap_or_default();
                let reserved = config.scrambler.reserved.get(name).cloned().unwrap_or_default();
                (category, Scrambler::new(category, config.scrambler.scramble_length, config.scrambler.mode, ignore, reserved))
            })
            .collect();

        Self { config, scramblers, on_disk_dir: None, needs_xor_helper: false, needs_array_access_helper: false }
    }

    pub fn with_on_disk_dir(mut self, dir: PathBuf) -> Self {
        self.on_disk_dir = Some(dir);
        self
    }

    pub fn scrambler_mode(&self) -> Mode {
        self.config.scrambler.mode
    }

    pub fn scrambler(&mut self, category: Category) -> &mut Scrambler {
        self.scramblers.get_mut(&category).expect("every Category is pre-populated in new()")
    }

    pub fn scrambler_ref(&self, category: Category) -> &Scrambler {
        self.scramblers.get(&category).expect("every Category is pre-populated in new()")
    }

    pub fn mark_needs_xor_helper(&mut self) {
        self.needs_xor_helper = true;
    }

    pub fn mark_needs_array_access_helper(&mut self) {
        self.needs_array_access_helper = true;
    }

    pub fn needs_xor_helper(&self) -> bool {
        self.needs_xor_helper
    }

    pub fn needs_array_access_helper(&self) -> bool {
        self.needs_array_access_helper || self.config.array_access.force_helper
    }

    fn scramble_path(&self, category: Category) -> Option<PathBuf> {
        self.on_disk_dir.as_ref().map(|dir| dir.join(format!("{}.scramble", category.as_str())))
    }

    /// Persists every category's scrambler under `<on_disk_dir>/<category>.scramble`.
    /// A context built without `with_on_disk_dir` (single-file mode) has
    /// nothing to do.
    pub fn save(&self) -> Result<(), ScramblerError> {
        for category in Category::ALL {
            if let Some(path) = self.scramble_path(category) {
                self.scramblers[&category].save(&path)?;
            }
        }
        Ok(())
    }

    /// Loads every category's scrambler from `dir`, leaving categories with a missing
    /// file untouched and ones with a corrupt file degraded to a fresh, empty map.
    pub fn load_from(dir: &Path) -> Result<HashMap<Category, Scrambler>, ScramblerError> {
        let mut loaded = HashMap::new();
        for category in Category::ALL {
            let mut scrambler = Scrambler::new(category, 8, Mode::Identifier, Default::default(), Default::default());
            let path = dir.join(format!("{}.scramble", category.as_str()));
            if let Err(error) = scrambler.load(&path) {
                tracing::warn!("failed to load {} scrambler from {}: {error}; starting fresh", category, path.display());
            }
            loaded.insert(category, scrambler);
        }
        Ok(loaded)
    }

    pub fn load_into(&mut self, dir: &Path) {
        for (category, scrambler) in Self::load_from(dir).unwrap_or_default() {
            self.scramblers.insert(category, scrambler);
        }
        self.on_disk_dir = Some(dir.to_path_buf());
    }
}
