//! Configuration structs for the Context and its passes.
//!
//! Each section carries its own `Default` rather than deriving one, so a config
//! file that omits a whole section still gets sensible per-category defaults
//! inline. The root binary's configuration layer composes these with the walker
//! policy (owned by `phpmix-walker`) and the scrambler policy below.

use phpmix_scrambler::Mode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub variable: bool,
    pub function: bool,
    pub method: bool,
    pub property: bool,
    pub class_constant: bool,
    pub global_constant: bool,
    pub label: bool,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self { variable: true, function: true, method: true, property: true, class_constant: true, global_constant: true, label: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringConfig {
    pub enabled: bool,
    /// Raw technique name (`base64`, `rot13`, `xor`, or empty/unrecognized). Kept as a
    /// string rather than an enum with a catch-all variant so that an empty or
    /// unrecognized technique is a distinct, representable value, letting plain and
    /// interpolated literals fall back differently when it's absent.
    pub technique: String,
    /// XOR key when `technique = "xor"`. Defaulted to a fixed key so a config omitting
    /// it still produces reproducible output; operators concerned about key reuse
    /// across projects should set this explicitly.
    pub xor_key: String,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self { enabled: true, technique: "base64".to_string(), xor_key: "phpmix".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringTechnique {
    Base64,
    Rot13,
    Xor,
}

impl StringConfig {
    /// `None` for an empty or unrecognized technique name.
    pub fn technique(&self) -> Option<StringTechnique> {
        match self.technique.to_ascii_lowercase().as_str() {
            "base64" => Some(StringTechnique::Base64),
            "rot13" => Some(StringTechnique::Rot13),
            "xor" => Some(StringTechnique::Xor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    pub enabled: bool,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlFlowConfig {
    pub enabled: bool,
    pub max_nesting_depth: u32,
    pub random_conditions: bool,
    pub add_dead_branches: bool,
    /// Whether loop bodies (not just function/method bodies) are eligible for
    /// wrapping.
    pub wrap_loops: bool,
}

impl Default for ControlFlowConfig {
    fn default() -> Self {
        Self { enabled: false, max_nesting_depth: 1, random_conditions: false, add_dead_branches: false, wrap_loops: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayAccessConfig {
    pub enabled: bool,
    pub force_helper: bool,
}

impl Default for ArrayAccessConfig {
    fn default() -> Self {
        Self { enabled: false, force_helper: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithmeticConfig {
    pub enabled: bool,
    pub complexity: u8,
    pub transformation_rate: u8,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self { enabled: false, complexity: 1, transformation_rate: 50 }
    }
}

impl ArithmeticConfig {
    pub fn normalized_complexity(&self) -> u8 {
        self.complexity.clamp(1, 3)
    }

    pub fn normalized_rate(&self) -> u8 {
        self.transformation_rate.min(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadJunkConfig {
    pub enabled: bool,
    pub injection_rate: u8,
    pub max_depth: u32,
}

impl Default for DeadJunkConfig {
    fn default() -> Self {
        Self { enabled: false, injection_rate: 10, max_depth: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkMode {
    Count,
    Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleConfig {
    pub enabled: bool,
    pub min_chunk_size: usize,
    pub chunk_mode: ChunkMode,
    pub chunk_ratio: f64,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self { enabled: false, min_chunk_size: 2, chunk_mode: ChunkMode::Count, chunk_ratio: 0.25 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScramblerPolicyConfig {
    pub scramble_length: usize,
    pub mode: Mode,
    pub ignore: HashMap<String, HashSet<String>>,
    pub reserved: HashMap<String, HashSet<String>>,
}

impl Default for ScramblerPolicyConfig {
    fn default() -> Self {
        Self { scramble_length: 8, mode: Mode::Identifier, ignore: HashMap::new(), reserved: HashMap::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscatorConfig {
    pub identifiers: IdentifierConfig,
    pub strings: StringConfig,
    pub comments: CommentConfig,
    pub control_flow: ControlFlowConfig,
    pub array_access: ArrayAccessConfig,
    pub arithmetic: ArithmeticConfig,
    pub dead_code: DeadJunkConfig,
    pub shuffle: ShuffleConfig,
    pub scrambler: ScramblerPolicyConfig,
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self {
            identifiers: IdentifierConfig::default(),
            strings: StringConfig::default(),
            comments: CommentConfig::default(),
            control_flow: ControlFlowConfig::default(),
            array_access: ArrayAccessConfig::default(),
            arithmetic: ArithmeticConfig::default(),
            dead_code: DeadJunkConfig::default(),
            shuffle: ShuffleConfig::default(),
            scrambler: ScramblerPolicyConfig::default(),
        }
    }
}
