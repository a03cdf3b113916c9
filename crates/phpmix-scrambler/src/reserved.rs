//! Fixed, non-configurable always-ignored name sets.

/// PHP magic method/identifier names, ignored regardless of category.
const MAGIC_NAMES: &[&str] = &[
    "__construct",
    "__destruct",
    "__call",
    "__callstatic",
    "__get",
    "__set",
    "__isset",
    "__unset",
    "__sleep",
    "__wakeup",
    "__serialize",
    "__unserialize",
    "__tostring",
    "__invoke",
    "__set_state",
    "__clone",
    "__debuginfo",
];

/// The self/parent/static pseudo-class references, also always ignored.
const PSEUDO_CLASSES: &[&str] = &["self", "parent", "static"];

const SUPERGLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV", "this",
];

/// PHP reserved words; a scrambled candidate must never collide with one of these,
/// since it would no longer parse as the identifier kind it's standing in for.
const RESERVED_WORDS: &[&str] = &[
    "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class", "clone", "const",
    "continue", "declare", "default", "do", "echo", "else", "elseif", "empty", "enddeclare", "endfor",
    "endforeach", "endif", "endswitch", "endwhile", "enum", "extends", "final", "finally", "fn", "for",
    "foreach", "function", "global", "goto", "if", "implements", "include", "include_once", "instanceof",
    "insteadof", "interface", "isset", "list", "match", "namespace", "new", "or", "print", "private",
    "protected", "public", "readonly", "require", "require_once", "return", "static", "switch", "throw",
    "trait", "try", "unset", "use", "var", "while", "xor", "yield", "true", "false", "null",
];

pub fn is_magic_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    MAGIC_NAMES.contains(&lower.as_str()) || PSEUDO_CLASSES.contains(&lower.as_str())
}

pub fn is_superglobal(name: &str) -> bool {
    SUPERGLOBALS.contains(&name)
}

pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name.to_ascii_lowercase().as_str())
}
