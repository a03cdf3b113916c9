use std::fmt;

/// Identifier categories, each with its own independent forward/inverse map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Variable,
    Function,
    Method,
    Property,
    ClassConstant,
    GlobalConstant,
    Label,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Variable,
        Category::Function,
        Category::Method,
        Category::Property,
        Category::ClassConstant,
        Category::GlobalConstant,
        Category::Label,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Variable => "variable",
            Category::Function => "function",
            Category::Method => "method",
            Category::Property => "property",
            Category::ClassConstant => "class-constant",
            Category::GlobalConstant => "global-constant",
            Category::Label => "label",
        }
    }

    pub fn parse(value: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation strategy for fresh scrambled names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Identifier,
    Hex,
    Numeric,
}
