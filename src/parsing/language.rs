//! Language enumeration
//!
//! This module provides the languages the converter can extract identifiers
//! from, their default file extensions and configuration keys.

use serde::{Deserialize, Serialize};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Php,
    Go,
    C,
    Cpp,
    CSharp,
    Java,
    Gdscript,
}

impl Language {
    /// Every supported language, in a stable order
    pub fn all() -> &'static [Language] {
        &[
            Language::Rust,
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Php,
            Language::Go,
            Language::C,
            Language::Cpp,
            Language::CSharp,
            Language::Java,
            Language::Gdscript,
        ]
    }

    /// Look up a language by its configuration key
    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|language| language.config_key() == key)
    }

    /// Get default file extensions for this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Php => &[
                "php", "php3", "php4", "php5", "php7", "php8", "phps", "phtml",
            ],
            Language::Go => &["go"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "hpp", "cc", "cxx", "hxx", "hh"],
            Language::CSharp => &["cs", "csx"],
            Language::Java => &["java"],
            Language::Gdscript => &["gd"],
        }
    }

    /// Get the configuration key for this language
    pub fn config_key(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Php => "php",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Gdscript => "gdscript",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Php => "PHP",
            Language::Go => "Go",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Java => "Java",
            Language::Gdscript => "GDScript",
        }
    }

    /// Tree node kinds that carry identifier text in this language's grammar
    pub fn identifier_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "identifier",
                "type_identifier",
                "field_identifier",
                "shorthand_field_identifier",
            ],
            Language::Python => &["identifier"],
            Language::JavaScript => &[
                "identifier",
                "property_identifier",
                "shorthand_property_identifier",
                "shorthand_property_identifier_pattern",
                "private_property_identifier",
            ],
            Language::TypeScript => &[
                "identifier",
                "type_identifier",
                "property_identifier",
                "shorthand_property_identifier",
                "shorthand_property_identifier_pattern",
                "private_property_identifier",
            ],
            Language::Php => &["name"],
            Language::Go => &[
                "identifier",
                "type_identifier",
                "field_identifier",
                "package_identifier",
            ],
            Language::C => &["identifier", "type_identifier", "field_identifier"],
            Language::Cpp => &[
                "identifier",
                "type_identifier",
                "field_identifier",
                "namespace_identifier",
            ],
            Language::CSharp => &["identifier"],
            Language::Java => &["identifier", "type_identifier"],
            Language::Gdscript => &["identifier", "name"],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
