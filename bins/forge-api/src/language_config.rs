// Language runtime configuration
// Maps each supported language to the runtime the judge service should use

use forge_common::types::Language;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub runtime: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LanguagesFile {
    languages: Vec<LanguageConfig>,
}

/// Judge runtime identifier and version for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    pub name: String,
    pub version: String,
}

impl Runtime {
    fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

fn default_runtime(language: Language) -> Runtime {
    match language {
        Language::Python => Runtime::new("python", "3.10.0"),
        Language::JavaScript => Runtime::new("javascript", "18.15.0"),
        Language::Java => Runtime::new("java", "15.0.2"),
        Language::Cpp => Runtime::new("c++", "10.2.0"),
        Language::C => Runtime::new("c", "10.2.0"),
    }
}

/// Registry of judge runtimes
/// Every supported language always resolves; the file only overrides
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    runtimes: HashMap<Language, Runtime>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        let runtimes = Language::ALL
            .iter()
            .map(|lang| (*lang, default_runtime(*lang)))
            .collect();
        Self { runtimes }
    }
}

impl LanguageRegistry {
    /// Load runtime overrides from languages.json
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read languages.json: {}", e))?;

        Self::from_json(&content)
    }

    /// Load from `path` if it exists, otherwise use built-in runtimes
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_json(content: &str) -> Result<Self, String> {
        let config: LanguagesFile = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse languages.json: {}", e))?;

        let mut registry = Self::default();

        for lang_config in config.languages {
            match lang_config.name.parse::<Language>() {
                Ok(lang) => {
                    registry
                        .runtimes
                        .insert(lang, Runtime::new(&lang_config.runtime, &lang_config.version));
                }
                Err(_) => {
                    return Err(format!(
                        "Unknown language '{}' in languages.json",
                        lang_config.name
                    ));
                }
            }
        }

        Ok(registry)
    }

    pub fn runtime(&self, language: Language) -> Runtime {
        self.runtimes
            .get(&language)
            .cloned()
            .unwrap_or_else(|| default_runtime(language))
    }
}
