//! # Documento de Configuração das Regras
//!
//! As regras são declaradas em JSON e carregadas uma única vez:
//!
//! ```json
//! {
//!   "max_sequence_length": 20,
//!   "rules": [
//!     {
//!       "name": "pessoa_nome_composto",
//!       "conditions": [
//!         { "formFirstLetter": 1, "ner": "^O$", "ann": "PER", "min": 2, "max": 3 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Este módulo só descreve o formato (serde). A validação semântica
//! (regex compiláveis, `min <= max`) acontece na construção de
//! [`crate::condition::Condition`] e [`crate::rule_set::RuleSet`].

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Valor padrão de `max_sequence_length`.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 20;

fn default_max_sequence_length() -> usize {
    DEFAULT_MAX_SEQUENCE_LENGTH
}

fn default_min() -> usize {
    1
}

/// Restrição de capitalização aplicada à forma do token.
///
/// No JSON é um inteiro: `0` = nenhuma, `1` = maiúscula, `2` = minúscula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CaseConstraint {
    #[default]
    Any,
    Upper,
    Lower,
}

impl TryFrom<u8> for CaseConstraint {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CaseConstraint::Any),
            1 => Ok(CaseConstraint::Upper),
            2 => Ok(CaseConstraint::Lower),
            other => Err(Error::InvalidCaseMode(other)),
        }
    }
}

impl From<CaseConstraint> for u8 {
    fn from(value: CaseConstraint) -> Self {
        match value {
            CaseConstraint::Any => 0,
            CaseConstraint::Upper => 1,
            CaseConstraint::Lower => 2,
        }
    }
}

/// Documento completo de regras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
    pub rules: Vec<RuleDef>,
}

/// Uma regra: nome e condições em ordem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(default)]
    pub name: String,
    pub conditions: Vec<ConditionDef>,
}

/// Uma condição sobre um único token, com quantificador `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDef {
    /// Regex sobre a forma (busca, não ancorada).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// `false` (padrão) compila `form` sem diferenciar maiúsculas.
    #[serde(default)]
    pub form_match_cased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default)]
    pub lemma_match_cased: bool,
    /// Regex sobre a tag normalizada; sempre sem diferenciar maiúsculas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ner: Option<String>,
    #[serde(default)]
    pub form_first_letter: CaseConstraint,
    #[serde(default)]
    pub form_all_letters: CaseConstraint,
    /// Tag escrita nos tokens consumidos por esta condição.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ann: Option<String>,
    #[serde(default = "default_min")]
    pub min: usize,
    /// Ausente = sem limite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl Default for ConditionDef {
    fn default() -> Self {
        Self {
            form: None,
            form_match_cased: false,
            lemma: None,
            lemma_match_cased: false,
            ner: None,
            form_first_letter: CaseConstraint::Any,
            form_all_letters: CaseConstraint::Any,
            ann: None,
            min: default_min(),
            max: None,
        }
    }
}

impl RulesConfig {
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RulesConfig::from_json_str(
            r#"{ "rules": [ { "name": "r", "conditions": [ {} ] } ] }"#,
        )
        .unwrap();
        assert_eq!(config.max_sequence_length, 20);
        let cond = &config.rules[0].conditions[0];
        assert_eq!(cond.min, 1);
        assert_eq!(cond.max, None);
        assert_eq!(cond.form_first_letter, CaseConstraint::Any);
        assert!(!cond.form_match_cased);
    }

    #[test]
    fn test_camel_case_fields() {
        let config = RulesConfig::from_json_str(
            r#"{
                "max_sequence_length": 5,
                "rules": [ { "name": "r", "conditions": [
                    { "form": "^[A-Z]", "formMatchCased": true, "formFirstLetter": 1,
                      "formAllLetters": 2, "ann": "PER", "min": 0, "max": 3 }
                ] } ]
            }"#,
        )
        .unwrap();
        let cond = &config.rules[0].conditions[0];
        assert_eq!(config.max_sequence_length, 5);
        assert!(cond.form_match_cased);
        assert_eq!(cond.form_first_letter, CaseConstraint::Upper);
        assert_eq!(cond.form_all_letters, CaseConstraint::Lower);
        assert_eq!(cond.ann.as_deref(), Some("PER"));
        assert_eq!((cond.min, cond.max), (0, Some(3)));
    }

    #[test]
    fn test_missing_conditions_is_error() {
        assert!(RulesConfig::from_json_str(r#"{ "rules": [ { "name": "r" } ] }"#).is_err());
        assert!(RulesConfig::from_json_str(r#"{ "max_sequence_length": 3 }"#).is_err());
    }

    #[test]
    fn test_invalid_case_mode_is_error() {
        let err = RulesConfig::from_json_str(
            r#"{ "rules": [ { "conditions": [ { "formFirstLetter": 7 } ] } ] }"#,
        );
        assert!(err.is_err());
    }
}
