//! # Condição sobre um Token
//!
//! Cada condição é um predicado sobre **um único token**, acompanhado de um
//! quantificador `[min, max]` que a [`crate::rule::Rule`] usa para decidir
//! quantos tokens consecutivos ela pode consumir.
//!
//! ## Ordem das verificações
//!
//! Todas precisam passar; a primeira que falha encerra a avaliação.
//!
//! 1. Capitalização da primeira letra da forma.
//! 2. Capitalização de todas as letras da forma.
//! 3. Regex da forma (busca em qualquer posição, não ancorada).
//! 4. Regex do lema.
//! 5. Regex da tag atual, já normalizada (`B-PER` → `PER`, `_` → `O`).
//!
//! Um token sem o campo exigido (ex: sem lema quando há regex de lema)
//! simplesmente não casa.
//!
//! A avaliação é pura. A anotação (`ann`) só é escrita pela regra vencedora,
//! depois da arbitragem.

use regex::{Regex, RegexBuilder};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{CaseConstraint, ConditionDef};
use crate::error::{Error, Result};
use crate::token::Token;

/// Quantificador sem limite superior.
pub const UNBOUNDED: usize = usize::MAX;

#[derive(Debug, Clone)]
pub struct Condition {
    form: Option<Regex>,
    lemma: Option<Regex>,
    ner: Option<Regex>,
    first_letter: CaseConstraint,
    all_letters: CaseConstraint,
    annotation: Option<String>,
    min: usize,
    max: usize,
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| Error::Regex {
            pattern: pattern.to_string(),
            source,
        })
}

impl Condition {
    /// Compila uma condição a partir da sua definição.
    ///
    /// `rule` só é usado para nomear a regra em mensagens de erro.
    pub fn from_def(def: &ConditionDef, rule: &str) -> Result<Self> {
        let max = def.max.unwrap_or(UNBOUNDED);
        if def.min > max {
            return Err(Error::InvalidBounds {
                rule: rule.to_string(),
                min: def.min,
                max,
            });
        }

        Ok(Self {
            form: def
                .form
                .as_deref()
                .map(|p| compile(p, !def.form_match_cased))
                .transpose()?,
            lemma: def
                .lemma
                .as_deref()
                .map(|p| compile(p, !def.lemma_match_cased))
                .transpose()?,
            ner: def.ner.as_deref().map(|p| compile(p, true)).transpose()?,
            first_letter: def.form_first_letter,
            all_letters: def.form_all_letters,
            annotation: def.ann.clone(),
            min: def.min,
            max,
        })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// Testa o token contra todas as verificações da condição.
    pub fn matches(&self, token: &Token) -> bool {
        if self.first_letter != CaseConstraint::Any || self.all_letters != CaseConstraint::Any {
            let Some(form) = token.form() else {
                return false;
            };
            if !first_letter_ok(form, self.first_letter) || !all_letters_ok(form, self.all_letters)
            {
                return false;
            }
        }

        if let Some(rx) = &self.form {
            match token.form() {
                Some(form) if rx.is_match(form) => {}
                _ => return false,
            }
        }

        if let Some(rx) = &self.lemma {
            match token.lemma() {
                Some(lemma) if rx.is_match(lemma) => {}
                _ => return false,
            }
        }

        if let Some(rx) = &self.ner {
            if !rx.is_match(token.normalized_tag()) {
                return false;
            }
        }

        true
    }
}

/// Compara o primeiro grafema da forma com sua versão maiúscula/minúscula.
///
/// Caracteres sem caixa (dígitos, pontuação) passam nas duas verificações.
fn first_letter_ok(form: &str, constraint: CaseConstraint) -> bool {
    let Some(first) = form.graphemes(true).next() else {
        return constraint == CaseConstraint::Any;
    };
    match constraint {
        CaseConstraint::Any => true,
        CaseConstraint::Upper => first == first.to_uppercase(),
        CaseConstraint::Lower => first == first.to_lowercase(),
    }
}

/// `Lower` exige a forma inteira em minúsculas.
fn all_letters_ok(form: &str, constraint: CaseConstraint) -> bool {
    match constraint {
        CaseConstraint::Any => true,
        CaseConstraint::Upper => form == form.to_uppercase(),
        CaseConstraint::Lower => form == form.to_lowercase(),
    }
}
