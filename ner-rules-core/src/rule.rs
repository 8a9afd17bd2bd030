//! # Regra: Autômato de Casamento Quantificado
//!
//! Uma regra é uma sequência fixa de [`Condition`]s. O casamento percorre a
//! janela da esquerda para a direita, de forma **gulosa e sem retrocesso**:
//!
//! - enquanto a condição corrente casa com o token corrente, o token é
//!   consumido; ao atingir `max` repetições, passa-se à próxima condição;
//! - quando não casa: se a condição já tem `min` repetições, passa-se à
//!   próxima condição e o **mesmo token** é testado de novo; senão a regra
//!   falha nesta posição.
//!
//! ## Exemplo
//!
//! Regra `[Maiúscula{1,3}, "visitou"{1,1}]` sobre `Dom Pedro II visitou Paris`:
//!
//! ```text
//! Dom    → cond 0 (1)
//! Pedro  → cond 0 (2)
//! II     → cond 0 (3 = max) → avança
//! visitou→ cond 1 (1 = max) → avança, todas consumidas
//! resultado: 4 tokens
//! ```
//!
//! Se os tokens acabam antes das condições, a regra só casa se a condição
//! corrente já atingiu seu `min` e todas as seguintes têm `min = 0`.
//! Uma condição com `max = 0` nunca consome token.

use std::ops::Range;

use serde::Serialize;

use crate::condition::Condition;
use crate::config::RuleDef;
use crate::error::Result;
use crate::token::{label_range, Token};

/// Tokens consumidos por uma condição durante um casamento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub condition: usize,
    pub range: Range<usize>,
}

/// Resultado de um casamento bem-sucedido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    /// Número de tokens consumidos a partir do início da janela.
    pub consumed: usize,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    conditions: Vec<Condition>,
}

impl Rule {
    pub fn from_def(def: &RuleDef) -> Result<Self> {
        let conditions = def
            .conditions
            .iter()
            .map(|c| Condition::from_def(c, &def.name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: def.name.clone(),
            conditions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Tenta casar a regra com o prefixo de `tokens`, sem alterá-los.
    pub fn match_tokens(&self, tokens: &[Token]) -> Option<RuleMatch> {
        let mut segments = Vec::new();
        let mut token = 0;
        let mut cond = 0;
        let mut repeats = 0;
        let mut segment_start = 0;

        while cond < self.conditions.len() {
            let condition = &self.conditions[cond];

            if repeats >= condition.max() {
                close_segment(&mut segments, cond, segment_start..token);
                cond += 1;
                repeats = 0;
                segment_start = token;
                continue;
            }

            if token == tokens.len() {
                break;
            }

            if condition.matches(&tokens[token]) {
                token += 1;
                repeats += 1;
            } else if repeats >= condition.min() {
                close_segment(&mut segments, cond, segment_start..token);
                cond += 1;
                repeats = 0;
                segment_start = token;
            } else {
                return None;
            }
        }

        if cond < self.conditions.len() {
            // tokens acabaram no meio da regra
            if repeats < self.conditions[cond].min() {
                return None;
            }
            if self.conditions[cond + 1..].iter().any(|c| c.min() > 0) {
                return None;
            }
            close_segment(&mut segments, cond, segment_start..token);
        }

        Some(RuleMatch {
            consumed: token,
            segments,
        })
    }

    /// Escreve a anotação de cada condição nos tokens que ela consumiu.
    pub fn apply(&self, matched: &RuleMatch, tokens: &mut [Token]) {
        for segment in &matched.segments {
            if let Some(ann) = self.conditions[segment.condition].annotation() {
                label_range(&mut tokens[segment.range.clone()], ann);
            }
        }
    }

    /// Casa e, se bem-sucedida, anota os tokens. Retorna quantos foram consumidos.
    pub fn match_and_apply(&self, tokens: &mut [Token]) -> Option<usize> {
        let matched = self.match_tokens(tokens)?;
        self.apply(&matched, tokens);
        Some(matched.consumed)
    }
}

fn close_segment(segments: &mut Vec<Segment>, condition: usize, range: Range<usize>) {
    if !range.is_empty() {
        segments.push(Segment { condition, range });
    }
}
