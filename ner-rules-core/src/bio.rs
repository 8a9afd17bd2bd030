//! # Reconstrução BIO e Spans de Entidade
//!
//! Os dois passes escrevem nos tokens apenas o **tipo** da entidade
//! (ex: `PER`). Ao final de cada sentença, as fronteiras são refeitas:
//!
//! ```text
//! PER PER O LOC   →   B-PER I-PER O B-LOC
//! ```
//!
//! Tokens vizinhos com o mesmo tipo viram uma única entidade; `O` e `_`
//! são preservados como estão.

use serde::{Deserialize, Serialize};

use crate::token::{normalize_tag, Token, OUTSIDE};

/// Trecho contíguo de tokens `[start, end)` com o mesmo tipo de entidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Tipo normalizado (ex: "PER", "ORG")
    pub label: String,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Refaz os prefixos `B-`/`I-` de uma sentença, da esquerda para a direita.
pub fn rebuild_bio(tokens: &mut [Token]) {
    let mut last = OUTSIDE.to_string();
    for token in tokens.iter_mut() {
        let current = token.normalized_tag().to_string();
        if current == OUTSIDE {
            last = current;
            continue;
        }
        let prefix = if current == last { "I" } else { "B" };
        token.set_tag(&format!("{prefix}-{current}"));
        last = current;
    }
}

/// Extrai os spans maximais de mesmo tipo normalizado.
///
/// Diferente de uma leitura BIO estrita, `B-PER B-PER` forma **um** span:
/// só a mudança de tipo (ou um `O`) fecha a entidade corrente.
pub fn typed_runs(tokens: &[Token]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Option<Span> = None;

    for (i, token) in tokens.iter().enumerate() {
        let label = token.normalized_tag();
        if let Some(span) = open.as_mut() {
            if span.label == label {
                span.end = i + 1;
                continue;
            }
        }
        spans.extend(open.take());
        if label != OUTSIDE {
            open = Some(Span {
                start: i,
                end: i + 1,
                label: label.to_string(),
            });
        }
    }
    spans.extend(open);
    spans
}

/// Remove prefixos BIO de todas as tags, deixando só o tipo.
pub fn strip_bio(tokens: &mut [Token]) {
    for token in tokens.iter_mut() {
        let bare = token
            .tag()
            .map(normalize_tag)
            .filter(|bare| *bare != OUTSIDE)
            .map(str::to_string);
        if let Some(bare) = bare {
            token.set_tag(&bare);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(pairs: &[(&str, &str)]) -> Vec<Token> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (form, tag))| Token::simple(i + 1, form, tag))
            .collect()
    }

    fn tags(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.tag().unwrap().to_string()).collect()
    }

    #[test]
    fn test_rebuild_from_bare_types() {
        let mut tokens = sentence(&[
            ("Barack", "PERSON"),
            ("Obama", "PERSON"),
            ("visitou", "O"),
            ("Paris", "LOC"),
        ]);
        rebuild_bio(&mut tokens);
        assert_eq!(tags(&tokens), vec!["B-PERSON", "I-PERSON", "O", "B-LOC"]);
    }

    #[test]
    fn test_rebuild_merges_adjacent_same_type() {
        // B-LOC seguido de B-LOC vira uma entidade só
        let mut tokens = sentence(&[("São", "B-LOC"), ("Paulo", "B-LOC"), ("Rio", "ORG")]);
        rebuild_bio(&mut tokens);
        assert_eq!(tags(&tokens), vec!["B-LOC", "I-LOC", "B-ORG"]);
    }

    #[test]
    fn test_rebuild_keeps_empty_marker() {
        let mut tokens = sentence(&[("a", "_"), ("Fiocruz", "ORG"), ("b", "_"), ("Anvisa", "ORG")]);
        rebuild_bio(&mut tokens);
        assert_eq!(tags(&tokens), vec!["_", "B-ORG", "_", "B-ORG"]);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut tokens = sentence(&[
            ("Hospital", "ORG"),
            ("Albert", "ORG"),
            ("Einstein", "ORG"),
            ("em", "O"),
            ("São", "LOC"),
            ("Paulo", "LOC"),
            ("Brasil", "MISC"),
        ]);
        rebuild_bio(&mut tokens);
        let first = tags(&tokens);

        strip_bio(&mut tokens);
        rebuild_bio(&mut tokens);
        assert_eq!(tags(&tokens), first);

        // e aplicar direto sobre BIO também não muda nada
        rebuild_bio(&mut tokens);
        assert_eq!(tags(&tokens), first);
    }

    #[test]
    fn test_typed_runs() {
        let tokens = sentence(&[
            ("O", "O"),
            ("Instituto", "B-ORG"),
            ("Butantan", "I-ORG"),
            ("Lula", "B-PER"),
            ("e", "O"),
            ("Brasil", "LOC"),
        ]);
        let spans = typed_runs(&tokens);
        assert_eq!(
            spans,
            vec![
                Span { start: 1, end: 3, label: "ORG".to_string() },
                Span { start: 3, end: 4, label: "PER".to_string() },
                Span { start: 5, end: 6, label: "LOC".to_string() },
            ]
        );
    }
}
