//! # Conjunto de Regras: Arbitragem e Janela Deslizante
//!
//! Para cada sentença, os tokens entram em um buffer FIFO. Sempre que o
//! buffer atinge `max_sequence_length`, roda uma rodada de casamento:
//!
//! 1. **Todas** as regras são testadas contra o buffer (sem efeitos).
//! 2. Vence a que consome mais tokens; em empate, a declarada primeiro.
//! 3. Se nenhuma consome ao menos um token, o token mais antigo é descartado.
//! 4. Senão, a vencedora anota os tokens que consumiu e eles saem do buffer.
//!
//! No fim da sentença o buffer é esvaziado com rodadas sucessivas e as
//! fronteiras BIO são reconstruídas.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::bio::rebuild_bio;
use crate::config::RulesConfig;
use crate::conllup::{SentenceSink, SentenceSource};
use crate::error::{Error, Result};
use crate::rule::{Rule, RuleMatch};
use crate::token::{Sentence, Token};
use crate::window::Window;

/// Contadores de uma execução do motor de regras.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub sentences: usize,
    pub tokens: usize,
    /// Quantas vezes cada regra venceu a arbitragem.
    pub applications: BTreeMap<String, usize>,
    /// Maior janela apresentada à arbitragem.
    pub largest_window: usize,
}

impl RuleStats {
    pub fn total_applications(&self) -> usize {
        self.applications.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    max_sequence_length: usize,
}

impl RuleSet {
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        if config.max_sequence_length == 0 {
            return Err(Error::InvalidSequenceLength);
        }
        let rules = config
            .rules
            .iter()
            .map(Rule::from_def)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            max_sequence_length: config.max_sequence_length,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_config(&RulesConfig::from_json_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let set = Self::from_json_str(&text)?;
        info!(
            "{} regras carregadas de {} (max_sequence_length={})",
            set.rules.len(),
            path.display(),
            set.max_sequence_length
        );
        Ok(set)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    /// Regra que consome mais tokens do início da janela.
    ///
    /// Empates ficam com a primeira regra declarada; casamentos de zero
    /// tokens não contam.
    pub fn best_match(&self, tokens: &[Token]) -> Option<(&Rule, RuleMatch)> {
        let mut best: Option<(&Rule, RuleMatch)> = None;
        for rule in &self.rules {
            let Some(candidate) = rule.match_tokens(tokens) else {
                continue;
            };
            let current = best.as_ref().map_or(0, |(_, m)| m.consumed);
            if candidate.consumed > current {
                best = Some((rule, candidate));
            }
        }
        best
    }

    /// Uma rodada de casamento sobre o buffer, seguida do descarte.
    fn match_round(&self, tokens: &mut [Token], window: &mut Window, stats: &mut RuleStats) {
        stats.largest_window = stats.largest_window.max(window.len());
        let buffer = &mut tokens[window.range()];

        match self.best_match(buffer) {
            Some((rule, matched)) => {
                debug!(
                    "regra '{}' consumiu {} token(s) a partir de {:?}",
                    rule.name(),
                    matched.consumed,
                    buffer.first().and_then(Token::form)
                );
                rule.apply(&matched, buffer);
                *stats.applications.entry(rule.name().to_string()).or_default() += 1;
                window.evict(matched.consumed);
            }
            None => window.evict(1),
        }
    }

    /// Processa uma sentença: janela deslizante, anotação e BIO.
    pub fn process_sentence(&self, sentence: &mut Sentence, stats: &mut RuleStats) {
        let mut window = Window::new();
        for _ in 0..sentence.tokens.len() {
            window.push();
            if window.len() >= self.max_sequence_length {
                self.match_round(&mut sentence.tokens, &mut window, stats);
            }
        }
        while !window.is_empty() {
            self.match_round(&mut sentence.tokens, &mut window, stats);
        }

        rebuild_bio(&mut sentence.tokens);
        stats.sentences += 1;
        stats.tokens += sentence.tokens.len();
    }

    /// Lê todas as sentenças de `source`, aplica as regras e escreve em `sink`.
    pub fn process_document<S, W>(&self, source: &mut S, sink: &mut W) -> Result<RuleStats>
    where
        S: SentenceSource + ?Sized,
        W: SentenceSink + ?Sized,
    {
        let mut stats = RuleStats::default();
        while let Some(mut sentence) = source.read_sentence()? {
            self.process_sentence(&mut sentence, &mut stats);
            sink.write_sentence(&sentence)?;
        }
        info!(
            "motor de regras: {} sentenças, {} tokens, {} aplicações",
            stats.sentences,
            stats.tokens,
            stats.total_applications()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conllup::ConllupReader;

    /// Duas maiúsculas seguidas → PERSON; uma maiúscula → LOC.
    const PERSON_LOC: &str = r#"{
        "rules": [
            { "name": "person", "conditions": [
                { "formFirstLetter": 1, "ann": "PERSON", "min": 1, "max": 1 },
                { "formFirstLetter": 1, "ann": "PERSON", "min": 1, "max": 1 }
            ] },
            { "name": "loc", "conditions": [
                { "formFirstLetter": 1, "ann": "LOC", "min": 1, "max": 1 }
            ] }
        ]
    }"#;

    fn sentence(forms: &[&str]) -> Sentence {
        Sentence::new(
            forms
                .iter()
                .enumerate()
                .map(|(i, f)| Token::simple(i + 1, f, "O"))
                .collect(),
        )
    }

    #[test]
    fn test_end_to_end_person_and_location() {
        let set = RuleSet::from_json_str(PERSON_LOC).unwrap();
        let mut s = sentence(&["Barack", "Obama", "visited", "Paris"]);
        let mut stats = RuleStats::default();
        set.process_sentence(&mut s, &mut stats);

        assert_eq!(s.tags(), vec!["B-PERSON", "I-PERSON", "O", "B-LOC"]);
        assert_eq!(stats.applications.get("person"), Some(&1));
        assert_eq!(stats.applications.get("loc"), Some(&1));
    }

    #[test]
    fn test_longest_match_wins_regardless_of_order() {
        // regra curta declarada primeiro ainda perde para a longa
        let set = RuleSet::from_json_str(
            r#"{ "rules": [
                { "name": "curta", "conditions": [ { "formFirstLetter": 1, "ann": "LOC", "max": 1 } ] },
                { "name": "longa", "conditions": [ { "formFirstLetter": 1, "ann": "ORG", "min": 1 } ] }
            ] }"#,
        )
        .unwrap();
        let tokens = sentence(&["Banco", "Central", "do"]).tokens;
        let (rule, m) = set.best_match(&tokens).unwrap();
        assert_eq!(rule.name(), "longa");
        assert_eq!(m.consumed, 2);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let set = RuleSet::from_json_str(
            r#"{ "rules": [
                { "name": "primeira", "conditions": [ { "formFirstLetter": 1, "ann": "LOC", "max": 1 } ] },
                { "name": "segunda", "conditions": [ { "form": "^[A-Z]", "formMatchCased": true, "ann": "ORG", "max": 1 } ] }
            ] }"#,
        )
        .unwrap();
        let mut s = sentence(&["Brasil"]);
        let mut stats = RuleStats::default();
        set.process_sentence(&mut s, &mut stats);
        assert_eq!(s.tags(), vec!["B-LOC"]);
    }

    #[test]
    fn test_window_never_exceeds_max_sequence_length() {
        let set = RuleSet::from_json_str(
            r#"{ "max_sequence_length": 3, "rules": [
                { "name": "nunca", "conditions": [ { "form": "^xyz$" } ] }
            ] }"#,
        )
        .unwrap();
        let mut s = sentence(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let mut stats = RuleStats::default();
        set.process_sentence(&mut s, &mut stats);
        assert_eq!(stats.largest_window, 3);
        assert_eq!(stats.total_applications(), 0);
    }

    #[test]
    fn test_short_horizon_truncates_long_entities() {
        // com horizonte 2, "Dom Pedro Segundo" não cabe numa janela só
        let rules = r#"{ "max_sequence_length": 2, "rules": [
            { "name": "nome", "conditions": [ { "formFirstLetter": 1, "ann": "PER", "min": 3 } ] }
        ] }"#;
        let set = RuleSet::from_json_str(rules).unwrap();
        let mut s = sentence(&["Dom", "Pedro", "Segundo", "reinou"]);
        set.process_sentence(&mut s, &mut RuleStats::default());
        assert_eq!(s.tags(), vec!["O", "O", "O", "O"]);
    }

    #[test]
    fn test_existing_tags_are_rebuilt_as_bio() {
        let set = RuleSet::from_json_str(
            r#"{ "rules": [ { "name": "x", "conditions": [ { "form": "^xyz$" } ] } ] }"#,
        )
        .unwrap();
        let mut s = Sentence::new(vec![
            Token::simple(1, "Rio", "LOC"),
            Token::simple(2, "de", "LOC"),
            Token::simple(3, "Janeiro", "LOC"),
        ]);
        set.process_sentence(&mut s, &mut RuleStats::default());
        assert_eq!(s.tags(), vec!["B-LOC", "I-LOC", "I-LOC"]);
    }

    #[test]
    fn test_rule_over_existing_entity_tag() {
        // reclassifica PER seguido de "S.A." como ORG
        let set = RuleSet::from_json_str(
            r#"{ "rules": [ { "name": "empresa", "conditions": [
                { "ner": "^PER$", "ann": "ORG", "min": 1 },
                { "form": "^S\\.A\\.$", "ann": "ORG", "max": 1 }
            ] } ] }"#,
        )
        .unwrap();
        let mut s = Sentence::new(vec![
            Token::simple(1, "Silva", "B-PER"),
            Token::simple(2, "Irmãos", "I-PER"),
            Token::simple(3, "S.A.", "O"),
            Token::simple(4, "faliu", "O"),
        ]);
        set.process_sentence(&mut s, &mut RuleStats::default());
        assert_eq!(s.tags(), vec!["B-ORG", "I-ORG", "I-ORG", "O"]);
    }

    #[test]
    fn test_process_document_counts() {
        let set = RuleSet::from_json_str(PERSON_LOC).unwrap();
        let mut reader = ConllupReader::parse(
            "1\tBarack\tbarack\tO\n2\tObama\tobama\tO\n\n1\tem\tem\tO\n2\tParis\tparis\tO\n",
        )
        .unwrap();
        let mut out: Vec<Sentence> = Vec::new();
        let stats = set.process_document(&mut reader, &mut out).unwrap();
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.tokens, 4);
        assert_eq!(out[1].tags(), vec!["O", "B-LOC"]);
    }

    #[test]
    fn test_invalid_configs_fail_at_load() {
        assert!(matches!(
            RuleSet::from_json_str(r#"{ "max_sequence_length": 0, "rules": [] }"#),
            Err(Error::InvalidSequenceLength)
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{ "rules": [ { "conditions": [ { "form": "(" } ] } ] }"#),
            Err(Error::Regex { .. })
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{ "rules": [ { "name": "sem_condicoes" } ] }"#),
            Err(Error::Config(_))
        ));
    }
}
