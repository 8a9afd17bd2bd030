//! # Uniformização de Entidades
//!
//! Garante que todas as menções de uma mesma entidade recebam o mesmo tipo
//! no documento inteiro. São duas leituras:
//!
//! 1. **Descoberta**: cada span de mesmo tipo vira uma chave canônica
//!    (formas em minúsculas, ordenadas, unidas por espaço) e o tipo é
//!    contado no histograma daquela chave ([`EntityType`]).
//! 2. **Re-anotação**: uma janela deslizante procura, em cada posição, a
//!    maior sequência de tokens cuja chave já é conhecida e escreve nela o
//!    tipo majoritário. Depois o BIO é reconstruído.
//!
//! ## Exemplo
//!
//! ```text
//! sentença 1: Banco(B-ORG) Central(I-ORG) anunciou ...
//! sentença 2: Banco(B-ORG) Central(I-ORG) subiu ...
//! sentença 3: o Central(O) Banco(O) ...        ← mesma chave "banco central"
//!
//! saída 3:    o Central(B-ORG) Banco(I-ORG) ...
//! ```
//!
//! A chave ignora a ordem das palavras: "York New" e "new york" coincidem.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bio::{rebuild_bio, typed_runs};
use crate::conllup::{SentenceSink, SentenceSource};
use crate::entity_type::EntityType;
use crate::error::Result;
use crate::token::{label_range, Sentence, Token};
use crate::window::Window;

/// Chave canônica de um conjunto de formas.
pub fn canonical_key<I, S>(forms: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut words: Vec<String> = forms
        .into_iter()
        .map(|f| f.as_ref().to_lowercase())
        .collect();
    words.sort();
    words.join(" ")
}

/// Contadores de uma execução da uniformização.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniformStats {
    pub sentences: usize,
    pub tokens: usize,
    /// Chaves distintas registradas na descoberta.
    pub entities: usize,
    /// Maior entidade registrada, em tokens.
    pub max_tokens: usize,
    /// Sequências re-anotadas na segunda leitura.
    pub retagged_spans: usize,
    pub retagged_tokens: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UniformProcessor {
    minw: usize,
    entities: HashMap<String, EntityType>,
    max_tokens: usize,
}

impl UniformProcessor {
    /// `minw` é o tamanho mínimo (em tokens) de uma entidade para que ela
    /// seja registrada e propagada.
    pub fn new(minw: usize) -> Self {
        Self {
            minw,
            ..Self::default()
        }
    }

    pub fn minw(&self) -> usize {
        self.minw
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn entity(&self, key: &str) -> Option<&EntityType> {
        self.entities.get(key)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Esquece tudo o que foi descoberto.
    pub fn reset(&mut self) {
        self.entities.clear();
        self.max_tokens = 0;
    }

    /// Conta mais uma ocorrência de `forms` com o tipo `label`.
    ///
    /// Spans vazios ou menores que `minw` são ignorados.
    pub fn register<S: AsRef<str>>(&mut self, forms: &[S], label: &str) {
        if forms.is_empty() || forms.len() < self.minw {
            return;
        }
        self.max_tokens = self.max_tokens.max(forms.len());
        let key = canonical_key(forms);
        match self.entities.get_mut(&key) {
            Some(entity) => entity.record(label),
            None => {
                self.entities.insert(key, EntityType::new(label));
            }
        }
    }

    /// Primeira leitura: registra os spans de uma sentença.
    pub fn discover(&mut self, sentence: &Sentence) {
        for span in typed_runs(&sentence.tokens) {
            let tokens = &sentence.tokens[span.start..span.end];
            let forms: Option<Vec<&str>> = tokens.iter().map(Token::form).collect();
            match forms {
                Some(forms) => self.register(&forms[..], &span.label),
                None => warn!(
                    "span {}..{} ({}) tem token sem forma; ignorado",
                    span.start, span.end, span.label
                ),
            }
        }
    }

    /// Maior prefixo de `tokens` cuja chave é conhecida, com o tipo majoritário.
    pub fn find_longest(&self, tokens: &[Token]) -> Option<(usize, &str)> {
        let largest = self.max_tokens.min(tokens.len());
        (1..=largest).rev().find_map(|size| {
            let forms: Option<Vec<&str>> = tokens[..size].iter().map(Token::form).collect();
            let entity = self.entities.get(&canonical_key(forms?))?;
            Some((size, entity.majority()))
        })
    }

    fn match_round(&self, tokens: &mut [Token], window: &mut Window, stats: &mut UniformStats) {
        let buffer = &mut tokens[window.range()];
        match self.find_longest(buffer) {
            Some((size, label)) => {
                debug!(
                    "uniformizando {} token(s) a partir de {:?} como {}",
                    size,
                    buffer.first().and_then(Token::form),
                    label
                );
                label_range(&mut buffer[..size], label);
                stats.retagged_spans += 1;
                stats.retagged_tokens += size;
                window.evict(size);
            }
            None => window.evict(1),
        }
    }

    /// Segunda leitura: re-anota uma sentença e refaz o BIO.
    pub fn retag_sentence(&self, sentence: &mut Sentence, stats: &mut UniformStats) {
        let mut window = Window::new();
        for _ in 0..sentence.tokens.len() {
            window.push();
            if window.len() > self.max_tokens {
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

    fn finish_discovery(&self, stats: &mut UniformStats) {
        stats.entities = self.entities.len();
        stats.max_tokens = self.max_tokens;
        debug!(
            "descoberta: {} entidades distintas, maior com {} tokens",
            stats.entities, stats.max_tokens
        );
    }

    /// Uniformiza um documento já em memória.
    pub fn process_sentences(&mut self, sentences: &mut [Sentence]) -> UniformStats {
        self.reset();
        let mut stats = UniformStats::default();
        for sentence in sentences.iter() {
            self.discover(sentence);
        }
        self.finish_discovery(&mut stats);
        for sentence in sentences.iter_mut() {
            self.retag_sentence(sentence, &mut stats);
        }
        stats
    }

    /// Lê o documento duas vezes (descoberta, `rewind`, re-anotação).
    pub fn process_document<S, W>(&mut self, source: &mut S, sink: &mut W) -> Result<UniformStats>
    where
        S: SentenceSource + ?Sized,
        W: SentenceSink + ?Sized,
    {
        self.reset();
        let mut stats = UniformStats::default();

        while let Some(sentence) = source.read_sentence()? {
            self.discover(&sentence);
        }
        self.finish_discovery(&mut stats);

        source.rewind()?;
        while let Some(mut sentence) = source.read_sentence()? {
            self.retag_sentence(&mut sentence, &mut stats);
            sink.write_sentence(&sentence)?;
        }

        info!(
            "uniformização: {} sentenças, {} entidades, {} tokens re-anotados",
            stats.sentences, stats.entities, stats.retagged_tokens
        );
        Ok(stats)
    }
}
