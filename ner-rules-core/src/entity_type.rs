//! Histograma de tipos observados para uma mesma entidade.
//!
//! A ordem de inserção é preservada: em empate na contagem, vence o tipo
//! visto primeiro.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityType {
    counts: Vec<(String, usize)>,
}

impl EntityType {
    pub fn new(label: &str) -> Self {
        Self {
            counts: vec![(label.to_string(), 1)],
        }
    }

    /// Registra mais uma ocorrência de `label`.
    pub fn record(&mut self, label: &str) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((label.to_string(), 1)),
        }
    }

    /// Tipo majoritário.
    pub fn majority(&self) -> &str {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(l, _)| l.as_str()).unwrap_or_default()
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(l, n)| (l.as_str(), *n))
    }
}
