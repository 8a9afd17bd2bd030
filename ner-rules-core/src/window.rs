//! Janela deslizante sobre os tokens de uma sentença.
//!
//! O buffer FIFO dos dois passes nunca atravessa o fim da sentença, só cresce
//! pelo fim e só encolhe pelo início. Por isso ele é sempre um intervalo
//! contíguo `[start, end)` da sentença e pode ser representado por dois índices.

use std::ops::Range;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acrescenta o próximo token da sentença ao fim do buffer.
    pub fn push(&mut self) {
        self.end += 1;
    }

    /// Descarta `n` tokens do início do buffer (no máximo o buffer inteiro).
    pub fn evict(&mut self, n: usize) {
        self.start = (self.start + n).min(self.end);
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
