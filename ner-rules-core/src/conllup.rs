//! # Leitura e Escrita de CoNLL-U Plus
//!
//! Formato tabular usado por todos os módulos de anotação:
//!
//! ```text
//! # global.columns = ID FORM LEMMA NER
//! # sent_id = 1
//! 1	Lula	lula	B-PER
//! 2	visitou	visitar	O
//!
//! # sent_id = 2
//! ...
//! ```
//!
//! - Linhas iniciadas por `#` são comentários; `global.columns` declara os
//!   nomes das colunas e define o [`ColumnLayout`] do documento inteiro.
//! - Linhas em branco separam sentenças.
//! - Campos são separados por TAB.
//!
//! O documento é lido inteiro para a memória. Assim a uniformização pode
//! reler as mesmas sentenças ([`SentenceSource::rewind`]) sem reabrir o arquivo.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::{ColumnLayout, Sentence, Token};

const COLUMNS_PREFIX: &str = "# global.columns =";

/// Documento CoNLL-U Plus em memória.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Comentários do cabeçalho (inclui a linha `global.columns`).
    pub header: Vec<String>,
    /// Nomes declarados das colunas, se houver.
    pub columns: Option<Vec<String>>,
    pub sentences: Vec<Sentence>,
    /// Comentários depois da última sentença.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailer: Vec<String>,
}

impl Document {
    /// Faz o parse de um documento inteiro.
    ///
    /// Comentários que aparecem antes da primeira linha em branco e antes de
    /// qualquer token pertencem ao cabeçalho. Um comentário entre tokens fica
    /// na posição em que apareceu; os demais ficam presos à sentença
    /// seguinte, ou ao final do documento se não houver outra.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = Document::default();
        let mut layout = ColumnLayout::default();
        let mut current = Sentence::default();
        let mut in_header = true;

        for (n, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');

            if line.trim().is_empty() {
                in_header = false;
                if !current.tokens.is_empty() {
                    doc.sentences.push(std::mem::take(&mut current));
                }
                continue;
            }

            if line.starts_with('#') {
                if let Some(names) = line.strip_prefix(COLUMNS_PREFIX) {
                    let names: Vec<String> =
                        names.split_whitespace().map(str::to_string).collect();
                    layout = ColumnLayout::from_columns(&names);
                    doc.columns = Some(names);
                    doc.header.push(line.to_string());
                } else if in_header && current.tokens.is_empty() && doc.sentences.is_empty() {
                    doc.header.push(line.to_string());
                } else if !current.tokens.is_empty() {
                    let at = current.tokens.len();
                    current.inline_comments.push((at, line.to_string()));
                } else {
                    current.comments.push(line.to_string());
                }
                continue;
            }

            // comentários soltos no topo (sem linha em branco) eram da 1ª sentença
            if in_header && current.tokens.is_empty() && doc.sentences.is_empty() {
                in_header = false;
                let (header, sentence): (Vec<_>, Vec<_>) = doc
                    .header
                    .drain(..)
                    .partition(|c| c.starts_with(COLUMNS_PREFIX));
                doc.header = header;
                current.comments = sentence;
            }

            let fields: Vec<String> = line.split('\t').map(str::to_string).collect();
            if let Some(columns) = &doc.columns {
                if fields.len() != columns.len() {
                    return Err(Error::Format {
                        line: n + 1,
                        message: format!(
                            "esperados {} campos (global.columns), encontrados {}",
                            columns.len(),
                            fields.len()
                        ),
                    });
                }
            }
            current.tokens.push(Token::new(fields, layout));
        }

        if current.tokens.is_empty() {
            doc.trailer = current.comments;
        } else {
            doc.sentences.push(current);
        }
        Ok(doc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    /// Serializa de volta para texto CoNLL-U Plus.
    pub fn to_conllup(&self) -> String {
        let mut out = Vec::new();
        let mut writer =
            ConllupWriter::new(&mut out, self.header.clone()).with_trailer(self.trailer.clone());
        // escrever em um Vec<u8> não falha
        for sentence in &self.sentences {
            let _ = writer.write_sentence(sentence);
        }
        let _ = writer.finish();
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}

/// Fonte de sentenças de um documento.
pub trait SentenceSource {
    /// Próxima sentença, ou `None` no fim do documento.
    fn read_sentence(&mut self) -> Result<Option<Sentence>>;

    /// Volta ao início do documento para uma segunda leitura.
    fn rewind(&mut self) -> Result<()>;
}

/// Destino das sentenças processadas.
pub trait SentenceSink {
    fn write_sentence(&mut self, sentence: &Sentence) -> Result<()>;
}

/// Leitor sobre um documento já carregado; `rewind` é só zerar o cursor.
#[derive(Debug, Clone)]
pub struct ConllupReader {
    document: Document,
    cursor: usize,
}

impl ConllupReader {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            cursor: 0,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Document::parse(text).map(Self::new)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Document::from_path(path).map(Self::new)
    }

    pub fn header(&self) -> &[String] {
        &self.document.header
    }
}

impl SentenceSource for ConllupReader {
    fn read_sentence(&mut self) -> Result<Option<Sentence>> {
        let sentence = self.document.sentences.get(self.cursor).cloned();
        if sentence.is_some() {
            self.cursor += 1;
        }
        Ok(sentence)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }
}

/// Escritor CoNLL-U Plus: cabeçalho uma vez, depois cada sentença seguida
/// de uma linha em branco e, no `finish`, os comentários finais.
pub struct ConllupWriter<W: Write> {
    out: W,
    header: Vec<String>,
    header_written: bool,
    trailer: Vec<String>,
}

impl<W: Write> ConllupWriter<W> {
    pub fn new(out: W, header: Vec<String>) -> Self {
        Self {
            out,
            header,
            header_written: false,
            trailer: Vec::new(),
        }
    }

    /// Comentários escritos depois da última sentença.
    pub fn with_trailer(mut self, trailer: Vec<String>) -> Self {
        self.trailer = trailer;
        self
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            for line in &self.header {
                writeln!(self.out, "{line}")?;
            }
            self.header_written = true;
        }
        Ok(())
    }

    /// Garante que o cabeçalho saia mesmo em documentos sem sentenças.
    pub fn finish(mut self) -> Result<W> {
        self.write_header()?;
        for line in &self.trailer {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SentenceSink for ConllupWriter<W> {
    fn write_sentence(&mut self, sentence: &Sentence) -> Result<()> {
        self.write_header()?;
        for comment in &sentence.comments {
            writeln!(self.out, "{comment}")?;
        }
        let mut inline = sentence.inline_comments.iter().peekable();
        for (i, token) in sentence.tokens.iter().enumerate() {
            while let Some((_, comment)) = inline.next_if(|(at, _)| *at <= i) {
                writeln!(self.out, "{comment}")?;
            }
            writeln!(self.out, "{}", token.fields().join("\t"))?;
        }
        for (_, comment) in inline {
            writeln!(self.out, "{comment}")?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

/// Sentenças acumuladas em memória; útil para testes e para encadear passes.
impl SentenceSink for Vec<Sentence> {
    fn write_sentence(&mut self, sentence: &Sentence) -> Result<()> {
        self.push(sentence.clone());
        Ok(())
    }
}
