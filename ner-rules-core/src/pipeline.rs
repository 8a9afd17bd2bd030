//! # Pipeline de Pós-processamento
//!
//! Encadeia os dois pós-processadores sobre um documento CoNLL-U Plus:
//!
//! ```text
//! documento anotado ──► motor de regras (opcional) ──► uniformização (opcional) ──► documento
//! ```
//!
//! O conjunto de regras é carregado uma vez e reaproveitado em todas as
//! chamadas; o estado da uniformização é criado do zero a cada documento.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conllup::{ConllupReader, ConllupWriter, Document};
use crate::error::{Error, Result};
use crate::rule_set::{RuleSet, RuleStats};
use crate::token::Sentence;
use crate::uniform::{UniformProcessor, UniformStats};

/// Quais pós-processadores executar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Só o motor de regras.
    #[default]
    Rules,
    /// Só a uniformização de entidades.
    Uniform,
    /// Regras primeiro; a uniformização vê as tags já corrigidas.
    RulesThenUniform,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Rules => "rules",
            Mode::Uniform => "uniform",
            Mode::RulesThenUniform => "rules_then_uniform",
        }
    }

    pub fn needs_rules(&self) -> bool {
        matches!(self, Mode::Rules | Mode::RulesThenUniform)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "rules" => Ok(Mode::Rules),
            "uniform" => Ok(Mode::Uniform),
            "rules_then_uniform" => Ok(Mode::RulesThenUniform),
            other => Err(format!(
                "modo desconhecido '{other}' (use rules, uniform ou rules_then_uniform)"
            )),
        }
    }
}

/// Resumo de uma execução, serializável para a API HTTP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub mode: Mode,
    pub sentences: usize,
    pub tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniform: Option<UniformStats>,
    pub processing_ms: u64,
}

/// O pipeline: conjunto de regras (se houver) e `minw` da uniformização.
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: Option<RuleSet>,
    minw: usize,
}

impl Pipeline {
    pub fn new(rules: Option<RuleSet>, minw: usize) -> Self {
        Self { rules, minw }
    }

    pub fn rules(&self) -> Option<&RuleSet> {
        self.rules.as_ref()
    }

    pub fn minw(&self) -> usize {
        self.minw
    }

    fn require_rules(&self, mode: Mode) -> Result<&RuleSet> {
        self.rules.as_ref().ok_or(Error::MissingRules(mode.name()))
    }

    /// Processa um documento em memória e escreve o resultado em `out`.
    pub fn process<W: Write>(&self, mode: Mode, document: Document, out: W) -> Result<PipelineReport> {
        let start = Instant::now();
        let mut report = PipelineReport {
            mode,
            sentences: document.sentences.len(),
            tokens: document.token_count(),
            rules: None,
            uniform: None,
            processing_ms: 0,
        };

        let mut writer = ConllupWriter::new(out, document.header.clone())
            .with_trailer(document.trailer.clone());
        match mode {
            Mode::Rules => {
                let rules = self.require_rules(mode)?;
                let mut reader = ConllupReader::new(document);
                report.rules = Some(rules.process_document(&mut reader, &mut writer)?);
            }
            Mode::Uniform => {
                let mut uniform = UniformProcessor::new(self.minw);
                let mut reader = ConllupReader::new(document);
                report.uniform = Some(uniform.process_document(&mut reader, &mut writer)?);
            }
            Mode::RulesThenUniform => {
                let rules = self.require_rules(mode)?;
                let header = document.header.clone();
                let columns = document.columns.clone();
                let trailer = document.trailer.clone();

                let mut tagged: Vec<Sentence> = Vec::new();
                let mut reader = ConllupReader::new(document);
                report.rules = Some(rules.process_document(&mut reader, &mut tagged)?);

                let mut reader = ConllupReader::new(Document {
                    header,
                    columns,
                    sentences: tagged,
                    trailer,
                });
                let mut uniform = UniformProcessor::new(self.minw);
                report.uniform = Some(uniform.process_document(&mut reader, &mut writer)?);
            }
        }
        writer.finish()?;

        report.processing_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Processa texto CoNLL-U Plus e devolve o texto resultante.
    pub fn run(&self, mode: Mode, text: &str) -> Result<(String, PipelineReport)> {
        let document = Document::parse(text)?;
        let mut out = Vec::new();
        let report = self.process(mode, document, &mut out)?;
        Ok((String::from_utf8_lossy(&out).into_owned(), report))
    }

    /// Lê `input`, processa e grava em `output`.
    pub fn run_paths(&self, mode: Mode, input: &Path, output: &Path) -> Result<PipelineReport> {
        let document = Document::from_path(input)?;
        let file = File::create(output).map_err(|e| Error::io(output, e))?;
        let report = self.process(mode, document, BufWriter::new(file))?;
        info!(
            "{} → {} [{}]: {} sentenças em {} ms",
            input.display(),
            output.display(),
            mode,
            report.sentences,
            report.processing_ms
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "max_sequence_length": 10,
        "rules": [
            { "name": "nome_proprio", "conditions": [
                { "formFirstLetter": 1, "ner": "^O$", "ann": "PER", "min": 2, "max": 3 }
            ] }
        ]
    }"#;

    const DOC: &str = "# global.columns = ID FORM LEMMA NER\n\
# sent_id = 1\n\
1\tGetúlio\tgetúlio\tO\n\
2\tVargas\tvargas\tO\n\
3\tgovernou\tgovernar\tO\n\
\n\
# sent_id = 2\n\
1\tVargas\tvargas\tO\n\
2\tGetúlio\tgetúlio\tB-LOC\n\
3\tmorreu\tmorrer\tO\n\
\n";

    fn pipeline() -> Pipeline {
        Pipeline::new(Some(RuleSet::from_json_str(RULES).unwrap()), 2)
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("rules".parse::<Mode>(), Ok(Mode::Rules));
        assert_eq!("rules-then-uniform".parse::<Mode>(), Ok(Mode::RulesThenUniform));
        assert!("crf".parse::<Mode>().is_err());
        assert_eq!(serde_json::to_string(&Mode::Uniform).unwrap(), "\"uniform\"");
    }

    #[test]
    fn test_rules_only() {
        let (out, report) = pipeline().run(Mode::Rules, DOC).unwrap();
        let doc = Document::parse(&out).unwrap();
        assert_eq!(doc.sentences[0].tags(), vec!["B-PER", "I-PER", "O"]);
        // "Getúlio" já era LOC, então ^O$ não casa e "Vargas" sozinho não basta
        assert_eq!(doc.sentences[1].tags(), vec!["O", "B-LOC", "O"]);
        assert_eq!(report.sentences, 2);
        assert!(report.uniform.is_none());
    }

    #[test]
    fn test_rules_then_uniform_propagates() {
        let (out, report) = pipeline().run(Mode::RulesThenUniform, DOC).unwrap();
        let doc = Document::parse(&out).unwrap();
        assert_eq!(doc.sentences[1].tags(), vec!["B-PER", "I-PER", "O"]);
        assert_eq!(report.uniform.as_ref().unwrap().entities, 1);
        assert_eq!(doc.sentences[1].comments, vec!["# sent_id = 2"]);
        assert!(out.starts_with("# global.columns = ID FORM LEMMA NER\n"));
    }

    #[test]
    fn test_comments_are_kept_in_every_mode() {
        let text = "# global.columns = ID FORM LEMMA NER\n\
1\tGetúlio\tgetúlio\tO\n\
# nota\n\
2\tVargas\tvargas\tO\n\
\n\
# fim\n";
        for mode in [Mode::Rules, Mode::Uniform, Mode::RulesThenUniform] {
            let (out, _) = pipeline().run(mode, text).unwrap();
            let doc = Document::parse(&out).unwrap();
            assert_eq!(doc.sentences[0].inline_comments, vec![(1, "# nota".to_string())]);
            assert!(out.ends_with("\n\n# fim\n"), "{mode}: {out:?}");
        }
    }

    #[test]
    fn test_rules_mode_without_rules_is_error() {
        let p = Pipeline::new(None, 2);
        assert!(matches!(p.run(Mode::Rules, DOC), Err(Error::MissingRules("rules"))));
        assert!(p.run(Mode::Uniform, DOC).is_ok());
    }

    #[test]
    fn test_run_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.conllup");
        let output = dir.path().join("out.conllup");
        std::fs::write(&input, DOC).unwrap();

        let report = pipeline().run_paths(Mode::Rules, &input, &output).unwrap();
        assert_eq!(report.tokens, 6);
        let written = Document::from_path(&output).unwrap();
        assert_eq!(written.sentences[0].tags(), vec!["B-PER", "I-PER", "O"]);
    }

    #[test]
    fn test_missing_input_reports_path() {
        let missing = Path::new("/nao/existe.conllup");
        match pipeline().run_paths(Mode::Rules, missing, Path::new("/tmp/x.conllup")) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("esperado erro de E/S, veio {other:?}"),
        }
    }
}
