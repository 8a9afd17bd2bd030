//! # ner-rules-core — Pós-processamento de Anotações NER
//!
//! Este crate corrige e sobrepõe rótulos de entidades nomeadas em documentos
//! CoNLL-U Plus já anotados (por um modelo, um dicionário ou à mão).
//!
//! ## Arquitetura
//!
//! Dois pós-processadores independentes, que podem rodar sozinhos ou em
//! sequência ([`pipeline`]):
//!
//! 1.  **Motor de Regras** ([`rule_set`]): regras declarativas em JSON, cada
//!     uma uma sequência de condições quantificadas sobre tokens
//!     ([`condition`], [`rule`]). Numa janela deslizante, vence a regra que
//!     consome mais tokens.
//! 2.  **Uniformização** ([`uniform`]): descobre as entidades multi-token do
//!     documento e força todas as suas ocorrências a usarem o tipo
//!     majoritário ([`entity_type`]).
//!
//! Ambos escrevem apenas o tipo da entidade e deixam a reconstrução das
//! fronteiras `B-`/`I-` para [`bio`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use ner_rules_core::{Mode, Pipeline, RuleSet};
//!
//! let rules = RuleSet::from_json_str(r#"{
//!     "rules": [ { "name": "loc", "conditions": [
//!         { "form": "^paris$", "ann": "LOC", "max": 1 }
//!     ] } ]
//! }"#).unwrap();
//!
//! let pipeline = Pipeline::new(Some(rules), 2);
//! let input = "1\tBarack\tbarack\tO\n2\tvisitou\tvisitar\tO\n3\tParis\tparis\tO\n";
//! let (output, report) = pipeline.run(Mode::Rules, input).unwrap();
//!
//! assert!(output.contains("Paris\tparis\tB-LOC"));
//! assert_eq!(report.sentences, 1);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`token`]: campos do token, layout das colunas e normalização de tags.
//! - [`conllup`]: leitura/escrita do formato tabular.
//! - [`config`]: formato do documento de regras.
//! - [`error`]: erros do crate.

pub mod bio;
pub mod condition;
pub mod config;
pub mod conllup;
pub mod entity_type;
pub mod error;
pub mod pipeline;
pub mod rule;
pub mod rule_set;
pub mod token;
pub mod uniform;
pub mod window;

pub use conllup::{ConllupReader, ConllupWriter, Document, SentenceSink, SentenceSource};
pub use error::{Error, Result};
pub use pipeline::{Mode, Pipeline, PipelineReport};
pub use rule_set::RuleSet;
pub use token::{Sentence, Token};
pub use uniform::UniformProcessor;
