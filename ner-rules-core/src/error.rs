//! # Erros do pós-processador
//!
//! Todos os erros são fatais para o documento em processamento: não há
//! recuperação parcial nem novas tentativas. Erros de configuração surgem
//! na carga do conjunto de regras, antes de qualquer token ser lido.

use std::path::PathBuf;

/// Erros produzidos pela carga de regras, leitura/escrita de CoNLL-U Plus
/// e orquestração do pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("falha de E/S em '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("falha de E/S: {0}")]
    Stream(#[from] std::io::Error),

    #[error("documento de regras inválido: {0}")]
    Config(#[from] serde_json::Error),

    #[error("expressão regular inválida '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("regra '{rule}': limites de repetição inválidos (min={min} > max={max})")]
    InvalidBounds { rule: String, min: usize, max: usize },

    #[error("modo de capitalização inválido: {0} (esperado 0, 1 ou 2)")]
    InvalidCaseMode(u8),

    #[error("max_sequence_length deve ser >= 1")]
    InvalidSequenceLength,

    #[error("linha {line}: {message}")]
    Format { line: usize, message: String },

    #[error("o modo '{0}' exige um conjunto de regras carregado")]
    MissingRules(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Anexa o caminho do arquivo a um erro de E/S.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
