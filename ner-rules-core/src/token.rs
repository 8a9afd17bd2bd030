//! # Tokens e Sentenças Anotadas
//!
//! Um token em CoNLL-U Plus é uma linha de campos separados por TAB. Os dois
//! passes de pós-processamento só precisam de três deles:
//!
//! | Campo | Coluna nomeada | Posição usada na falta do nome |
//! |-------|----------------|--------------------------------|
//! | forma | `FORM`         | 1                              |
//! | lema  | `LEMMA`        | 2                              |
//! | tag   | `NER`          | último campo da linha          |
//!
//! A localização de cada campo é resolvida **uma única vez por documento**
//! ([`ColumnLayout::from_columns`]) e copiada para cada token, em vez de ser
//! procurada pelo nome a cada acesso.
//!
//! ## Normalização de tags
//!
//! Para comparar tipos, o prefixo BIO é descartado (`B-PER` → `PER`) e o
//! marcador vazio `_` equivale a `O`. Um token sem campo de tag também é `O`.

use serde::{Deserialize, Serialize};

/// Tag de "fora de entidade".
pub const OUTSIDE: &str = "O";

/// Valor usado pelo CoNLL-U Plus para campos sem anotação.
pub const EMPTY_FIELD: &str = "_";

/// Localização de um campo dentro da linha do token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldLocator {
    /// Posição fixa (0 = primeira coluna).
    Index(usize),
    /// Último campo da linha, seja qual for o seu tamanho.
    Last,
}

impl FieldLocator {
    fn resolve(self, len: usize) -> Option<usize> {
        match self {
            FieldLocator::Index(i) if i < len => Some(i),
            FieldLocator::Index(_) => None,
            FieldLocator::Last => len.checked_sub(1),
        }
    }
}

/// Onde ficam forma, lema e tag nas linhas de um documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub form: FieldLocator,
    pub lemma: FieldLocator,
    pub tag: FieldLocator,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            form: FieldLocator::Index(1),
            lemma: FieldLocator::Index(2),
            tag: FieldLocator::Last,
        }
    }
}

impl ColumnLayout {
    /// Resolve o layout a partir dos nomes declarados em `global.columns`.
    ///
    /// Colunas ausentes mantêm a posição padrão.
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let position = |name: &str| columns.iter().position(|c| c.as_ref() == name);
        let mut layout = Self::default();
        if let Some(i) = position("FORM") {
            layout.form = FieldLocator::Index(i);
        }
        if let Some(i) = position("LEMMA") {
            layout.lemma = FieldLocator::Index(i);
        }
        if let Some(i) = position("NER") {
            layout.tag = FieldLocator::Index(i);
        }
        layout
    }
}

/// Um token: os campos da linha, na ordem original, mais o layout do documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    fields: Vec<String>,
    layout: ColumnLayout,
}

impl Token {
    pub fn new(fields: Vec<String>, layout: ColumnLayout) -> Self {
        Self { fields, layout }
    }

    /// Atalho para testes e demos: `ID FORM LEMMA NER` com layout padrão.
    pub fn simple(index: usize, form: &str, tag: &str) -> Self {
        Self::new(
            vec![
                index.to_string(),
                form.to_string(),
                form.to_lowercase(),
                tag.to_string(),
            ],
            ColumnLayout::default(),
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    fn get(&self, locator: FieldLocator) -> Option<&str> {
        locator
            .resolve(self.fields.len())
            .map(|i| self.fields[i].as_str())
    }

    pub fn form(&self) -> Option<&str> {
        self.get(self.layout.form)
    }

    pub fn lemma(&self) -> Option<&str> {
        self.get(self.layout.lemma)
    }

    /// Tag crua, exatamente como está no campo (ex: "B-PER", "_").
    pub fn tag(&self) -> Option<&str> {
        self.get(self.layout.tag)
    }

    /// Tipo da entidade sem prefixo BIO; `O` quando não há entidade.
    pub fn normalized_tag(&self) -> &str {
        self.tag().map(normalize_tag).unwrap_or(OUTSIDE)
    }

    /// Sobrescreve a tag. Se a coluna de tag estiver além do fim da linha,
    /// os campos intermediários são preenchidos com `_`.
    pub fn set_tag(&mut self, label: &str) {
        let index = match self.layout.tag {
            FieldLocator::Index(i) => i,
            FieldLocator::Last if self.fields.is_empty() => 0,
            FieldLocator::Last => self.fields.len() - 1,
        };
        if index >= self.fields.len() {
            self.fields.resize(index + 1, EMPTY_FIELD.to_string());
        }
        self.fields[index] = label.to_string();
    }
}

/// Uma sentença: comentários que a precedem e seus tokens em ordem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub comments: Vec<String>,
    pub tokens: Vec<Token>,
    /// Comentários entre linhas de token: `(i, linha)` sai logo antes do
    /// token `i` (ou depois do último, se `i == tokens.len()`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_comments: Vec<(usize, String)>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            comments: Vec::new(),
            tokens,
            inline_comments: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tags cruas de todos os tokens (`O` para tokens sem tag).
    pub fn tags(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .map(|t| t.tag().unwrap_or(OUTSIDE))
            .collect()
    }
}

/// Remove o prefixo `B-`/`I-` e mapeia `_` para `O`.
pub fn normalize_tag(tag: &str) -> &str {
    if tag == EMPTY_FIELD {
        return OUTSIDE;
    }
    tag.strip_prefix("B-")
        .or_else(|| tag.strip_prefix("I-"))
        .unwrap_or(tag)
}

/// Aplica o mesmo rótulo a um intervalo de tokens.
///
/// É a única operação de escrita de tags usada pelo motor de regras e
/// pela uniformização; a reconstrução BIO acontece depois, em [`crate::bio`].
pub fn label_range(tokens: &mut [Token], label: &str) {
    for token in tokens {
        token.set_tag(label);
    }
}
