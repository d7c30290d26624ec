//! # Erros do pipeline astro
//!
//! Três famílias de falha chegam ao chamador:
//! - **Inicialização**: o arquivo de vocabulário não existe ou não pode ser lido.
//! - **Rotulação**: o etiquetador externo falhou ou devolveu uma quantidade de rótulos
//!   diferente da quantidade de linhas de features. A unidade inteira é descartada.
//! - **Configuração**: arquivo ou variável de ambiente inválidos ([`ConfigError`],
//!   vindo de [`AstroConfig::load`](crate::config::AstroConfig::load)).
//!
//! Texto vazio nunca é erro: produz uma lista vazia de entidades.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AstroError {
    #[error("Não foi possível inicializar o dicionário astro: o arquivo '{path}' não existe")]
    LexiconMissing { path: PathBuf },

    #[error("Não foi possível ler o dicionário astro '{path}': {source}")]
    LexiconUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Falha na rotulação CRF do texto astro: {0}")]
    Labeling(String),

    #[error("Rótulos desalinhados: {expected} linhas de features, {found} rótulos")]
    LabelMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, AstroError>;

impl AstroError {
    /// Falhas de rotulação afetam só a unidade (parágrafo/segmento) corrente.
    pub fn is_labeling_failure(&self) -> bool {
        matches!(self, AstroError::Labeling(_) | AstroError::LabelMismatch { .. })
    }
}
