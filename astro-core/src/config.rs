//! # Configuração
//!
//! Lida de um arquivo TOML e/ou de variáveis de ambiente, com padrões para
//! desenvolvimento local.
//!
//! ```toml
//! [lexicon]
//! path = "resources/lexicon/astroVoc.txt"
//!
//! [tagger]
//! command = "wapiti"
//! args = ["label", "-m", "resources/models/astro.wapiti"]
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8060
//!
//! [logging]
//! level = "info"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::lexicon::AstroLexicon;
use crate::pipeline::AstroParser;
use crate::tagger::{CommandLabeler, LexiconLabeler, SequenceLabeler};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AstroConfig {
    pub lexicon: LexiconConfig,
    pub tagger: TaggerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Lista de nomes astronômicos, um por linha.
    pub path: PathBuf,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("resources/lexicon/astroVoc.txt"),
        }
    }
}

/// Etiquetador externo. Sem `command`, usa o rotulador do gazetteer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8060,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filtro do `tracing-subscriber` (ex: `info`, `astro_core=debug`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AstroConfig {
    /// Configuração padrão sobrescrita pelas variáveis de ambiente.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Carrega de um arquivo TOML (seções ausentes ficam com o padrão).
    pub fn from_file(path: impl Into<PathBuf>) -> std::result::Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Arquivo TOML opcional seguido das variáveis de ambiente; sem arquivo, só o ambiente.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?.with_env_override()?,
            None => Self::from_env()?,
        };
        Ok(config)
    }

    /// Variáveis de ambiente definidas têm precedência sobre o arquivo.
    pub fn with_env_override(self) -> std::result::Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, ConfigError> {
        if let Some(path) = var("ASTRO_LEXICON_PATH") {
            self.lexicon.path = PathBuf::from(path);
        }

        if let Some(command) = var("ASTRO_TAGGER_CMD") {
            let command = command.trim().to_string();
            self.tagger.command = (!command.is_empty()).then_some(command);
        }
        if let Some(args) = var("ASTRO_TAGGER_ARGS") {
            self.tagger.args = args.split_whitespace().map(str::to_string).collect();
        }

        if let Some(host) = var("ASTRO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("ASTRO_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ASTRO_PORT".to_string(),
                value: port,
            })?;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(self)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn build_labeler(&self) -> Arc<dyn SequenceLabeler> {
        match &self.tagger.command {
            Some(command) => Arc::new(CommandLabeler::new(command, self.tagger.args.clone())),
            None => Arc::new(LexiconLabeler),
        }
    }

    /// Carrega o léxico e monta o contexto de processamento. Falha aqui é fatal.
    pub fn build_parser(&self) -> Result<AstroParser> {
        let lexicon = AstroLexicon::from_file(&self.lexicon.path)?;
        Ok(AstroParser::new(Arc::new(lexicon), self.build_labeler()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Falha ao ler o arquivo de configuração {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Falha ao interpretar o arquivo de configuração {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Valor inválido para {key}: {value}")]
    InvalidValue { key: String, value: String },
}
