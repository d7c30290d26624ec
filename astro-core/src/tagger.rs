//! # Rótulos e Etiquetador de Sequência
//!
//! O núcleo não treina nem executa modelos: ele delega a rotulação a um
//! [`SequenceLabeler`], uma função pura de "texto de features" para "texto de rótulos".
//!
//! ## Rótulos
//!
//! | Rótulo        | Significado                                   |
//! |---------------|-----------------------------------------------|
//! | `<object>`    | token faz parte de um nome astronômico        |
//! | `<other>`     | token fora de entidade                        |
//! | `I-<object>`  | **início** de um novo nome (prefixo `I-`)     |
//!
//! O prefixo `I-` marca o *primeiro* token de uma entidade (convenção dos dados de
//! treino), não a continuação como no BIO clássico.
//!
//! ## Saída do etiquetador
//!
//! Cada linha não vazia da saída contribui com um rótulo: o último campo separado por
//! espaço. Assim tanto listas simples de rótulos quanto a saída do Wapiti/CRF++ (que
//! repete as colunas de entrada) são aceitas.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AstroError, Result};

pub const OBJECT_LABEL: &str = "<object>";
pub const OTHER_LABEL: &str = "<other>";
/// Prefixo que marca o primeiro token de uma entidade.
pub const BEGIN_PREFIX: &str = "I-";

/// Rótulo (sem o prefixo de início).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AstroLabel {
    Object,
    Other,
    /// Rótulo bem formado porém desconhecido: participa do agrupamento mas nunca vira entidade.
    Custom(String),
}

impl AstroLabel {
    pub fn as_str(&self) -> &str {
        match self {
            AstroLabel::Object => OBJECT_LABEL,
            AstroLabel::Other => OTHER_LABEL,
            AstroLabel::Custom(name) => name,
        }
    }
}

/// Rótulo de um token de conteúdo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub label: AstroLabel,
    /// `true` quando o rótulo veio com o prefixo `I-` (abre um novo grupo).
    pub begin: bool,
}

impl Tag {
    pub fn object(begin: bool) -> Self {
        Self {
            label: AstroLabel::Object,
            begin,
        }
    }

    pub fn other() -> Self {
        Self {
            label: AstroLabel::Other,
            begin: false,
        }
    }

    /// Interpreta um rótulo textual.
    ///
    /// Aceita prefixo `I-` ou `B-` e sinais `<...>` opcionais; `object`/`other` sem
    /// distinção de maiúsculas. Devolve `None` para rótulos mal formados.
    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (begin, rest) = match raw.strip_prefix(BEGIN_PREFIX).or_else(|| raw.strip_prefix("B-")) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let name = match (rest.strip_prefix('<'), rest.ends_with('>')) {
            (Some(inner), true) => &inner[..inner.len() - 1],
            (None, false) => rest,
            _ => return None,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return None;
        }

        let label = if name.eq_ignore_ascii_case("object") {
            AstroLabel::Object
        } else if name.eq_ignore_ascii_case("other") || name == "O" {
            AstroLabel::Other
        } else {
            AstroLabel::Custom(rest.to_string())
        };
        Some(Self { label, begin })
    }

    /// Forma textual usada nos dados de treino (`I-<object>`, `<other>`...).
    pub fn to_label(&self) -> String {
        if self.begin {
            format!("{BEGIN_PREFIX}{}", self.label.as_str())
        } else {
            self.label.as_str().to_string()
        }
    }

    pub fn is_object(&self) -> bool {
        self.label == AstroLabel::Object
    }
}

/// Extrai um rótulo por linha não vazia da saída do etiquetador.
pub fn parse_labels(output: &str) -> Vec<Option<Tag>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split_whitespace().last().and_then(Tag::from_label))
        .collect()
}

/// Função de rotulação de sequência: features (uma linha por token, linha vazia entre
/// sequências) → rótulos (um por linha de features não vazia).
pub trait SequenceLabeler: Send + Sync {
    fn name(&self) -> &str;
    fn label(&self, features: &str) -> Result<String>;
}

/// Executa um binário externo de CRF (ex: `wapiti label -m model.wapiti`).
///
/// As features vão pelo stdin; os rótulos são lidos do stdout.
#[derive(Debug, Clone)]
pub struct CommandLabeler {
    program: String,
    args: Vec<String>,
}

impl CommandLabeler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SequenceLabeler for CommandLabeler {
    fn name(&self) -> &str {
        &self.program
    }

    fn label(&self, features: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AstroError::Labeling(format!("{}: {e}", self.program)))?;

        // escreve em outra thread: o processo pode encher o stdout antes de ler tudo
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AstroError::Labeling("stdin indisponível".to_string()))?;
        let input = features.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        // stdout e stderr são drenados juntos
        let output = child
            .wait_with_output()
            .map_err(|e| AstroError::Labeling(format!("{}: {e}", self.program)))?;
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) if !output.status.success() => {
                debug!("stdin do etiquetador fechado cedo: {e}");
            }
            Ok(Err(e)) => return Err(AstroError::Labeling(format!("stdin: {e}"))),
            Err(_) => return Err(AstroError::Labeling("escrita no stdin abortada".to_string())),
        }
        if !output.status.success() {
            return Err(AstroError::Labeling(format!(
                "{} terminou com {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| AstroError::Labeling(format!("stdout: {e}")))
    }
}

/// Coluna do vetor de features com o sinal "dentro de um span do gazetteer".
const SPAN_COLUMN: usize = 17;

/// Rotulador determinístico: todo token dentro de um nome casado pelo gazetteer é
/// `<object>`; o primeiro de cada sequência contígua recebe `I-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconLabeler;

impl SequenceLabeler for LexiconLabeler {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn label(&self, features: &str) -> Result<String> {
        let mut output = String::new();
        let mut inside = false;
        for line in features.lines() {
            if line.trim().is_empty() {
                inside = false;
                continue;
            }
            let columns: Vec<&str> = line.split_whitespace().collect();
            let flagged = columns.get(SPAN_COLUMN) == Some(&"1");
            let tag = match (flagged, inside) {
                (true, false) => Tag::object(true),
                (true, true) => Tag::object(false),
                (false, _) => Tag::other(),
            };
            inside = flagged;
            output.push_str(columns.first().copied().unwrap_or_default());
            output.push(' ');
            output.push_str(&tag.to_label());
            output.push('\n');
        }
        Ok(output)
    }
}
