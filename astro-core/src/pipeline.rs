//! # Pipeline Astro — Orquestrador com Eventos Observáveis
//!
//! O [`AstroParser`] é o contexto explícito do processamento: guarda o léxico
//! (construído uma vez, compartilhado via `Arc`) e o etiquetador. Cada chamada executa
//!
//! ```text
//! tokens → gazetteer → features → etiquetador → rótulos → decodificador → entidades
//! ```
//!
//! e pode emitir [`PipelineEvent`]s por um canal `mpsc`, para que o servidor
//! WebSocket transmita o progresso em tempo real.
//!
//! Falhas do etiquetador descartam a unidade inteira (`Err`), o que é diferente de
//! "nenhuma entidade" (`Ok(vec![])`).

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decoder::decode;
use crate::entity::AstroEntity;
use crate::error::{AstroError, Result};
use crate::features::{add_features, feature_line_count};
use crate::lexicon::{AstroLexicon, OffsetPosition};
use crate::tagger::{parse_labels, SequenceLabeler, Tag};
use crate::tokenizer::{retokenize, to_text, tokenize, Token};

/// Eventos emitidos durante o processamento de uma unidade de texto.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: texto tokenizado.
    TokenizationDone { tokens: Vec<Token>, total: usize },
    /// **Passo 2**: nomes conhecidos localizados pelo gazetteer.
    GazetteerMatched { positions: Vec<OffsetPosition> },
    /// **Passo 3**: vetor de features pronto para o etiquetador.
    FeaturesEncoded { lines: usize, features: String },
    /// **Passo 4**: rótulos devolvidos pelo etiquetador, alinhados aos tokens de conteúdo.
    Labeled { labeler: String, tags: Vec<Option<Tag>> },
    /// **Conclusão**: entidades e estatísticas de tempo.
    Done {
        entities: Vec<AstroEntity>,
        total_tokens: usize,
        processing_ms: u64,
    },
    /// **Falha**: a unidade foi descartada.
    Error { message: String },
}

fn emit(tx: Option<&mpsc::Sender<PipelineEvent>>, event: impl FnOnce() -> PipelineEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event());
    }
}

/// Contexto de reconhecimento de nomes astronômicos.
#[derive(Clone)]
pub struct AstroParser {
    lexicon: Arc<AstroLexicon>,
    labeler: Arc<dyn SequenceLabeler>,
}

impl AstroParser {
    pub fn new(lexicon: Arc<AstroLexicon>, labeler: Arc<dyn SequenceLabeler>) -> Self {
        Self { lexicon, labeler }
    }

    pub fn lexicon(&self) -> &AstroLexicon {
        &self.lexicon
    }

    pub fn labeler_name(&self) -> &str {
        self.labeler.name()
    }

    /// Processa um texto simples (sem layout).
    ///
    /// Quebras de linha e tabulações viram espaços antes da tokenização; os offsets
    /// das entidades são offsets de caracteres no texto recebido.
    pub fn process_text(&self, text: &str) -> Result<Vec<AstroEntity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let text = text.replace(['\n', '\t'], " ");
        let tokens = tokenize(&text);
        self.run(&text, &tokens, None)
    }

    /// Processa uma sequência de tokens pré-segmentados (ex: parágrafo de um PDF).
    ///
    /// Os tokens são re-tokenizados (herdando o layout) e os offsets se referem à
    /// concatenação dos seus textos.
    pub fn process_tokens(&self, tokens: &[Token]) -> Result<Vec<AstroEntity>> {
        let tokens = retokenize(tokens);
        let text = to_text(&tokens);
        self.run(&text, &tokens, None)
    }

    /// Tabelas e figuras: cada linha (separada por tokens `"\n"`) é uma unidade própria.
    ///
    /// Os offsets de cada entidade são relativos à sua linha.
    pub fn process_table_figure_tokens(&self, tokens: &[Token]) -> Result<Vec<AstroEntity>> {
        let tokens = retokenize(tokens);
        let mut entities = Vec::new();
        for line in tokens.split(|t| t.text == "\n") {
            if line.is_empty() {
                continue;
            }
            let text = to_text(line);
            entities.extend(self.run(&text, line, None)?);
        }
        Ok(entities)
    }

    /// Processa segmentos independentes em paralelo (rayon), um `Result` por segmento.
    pub fn process_segments<S>(&self, segments: &[S]) -> Vec<Result<Vec<AstroEntity>>>
    where
        S: AsRef<str> + Sync,
    {
        segments
            .par_iter()
            .enumerate()
            .map(|(i, segment)| {
                let result = self.process_text(segment.as_ref());
                if let Err(e) = &result {
                    warn!("Segmento {} descartado: {}", i, e);
                }
                result
            })
            .collect()
    }

    /// Versão de [`process_text`](Self::process_text) que empurra [`PipelineEvent`]s
    /// pelo canal `tx`, terminando sempre com `Done` ou `Error`.
    pub fn process_text_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();
        let normalized = text.replace(['\n', '\t'], " ");
        let tokens = tokenize(&normalized);
        let total_tokens = tokens.len();

        let result = if text.trim().is_empty() {
            Ok(Vec::new())
        } else {
            self.run(&normalized, &tokens, Some(&tx))
        };

        match result {
            Ok(entities) => {
                let _ = tx.send(PipelineEvent::Done {
                    entities,
                    total_tokens,
                    processing_ms: start.elapsed().as_millis() as u64,
                });
            }
            Err(e) => {
                let _ = tx.send(PipelineEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn run(
        &self,
        text: &str,
        tokens: &[Token],
        tx: Option<&mpsc::Sender<PipelineEvent>>,
    ) -> Result<Vec<AstroEntity>> {
        emit(tx, || PipelineEvent::TokenizationDone {
            tokens: tokens.to_vec(),
            total: tokens.len(),
        });

        let expected = tokens.iter().filter(|t| !t.is_blank()).count();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let positions = self.lexicon.token_positions(tokens);
        emit(tx, || PipelineEvent::GazetteerMatched {
            positions: positions.clone(),
        });

        let features = add_features(tokens, &positions, |t| self.lexicon.in_dictionary(t));
        emit(tx, || PipelineEvent::FeaturesEncoded {
            lines: feature_line_count(&features),
            features: features.clone(),
        });

        let output = self.labeler.label(&features)?;
        let tags = parse_labels(&output);
        if tags.len() != expected {
            return Err(AstroError::LabelMismatch {
                expected,
                found: tags.len(),
            });
        }
        emit(tx, || PipelineEvent::Labeled {
            labeler: self.labeler.name().to_string(),
            tags: tags.clone(),
        });

        let entities = decode(text, tokens, &tags);
        debug!(
            "{} tokens, {} spans do gazetteer, {} entidades",
            tokens.len(),
            positions.len(),
            entities.len()
        );
        Ok(entities)
    }
}
