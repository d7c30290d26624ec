//! # Entidade Astronômica
//!
//! Resultado final do pipeline: um nome astronômico localizado por offsets de
//! **caracteres** (não bytes) no texto de entrada.
//!
//! ## JSON
//!
//! ```json
//! {"rawForm": "GRB 050219", "type": "OBJECT", "offsetStart": 0, "offsetEnd": 10, "conf": 0.8}
//! ```
//!
//! Campos opcionais ausentes (`normalizedForm`, `type`, `id`) são omitidos;
//! `offsetStart`, `offsetEnd` e `conf` estão sempre presentes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::lexicon::AstroType;
use crate::tokenizer::{LayoutInfo, Token};

/// Confiança atribuída às entidades produzidas pelo pipeline.
pub const DEFAULT_CONF: f64 = 0.8;

/// Origem da entidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstroEntity {
    pub raw_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_form: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<AstroType>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub offset_start: usize,
    pub offset_end: usize,
    pub conf: f64,
    #[serde(skip)]
    pub origin: Origin,
    /// Tokens do grupo que originou a entidade.
    #[serde(skip)]
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounding_boxes: Vec<LayoutInfo>,
}

impl AstroEntity {
    pub fn new(raw_form: impl Into<String>, offset_start: usize, offset_end: usize) -> Self {
        Self {
            raw_form: raw_form.into(),
            normalized_form: None,
            entity_type: None,
            entity_id: None,
            offset_start,
            offset_end,
            conf: DEFAULT_CONF,
            origin: Origin::System,
            tokens: Vec::new(),
            bounding_boxes: Vec::new(),
        }
    }

    /// Entidade do tipo `OBJECT` com tokens e caixas (deduplicadas) do layout.
    pub fn object(
        raw_form: impl Into<String>,
        offset_start: usize,
        offset_end: usize,
        tokens: Vec<Token>,
    ) -> Self {
        let mut bounding_boxes: Vec<LayoutInfo> = Vec::new();
        for layout in tokens.iter().filter_map(|t| t.layout.as_ref()) {
            if !bounding_boxes.contains(layout) {
                bounding_boxes.push(layout.clone());
            }
        }
        Self {
            entity_type: Some(AstroType::Object),
            tokens,
            bounding_boxes,
            ..Self::new(raw_form, offset_start, offset_end)
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl PartialEq for AstroEntity {
    fn eq(&self, other: &Self) -> bool {
        self.offset_start == other.offset_start && self.offset_end == other.offset_end
    }
}

impl Eq for AstroEntity {}

impl PartialOrd for AstroEntity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AstroEntity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset_start
            .cmp(&other.offset_start)
            .then(self.offset_end.cmp(&other.offset_end))
    }
}
