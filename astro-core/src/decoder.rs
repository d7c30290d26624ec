//! # Decodificador de Spans
//!
//! Converte a sequência de rótulos do etiquetador de volta em entidades com offsets
//! de caracteres no texto original, em duas etapas:
//!
//! 1. **Agrupamento** ([`cluster_tokens`]): tokens consecutivos com o mesmo rótulo
//!    formam um [`TokenCluster`]. Um rótulo com prefixo `I-` sempre abre um grupo novo.
//!    Tokens em branco (e tokens sem rótulo reconhecido) ficam pendentes e entram no
//!    grupo do próximo token de conteúdo; os pendentes no fim entram no último grupo.
//! 2. **Cursor de offsets** ([`OffsetCursor`]): percorre os grupos em ordem mantendo a
//!    posição `pos` no texto. A aritmética abaixo é exatamente a esperada pelos dados
//!    de treino; a ordem dos cortes (quebra de linha antes de espaço) importa.
//!
//! ```text
//! 1. pula um ' ' em pos, depois um '\n' em pos (só se pos + 1 < len)
//! 2. end = pos + Σ len(token)   (um " " no início do grupo não conta)
//! 3. end = min(end, len); corta um '\n' final, depois um ' ' final; end >= pos
//! 4. grupo <object> → entidade (pos, end)
//! 5. pos = end
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::AstroEntity;
use crate::tagger::{AstroLabel, Tag};
use crate::tokenizer::{to_text, Token};

/// Sequência máxima de tokens consecutivos com o mesmo rótulo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCluster {
    pub label: AstroLabel,
    pub tokens: Vec<Token>,
}

impl TokenCluster {
    pub fn text(&self) -> String {
        to_text(&self.tokens)
    }
}

/// Agrupa os tokens pelos rótulos.
///
/// `tags` tem um elemento por token de conteúdo (`None` = rótulo ausente ou inválido).
pub fn cluster_tokens(tokens: &[Token], tags: &[Option<Tag>]) -> Vec<TokenCluster> {
    let mut clusters: Vec<TokenCluster> = Vec::new();
    let mut current: Option<TokenCluster> = None;
    let mut pending: Vec<Token> = Vec::new();
    let mut tags = tags.iter();

    for token in tokens {
        if token.is_blank() {
            pending.push(token.clone());
            continue;
        }
        let Some(tag) = tags.next().cloned().flatten() else {
            pending.push(token.clone());
            continue;
        };

        match current.as_mut() {
            Some(cluster) if cluster.label == tag.label && !tag.begin => {
                cluster.tokens.append(&mut pending);
                cluster.tokens.push(token.clone());
            }
            _ => {
                if let Some(done) = current.take() {
                    clusters.push(done);
                }
                let mut cluster_tokens = std::mem::take(&mut pending);
                cluster_tokens.push(token.clone());
                current = Some(TokenCluster {
                    label: tag.label,
                    tokens: cluster_tokens,
                });
            }
        }
    }

    if let Some(mut last) = current {
        last.tokens.append(&mut pending);
        clusters.push(last);
    }
    clusters
}

/// Cursor de posição (em caracteres) sobre o texto do segmento.
#[derive(Debug, Clone)]
pub struct OffsetCursor {
    chars: Vec<char>,
    pos: usize,
}

impl OffsetCursor {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Avança sobre um grupo e devolve o intervalo `(início, fim)` que ele ocupa.
    pub fn advance(&mut self, cluster: &TokenCluster) -> (usize, usize) {
        let len = self.chars.len();

        for skipped in [' ', '\n'] {
            if self.pos + 1 < len && self.char_at(self.pos) == Some(skipped) {
                self.pos += 1;
            }
        }

        let mut end = self.pos;
        for (i, token) in cluster.tokens.iter().enumerate() {
            if i == 0 && token.text == " " {
                continue;
            }
            end += token.text.chars().count();
        }

        end = end.min(len);
        if end > 0 && self.char_at(end - 1) == Some('\n') {
            end -= 1;
        }
        if end > 0 && self.char_at(end - 1) == Some(' ') {
            end -= 1;
        }
        end = end.max(self.pos);

        let start = self.pos;
        self.pos = end;
        (start, end)
    }
}

/// Percorre os grupos e materializa as entidades `<object>`, em ordem de offset.
pub fn extract_entities(text: &str, clusters: &[TokenCluster]) -> Vec<AstroEntity> {
    let mut cursor = OffsetCursor::new(text);
    let mut entities = Vec::new();

    for cluster in clusters {
        let (start, end) = cursor.advance(cluster);
        if cluster.label == AstroLabel::Object {
            entities.push(AstroEntity::object(
                cluster.text().trim(),
                start,
                end,
                cluster.tokens.clone(),
            ));
        }
    }
    entities
}

/// Agrupamento + extração.
pub fn decode(text: &str, tokens: &[Token], tags: &[Option<Tag>]) -> Vec<AstroEntity> {
    extract_entities(text, &cluster_tokens(tokens, tags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{tokenize, NEWLINE_MARKER};

    fn obj(begin: bool) -> Option<Tag> {
        Some(Tag::object(begin))
    }

    fn other() -> Option<Tag> {
        Some(Tag::other())
    }

    fn slice(text: &str, start: usize, end: usize) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_single_entity_at_start() {
        let text = "GRB 050219 was observed.";
        let tokens = tokenize(text);
        let tags = vec![obj(true), obj(false), other(), other(), other()];
        let entities = decode(text, &tokens, &tags);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].raw_form, "GRB 050219");
        assert_eq!(entities[0].offset_start, 0);
        assert_eq!(entities[0].offset_end, 10);
    }

    #[test]
    fn test_object_spanning_split_tokens() {
        let text = "M4-37934";
        let tokens = tokenize(text);
        let tags = vec![obj(true), obj(false), obj(false), obj(false)];
        let entities = decode(text, &tokens, &tags);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].raw_form, "M4-37934");
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 8));
    }

    #[test]
    fn test_empty_text() {
        assert!(decode("", &[], &[]).is_empty());
    }

    #[test]
    fn test_two_mentions_in_prose() {
        let text = "M31 lies near NGC 224.";
        let tokens = tokenize(text);
        let tags = vec![
            obj(true),
            obj(false),
            other(),
            other(),
            obj(true),
            obj(false),
            other(),
        ];
        let entities = decode(text, &tokens, &tags);

        assert_eq!(entities.len(), 2);
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 3));
        assert_eq!((entities[1].offset_start, entities[1].offset_end), (14, 21));
        for entity in &entities {
            assert_eq!(
                slice(text, entity.offset_start, entity.offset_end),
                entity.raw_form
            );
        }
        assert!(entities[0].offset_end <= entities[1].offset_start);
    }

    #[test]
    fn test_begin_prefix_splits_adjacent_objects() {
        let text = "Vega Deneb";
        let tokens = tokenize(text);
        let entities = decode(text, &tokens, &[obj(true), obj(true)]);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].raw_form, "Vega");
        assert_eq!(entities[1].raw_form, "Deneb");
        assert_eq!((entities[1].offset_start, entities[1].offset_end), (5, 10));
    }

    #[test]
    fn test_no_entity_moves_cursor_to_end() {
        let text = "nothing astronomical here.";
        let tokens = tokenize(text);
        let tags = vec![other(); 4];
        let clusters = cluster_tokens(&tokens, &tags);
        assert_eq!(clusters.len(), 1);

        let mut cursor = OffsetCursor::new(text);
        for cluster in &clusters {
            cursor.advance(cluster);
        }
        assert_eq!(cursor.position(), cursor.len());
        assert!(extract_entities(text, &clusters).is_empty());
    }

    #[test]
    fn test_trailing_trim_order() {
        // '\n' é cortado antes do ' '
        let text = "Vega \n";
        let entities = decode(text, &tokenize(text), &[obj(true)]);
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 4));
        assert_eq!(entities[0].raw_form, "Vega");

        // ordem inversa: só o ' ' sai, o '\n' fica dentro do intervalo
        let text = "Vega\n ";
        let entities = decode(text, &tokenize(text), &[obj(true)]);
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 5));
    }

    #[test]
    fn test_leading_space_and_newline_skipped() {
        let text = "is \nVega";
        let tokens = tokenize(text);
        let clusters = cluster_tokens(&tokens, &[other(), obj(true)]);
        assert_eq!(clusters[1].text(), " \nVega");
        let entities = extract_entities(text, &clusters);
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (4, 8));
        assert_eq!(entities[0].raw_form, "Vega");
    }

    #[test]
    fn test_offsets_clamped_to_text() {
        let clusters = vec![TokenCluster {
            label: AstroLabel::Object,
            tokens: tokenize("GRB 050219"),
        }];
        let entities = extract_entities("GRB", &clusters);
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 3));
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let text = "Étoile α Cen";
        let tokens = tokenize(text);
        let entities = decode(text, &tokens, &[other(), obj(true), obj(false)]);
        assert_eq!(entities[0].raw_form, "α Cen");
        assert_eq!((entities[0].offset_start, entities[0].offset_end), (7, 12));
    }

    #[test]
    fn test_missing_tags_are_carried_forward() {
        let text = "Vega ? Deneb";
        let tokens = tokenize(text);
        let clusters = cluster_tokens(&tokens, &[obj(true), None, obj(false)]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].text(), "Vega ? Deneb");
    }

    #[test]
    fn test_custom_labels_never_materialize() {
        let text = "Jupiter";
        let tags = vec![Tag::from_label("<planet>")];
        assert!(decode(text, &tokenize(text), &tags).is_empty());
    }

    #[test]
    fn test_newline_marker_joins_next_cluster() {
        let tokens = vec![
            Token::new("Vega", 0),
            Token::new(NEWLINE_MARKER, 4),
            Token::new("Deneb", 12),
        ];
        let clusters = cluster_tokens(&tokens, &[obj(true), other()]);
        assert_eq!(clusters[1].tokens.len(), 2);
        assert!(clusters[1].tokens[0].is_newline_marker());
    }
}
