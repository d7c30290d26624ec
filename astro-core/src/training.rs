//! # Dados de Treino
//!
//! Utilitários para produzir e corrigir dados de treino do etiquetador:
//!
//! - [`label_tokens`]: anotações por offset de caractere → pares `(token, rótulo)`;
//! - [`add_features_labeled`]: pares rotulados → arquivo de treino (features + rótulo
//!   na última coluna, sequências separadas por linha vazia);
//! - [`paragraphs`] e [`create_training_text`]: pré-anotação de um texto com o modelo
//!   corrente, gerando TEI (`<rs type="astro-object">`) para correção manual.

use crate::entity::AstroEntity;
use crate::error::Result;
use crate::features::{encode, EncoderInput};
use crate::lexicon::{AstroLexicon, AstroType};
use crate::pipeline::AstroParser;
use crate::tagger::{Tag, OTHER_LABEL};
use crate::tokenizer::{is_blank_text, tokenize, NEWLINE_MARKER};

/// Gera o texto de treino a partir de pares `(token, rótulo)`.
///
/// Um par com token `"\n"` (ou `@newline`) fecha a sequência corrente (linha vazia).
pub fn add_features_labeled(pairs: &[(String, String)], lexicon: &AstroLexicon) -> String {
    let positions = lexicon.token_positions_labeled(pairs);
    let inputs = pairs.iter().map(|(text, label)| EncoderInput {
        text: text.as_str(),
        label: Some(label.as_str()),
        boundary: text == "\n" || text.trim() == NEWLINE_MARKER,
    });
    encode(inputs, &positions, |t| lexicon.in_dictionary(t))
}

/// Rotula os tokens de conteúdo de `text` a partir de intervalos `[início, fim)` em
/// caracteres.
///
/// O primeiro token coberto recebe `I-<object>` (exceto `(`), os seguintes `<object>`
/// e o resto `<other>`. Pontuação final (`;` `.` `,`) é devolvida a `<other>`.
pub fn label_tokens(text: &str, annotations: &[(usize, usize)]) -> Vec<(String, String)> {
    let mut labeled: Vec<(String, String)> = Vec::new();
    let mut previous: Option<Tag> = None;
    let mut offset = 0usize;

    for token in tokenize(text) {
        let start = offset;
        offset += token.text.chars().count();
        if is_blank_text(&token.text) {
            continue;
        }

        let covered = annotations
            .iter()
            .any(|&(a_start, a_end)| start < a_end && a_start < offset);
        let inside = previous.as_ref().is_some_and(Tag::is_object);
        let tag = match (covered, inside) {
            (true, true) => Some(Tag::object(false)),
            (true, false) if token.text != "(" => Some(Tag::object(true)),
            _ => None,
        };

        if tag.is_none() && inside {
            if let Some(last) = labeled.last_mut() {
                if matches!(last.0.as_str(), ";" | "." | ",") {
                    last.1 = OTHER_LABEL.to_string();
                }
            }
        }

        let label = tag
            .as_ref()
            .map(Tag::to_label)
            .unwrap_or_else(|| OTHER_LABEL.to_string());
        labeled.push((token.text, label));
        previous = tag;
    }
    labeled
}

/// Divide um texto em parágrafos: linhas não vazias consecutivas, unidas por espaço.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                result.push(current.join(" ").replace('\t', " "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        result.push(current.join(" ").replace('\t', " "));
    }
    result
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Parágrafo TEI com as entidades `OBJECT` marcadas como `<rs type="astro-object">`.
///
/// Os offsets das entidades são em caracteres e devem estar ordenados.
pub fn training_extraction(entities: &[AstroEntity], text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let slice = |from: usize, to: usize| -> String {
        let to = to.min(chars.len());
        let from = from.min(to);
        chars[from..to].iter().collect()
    };

    let mut p = String::from("<p>");
    let mut pos = 0usize;
    for entity in entities {
        if entity.entity_type != Some(AstroType::Object) || entity.offset_start < pos {
            continue;
        }
        p.push_str(&escape_xml(&slice(pos, entity.offset_start)));
        p.push_str("<rs type=\"astro-object\">");
        p.push_str(&escape_xml(&slice(entity.offset_start, entity.offset_end)));
        p.push_str("</rs>");
        pos = entity.offset_end;
    }
    p.push_str(&escape_xml(&slice(pos, chars.len())));
    p.push_str("</p>");
    p
}

/// Pré-anota um texto parágrafo a parágrafo e devolve um documento TEI.
pub fn create_training_text(parser: &AstroParser, text: &str) -> Result<String> {
    let mut tei = String::from(
        "<tei xmlns=\"http://www.tei-c.org/ns/1.0\">\n\t<teiHeader/>\n\t<text xml:lang=\"en\">\n",
    );
    for paragraph in paragraphs(text) {
        let entities = parser.process_text(&paragraph)?;
        tei.push_str("\t\t");
        tei.push_str(&training_extraction(&entities, &paragraph));
        tei.push('\n');
    }
    tei.push_str("\t</text>\n</tei>\n");
    Ok(tei)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::tagger::LexiconLabeler;

    fn labels(pairs: &[(String, String)]) -> Vec<&str> {
        pairs.iter().map(|(_, l)| l.as_str()).collect()
    }

    #[test]
    fn test_label_tokens_from_offsets() {
        let text = "GRB 050219 was observed.";
        let pairs = label_tokens(text, &[(0, 10)]);
        assert_eq!(
            labels(&pairs),
            vec!["I-<object>", "<object>", "<other>", "<other>", "<other>"]
        );
        assert_eq!(pairs[1].0, "050219");
    }

    #[test]
    fn test_label_tokens_drops_trailing_punctuation() {
        let pairs = label_tokens("near M31, bright", &[(5, 9)]);
        assert_eq!(
            labels(&pairs),
            vec!["<other>", "I-<object>", "<object>", "<other>", "<other>"]
        );
    }

    #[test]
    fn test_label_tokens_skips_opening_bracket() {
        let pairs = label_tokens("(M31)", &[(0, 5)]);
        assert_eq!(pairs[0], ("(".to_string(), "<other>".to_string()));
        assert_eq!(pairs[1].1, "I-<object>");
        assert_eq!(pairs[2].1, "<object>");
    }

    #[test]
    fn test_add_features_labeled() {
        let lexicon = AstroLexicon::from_lines(["GRB 050219"]);
        let mut pairs = label_tokens("GRB 050219 was seen", &[(0, 10)]);
        pairs.push(("\n".to_string(), String::new()));
        pairs.extend(label_tokens("GRB 050219", &[]));

        let data = add_features_labeled(&pairs, &lexicon);
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].ends_with(" 1 1 GRB XXX X I-<object>"));
        assert!(lines[1].ends_with("<object>"));
        assert!(lines[4].is_empty());
        assert!(lines[5].ends_with(" 1 1 GRB XXX X <other>"));
    }

    #[test]
    fn test_paragraphs() {
        let text = "First line\n  continues here\n\n\nSecond\tparagraph\n";
        assert_eq!(
            paragraphs(text),
            vec!["First line continues here", "Second paragraph"]
        );
        assert!(paragraphs("\n \n").is_empty());
    }

    #[test]
    fn test_training_extraction_markup() {
        let text = "M31 & NGC 224 <close>";
        let entities = vec![
            AstroEntity::object("M31", 0, 3, vec![]),
            AstroEntity::object("NGC 224", 6, 13, vec![]),
        ];
        assert_eq!(
            training_extraction(&entities, text),
            "<p><rs type=\"astro-object\">M31</rs> &amp; \
             <rs type=\"astro-object\">NGC 224</rs> &lt;close&gt;</p>"
        );
        assert_eq!(training_extraction(&[], "Vega"), "<p>Vega</p>");
    }

    #[test]
    fn test_create_training_text() {
        let lexicon = AstroLexicon::from_lines(["M31"]);
        let parser = AstroParser::new(Arc::new(lexicon), Arc::new(LexiconLabeler));
        let tei = create_training_text(&parser, "See M31.\n\nNothing here.").unwrap();
        assert!(tei.contains("<p>See <rs type=\"astro-object\">M31</rs>.</p>"));
        assert!(tei.contains("<p>Nothing here.</p>"));
        assert!(tei.starts_with("<tei"));
    }
}
