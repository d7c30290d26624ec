//! # Tokenizador para Menções Astronômicas
//!
//! Divide o texto bruto em tokens atômicos usando um conjunto fixo de delimitadores.
//! Os delimitadores **também viram tokens** (um caractere cada), de modo que a
//! concatenação dos tokens reproduz exatamente o texto original; o decodificador
//! recalcula os offsets de caracteres a partir dela.
//!
//! ## Esquema de Tokenização
//!
//! 1. **Delimitadores**: espaços (incluindo as variantes Unicode), hífens e traços,
//!    pontos, apóstrofos, parênteses/colchetes, alguns símbolos (`%`, `‰`, `°`, `$`...)
//!    e `<`, `=`, `>`.
//! 2. **Fronteira letra/dígito**: cada trecho entre delimitadores é quebrado
//!    em toda transição letra ASCII → dígito e dígito → não-dígito.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use astro_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("M4-37934");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["M", "4", "-", "37934"]);
//! ```

use serde::{Deserialize, Serialize};

/// Marcador sintético de quebra de parágrafo inserido por etapas anteriores.
pub const NEWLINE_MARKER: &str = "@newline";

/// Metadados de layout de um token (página e caixa), repassados sem interpretação.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutInfo {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Um token extraído do texto original.
///
/// O `Token` é imutável depois de criado: re-tokenizar produz novos tokens que
/// herdam o `layout` do token pai (cópia rasa) com o texto substituído.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "GRB", " ", "050219").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
    /// Layout opcional (PDF), nunca interpretado pelo núcleo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutInfo>,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.len();
        Self {
            text,
            start,
            end,
            index: 0,
            layout: None,
        }
    }

    /// Token "em branco": espaços, controles, caracteres de largura zero ou o marcador
    /// de parágrafo. Não gera linha de features e não conta nas posições do gazetteer.
    pub fn is_blank(&self) -> bool {
        self.is_newline_marker() || is_blank_text(&self.text)
    }

    /// Marcador sintético de quebra de parágrafo (`@newline`).
    pub fn is_newline_marker(&self) -> bool {
        self.text.trim() == NEWLINE_MARKER
    }
}

/// Caracteres descartados pela normalização (espaços, controles, largura zero).
pub(crate) fn is_ignorable(c: char) -> bool {
    c.is_whitespace()
        || c.is_control()
        || matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Vazio depois da normalização das features: não gera linha nem posição.
pub(crate) fn is_blank_text(text: &str) -> bool {
    text.chars().all(is_ignorable) || crate::features::normalize_text(text).is_empty()
}

/// Delimitadores: cada ocorrência fecha o trecho corrente e vira um token próprio.
fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '\n' | '\r' | '\t'
            | '(' | '[' | '^' | '%' | '‰' | '°' | ',' | ':' | ';' | '?' | '.' | '!' | '/' | ')'
            | '-' | '=' | '≈' | '<' | '>' | '+'
            | '"' | '“' | '”' | '‘' | '’' | '\'' | '`' | '$' | ']' | '*'
            | '\u{2666}' | '\u{2665}' | '\u{2663}' | '\u{2660}'
            // hífens e traços
            | '\u{2010}'..='\u{2015}' | '\u{207B}' | '\u{208B}' | '\u{2212}'
            | '\u{0096}' | '\u{058A}' | '\u{2043}' | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}'
            // pontos
            | '\u{2024}' | '\u{2027}' | '\u{2219}' | '\u{FE52}'
            // apóstrofos
            | '\u{2032}' | '\u{FF07}'
            // espaços
            | '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{F0A0}'
    )
}

/// Tokeniza um texto. Texto vazio produz lista vazia.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = split_pieces(text)
        .into_iter()
        .map(|(start, piece)| Token::new(piece, start))
        .collect();
    reindex(&mut tokens);
    tokens
}

/// Versão que devolve apenas as strings (usada na construção do vocabulário).
pub fn tokenize_strings(text: &str) -> Vec<String> {
    split_pieces(text)
        .into_iter()
        .map(|(_, piece)| piece.to_string())
        .collect()
}

/// Re-tokeniza um token já existente (trecho pré-segmentado de parágrafo, figura ou tabela).
///
/// Cada sub-token herda o `layout` do token original; os offsets são deslocados
/// a partir do `start` do pai.
pub fn tokenize_token(chunk: &Token) -> Vec<Token> {
    split_pieces(&chunk.text)
        .into_iter()
        .map(|(offset, piece)| Token {
            text: piece.to_string(),
            start: chunk.start + offset,
            end: chunk.start + offset + piece.len(),
            index: 0,
            layout: chunk.layout.clone(),
        })
        .collect()
}

/// Re-tokeniza uma sequência inteira na granularidade deste tokenizador.
pub fn retokenize(tokens: &[Token]) -> Vec<Token> {
    let mut result: Vec<Token> = tokens.iter().flat_map(tokenize_token).collect();
    reindex(&mut result);
    result
}

/// Texto de uma sequência de tokens (concatenação simples).
pub fn to_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

fn reindex(tokens: &mut [Token]) {
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
}

/// Divide o texto em pedaços `(offset_em_bytes, texto)`.
fn split_pieces(text: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut chunk_start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if is_delimiter(ch) {
            if let Some(start) = chunk_start.take() {
                split_digit_boundaries(text, start, i, &mut pieces);
            }
            pieces.push((i, &text[i..i + ch.len_utf8()]));
        } else if chunk_start.is_none() {
            chunk_start = Some(i);
        }
    }
    if let Some(start) = chunk_start {
        split_digit_boundaries(text, start, text.len(), &mut pieces);
    }

    pieces
}

/// Quebra um trecho sem delimitadores nas fronteiras letra→dígito e dígito→não-dígito.
fn split_digit_boundaries<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    pieces: &mut Vec<(usize, &'a str)>,
) {
    let chunk = &text[start..end];
    let mut piece_start = 0;
    let mut prev: Option<char> = None;

    for (i, ch) in chunk.char_indices() {
        if let Some(p) = prev {
            let boundary = (p.is_ascii_alphabetic() && ch.is_ascii_digit())
                || (p.is_ascii_digit() && !ch.is_ascii_digit());
            if boundary {
                pieces.push((start + piece_start, &chunk[piece_start..i]));
                piece_start = i;
            }
        }
        prev = Some(ch);
    }
    pieces.push((start + piece_start, &chunk[piece_start..]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_delimiters_are_tokens() {
        let tokens = tokenize("GRB 050219 was observed.");
        assert_eq!(
            texts(&tokens),
            vec!["GRB", " ", "050219", " ", "was", " ", "observed", "."]
        );
        assert_eq!(tokens[2].index, 2);
        assert_eq!(tokens[2].start, 4);
        assert_eq!(tokens[2].end, 10);
    }

    #[test]
    fn test_letter_digit_split() {
        assert_eq!(texts(&tokenize("M4")), vec!["M", "4"]);
        assert_eq!(texts(&tokenize("12Jan")), vec!["12", "Jan"]);
        assert_eq!(texts(&tokenize("M4-37934")), vec!["M", "4", "-", "37934"]);
        // letra não-ASCII antes do dígito não quebra
        assert_eq!(texts(&tokenize("é4")), vec!["é4"]);
    }

    #[test]
    fn test_unicode_delimiters() {
        let tokens = tokenize("NGC\u{00A0}224\u{2013}b");
        assert_eq!(texts(&tokens), vec!["NGC", "\u{00A0}", "224", "\u{2013}", "b"]);
    }

    #[test]
    fn test_retokenize_keeps_layout() {
        let layout = LayoutInfo {
            page: 3,
            x: 10.0,
            y: 20.0,
            width: 40.0,
            height: 9.5,
        };
        let chunk = Token {
            text: "SN1987A".to_string(),
            start: 100,
            end: 107,
            index: 7,
            layout: Some(layout.clone()),
        };
        let subs = retokenize(&[chunk]);
        assert_eq!(texts(&subs), vec!["SN", "1987", "A"]);
        assert!(subs.iter().all(|t| t.layout.as_ref() == Some(&layout)));
        assert_eq!(subs[1].start, 102);
        assert_eq!(subs[1].end, 106);
        assert_eq!(subs[2].index, 2);
    }

    #[test]
    fn test_blank_tokens() {
        assert!(Token::new(" ", 0).is_blank());
        assert!(Token::new("\u{00A0}", 0).is_blank());
        assert!(Token::new("\u{200B}", 0).is_blank());
        assert!(Token::new(NEWLINE_MARKER, 0).is_blank());
        assert!(Token::new(NEWLINE_MARKER, 0).is_newline_marker());
        assert!(!Token::new("M", 0).is_blank());
    }

    proptest! {
        #[test]
        fn prop_tokenize_is_lossless(text in "\\PC{0,64}") {
            let tokens = tokenize(&text);
            prop_assert_eq!(to_text(&tokens), text.clone());
            prop_assert!(tokens.iter().all(|t| !t.text.is_empty()));
            for token in &tokens {
                prop_assert_eq!(&text[token.start..token.end], token.text.as_str());
            }
        }
    }
}
