//! # Léxico Astro — Vocabulário e Gazetteer de Nomes
//!
//! O léxico é construído **uma única vez** a partir de uma lista de nomes (um por linha)
//! e depois compartilhado somente para leitura (`Arc<AstroLexicon>`).
//!
//! Cada linha é tokenizada com o [`crate::tokenizer`]:
//! - tokens com mais de um caractere entram no **vocabulário** (busca exata, sem posição);
//! - a sequência de tokens de conteúdo da linha entra numa **trie de tokens**, usada para
//!   localizar nomes de vários tokens (ex: "GRB 050219", "Magellanic Clouds").
//!
//! ## Posições
//!
//! As posições devolvidas ([`OffsetPosition`]) contam apenas tokens de conteúdo:
//! espaços, quebras de linha e o marcador `@newline` não ocupam posição. Dentro de um
//! padrão, espaços são transparentes (`GRB\n050219` casa com `GRB 050219`), mas o
//! marcador `@newline` é uma fronteira que nenhum padrão atravessa.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AstroError, Result};
use crate::tokenizer::{is_blank_text, tokenize, Token, NEWLINE_MARKER};

/// Tipos de entidade da base NER astro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AstroType {
    Unknown,
    Object,
}

impl AstroType {
    pub fn name(&self) -> &'static str {
        match self {
            AstroType::Unknown => "UNKNOWN",
            AstroType::Object => "OBJECT",
        }
    }
}

/// Intervalo inclusivo de índices de tokens de conteúdo casado pelo gazetteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPosition {
    pub start: usize,
    pub end: usize,
}

impl OffsetPosition {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Nó da trie: filhos indexados pelo texto do token.
#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    terminal: bool,
}

/// Casador de padrões multi-token.
#[derive(Debug, Default, Clone)]
struct TokenTrie {
    root: TrieNode,
    patterns: usize,
}

impl TokenTrie {
    fn insert(&mut self, pattern: &[&str]) {
        if pattern.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for part in pattern {
            node = node.children.entry(part.to_string()).or_default();
        }
        if !node.terminal {
            node.terminal = true;
            self.patterns += 1;
        }
    }

    /// Maior padrão começando em `start`; devolve o índice do último token casado.
    fn longest_match(&self, content: &[&str], breaks: &[bool], start: usize) -> Option<usize> {
        let mut node = &self.root;
        let mut best = None;
        for j in start..content.len() {
            if j > start && breaks[j] {
                break;
            }
            match node.children.get(content[j]) {
                Some(next) => {
                    node = next;
                    if node.terminal {
                        best = Some(j);
                    }
                }
                None => break,
            }
        }
        best
    }
}

/// Recursos léxicos para entidades astronômicas.
#[derive(Debug, Default, Clone)]
pub struct AstroLexicon {
    vocabulary: HashSet<String>,
    patterns: TokenTrie,
}

impl AstroLexicon {
    /// Carrega o léxico de um arquivo UTF-8 (uma entrada por linha).
    ///
    /// Arquivo ausente ou ilegível é um erro fatal de inicialização.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AstroError::LexiconMissing {
                path: path.to_path_buf(),
            });
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| AstroError::LexiconUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let lexicon = Self::from_lines(content.lines());
        info!(
            "Léxico astro carregado de {}: {} termos, {} padrões",
            path.display(),
            lexicon.vocabulary_size(),
            lexicon.pattern_count()
        );
        Ok(lexicon)
    }

    /// Constrói o léxico a partir de linhas já lidas.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut lexicon = Self::default();
        for line in lines {
            lexicon.add_entry(line);
        }
        lexicon
    }

    /// Adiciona uma entrada (nome completo) ao vocabulário e à trie.
    pub fn add_entry(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return;
        }
        let tokens = tokenize(line);
        for token in &tokens {
            if token.text.chars().count() > 1 {
                self.vocabulary.insert(token.text.clone());
            }
        }
        let pattern: Vec<&str> = tokens
            .iter()
            .filter(|t| !t.is_blank())
            .map(|t| t.text.as_str())
            .collect();
        self.patterns.insert(&pattern);
    }

    /// Busca léxica simples, independente de posição.
    pub fn in_dictionary(&self, token: &str) -> bool {
        self.vocabulary.contains(token)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.patterns
    }

    /// Posições (em tokens de conteúdo) dos nomes astronômicos conhecidos.
    ///
    /// Resultado ordenado por `start` e sem sobreposição.
    pub fn token_positions(&self, tokens: &[Token]) -> Vec<OffsetPosition> {
        let mut content = Vec::with_capacity(tokens.len());
        let mut breaks = Vec::with_capacity(tokens.len());
        let mut pending_break = false;
        for token in tokens {
            if token.is_newline_marker() {
                pending_break = true;
            } else if !token.is_blank() {
                content.push(token.text.as_str());
                breaks.push(pending_break);
                pending_break = false;
            }
        }
        self.match_content(&content, &breaks)
    }

    /// Mesma busca sobre pares `(token, rótulo)` de dados de treino.
    ///
    /// Um par cujo token é `"\n"` (ou o marcador `@newline`) separa sequências.
    pub fn token_positions_labeled(&self, pairs: &[(String, String)]) -> Vec<OffsetPosition> {
        let mut content = Vec::with_capacity(pairs.len());
        let mut breaks = Vec::with_capacity(pairs.len());
        let mut pending_break = false;
        for (text, _) in pairs {
            if text == "\n" || text.trim() == NEWLINE_MARKER {
                pending_break = true;
            } else if !is_blank_text(text) {
                content.push(text.as_str());
                breaks.push(pending_break);
                pending_break = false;
            }
        }
        self.match_content(&content, &breaks)
    }

    fn match_content(&self, content: &[&str], breaks: &[bool]) -> Vec<OffsetPosition> {
        let mut positions = Vec::new();
        let mut i = 0;
        while i < content.len() {
            match self.patterns.longest_match(content, breaks, i) {
                Some(end) => {
                    positions.push(OffsetPosition::new(i, end));
                    i = end + 1;
                }
                None => i += 1,
            }
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lexicon() -> AstroLexicon {
        AstroLexicon::from_lines([
            "GRB",
            "GRB 050219",
            "Magellanic Clouds",
            "M4-37934",
            "NGC",
            "",
        ])
    }

    #[test]
    fn test_vocabulary_skips_single_chars() {
        let lex = lexicon();
        assert!(lex.in_dictionary("GRB"));
        assert!(lex.in_dictionary("050219"));
        assert!(lex.in_dictionary("37934"));
        assert!(!lex.in_dictionary("M"));
        assert!(!lex.in_dictionary("-"));
        assert!(!lex.in_dictionary("grb"));
    }

    #[test]
    fn test_longest_match_wins() {
        let lex = lexicon();
        let tokens = tokenize("GRB 050219 and GRB 10002");
        let positions = lex.token_positions(&tokens);
        // conteúdo: GRB(0) 050219(1) and(2) GRB(3) 10002(4)
        assert_eq!(
            positions,
            vec![OffsetPosition::new(0, 1), OffsetPosition::new(3, 3)]
        );
    }

    #[test]
    fn test_positions_sorted_and_disjoint() {
        let lex = lexicon();
        let text = "GRB 10002 and other GRBs, but also GRB 050219. Still we have \
                    Magellanic Clouds around and M4-37934 in the corner, of M 4 or other NGC.";
        let positions = lex.token_positions(&tokenize(text));
        assert!(!positions.is_empty());
        for pair in positions.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        assert!(positions.iter().all(|p| p.start <= p.end));
    }

    #[test]
    fn test_no_match_is_empty() {
        let lex = lexicon();
        assert!(lex.token_positions(&tokenize("nothing to see here")).is_empty());
        assert!(lex.token_positions(&[]).is_empty());
    }

    #[test]
    fn test_whitespace_is_transparent_inside_pattern() {
        let lex = lexicon();
        let positions = lex.token_positions(&tokenize("Magellanic\nClouds"));
        assert_eq!(positions, vec![OffsetPosition::new(0, 1)]);

        let positions = lex.token_positions(&tokenize("Magellanic  \u{00A0}Clouds"));
        assert_eq!(positions, vec![OffsetPosition::new(0, 1)]);
    }

    #[test]
    fn test_newline_marker_breaks_pattern() {
        let lex = lexicon();
        let tokens = vec![
            Token::new("Magellanic", 0),
            Token::new(NEWLINE_MARKER, 10),
            Token::new("Clouds", 18),
        ];
        assert!(lex.token_positions(&tokens).is_empty());
    }

    #[test]
    fn test_labeled_pairs() {
        let lex = lexicon();
        let pairs: Vec<(String, String)> = [
            ("GRB", "I-<object>"),
            ("050219", "<object>"),
            ("\n", ""),
            ("NGC", "I-<object>"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(
            lex.token_positions_labeled(&pairs),
            vec![OffsetPosition::new(0, 1), OffsetPosition::new(2, 2)]
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GRB 050219\r").unwrap();
        writeln!(file, "Sgr A*").unwrap();
        let lex = AstroLexicon::from_file(file.path()).unwrap();
        assert!(lex.in_dictionary("Sgr"));
        assert_eq!(lex.pattern_count(), 2);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = AstroLexicon::from_file("/nonexistent/astroVoc.txt").unwrap_err();
        assert!(matches!(err, AstroError::LexiconMissing { .. }));
    }
}
