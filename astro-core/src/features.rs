//! # Vetor de Features para Menções Astronômicas
//!
//! Para cada token de conteúdo produz **uma linha** com colunas fixas separadas por
//! espaço, no formato consumido pelo etiquetador de sequência (CRF):
//!
//! | # | coluna                                  | exemplo (`GRB`) |
//! |---|-----------------------------------------|-----------------|
//! | 1 | token normalizado                       | `GRB`           |
//! | 2 | minúsculas                              | `grb`           |
//! | 3-7 | prefixos de 1 a 5 caracteres          | `G GR GRB GRB GRB` |
//! | 8-12 | sufixos de 1 a 5 caracteres          | `B RB GRB GRB GRB` |
//! | 13 | capitalização                          | `ALLCAPS`       |
//! | 14 | dígitos                                | `NODIGIT`       |
//! | 15 | caractere único                        | `0`             |
//! | 16 | pontuação                              | `NOPUNCT`       |
//! | 17 | token presente no vocabulário          | `1`             |
//! | 18 | token dentro de um span do gazetteer   | `1`             |
//! | 19 | "sombra" numérica                      | `GRB`           |
//! | 20 | forma da palavra                       | `XXX`           |
//! | 21 | forma da palavra reduzida              | `X`             |
//! | 22 | rótulo (treino) ou `0`                 | `0`             |
//!
//! Espaços não geram linha; o marcador `@newline` gera uma linha vazia, que o
//! etiquetador entende como fronteira de sequência.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::lexicon::OffsetPosition;
use crate::tokenizer::{is_ignorable, Token};

/// Token composto apenas de `, : ; ? .`
static IS_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[,:;?.]+$").expect("regex de pontuação válida"));

/// Classe de capitalização.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capitalisation {
    AllCaps,
    InitCap,
    NoCaps,
}

impl Capitalisation {
    pub fn of(word: &str) -> Self {
        if !word.is_empty() && !word.chars().any(char::is_lowercase) {
            Capitalisation::AllCaps
        } else if word.chars().next().is_some_and(char::is_uppercase) {
            Capitalisation::InitCap
        } else {
            Capitalisation::NoCaps
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capitalisation::AllCaps => "ALLCAPS",
            Capitalisation::InitCap => "INITCAP",
            Capitalisation::NoCaps => "NOCAPS",
        }
    }
}

/// Classe de dígitos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigitClass {
    AllDigit,
    ContainDigit,
    NoDigit,
}

impl DigitClass {
    pub fn of(word: &str) -> Self {
        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            DigitClass::AllDigit
        } else if word.chars().any(|c| c.is_ascii_digit()) {
            DigitClass::ContainDigit
        } else {
            DigitClass::NoDigit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DigitClass::AllDigit => "ALLDIGIT",
            DigitClass::ContainDigit => "CONTAINDIGIT",
            DigitClass::NoDigit => "NODIGIT",
        }
    }
}

/// Classe de pontuação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PunctType {
    NoPunct,
    OpenBracket,
    EndBracket,
    Dot,
    Comma,
    Hyphen,
    Quote,
    Punct,
}

impl PunctType {
    pub fn of(word: &str) -> Self {
        match word {
            "(" | "[" => PunctType::OpenBracket,
            ")" | "]" => PunctType::EndBracket,
            "." => PunctType::Dot,
            "," => PunctType::Comma,
            "-" => PunctType::Hyphen,
            "\"" | "'" | "`" => PunctType::Quote,
            _ if IS_PUNCT.is_match(word) => PunctType::Punct,
            _ => PunctType::NoPunct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PunctType::NoPunct => "NOPUNCT",
            PunctType::OpenBracket => "OPENBRACKET",
            PunctType::EndBracket => "ENDBRACKET",
            PunctType::Dot => "DOT",
            PunctType::Comma => "COMMA",
            PunctType::Hyphen => "HYPHEN",
            PunctType::Quote => "QUOTE",
            PunctType::Punct => "PUNCT",
        }
    }
}

/// Features de um único token. Criado, serializado e descartado a cada chamada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Token já normalizado.
    pub string: String,
    /// Rótulo de treino, se conhecido.
    pub label: Option<String>,
    pub capitalisation: Capitalisation,
    pub digit: DigitClass,
    pub single_char: bool,
    pub punct_type: PunctType,
    /// Pertence ao vocabulário sem olhar os vizinhos.
    pub astro_name: bool,
    /// Está dentro de um nome astronômico casado pelo gazetteer.
    pub astro_token: bool,
    pub shadow_number: String,
    pub word_shape: String,
    pub word_shape_trimmed: String,
}

impl FeatureRecord {
    pub fn new(word: &str, label: Option<&str>, astro_name: bool, astro_token: bool) -> Self {
        Self {
            string: word.to_string(),
            label: label.map(str::to_string),
            capitalisation: Capitalisation::of(word),
            digit: DigitClass::of(word),
            single_char: word.graphemes(true).count() == 1,
            punct_type: PunctType::of(word),
            astro_name,
            astro_token,
            shadow_number: shadow_number(word),
            word_shape: word_shape(word),
            word_shape_trimmed: word_shape_trimmed(word),
        }
    }

    /// Capitalização efetivamente emitida: números puros são sempre `NOCAPS`.
    pub fn effective_capitalisation(&self) -> Capitalisation {
        if self.digit == DigitClass::AllDigit {
            Capitalisation::NoCaps
        } else {
            self.capitalisation
        }
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.string.as_str();
        write!(f, "{} {}", word, word.to_lowercase())?;
        for n in 1..=5 {
            write!(f, " {}", prefix(word, n))?;
        }
        for n in 1..=5 {
            write!(f, " {}", suffix(word, n))?;
        }
        write!(
            f,
            " {} {} {} {} {} {} {} {} {} {}",
            self.effective_capitalisation().as_str(),
            self.digit.as_str(),
            flag(self.single_char),
            self.punct_type.as_str(),
            flag(self.astro_name),
            flag(self.astro_token),
            self.shadow_number,
            self.word_shape,
            self.word_shape_trimmed,
            self.label.as_deref().unwrap_or("0"),
        )
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Os `n` primeiros caracteres (ou o token inteiro, se for mais curto).
pub fn prefix(word: &str, n: usize) -> String {
    word.chars().take(n).collect()
}

/// Os `n` últimos caracteres (ou o token inteiro, se for mais curto).
pub fn suffix(word: &str, n: usize) -> String {
    let count = word.chars().count();
    word.chars().skip(count.saturating_sub(n)).collect()
}

/// Troca cada dígito por `0`.
pub fn shadow_number(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_ascii_digit() { '0' } else { c })
        .collect()
}

fn shape_of(c: char) -> char {
    if c.is_alphabetic() {
        if c.is_uppercase() {
            'X'
        } else {
            'x'
        }
    } else if c.is_ascii_digit() {
        'd'
    } else {
        c
    }
}

/// Maiúsculas → `X`, demais letras → `x`, dígitos → `d`, resto mantido.
pub fn word_shape(word: &str) -> String {
    word.chars().map(shape_of).collect()
}

/// Forma da palavra com repetições consecutivas do mesmo símbolo reduzidas a um.
pub fn word_shape_trimmed(word: &str) -> String {
    let mut trimmed = String::new();
    let mut last = None;
    for shape in word.chars().map(shape_of) {
        if last != Some(shape) {
            trimmed.push(shape);
            last = Some(shape);
        }
    }
    trimmed
}

/// Normalização "paranoica" antes das features: NFKC, variantes de hífen e aspas
/// unificadas e remoção de espaços/controles.
pub fn normalize_text(text: &str) -> String {
    text.nfkc()
        .filter(|c| !is_ignorable(*c))
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{0096}' | '\u{058A}' | '\u{2043}'
            | '\u{FE58}' | '\u{FE63}' | '\u{FF0D}' => '-',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            other => other,
        })
        .collect()
}

/// Entrada genérica do codificador: texto do token e rótulo opcional (treino).
pub(crate) struct EncoderInput<'a> {
    pub text: &'a str,
    pub label: Option<&'a str>,
    pub boundary: bool,
}

/// Serializa as features de uma sequência.
///
/// `positions` vem do gazetteer (ordenado, sem sobreposição) e é percorrido uma única
/// vez junto com o cursor `posit`, que só avança em tokens de conteúdo.
pub(crate) fn encode<'a>(
    inputs: impl IntoIterator<Item = EncoderInput<'a>>,
    positions: &[OffsetPosition],
    in_dictionary: impl Fn(&str) -> bool,
) -> String {
    let mut result = String::new();
    let mut posit = 0usize;
    let mut current = 0usize;

    for input in inputs {
        if input.boundary {
            result.push('\n');
            continue;
        }
        let text = normalize_text(input.text);
        if text.is_empty() {
            continue;
        }

        while current < positions.len() && positions[current].end < posit {
            current += 1;
        }
        let in_span = positions
            .get(current)
            .is_some_and(|position| position.contains(posit));

        let record = FeatureRecord::new(&text, input.label, in_dictionary(input.text), in_span);
        result.push_str(&record.to_string());
        result.push('\n');
        posit += 1;
    }

    result
}

/// Gera o texto de features de uma sequência de tokens (modo de rotulação).
///
/// # Parâmetros
/// - `tokens`: tokens do segmento, incluindo espaços.
/// - `positions`: spans do gazetteer sobre os tokens de conteúdo.
/// - `in_dictionary`: busca no vocabulário (sobre o texto bruto do token).
pub fn add_features(
    tokens: &[Token],
    positions: &[OffsetPosition],
    in_dictionary: impl Fn(&str) -> bool,
) -> String {
    let inputs = tokens.iter().map(|token| EncoderInput {
        text: &token.text,
        label: None,
        boundary: token.is_newline_marker(),
    });
    encode(inputs, positions, in_dictionary)
}

/// Número de linhas de features (não vazias) num texto produzido por [`add_features`].
pub fn feature_line_count(features: &str) -> usize {
    features.lines().filter(|l| !l.trim().is_empty()).count()
}
