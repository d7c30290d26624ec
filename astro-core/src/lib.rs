//! # astro-core — Reconhecimento de Nomes de Objetos Astronômicos
//!
//! Localiza menções a objetos astronômicos ("GRB 050219", "NGC 224", "M4-37934") em
//! textos científicos, combinando análise léxica determinística com um etiquetador
//! de sequência externo (CRF). O núcleo garante que os offsets de caracteres
//! devolvidos correspondam exatamente ao texto de entrada, qualquer que seja o
//! etiquetador usado.
//!
//! ## Arquitetura
//!
//! 1.  **Tokenização** ([`tokenizer`]): delimitadores viram tokens; fronteiras letra/dígito.
//! 2.  **Gazetteer** ([`lexicon`]): vocabulário e casamento de nomes multi-token.
//! 3.  **Features** ([`features`]): uma linha de colunas fixas por token.
//! 4.  **Rotulação** ([`tagger`]): [`SequenceLabeler`] externo → rótulos `<object>`/`<other>`.
//! 5.  **Decodificação** ([`decoder`]): grupos de rótulos → [`AstroEntity`] com offsets.
//!
//! O [`AstroParser`] ([`pipeline`]) encadeia as etapas e é montado uma vez a partir
//! da [`AstroConfig`] ([`config`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use astro_core::{AstroLexicon, AstroParser, LexiconLabeler};
//!
//! let lexicon = AstroLexicon::from_lines(["GRB 050219", "NGC 224"]);
//! let parser = AstroParser::new(Arc::new(lexicon), Arc::new(LexiconLabeler));
//!
//! let entities = parser.process_text("GRB 050219 was observed near NGC 224.").unwrap();
//! assert_eq!(entities.len(), 2);
//! assert_eq!((entities[0].offset_start, entities[0].offset_end), (0, 10));
//! ```

pub mod config;
pub mod decoder;
pub mod entity;
pub mod error;
pub mod features;
pub mod lexicon;
pub mod pipeline;
pub mod tagger;
pub mod tokenizer;
pub mod training;

pub use config::{AstroConfig, ConfigError};
pub use entity::AstroEntity;
pub use error::{AstroError, Result};
pub use lexicon::{AstroLexicon, AstroType, OffsetPosition};
pub use pipeline::{AstroParser, PipelineEvent};
pub use tagger::{CommandLabeler, LexiconLabeler, SequenceLabeler, Tag};
pub use tokenizer::{LayoutInfo, Token};
