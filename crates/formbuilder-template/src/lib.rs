//! # formbuilder-template
//!
//! The tag grammar of form templates. Templates are plain HTML interleaved
//! with `{tag attr="value"}` single tags and `{tag}...{/tag}` blocks; tag
//! names are case-insensitive and anything that does not look like a tag is
//! text.
//!
//! Rendering happens in ordered phases. Each phase lexes the current text,
//! parses only the block tags it owns into a tree, transforms that tree, and
//! serializes it back to text for the next phase. Tags a phase does not own
//! survive verbatim.
//!
//! ## Modules
//!
//! - [`lexer`] - Splits template text into text and tag tokens
//! - [`attrs`] - `attr="value"` pair parsing and boolean coercion
//! - [`parser`] - Builds a block tree for a chosen set of block names
//! - [`html`] - HTML escaping and attribute rendering
//! - [`loaders`] - Template loaders (filesystem and in-memory)

pub mod attrs;
pub mod html;
pub mod lexer;
pub mod loaders;
pub mod parser;

pub use attrs::{str2bool, AttrPairs};
pub use html::{escape_html, render_attrs};
pub use lexer::{tokenize, TagToken, Token};
pub use loaders::{FileSystemLoader, StringLoader, TemplateLoader, TemplateVariant};
pub use parser::{parse, to_source, Node};
