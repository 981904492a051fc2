pub mod composer;
pub mod engine;
pub mod templates;

pub use composer::{filter_by_prefix, without_notify_tags, SuggestionCache, SuggestionComposer};
pub use engine::Engine;
pub use templates::{ListStyle, TemplateRenderer};
