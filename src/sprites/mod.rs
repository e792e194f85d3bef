//! Sprites module - PokeAPI lookup, fallback handling, and color extraction

mod color;
mod resolver;

pub use color::dominant_color;
pub use resolver::{sprite_markup, SpriteError, SpriteResolver, SpriteResult, FALLBACK_ALT};
