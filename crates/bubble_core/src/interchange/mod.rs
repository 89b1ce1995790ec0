//! Converters to and from external editing tools' file formats. These work
//! on decoded entities only and never touch a program image.

pub mod editor;
pub mod flat_sprites;
mod font;
pub mod lzw;
