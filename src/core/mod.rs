pub mod compiler;
pub mod formats;
pub mod generator;
pub mod lexer;
pub mod render;
pub mod resolver;
