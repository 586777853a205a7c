/// Renderer — joins resolved pieces into the final marker string.
use crate::core::resolver::{Piece, Resolution};

/// Renders a resolution: literal text verbatim, chosen names as `{name}`
/// markers ready for keyed substitution, empty slots as nothing.
pub struct Renderer;

impl Renderer {
    pub fn render(resolution: &Resolution<'_>) -> String {
        let capacity = resolution
            .pieces()
            .iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text.len(),
                Piece::Value(name) => name.len() + 2,
                Piece::Nothing => 0,
            })
            .sum();

        let mut out = String::with_capacity(capacity);
        for piece in resolution.pieces() {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Value(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                Piece::Nothing => {}
            }
        }
        out
    }
}
