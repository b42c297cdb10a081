/// Markup formatter: pretty-printed and minified re-serialization.
pub mod format;
/// Markup lexer: splits raw input into borrowed command tokens.
pub mod lexer;
