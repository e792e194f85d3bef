//! Palette Module
//! Bulbapedia color tables for generations and types.

/// Neutral gray for anything outside the palettes.
pub const DEFAULT_COLOR: &str = "#7f7f7f";

/// Fill color for a generation cohort (1-7).
pub fn generation_color(generation: u8) -> Option<&'static str> {
    match generation {
        1 => Some("#ACD36C"),
        2 => Some("#DCD677"),
        3 => Some("#9CD7C8"),
        4 => Some("#B7A3C3"),
        5 => Some("#9FCADF"),
        6 => Some("#DD608C"),
        7 => Some("#E89483"),
        _ => None,
    }
}

/// Fill color for a type name (matched case-insensitively).
pub fn type_color(type_name: &str) -> Option<&'static str> {
    match type_name.to_ascii_lowercase().as_str() {
        "normal" => Some("#A8A878"),
        "fire" => Some("#F08030"),
        "fighting" => Some("#C03028"),
        "water" => Some("#6890F0"),
        "flying" => Some("#A890F0"),
        "grass" => Some("#78C850"),
        "poison" => Some("#A040A0"),
        "electric" => Some("#F8D030"),
        "ground" => Some("#E0C068"),
        "psychic" => Some("#F85888"),
        "rock" => Some("#B8A038"),
        "ice" => Some("#98D8D8"),
        "bug" => Some("#A8B820"),
        "dragon" => Some("#7038F8"),
        "ghost" => Some("#705898"),
        "dark" => Some("#705848"),
        "steel" => Some("#B8B8D0"),
        "fairy" => Some("#EE99AC"),
        _ => None,
    }
}
