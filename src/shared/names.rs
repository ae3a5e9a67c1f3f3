pub const MAX_PLAYER_NAME_LENGTH: usize = 5;

pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned.chars().take(MAX_PLAYER_NAME_LENGTH).collect()
}

pub fn sanitize_glyph(glyph: &str, fallback: char) -> char {
    glyph
        .chars()
        .find(|ch| !ch.is_whitespace() && !ch.is_control())
        .unwrap_or(fallback)
}
