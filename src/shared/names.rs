pub const MAX_PLAYER_NAME_LENGTH: usize = 16;
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Keeps ASCII letters, digits, `_`, `-` and spaces, trims, and caps the
/// length. Falls back when nothing printable is left.
pub fn sanitize_player_name(name: &str, fallback: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | ' '))
        .collect();
    let cleaned: String = filtered
        .trim()
        .chars()
        .take(MAX_PLAYER_NAME_LENGTH)
        .collect();
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_player_name("<b>Neo</b>!", DEFAULT_PLAYER_NAME), "bNeob");
        assert_eq!(sanitize_player_name("  snake_eater-9 ", DEFAULT_PLAYER_NAME), "snake_eater-9");
    }

    #[test]
    fn truncates_to_sixteen_characters() {
        let name = sanitize_player_name("abcdefghijklmnopqrstuvwxyz", DEFAULT_PLAYER_NAME);
        assert_eq!(name, "abcdefghijklmnop");
    }

    #[test]
    fn falls_back_when_empty() {
        assert_eq!(sanitize_player_name("   ", DEFAULT_PLAYER_NAME), "Player");
        assert_eq!(sanitize_player_name("!!!", "Viper"), "Viper");
    }
}
