/// Split text on runs of the space character, dropping empty tokens.
///
/// Only `' '` separates words; tabs and other whitespace stay inside tokens and
/// are later rejected by [`is_valid_word`]. The returned slices borrow `text`.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split(' ').filter(|word| !word.is_empty())
}

/// A word is valid when none of its characters is an ASCII control character.
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| (c as u32) < 0x20)
}
