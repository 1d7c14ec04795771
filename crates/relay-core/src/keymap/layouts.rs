//! Keyboard layouts used to synthesize keystrokes from pasted text.
//!
//! When the operator pastes text, the relay has characters, not key presses.
//! To type them on the remote machine it must work out which physical key
//! (and whether Shift) produces each character under the remote's input
//! layout.  The answer differs per layout: `@` is Shift+`Digit2` on a US
//! keyboard but Shift+`Quote` on a UK one.
//!
//! Two layouts are supported, selected by locale tag: `en-US` and `en-GB`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::codes::CanonicalCode;

/// Error returned when a locale tag names no supported layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported keyboard locale: {0}")]
pub struct UnknownLocale(pub String);

/// An input-locale keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardLayout {
    /// US English (ANSI).
    #[default]
    EnUs,
    /// UK English (ISO).
    EnGb,
}

/// `(code, unshifted, shifted)` for every non-letter key of a layout.
type SymbolRow = (&'static str, char, Option<char>);

const EN_US_SYMBOLS: &[SymbolRow] = &[
    ("Digit1", '1', Some('!')),
    ("Digit2", '2', Some('@')),
    ("Digit3", '3', Some('#')),
    ("Digit4", '4', Some('$')),
    ("Digit5", '5', Some('%')),
    ("Digit6", '6', Some('^')),
    ("Digit7", '7', Some('&')),
    ("Digit8", '8', Some('*')),
    ("Digit9", '9', Some('(')),
    ("Digit0", '0', Some(')')),
    ("Minus", '-', Some('_')),
    ("Equal", '=', Some('+')),
    ("BracketLeft", '[', Some('{')),
    ("BracketRight", ']', Some('}')),
    ("Backslash", '\\', Some('|')),
    ("Semicolon", ';', Some(':')),
    ("Quote", '\'', Some('"')),
    ("Backquote", '`', Some('~')),
    ("Comma", ',', Some('<')),
    ("Period", '.', Some('>')),
    ("Slash", '/', Some('?')),
    ("Space", ' ', None),
    ("Enter", '\n', None),
    ("Tab", '\t', None),
];

// ISO layout: the key next to Enter is `#~`, and an extra key left of Z
// (IntlBackslash) carries `\|`.
const EN_GB_SYMBOLS: &[SymbolRow] = &[
    ("Digit1", '1', Some('!')),
    ("Digit2", '2', Some('"')),
    ("Digit3", '3', Some('£')),
    ("Digit4", '4', Some('$')),
    ("Digit5", '5', Some('%')),
    ("Digit6", '6', Some('^')),
    ("Digit7", '7', Some('&')),
    ("Digit8", '8', Some('*')),
    ("Digit9", '9', Some('(')),
    ("Digit0", '0', Some(')')),
    ("Minus", '-', Some('_')),
    ("Equal", '=', Some('+')),
    ("BracketLeft", '[', Some('{')),
    ("BracketRight", ']', Some('}')),
    ("Backslash", '#', Some('~')),
    ("IntlBackslash", '\\', Some('|')),
    ("Semicolon", ';', Some(':')),
    ("Quote", '\'', Some('@')),
    ("Backquote", '`', Some('¬')),
    ("Comma", ',', Some('<')),
    ("Period", '.', Some('>')),
    ("Slash", '/', Some('?')),
    ("Space", ' ', None),
    ("Enter", '\n', None),
    ("Tab", '\t', None),
];

const LETTER_CODES: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ",
];

impl KeyboardLayout {
    /// Resolves a locale tag such as `"en-GB"` (case-insensitive, `-` or `_`).
    pub fn from_locale(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
        match normalized.as_str() {
            "en-us" | "en" => Some(KeyboardLayout::EnUs),
            "en-gb" => Some(KeyboardLayout::EnGb),
            _ => None,
        }
    }

    /// The canonical locale tag for this layout.
    pub fn locale_tag(self) -> &'static str {
        match self {
            KeyboardLayout::EnUs => "en-US",
            KeyboardLayout::EnGb => "en-GB",
        }
    }

    fn symbols(self) -> &'static [SymbolRow] {
        match self {
            KeyboardLayout::EnUs => EN_US_SYMBOLS,
            KeyboardLayout::EnGb => EN_GB_SYMBOLS,
        }
    }

    /// Finds the physical key producing `character`, and whether Shift is needed.
    pub fn lookup(self, character: char) -> Option<(CanonicalCode, bool)> {
        if character.is_ascii_alphabetic() {
            let index = (character.to_ascii_lowercase() as u8 - b'a') as usize;
            return Some((
                CanonicalCode::from_static(LETTER_CODES[index]),
                character.is_ascii_uppercase(),
            ));
        }

        self.symbols().iter().find_map(|&(code, plain, shifted)| {
            if plain == character {
                Some((CanonicalCode::from_static(code), false))
            } else if shifted == Some(character) {
                Some((CanonicalCode::from_static(code), true))
            } else {
                None
            }
        })
    }

    /// Layout-precise variant of [`requires_shift_key`].
    ///
    /// `#` needs Shift on a US keyboard but not on a UK one.
    pub fn requires_shift(self, character: char) -> bool {
        self.lookup(character).map(|(_, shift)| shift).unwrap_or(false)
    }
}

impl FromStr for KeyboardLayout {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_locale(s).ok_or_else(|| UnknownLocale(s.to_string()))
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.locale_tag())
    }
}

/// Resolves `character` to the code that types it under `locale_tag`.
///
/// Unsupported locale tags fall back to `en-US`.  Returns `None` for
/// characters the layout cannot produce (e.g. `é`).
///
/// # Example
///
/// ```rust
/// use relay_core::keymap::layouts::find_key_code;
///
/// assert_eq!(find_key_code('@', "en-US").unwrap(), "Digit2");
/// assert_eq!(find_key_code('@', "en-GB").unwrap(), "Quote");
/// ```
pub fn find_key_code(character: char, locale_tag: &str) -> Option<CanonicalCode> {
    KeyboardLayout::from_locale(locale_tag)
        .unwrap_or_default()
        .lookup(character)
        .map(|(code, _)| code)
}

/// Shifted symbols of the US layout plus the UK-only `£` and `¬`.
const SHIFTED_SYMBOLS: &str = "~!@#$%^&*()_+{}|:\"<>?£¬";

/// Reports whether Shift must be held to produce `character`.
///
/// Uppercase letters and the shifted symbol row; locale-independent.  Use
/// [`KeyboardLayout::requires_shift`] when the layout is known.
pub fn requires_shift_key(character: char) -> bool {
    character.is_ascii_uppercase() || SHIFTED_SYMBOLS.contains(character)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_sign_resolves_differently_per_layout() {
        assert_eq!(find_key_code('@', "en-US").unwrap(), "Digit2");
        assert_eq!(find_key_code('@', "en-GB").unwrap(), "Quote");
    }

    #[test]
    fn test_double_quote_resolves_differently_per_layout() {
        assert_eq!(find_key_code('"', "en-US").unwrap(), "Quote");
        assert_eq!(find_key_code('"', "en-GB").unwrap(), "Digit2");
    }

    #[test]
    fn test_hash_and_backslash_on_uk_layout() {
        assert_eq!(find_key_code('#', "en-GB").unwrap(), "Backslash");
        assert_eq!(find_key_code('\\', "en-GB").unwrap(), "IntlBackslash");
        assert_eq!(find_key_code('\\', "en-US").unwrap(), "Backslash");
    }

    #[test]
    fn test_letters_map_regardless_of_case() {
        assert_eq!(find_key_code('q', "en-US").unwrap(), "KeyQ");
        assert_eq!(find_key_code('Q', "en-GB").unwrap(), "KeyQ");
    }

    #[test]
    fn test_whitespace_maps_to_space_enter_tab() {
        assert_eq!(find_key_code(' ', "en-US").unwrap(), "Space");
        assert_eq!(find_key_code('\n', "en-US").unwrap(), "Enter");
        assert_eq!(find_key_code('\t', "en-GB").unwrap(), "Tab");
    }

    #[test]
    fn test_unmappable_character_returns_none() {
        assert!(find_key_code('é', "en-US").is_none());
        assert!(find_key_code('£', "en-US").is_none());
    }

    #[test]
    fn test_unknown_locale_falls_back_to_us() {
        assert_eq!(find_key_code('@', "fr-FR").unwrap(), "Digit2");
    }

    #[test]
    fn test_locale_tag_parsing_is_lenient() {
        assert_eq!(KeyboardLayout::from_locale("EN_gb"), Some(KeyboardLayout::EnGb));
        assert_eq!("en".parse::<KeyboardLayout>(), Ok(KeyboardLayout::EnUs));
        assert_eq!(
            "de-DE".parse::<KeyboardLayout>(),
            Err(UnknownLocale("de-DE".to_string()))
        );
    }

    #[test]
    fn test_requires_shift_key_for_uppercase_and_symbols() {
        assert!(requires_shift_key('A'));
        assert!(requires_shift_key('@'));
        assert!(requires_shift_key('?'));
        assert!(!requires_shift_key('a'));
        assert!(!requires_shift_key('1'));
        assert!(!requires_shift_key(' '));
    }

    #[test]
    fn test_layout_requires_shift_differs_for_hash() {
        assert!(KeyboardLayout::EnUs.requires_shift('#'));
        assert!(!KeyboardLayout::EnGb.requires_shift('#'));
    }

    #[test]
    fn test_layout_shift_agrees_with_generic_check_on_us_layout() {
        // Every character the US layout can type must agree with the
        // locale-independent shift check.
        for row in EN_US_SYMBOLS {
            assert!(!requires_shift_key(row.1), "{:?}", row.1);
            if let Some(shifted) = row.2 {
                assert!(requires_shift_key(shifted), "{shifted:?}");
            }
        }
    }
}
