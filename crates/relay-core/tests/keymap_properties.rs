//! Integration tests for the relay-core keymap.
//!
//! Exercises the canonicalizer and the layouts together through the public
//! API, the way the forwarder uses them.

use relay_core::{
    canonicalize, find_key_code, is_modifier_code, requires_shift_key, CanonicalCode,
    KeyboardLayout,
};

#[test]
fn test_blank_alt_is_right_alt_for_any_label_casing_of_code() {
    // The rule keys off the exact "Alt" label and an empty code only.
    assert_eq!(canonicalize("", "Alt"), CanonicalCode::ALT_RIGHT);
    assert_ne!(canonicalize("", "alt"), CanonicalCode::ALT_RIGHT);
}

#[test]
fn test_every_legacy_os_code_maps_to_meta_with_same_side() {
    for (legacy, expected) in [
        ("OSLeft", CanonicalCode::META_LEFT),
        ("OSRight", CanonicalCode::META_RIGHT),
    ] {
        for label in ["OS", "Meta", "Super", ""] {
            let code = canonicalize(legacy, label);
            assert_eq!(code, expected, "{legacy} with label {label:?}");
            assert!(is_modifier_code(&code));
        }
    }
}

#[test]
fn test_every_printable_ascii_character_is_typeable_on_both_layouts() {
    // Arrange: both layouts cover the full printable ASCII range.
    for layout in [KeyboardLayout::EnUs, KeyboardLayout::EnGb] {
        for byte in 0x20u8..0x7f {
            let c = byte as char;

            // Act
            let code = find_key_code(c, layout.locale_tag());

            // Assert
            let code = code.unwrap_or_else(|| panic!("{c:?} must map on {layout}"));
            assert!(code.is_known(), "{code} must be a known code");
            assert!(!is_modifier_code(&code));
        }
    }
}

#[test]
fn test_generic_shift_check_matches_us_layout_for_printable_ascii() {
    for byte in 0x20u8..0x7f {
        let c = byte as char;
        assert_eq!(
            requires_shift_key(c),
            KeyboardLayout::EnUs.requires_shift(c),
            "{c:?}"
        );
    }
}

#[test]
fn test_uk_pound_sign_is_shifted_digit3() {
    assert_eq!(find_key_code('£', "en-GB").unwrap(), "Digit3");
    assert!(KeyboardLayout::EnGb.requires_shift('£'));
    assert!(requires_shift_key('£'));
}
