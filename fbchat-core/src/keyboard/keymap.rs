//! US layout scancode table.

use super::report::usage;

// Usages 0x1e..=0x38: digit row, enter, escape, backspace, tab, space and
// the punctuation keys. Zero marks keys with no character (escape,
// backspace, the non-US hash key).
const UNSHIFTED: &[u8; 27] = b"1234567890\n\0\0\t -=[]\\\0;'`,./";
const SHIFTED: &[u8; 27] = b"!@#$%^&*()\n\0\0\t _+{}|\0:\"~<>?";

/// Maps a keycode to ASCII.
///
/// Letters are upper case when exactly one of shift and caps lock is on;
/// the other keys follow shift alone. Unmapped keycodes give `None`.
pub fn to_ascii(code: u8, shift: bool, caps_lock: bool) -> Option<u8> {
    match code {
        usage::A..=usage::Z => {
            let base = if shift ^ caps_lock { b'A' } else { b'a' };
            Some(base + (code - usage::A))
        }
        usage::ONE..=usage::SLASH => {
            let table = if shift { SHIFTED } else { UNSHIFTED };
            match table[(code - usage::ONE) as usize] {
                0 => None,
                ch => Some(ch),
            }
        }
        _ => None,
    }
}
