//! Key/button code classification and the hardware-key-held bitmask (§4.5, §3).
//!
//! Grounded on `original_source/src/evdev-fallback.c`'s `evdev_usage_type_for_code`,
//! which buckets kernel key codes into keys, buttons, or discarded tool-type codes by
//! numeric range.

use evdev::Key;

/// What a kernel `EV_KEY` code represents, per §4.5's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Not interesting to this crate (e.g. a tool-type code).
    None,
    /// A keyboard key.
    Key,
    /// A pointer/touch button.
    Button,
}

/// Classify a raw kernel key code (§4.5 "Other codes are classified...").
#[must_use]
pub fn classify(code: u16) -> KeyType {
    const KEY_ESC: u16 = Key::KEY_ESC.0;
    const KEY_MICMUTE: u16 = Key::KEY_MICMUTE.0;
    const BTN_MISC: u16 = Key::BTN_MISC.0;
    const BTN_GEAR_UP: u16 = Key::BTN_GEAR_UP.0;

    if (KEY_ESC..=KEY_MICMUTE).contains(&code) {
        KeyType::Key
    } else if (BTN_MISC..=BTN_GEAR_UP).contains(&code) {
        KeyType::Button
    } else {
        KeyType::None
    }
}

/// True if `code` is a modifier key (shift/ctrl/alt/meta, either side). Used by DWT
/// (§4.8.3) to exclude modifier-only presses from triggering typing suppression.
#[must_use]
pub fn is_modifier(code: u16) -> bool {
    const MODIFIERS: [u16; 8] = [
        Key::KEY_LEFTSHIFT.0,
        Key::KEY_RIGHTSHIFT.0,
        Key::KEY_LEFTCTRL.0,
        Key::KEY_RIGHTCTRL.0,
        Key::KEY_LEFTALT.0,
        Key::KEY_RIGHTALT.0,
        Key::KEY_LEFTMETA.0,
        Key::KEY_RIGHTMETA.0,
    ];
    MODIFIERS.contains(&code)
}

/// Number of distinct kernel key/button codes (`KEY_MAX + 1` in the kernel headers).
const KEY_CODE_COUNT: usize = 768;
const WORD_BITS: usize = 64;
const WORDS: usize = KEY_CODE_COUNT.div_ceil(WORD_BITS);

/// A fixed-width bitset over the full kernel key-code range, tracking which keys are
/// currently held on a device (§3 "Bitmask of hardware keys currently held").
///
/// Too wide for [`bitflags`] (which targets small enumerated flag sets), so this is a
/// small hand-rolled word-array bitset instead.
#[derive(Debug, Clone)]
pub struct KeyBitset {
    words: [u64; WORDS],
}

impl Default for KeyBitset {
    fn default() -> Self {
        Self {
            words: [0; WORDS],
        }
    }
}

impl KeyBitset {
    /// An all-clear bitset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn location(code: u16) -> (usize, u64) {
        let code = code as usize;
        (code / WORD_BITS, 1u64 << (code % WORD_BITS))
    }

    /// True if `code` is currently held.
    #[must_use]
    pub fn is_set(&self, code: u16) -> bool {
        let (word, mask) = Self::location(code);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Mark `code` held. Returns `false` (and leaves state unchanged) if `code` was
    /// already held — the caller should drop the kernel event as a press-while-pressed
    /// violation (§3 invariant).
    pub fn press(&mut self, code: u16) -> bool {
        let (word, mask) = Self::location(code);
        let Some(slot) = self.words.get_mut(word) else {
            return false;
        };
        if *slot & mask != 0 {
            return false;
        }
        *slot |= mask;
        true
    }

    /// Mark `code` released. Returns `false` if `code` was not held — the caller
    /// should drop the kernel event as a release-without-press violation.
    pub fn release(&mut self, code: u16) -> bool {
        let (word, mask) = Self::location(code);
        let Some(slot) = self.words.get_mut(word) else {
            return false;
        };
        if *slot & mask == 0 {
            return false;
        }
        *slot &= !mask;
        true
    }

    /// All currently-held codes, used to synthesize releases on suspend (§4.5).
    pub fn iter_held(&self) -> impl Iterator<Item = u16> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, word)| {
            (0..WORD_BITS).filter_map(move |bit| {
                if word & (1u64 << bit) != 0 {
                    Some((word_idx * WORD_BITS + bit) as u16)
                } else {
                    None
                }
            })
        })
    }

    /// Clear every bit (§4.5 "the hardware key bitmask is zeroed" on suspend).
    pub fn clear(&mut self) {
        self.words = [0; WORDS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_ranges() {
        assert_eq!(classify(Key::KEY_A.0), KeyType::Key);
        assert_eq!(classify(Key::BTN_LEFT.0), KeyType::Button);
    }

    #[test]
    fn press_then_press_again_is_rejected() {
        let mut bitset = KeyBitset::new();
        assert!(bitset.press(Key::BTN_LEFT.0));
        assert!(!bitset.press(Key::BTN_LEFT.0));
    }

    #[test]
    fn release_without_press_is_rejected() {
        let mut bitset = KeyBitset::new();
        assert!(!bitset.release(Key::BTN_LEFT.0));
    }

    #[test]
    fn press_release_cycle_clears_bit() {
        let mut bitset = KeyBitset::new();
        bitset.press(Key::BTN_LEFT.0);
        assert!(bitset.is_set(Key::BTN_LEFT.0));
        bitset.release(Key::BTN_LEFT.0);
        assert!(!bitset.is_set(Key::BTN_LEFT.0));
    }

    #[test]
    fn iter_held_reports_all_pressed_codes() {
        let mut bitset = KeyBitset::new();
        bitset.press(Key::KEY_A.0);
        bitset.press(Key::BTN_LEFT.0);
        let mut held: Vec<_> = bitset.iter_held().collect();
        held.sort_unstable();
        let mut expected = vec![Key::KEY_A.0, Key::BTN_LEFT.0];
        expected.sort_unstable();
        assert_eq!(held, expected);
    }

    #[test]
    fn clear_releases_everything() {
        let mut bitset = KeyBitset::new();
        bitset.press(Key::KEY_A.0);
        bitset.clear();
        assert!(bitset.iter_held().next().is_none());
    }
}
