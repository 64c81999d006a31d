use super::types::Key;

/// Number of slots in the key-state table.
pub const KEY_COUNT: usize = 256;

/// Held/not-held flag per virtual-key code.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyTable([bool; KEY_COUNT]);

impl KeyTable {
    pub fn new() -> Self {
        Self([false; KEY_COUNT])
    }

    /// Builds a table from a raw byte-per-key buffer (non-zero = held).
    ///
    /// Shorter buffers leave the remaining keys released; extra bytes are ignored.
    pub fn from_raw(raw: &[u8]) -> Self {
        let mut table = Self::new();
        for (slot, byte) in table.0.iter_mut().zip(raw) {
            *slot = *byte != 0;
        }
        table
    }

    #[inline]
    pub fn is_down(&self, code: u8) -> bool {
        self.0[usize::from(code)]
    }

    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        key.code().is_some_and(|c| self.is_down(c))
    }

    #[inline]
    pub fn set(&mut self, code: u8, down: bool) {
        self.0[usize::from(code)] = down;
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        if let Some(code) = key.code() {
            self.set(code, down);
        }
    }

    pub fn clear(&mut self) {
        self.0 = [false; KEY_COUNT];
    }

    pub fn any_down(&self) -> bool {
        self.0.iter().any(|k| *k)
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let held: Vec<u8> = (0..=u8::MAX).filter(|c| self.is_down(*c)).collect();
        f.debug_struct("KeyTable").field("held", &held).finish()
    }
}

/// Button flags carried by a pointer sample.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PointerButtons {
    pub primary: bool,
    pub secondary: bool,
    pub middle: bool,
}

/// One pointer reading: position in window pixels plus button flags.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub buttons: PointerButtons,
}

impl PointerSample {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, buttons: PointerButtons::default() }
    }

    pub fn with_secondary(mut self, down: bool) -> Self {
        self.buttons.secondary = down;
        self
    }
}

/// Input consumed by one frame of the renderer. Read-only to the core.
///
/// Only the current pointer sample travels here; the camera controller keeps
/// the previous one so that it alone decides when a sample becomes stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub keys: KeyTable,
    pub pointer: Option<PointerSample>,
}

impl InputSnapshot {
    pub fn new(keys: KeyTable, pointer: Option<PointerSample>) -> Self {
        Self { keys, pointer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_maps_non_zero_bytes() {
        let mut raw = [0u8; KEY_COUNT];
        raw[b'W' as usize] = 0x80;
        raw[0x20] = 1;
        let table = KeyTable::from_raw(&raw);
        assert!(table.key_down(Key::W));
        assert!(table.key_down(Key::Space));
        assert!(!table.key_down(Key::S));
    }

    #[test]
    fn short_raw_buffer_leaves_rest_released() {
        let table = KeyTable::from_raw(&[1, 0, 1]);
        assert!(table.is_down(0));
        assert!(table.is_down(2));
        assert!(!table.is_down(255));
    }
}
