//! Key/value settings store trait

/// Errors from a settings store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// No room for another key
    Full,
    /// Key longer than the store supports
    KeyTooLong,
    /// String value longer than the store supports
    ValueTooLong,
}

/// Opaque persisted key/value capability
///
/// The clock reads its settings through this trait at startup and writes
/// them back on change. The storage format is the implementation's
/// business.
pub trait SettingsStore {
    /// Read an integer, falling back to `default` when the key is absent
    /// or holds a string
    fn get_int(&self, key: &str, default: i32) -> i32;

    /// Store an integer
    fn set_int(&mut self, key: &str, value: i32) -> Result<(), StoreError>;

    /// Read a string value
    fn get_string(&self, key: &str) -> Option<&str>;

    /// Store a string value
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}
