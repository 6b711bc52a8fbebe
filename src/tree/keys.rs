//! Namespaced KV key builders for tree rows.
//! Keep this module focused and small; complex logic belongs in higher layers.

/// Rows are keyed `tree.entry::<container>\0<name>` so one prefix scan lists a container.
const ENTRY_NS: &str = "tree.entry::";
const KEY_SEP: char = '\u{0000}';

pub struct Keys;

impl Keys {
    pub fn entry(container: &str, name: &str) -> String {
        format!("{}{}{}{}", ENTRY_NS, container, KEY_SEP, name)
    }

    /// Prefix matching every row whose container is exactly `container`.
    #[inline]
    pub fn container_prefix(container: &str) -> String {
        format!("{}{}{}", ENTRY_NS, container, KEY_SEP)
    }

    #[inline]
    pub fn entry_prefix() -> &'static str { ENTRY_NS }

    /// Inverse of [`Keys::entry`].
    pub fn parse_entry(key: &str) -> Option<(&str, &str)> {
        let rest = key.strip_prefix(ENTRY_NS)?;
        rest.split_once(KEY_SEP)
    }
}
