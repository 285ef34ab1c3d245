/// One top-level entity under a watched location: its key and its value.
///
/// Key uniqueness among siblings is the store's business; the envelope just
/// mirrors what the store reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity<T> {
    key: String,
    value: T,
}

impl<T> Entity<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Entity {
            key: key.into(),
            value,
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_parts(self) -> (String, T) {
        (self.key, self.value)
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
