//! Entity adapter seam.
//!
//! The host owns its records; the engine only needs their identity. Hosts
//! implement `Taggable` on their record type (or a thin view of it) and hand
//! it, or a reference to it, to the engine that manages its tags.

/// Identity of a taggable record as the engine sees it.
pub trait Taggable {
    /// Table (collection) name of the entity type, e.g. `Post`.
    fn table_name(&self) -> &str;

    /// Primary key, once the record has been stored.
    fn primary_key(&self) -> Option<i64>;

    /// True while the record is being inserted for the first time.
    ///
    /// This may still be true when `after_save` runs for the insert, even
    /// though a primary key has already been assigned.
    fn is_new_record(&self) -> bool;
}

impl<T: Taggable + ?Sized> Taggable for &T {
    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    fn primary_key(&self) -> Option<i64> {
        (**self).primary_key()
    }

    fn is_new_record(&self) -> bool {
        (**self).is_new_record()
    }
}

/// Minimal owned adapter for hosts that do not want to implement the trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub table: String,
    pub id: Option<i64>,
    pub is_new: bool,
}

impl EntityRef {
    /// A record that already exists in storage.
    pub fn stored(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id: Some(id),
            is_new: false,
        }
    }

    /// A record that has just been inserted under `id`.
    pub fn inserted(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id: Some(id),
            is_new: true,
        }
    }

    /// A record not yet inserted.
    pub fn unsaved(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id: None,
            is_new: true,
        }
    }

    /// Record that the insert completed.
    pub fn mark_persisted(&mut self) {
        self.is_new = false;
    }
}

impl Taggable for EntityRef {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn primary_key(&self) -> Option<i64> {
        self.id
    }

    fn is_new_record(&self) -> bool {
        self.is_new
    }
}
