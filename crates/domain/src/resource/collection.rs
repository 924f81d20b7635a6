//! Insertion-ordered record collections.

use super::ResourceRecord;

/// An insertion-ordered sequence of records, unique by canonical id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceCollection {
    records: Vec<ResourceRecord>,
}

impl ResourceCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a collection, keeping the first record for each id.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ResourceRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if !collection.contains(record.id()) {
                collection.records.push(record);
            }
        }
        collection
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = ResourceRecord>) {
        *self = Self::from_records(records);
    }

    /// Inserts a record at the front, dropping any record with the same id.
    pub fn prepend(&mut self, record: ResourceRecord) {
        self.remove(record.id());
        self.records.insert(0, record);
    }

    /// Replaces a record in place, or prepends it if absent.
    pub fn upsert(&mut self, record: ResourceRecord) {
        match self.position(record.id()) {
            Some(index) => self.records[index] = record,
            None => self.records.insert(0, record),
        }
    }

    /// Index of the record with the given id.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Whether a record with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Looks up a record by canonical id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ResourceRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Looks up a record by canonical id for mutation.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut ResourceRecord> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    /// Removes and returns the record with the given id.
    pub fn remove(&mut self, id: &str) -> Option<ResourceRecord> {
        let index = self.position(id)?;
        Some(self.records.remove(index))
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates records in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.iter()
    }

    /// Canonical ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(ResourceRecord::id).collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ResourceRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a ResourceRecord;
    type IntoIter = std::slice::Iter<'a, ResourceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
