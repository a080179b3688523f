//! Reusable record storage.

use std::{iter::FusedIterator, string::String, vec::Vec};

extern crate std;

/// A single record: an ordered list of fields.
///
/// Fields are stored back to back in one buffer, so clearing and refilling a
/// record reuses its allocations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    text: String,
    ends: Vec<usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Whether the record holds no fields.
    ///
    /// Records produced by a reader always hold at least one (possibly empty)
    /// field.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Retrieve a field by column.
    pub fn get(&self, i: usize) -> Option<&str> {
        let end = *self.ends.get(i)?;
        let start = match i {
            0 => 0,
            _ => self.ends[i - 1],
        };

        self.text.get(start..end)
    }

    pub fn iter(&self) -> Fields<'_> {
        Fields {
            record: self,
            front: 0,
            back: self.ends.len(),
        }
    }

    /// Copy fields into owned strings.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(String::from).collect()
    }

    pub(crate) fn push_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub(crate) fn end_field(&mut self) {
        self.ends.push(self.text.len());
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
        self.ends.clear();
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a str;
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Record {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut record = Self::new();

        for field in iter {
            record.text.push_str(field.as_ref());
            record.end_field();
        }

        record
    }
}

/// Iterator over the fields of a [`Record`].
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    record: &'a Record,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        let field = self.record.get(self.front);
        self.front += 1;
        field
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Fields<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }

        self.back -= 1;
        self.record.get(self.back)
    }
}

impl ExactSizeIterator for Fields<'_> {}
impl FusedIterator for Fields<'_> {}
