use indexmap::IndexMap;

use crate::error::Error;

/// Label name to byte offset, in definition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    labels: IndexMap<String, usize>,
}

impl Labels {
    pub fn new() -> Self {
        Labels {
            labels: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, offset: usize) -> Result<(), Error> {
        match self.labels.insert(name.to_string(), offset) {
            Some(_) => Err(Error::RedefinedLabel(name.to_string())),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Result<usize, Error> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndefinedLabel(name.to_string()))
    }

    /// Labels defined at `offset`.
    pub fn at(&self, offset: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, &o)| o == offset)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, &o)| (name.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
