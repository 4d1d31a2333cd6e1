//! Embedded resources come back from the table service either as `null`, as a
//! single object (to-one relationship) or as an array (when the relationship is
//! inferred as to-many). [Embedded] collapses all of them into one shape.

use serde::{Deserialize, Deserializer, Serialize};

/// A 1:1 join result
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Embedded<T> {
    #[default]
    Zero,
    One(T),
}

impl<T> Embedded<T> {
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Embedded::Zero => None,
            Embedded::One(inner) => Some(inner),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Embedded::Zero => None,
            Embedded::One(inner) => Some(inner),
        }
    }
}

impl<T> From<Option<T>> for Embedded<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Embedded::One).unwrap_or(Embedded::Zero)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEmbedded<T> {
    Many(Vec<T>),
    One(T),
}

impl<'de, T> Deserialize<'de> for Embedded<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawEmbedded<T>>::deserialize(deserializer)?;
        Ok(match raw {
            None => Embedded::Zero,
            Some(RawEmbedded::One(inner)) => Embedded::One(inner),
            Some(RawEmbedded::Many(rows)) => rows.into_iter().next().into(),
        })
    }
}

impl<T> Serialize for Embedded<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_ref().serialize(serializer)
    }
}
