//! Serde helpers for JSON objects whose key order is meaningful.
//!
//! `serde_json::Map` sorts its keys, so ordered sections of a flow
//! definition are held as `Vec<(String, T)>` and (de)serialized as objects.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, Error, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
  T: Serialize,
{
  let mut map = serializer.serialize_map(Some(entries.len()))?;
  for (key, value) in entries {
    map.serialize_entry(key, value)?;
  }
  map.end()
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

struct OrderedVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
  type Value = Vec<(String, T)>;

  fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("an object")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
    let mut entries: Vec<(String, T)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
    while let Some((key, value)) = access.next_entry::<String, T>()? {
      if entries.iter().any(|(k, _)| *k == key) {
        return Err(A::Error::custom(format!("duplicate key '{}'", key)));
      }
      entries.push((key, value));
    }
    Ok(entries)
  }
}
