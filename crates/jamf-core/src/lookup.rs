// ── Identity resolution ──
//
// Objects are found through their summary list: resolve an identifier
// (id, name, or an alternate key like serial number) to exactly one id,
// then GET the full record by id. Lists are memoized per resource type
// on the connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::object::ApiObject;

// ── Ident ────────────────────────────────────────────────────────────

/// How to identify an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    Id(i64),
    Name(String),
    /// An alternate key of the summary list, e.g. `serial_number`.
    Key { key: String, value: String },
    /// Try the id, then the name, then each alternate key.
    Any(String),
}

impl From<i64> for Ident {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Self::Any(s.to_owned())
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Self::Any(s)
    }
}

impl From<&String> for Ident {
    fn from(s: &String) -> Self {
        Self::Any(s.clone())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Key { key, value } => write!(f, "{key} '{value}'"),
            Self::Any(s) => write!(f, "'{s}'"),
        }
    }
}

// ── ListEntry ────────────────────────────────────────────────────────

/// One row of a summary list, kept as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListEntry(Map<String, Value>);

impl ListEntry {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(json::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A scalar field rendered as a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(json::scalar_string)
    }

    /// A boolean field; absent or non-boolean is `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ListEntry {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ── Resolution ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LookupFailure {
    Missing,
    Ambiguous(usize),
}

/// Find the one entry an identifier names.
///
/// Name and key comparisons ignore ASCII case. Each stage of `Any` only
/// falls through when it matched nothing; two matches stop the search.
pub(crate) fn resolve<'a>(
    entries: &'a [ListEntry],
    ident: &Ident,
    other_keys: &[&str],
) -> std::result::Result<&'a ListEntry, LookupFailure> {
    match ident {
        Ident::Id(id) => single(entries, |e| e.id() == Some(*id)),
        Ident::Name(name) => single(entries, |e| eq_ci(e.name(), name)),
        Ident::Key { key, value } => {
            single(entries, |e| eq_ci(e.get_str(key).as_deref(), value))
        }
        Ident::Any(s) => {
            if let Ok(id) = s.trim().parse::<i64>() {
                match single(entries, |e| e.id() == Some(id)) {
                    Err(LookupFailure::Missing) => {}
                    found => return found,
                }
            }
            match single(entries, |e| eq_ci(e.name(), s)) {
                Err(LookupFailure::Missing) => {}
                found => return found,
            }
            for key in other_keys {
                match single(entries, |e| eq_ci(e.get_str(key).as_deref(), s)) {
                    Err(LookupFailure::Missing) => {}
                    found => return found,
                }
            }
            Err(LookupFailure::Missing)
        }
    }
}

fn single(
    entries: &[ListEntry],
    pred: impl Fn(&ListEntry) -> bool,
) -> std::result::Result<&ListEntry, LookupFailure> {
    let mut matches = entries.iter().filter(|e| pred(e));
    match (matches.next(), matches.count()) {
        (None, _) => Err(LookupFailure::Missing),
        (Some(entry), 0) => Ok(entry),
        (Some(_), more) => Err(LookupFailure::Ambiguous(more + 1)),
    }
}

fn eq_ci(candidate: Option<&str>, wanted: &str) -> bool {
    candidate.is_some_and(|c| !c.is_empty() && c.eq_ignore_ascii_case(wanted.trim()))
}

// ── Jss lookup operations ────────────────────────────────────────────

impl Jss {
    /// The summary list of a resource type, memoized until `refresh`.
    pub async fn all<T: ApiObject>(&self, refresh: bool) -> Result<Arc<Vec<ListEntry>>> {
        if !refresh {
            if let Some(list) = self.cached_list(T::RSRC_LIST_KEY) {
                return Ok(list);
            }
        }

        let value = self.api().get_json(T::RSRC_LIST_PATH).await?;
        let entries: Vec<ListEntry> = json::array(&value, T::RSRC_LIST_KEY)
            .iter()
            .filter_map(|v| v.as_object().cloned().map(ListEntry::from))
            .collect();
        debug!(list = T::RSRC_LIST_KEY, count = entries.len(), "summary list loaded");

        let list = Arc::new(entries);
        self.store_list(T::RSRC_LIST_KEY, Arc::clone(&list));
        Ok(list)
    }

    pub async fn all_ids<T: ApiObject>(&self, refresh: bool) -> Result<Vec<i64>> {
        Ok(self.all::<T>(refresh).await?.iter().filter_map(ListEntry::id).collect())
    }

    pub async fn all_names<T: ApiObject>(&self, refresh: bool) -> Result<Vec<String>> {
        Ok(self
            .all::<T>(refresh)
            .await?
            .iter()
            .filter_map(|e| e.name().map(str::to_owned))
            .collect())
    }

    /// Map each id in the summary list to the value of another field.
    pub async fn map_all_ids_to<T: ApiObject>(
        &self,
        key: &str,
        refresh: bool,
    ) -> Result<HashMap<i64, Value>> {
        Ok(self
            .all::<T>(refresh)
            .await?
            .iter()
            .filter_map(|e| Some((e.id()?, e.get(key).cloned().unwrap_or(Value::Null))))
            .collect())
    }

    /// The summary-list entry an identifier names, if exactly one does.
    pub async fn lookup_entry<T: ApiObject>(
        &self,
        ident: impl Into<Ident>,
    ) -> Result<Option<ListEntry>> {
        let ident = ident.into();
        let list = self.all::<T>(false).await?;
        match resolve(&list, &ident, T::OTHER_LOOKUP_KEYS) {
            Ok(entry) => Ok(Some(entry.clone())),
            Err(LookupFailure::Missing) => Ok(None),
            Err(LookupFailure::Ambiguous(n)) => {
                warn!(kind = T::RSRC_OBJECT_KEY, %ident, matches = n, "ambiguous lookup");
                Ok(None)
            }
        }
    }

    /// The id an identifier names, if exactly one object matches.
    pub async fn valid_id<T: ApiObject>(&self, ident: impl Into<Ident>) -> Result<Option<i64>> {
        Ok(self.lookup_entry::<T>(ident).await?.and_then(|e| e.id()))
    }

    pub async fn exists<T: ApiObject>(&self, ident: impl Into<Ident>) -> Result<bool> {
        Ok(self.valid_id::<T>(ident).await?.is_some())
    }

    /// Resolve an identifier to one id, or `NoSuchItem`.
    pub async fn require_id<T: ApiObject>(&self, ident: impl Into<Ident>) -> Result<i64> {
        let ident = ident.into();
        self.valid_id::<T>(ident.clone()).await?.ok_or_else(|| {
            JssError::NoSuchItem(format!("no {} matches {ident}", T::RSRC_OBJECT_KEY))
        })
    }

    /// Fetch the full object an identifier names.
    pub async fn fetch<T: ApiObject>(&self, ident: impl Into<Ident>) -> Result<T> {
        let id = self.require_id::<T>(ident).await?;
        self.fetch_by_id(id).await
    }

    /// Fetch by id without consulting the summary list.
    pub async fn fetch_by_id<T: ApiObject>(&self, id: i64) -> Result<T> {
        let record = self.fetch_record::<T>(id).await?;
        let mut obj = T::from_json(&record)?;
        let core = obj.core_mut();
        core.in_jss = true;
        core.need_to_update = false;
        Ok(obj)
    }

    /// The raw JSON record of an object, unwrapped from its object key.
    pub async fn fetch_record<T: ApiObject>(&self, id: i64) -> Result<Value> {
        let rsrc = format!("{}/id/{id}", T::RSRC_BASE);
        let mut value = self.api().get_json(&rsrc).await.map_err(|e| {
            if e.is_not_found() {
                JssError::NoSuchItem(format!("no {} with id {id}", T::RSRC_OBJECT_KEY))
            } else {
                e.into()
            }
        })?;
        match value.get_mut(T::RSRC_OBJECT_KEY) {
            Some(record) => Ok(record.take()),
            None => Err(JssError::MissingData(format!(
                "response for {rsrc} has no '{}' record",
                T::RSRC_OBJECT_KEY
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries() -> Vec<ListEntry> {
        let list = json!([
            { "id": 1, "name": "Mac-01", "serial_number": "C02AAA", "udid": "U-1" },
            { "id": 2, "name": "mac-02", "serial_number": "C02BBB", "udid": "U-2" },
            { "id": 3, "name": "Shared", "serial_number": "C02CCC", "udid": "U-3" },
            { "id": 4, "name": "SHARED", "serial_number": "4", "udid": "U-4" },
        ]);
        serde_json::from_value(list).unwrap()
    }

    const KEYS: &[&str] = &["udid", "serial_number"];

    #[test]
    fn resolves_by_id_and_case_insensitive_name() {
        let list = entries();
        assert_eq!(resolve(&list, &Ident::Id(2), KEYS).unwrap().id(), Some(2));
        assert_eq!(
            resolve(&list, &Ident::Name("MAC-02".into()), KEYS).unwrap().id(),
            Some(2)
        );
    }

    #[test]
    fn resolves_by_explicit_key() {
        let list = entries();
        let ident = Ident::Key {
            key: "serial_number".into(),
            value: "c02ccc".into(),
        };
        assert_eq!(resolve(&list, &ident, KEYS).unwrap().id(), Some(3));
    }

    #[test]
    fn any_prefers_id_then_name_then_keys() {
        let list = entries();
        // "4" is both an id and a serial number; the id wins.
        assert_eq!(resolve(&list, &Ident::Any("4".into()), KEYS).unwrap().id(), Some(4));
        assert_eq!(resolve(&list, &Ident::Any("mac-01".into()), KEYS).unwrap().id(), Some(1));
        assert_eq!(resolve(&list, &Ident::Any("U-3".into()), KEYS).unwrap().id(), Some(3));
    }

    #[test]
    fn duplicate_names_are_ambiguous() {
        let list = entries();
        assert_eq!(
            resolve(&list, &Ident::Name("shared".into()), KEYS).unwrap_err(),
            LookupFailure::Ambiguous(2)
        );
    }

    #[test]
    fn unknown_ident_is_missing() {
        let list = entries();
        assert_eq!(
            resolve(&list, &Ident::Any("nope".into()), KEYS).unwrap_err(),
            LookupFailure::Missing
        );
        assert_eq!(resolve(&list, &Ident::Id(99), KEYS).unwrap_err(), LookupFailure::Missing);
    }

    #[test]
    fn list_entry_accessors() {
        let entry: ListEntry =
            serde_json::from_value(json!({ "id": "5", "name": "X", "managed": true })).unwrap();
        assert_eq!(entry.id(), Some(5));
        assert!(entry.get_bool("managed"));
        assert!(!entry.get_bool("absent"));
    }
}
