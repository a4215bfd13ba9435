// ── API object machinery ──
//
// Every resource type implements `ApiObject`: where it lives in the
// Classic API and how to read it from JSON. Types the server accepts
// writes for add `Writable`, their XML form. Persistence is split into
// capability traits so the compiler refuses e.g. creating a computer
// record or deleting an LDAP server.
//
// Objects track one dirty flag, not per-field changes. `update` sends
// the whole object when the flag is set and does nothing otherwise.

use serde_json::Value;
use tracing::{debug, info};

use jamf_api::{XmlElement, parse_id};

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;

// ── ObjectCore ───────────────────────────────────────────────────────

/// Identity and persistence state shared by every object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCore {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) in_jss: bool,
    pub(crate) need_to_update: bool,
}

impl ObjectCore {
    /// State for a locally built object that has never been saved.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            in_jss: false,
            need_to_update: false,
        }
    }

    /// State for an object just read from the server.
    pub fn loaded(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            in_jss: true,
            need_to_update: false,
        }
    }

    /// Read `id` and `name` from the top level of a record.
    pub fn from_json(record: &Value) -> Result<Self> {
        let id = json::opt_i64(record, "id")
            .ok_or_else(|| JssError::MissingData("record has no id".into()))?;
        Ok(Self::loaded(id, json::string(record, "name")))
    }

    /// Read `id` and `name` from a subset such as `general`.
    pub fn from_json_at(record: &Value, subset: &str) -> Result<Self> {
        Self::from_json(json::at(record, subset))
    }

    /// Flag the object as changed.
    pub fn touch(&mut self) {
        self.need_to_update = true;
    }
}

/// Where an object is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ObjectState {
    /// Built locally, not yet created on the server.
    New,
    /// Matches the server.
    Clean,
    /// Changed locally since it was fetched or saved.
    Dirty,
}

// ── ObjectRef ────────────────────────────────────────────────────────

/// An `{id, name}` reference to another object, as embedded in records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectRef {
    pub id: i64,
    pub name: String,
}

impl ObjectRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn from_json(v: &Value) -> Self {
        Self {
            id: json::i64_or(v, "id", 0),
            name: json::string(v, "name"),
        }
    }

    /// Parse every member of the array at `key`.
    pub fn list_from_json(v: &Value, key: &str) -> Vec<Self> {
        json::array(v, key).iter().map(Self::from_json).collect()
    }

    /// `<tag><id>..</id><name>..</name></tag>`
    pub fn to_xml(&self, tag: &str) -> XmlElement {
        XmlElement::new(tag)
            .text_child("id", self.id)
            .text_child("name", &self.name)
    }

    /// `<plural><singular>..</singular>...</plural>`
    pub fn list_to_xml(refs: &[Self], plural: &str, singular: &str) -> XmlElement {
        XmlElement::new(plural).extend(refs.iter().map(|r| r.to_xml(singular)))
    }
}

// ── Traits ───────────────────────────────────────────────────────────

/// A resource type of the Classic API.
pub trait ApiObject: Sized + Send + Sync + 'static {
    /// Resource path, e.g. `computergroups`.
    const RSRC_BASE: &'static str;
    /// Key of the array in the summary list response.
    const RSRC_LIST_KEY: &'static str;
    /// Key wrapping a single record, also the root element of its XML.
    const RSRC_OBJECT_KEY: &'static str;
    /// Path of the summary list, when it differs from `RSRC_BASE`.
    const RSRC_LIST_PATH: &'static str = Self::RSRC_BASE;
    /// Extra unique keys in the summary list usable for lookup.
    const OTHER_LOOKUP_KEYS: &'static [&'static str] = &[];

    fn core(&self) -> &ObjectCore;
    fn core_mut(&mut self) -> &mut ObjectCore;

    /// Build the object from the record under `RSRC_OBJECT_KEY`.
    fn from_json(record: &Value) -> Result<Self>;

    fn id(&self) -> i64 {
        self.core().id
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn in_jss(&self) -> bool {
        self.core().in_jss
    }

    fn need_to_update(&self) -> bool {
        self.core().need_to_update
    }

    fn state(&self) -> ObjectState {
        match (self.in_jss(), self.need_to_update()) {
            (false, _) => ObjectState::New,
            (true, false) => ObjectState::Clean,
            (true, true) => ObjectState::Dirty,
        }
    }

    /// Resource path of this object on the server.
    fn rest_rsrc(&self) -> String {
        format!("{}/id/{}", Self::RSRC_BASE, self.id())
    }
}

/// Objects with an XML form the server accepts. Read-only resources
/// never implement this.
pub trait Writable: ApiObject {
    /// The full XML body for POST/PUT.
    fn rest_xml(&self) -> XmlElement;

    /// Hook run after a successful create or update.
    fn on_saved(&mut self) {}
}

/// Objects that can be created on the server.
pub trait Creatable: Writable {
    /// A blank object with the given name, not yet saved.
    fn new_unsaved(name: &str) -> Self;

    /// Checks that must pass before the first POST.
    fn validate_for_create(&self) -> Result<()> {
        Ok(())
    }

    /// Where to POST the new object.
    fn create_rsrc(&self) -> String {
        format!("{}/id/0", Self::RSRC_BASE)
    }

    /// An unsaved copy under a new name.
    fn duplicate(&self, new_name: &str) -> Self
    where
        Self: Clone,
    {
        let mut copy = self.clone();
        *copy.core_mut() = ObjectCore::new(new_name);
        copy
    }
}

/// Objects whose changes can be sent back to the server.
pub trait Updatable: Writable {
    /// Checks that must pass before a PUT.
    fn validate_for_update(&self) -> Result<()> {
        Ok(())
    }
}

/// Objects that can be deleted from the server.
pub trait Deletable: ApiObject {}

// ── Lifecycle ────────────────────────────────────────────────────────

impl Jss {
    /// A new, unsaved object. Fails when the name is empty or taken.
    pub async fn make<T: Creatable>(&self, name: &str) -> Result<T> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JssError::MissingData(format!(
                "a name is required for a new {}",
                T::RSRC_OBJECT_KEY
            )));
        }
        self.ensure_name_available::<T>(name).await?;
        Ok(T::new_unsaved(name))
    }

    /// POST a new object and adopt the id the server assigns.
    pub async fn create<T: Creatable>(&self, obj: &mut T) -> Result<i64> {
        if obj.in_jss() {
            return Err(JssError::AlreadyExists(format!(
                "{} '{}' already exists with id {}; use update",
                T::RSRC_OBJECT_KEY,
                obj.name(),
                obj.id()
            )));
        }
        obj.validate_for_create()?;
        self.ensure_name_available::<T>(obj.name()).await?;

        let body = self
            .api()
            .post_xml(&obj.create_rsrc(), obj.rest_xml().to_document())
            .await?;
        let id = parse_id(&body).ok_or_else(|| JssError::Api {
            status: None,
            message: format!("create response carried no id: {body}"),
        })?;

        let core = obj.core_mut();
        core.id = id;
        core.in_jss = true;
        core.need_to_update = false;
        obj.on_saved();
        self.forget_list(T::RSRC_LIST_KEY);

        info!(kind = T::RSRC_OBJECT_KEY, id, name = obj.name(), "created");
        Ok(id)
    }

    /// PUT the object if it changed. Returns whether anything was sent.
    pub async fn update<T: Updatable>(&self, obj: &mut T) -> Result<bool> {
        if !obj.in_jss() {
            return Err(JssError::NoSuchItem(format!(
                "{} '{}' is not in the JSS; create it first",
                T::RSRC_OBJECT_KEY,
                obj.name()
            )));
        }
        if !obj.need_to_update() {
            debug!(kind = T::RSRC_OBJECT_KEY, id = obj.id(), "no changes to send");
            return Ok(false);
        }
        obj.validate_for_update()?;

        self.api()
            .put_xml(&obj.rest_rsrc(), obj.rest_xml().to_document())
            .await?;

        obj.core_mut().need_to_update = false;
        obj.on_saved();
        // A rename saved here changes the cached list.
        self.forget_list(T::RSRC_LIST_KEY);

        info!(kind = T::RSRC_OBJECT_KEY, id = obj.id(), "updated");
        Ok(true)
    }

    /// Create when new, update otherwise. Returns the object id.
    pub async fn save<T: Creatable + Updatable>(&self, obj: &mut T) -> Result<i64> {
        if obj.in_jss() {
            self.update(obj).await?;
            Ok(obj.id())
        } else {
            self.create(obj).await
        }
    }

    /// Change the name locally. Fails when another object has it.
    pub async fn rename<T: Updatable>(&self, obj: &mut T, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(JssError::MissingData("name cannot be empty".into()));
        }
        if new_name == obj.name() {
            return Ok(());
        }
        if !new_name.eq_ignore_ascii_case(obj.name()) {
            self.ensure_name_available::<T>(new_name).await?;
        }
        let core = obj.core_mut();
        core.name = new_name.to_owned();
        core.touch();
        self.forget_list(T::RSRC_LIST_KEY);
        Ok(())
    }

    /// DELETE the object. Afterwards it is unsaved again.
    pub async fn delete<T: Deletable>(&self, obj: &mut T) -> Result<()> {
        if !obj.in_jss() {
            return Err(JssError::NoSuchItem(format!(
                "{} '{}' is not in the JSS",
                T::RSRC_OBJECT_KEY,
                obj.name()
            )));
        }
        self.api().delete(&obj.rest_rsrc()).await?;
        self.forget_list(T::RSRC_LIST_KEY);

        info!(kind = T::RSRC_OBJECT_KEY, id = obj.id(), "deleted");
        let core = obj.core_mut();
        core.id = 0;
        core.in_jss = false;
        core.need_to_update = false;
        Ok(())
    }

    /// DELETE objects by id without fetching them.
    ///
    /// Returns the ids that did not exist; those are skipped.
    pub async fn delete_ids<T: Deletable>(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let existing = self.all_ids::<T>(true).await?;
        let mut skipped = Vec::new();
        for &id in ids {
            if !existing.contains(&id) {
                skipped.push(id);
                continue;
            }
            self.api()
                .delete(&format!("{}/id/{id}", T::RSRC_BASE))
                .await?;
            info!(kind = T::RSRC_OBJECT_KEY, id, "deleted");
        }
        self.forget_list(T::RSRC_LIST_KEY);
        Ok(skipped)
    }

    async fn ensure_name_available<T: ApiObject>(&self, name: &str) -> Result<()> {
        let taken = self
            .all_names::<T>(true)
            .await?
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(name));
        if taken {
            return Err(JssError::AlreadyExists(format!(
                "a {} named '{name}' already exists",
                T::RSRC_OBJECT_KEY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn core_reads_id_and_name() {
        let core = ObjectCore::from_json_at(
            &json!({ "general": { "id": 7, "name": "Office" } }),
            "general",
        )
        .unwrap();
        assert_eq!(core, ObjectCore::loaded(7, "Office"));
        assert!(core.in_jss);
    }

    #[test]
    fn core_without_id_is_missing_data() {
        let err = ObjectCore::from_json(&json!({ "name": "x" })).unwrap_err();
        assert!(matches!(err, JssError::MissingData(_)));
    }

    #[test]
    fn touch_sets_dirty_flag() {
        let mut core = ObjectCore::loaded(1, "a");
        assert!(!core.need_to_update);
        core.touch();
        assert!(core.need_to_update);
    }

    #[test]
    fn object_ref_renders_xml() {
        let r = ObjectRef::new(3, "Lab");
        assert_eq!(
            ObjectRef::list_to_xml(&[r], "buildings", "building").to_xml_string(),
            "<buildings><building><id>3</id><name>Lab</name></building></buildings>"
        );
    }

    // Generic over the write side only; read-only types do not fit here.
    fn document_of<T: Writable>(obj: &T) -> String {
        obj.rest_xml().to_xml_string()
    }

    #[test]
    fn writable_body_is_rooted_at_object_key() {
        let building = crate::resources::Building::new_unsaved("Annex");
        assert_eq!(
            document_of(&building),
            "<building><name>Annex</name></building>"
        );
    }
}
