// Category assignment.
//
// Records carry their category either as a bare name string (policies,
// packages, scripts) or as an `{id, name}` hash (profiles, apps). Both
// read into `CategoryRef`; the resource picks the XML form it needs.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;
use crate::resources::Category;

/// The name the server uses for "no category".
pub const NO_CATEGORY: &str = "No category assigned";

/// How a resource writes its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStyle {
    /// `<category>Name</category>`
    Name,
    /// `<category><id>..</id><name>..</name></category>`
    Hash,
}

/// The category an object is assigned to, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl CategoryRef {
    /// Read either form. The "no category" sentinels become the default.
    pub fn from_json(v: &Value) -> Self {
        let (id, name) = match v {
            Value::String(s) => (None, Some(s.clone())),
            Value::Object(_) => (
                json::opt_i64(v, "id").filter(|id| *id > 0),
                json::opt_str(v, "name"),
            ),
            _ => (None, None),
        };
        match name.filter(|n| !is_unassigned(n)) {
            Some(name) => Self {
                id,
                name: Some(name),
            },
            None => Self::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_assigned(&self) -> bool {
        self.name.is_some()
    }

    pub fn to_xml(&self, style: CategoryStyle) -> XmlElement {
        let name = self.name.as_deref().unwrap_or(NO_CATEGORY);
        match style {
            CategoryStyle::Name => XmlElement::with_text("category", name),
            CategoryStyle::Hash => XmlElement::new("category")
                .text_child("id", self.id.unwrap_or(-1))
                .text_child("name", name),
        }
    }
}

fn is_unassigned(name: &str) -> bool {
    name.is_empty() || name == NO_CATEGORY || name.eq_ignore_ascii_case("unknown")
}

/// Objects assigned to a category.
pub trait Categorizable: ApiObject {
    const CATEGORY_STYLE: CategoryStyle;

    fn category(&self) -> &CategoryRef;
    fn category_mut(&mut self) -> &mut CategoryRef;

    fn category_name(&self) -> Option<&str> {
        self.category().name()
    }

    fn category_xml(&self) -> XmlElement {
        self.category().to_xml(Self::CATEGORY_STYLE)
    }
}

impl Jss {
    /// Assign a category by name, or clear it with `None`.
    ///
    /// The category must exist; its canonical name is stored.
    pub async fn set_category<T: Categorizable>(&self, obj: &mut T, name: Option<&str>) -> Result<()> {
        let wanted = name.map(str::trim).filter(|n| !is_unassigned(n));

        let new_ref = match wanted {
            None => CategoryRef::default(),
            Some(name) => {
                let entry = self
                    .lookup_entry::<Category>(Ident::Name(name.to_owned()))
                    .await?
                    .ok_or_else(|| JssError::NoSuchItem(format!("no category named '{name}'")))?;
                CategoryRef {
                    id: entry.id(),
                    name: Some(entry.name().unwrap_or(name).to_owned()),
                }
            }
        };

        if *obj.category() != new_ref {
            *obj.category_mut() = new_ref;
            obj.core_mut().touch();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_string_and_hash_forms() {
        let s = CategoryRef::from_json(&json!("Utilities"));
        assert_eq!(s.name(), Some("Utilities"));
        assert_eq!(s.id, None);

        let h = CategoryRef::from_json(&json!({ "id": 4, "name": "Browsers" }));
        assert_eq!(h.id, Some(4));
        assert_eq!(h.name(), Some("Browsers"));
    }

    #[test]
    fn sentinels_mean_unassigned() {
        assert!(!CategoryRef::from_json(&json!(NO_CATEGORY)).is_assigned());
        assert!(!CategoryRef::from_json(&json!({ "id": -1, "name": "" })).is_assigned());
        assert!(!CategoryRef::from_json(&json!("Unknown")).is_assigned());
        assert!(!CategoryRef::from_json(&Value::Null).is_assigned());
    }

    #[test]
    fn renders_both_styles() {
        let cat = CategoryRef {
            id: Some(2),
            name: Some("Security".into()),
        };
        assert_eq!(
            cat.to_xml(CategoryStyle::Name).to_xml_string(),
            "<category>Security</category>"
        );
        assert_eq!(
            cat.to_xml(CategoryStyle::Hash).to_xml_string(),
            "<category><id>2</id><name>Security</name></category>"
        );
        assert_eq!(
            CategoryRef::default().to_xml(CategoryStyle::Name).to_xml_string(),
            "<category>No category assigned</category>"
        );
    }
}
