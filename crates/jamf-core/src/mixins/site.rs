// Site assignment.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::Ident;
use crate::object::ApiObject;
use crate::resources::Site;

/// The name the server uses for "no site".
pub const NO_SITE: &str = "None";

/// The site an object belongs to, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl SiteRef {
    pub fn from_json(v: &Value) -> Self {
        let id = json::opt_i64(v, "id").filter(|id| *id > 0);
        match json::opt_str(v, "name").filter(|n| n != NO_SITE) {
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

    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("site")
            .text_child("id", self.id.unwrap_or(-1))
            .text_child("name", self.name.as_deref().unwrap_or(NO_SITE))
    }
}

/// Objects that belong to a site.
pub trait Sitable: ApiObject {
    fn site(&self) -> &SiteRef;
    fn site_mut(&mut self) -> &mut SiteRef;

    fn site_name(&self) -> Option<&str> {
        self.site().name()
    }
}

impl Jss {
    /// Move an object to a site by name, or to no site with `None`.
    pub async fn set_site<T: Sitable>(&self, obj: &mut T, name: Option<&str>) -> Result<()> {
        let wanted = name.map(str::trim).filter(|n| !n.is_empty() && *n != NO_SITE);

        let new_ref = match wanted {
            None => SiteRef::default(),
            Some(name) => {
                let entry = self
                    .lookup_entry::<Site>(Ident::Name(name.to_owned()))
                    .await?
                    .ok_or_else(|| JssError::NoSuchItem(format!("no site named '{name}'")))?;
                SiteRef {
                    id: entry.id(),
                    name: Some(entry.name().unwrap_or(name).to_owned()),
                }
            }
        };

        if *obj.site() != new_ref {
            *obj.site_mut() = new_ref;
            obj.core_mut().touch();
        }
        Ok(())
    }
}
