// ── Advanced computer searches ──
//
// A saved search: criteria select computers, display fields choose the
// columns. The server evaluates the search when it is saved, so the
// results held here are as of the last fetch or requery.

use serde_json::Value;
use tracing::info;

use jamf_api::XmlElement;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::json;
use crate::lookup::ListEntry;
use crate::mixins::{Criteria, Criteriable, Sitable, SiteRef};
use crate::object::{ApiObject, Creatable, Deletable, ObjectCore, Updatable, Writable};

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedComputerSearch {
    core: ObjectCore,
    view_as: Option<String>,
    criteria: Criteria,
    display_fields: Vec<String>,
    results: Vec<ListEntry>,
    site: SiteRef,
}

impl AdvancedComputerSearch {
    pub fn view_as(&self) -> Option<&str> {
        self.view_as.as_deref()
    }

    pub fn display_fields(&self) -> &[String] {
        &self.display_fields
    }

    /// Matching computers, one entry per row with the display fields as
    /// keys (spaces become underscores on the server side).
    pub fn results(&self) -> &[ListEntry] {
        &self.results
    }

    pub fn result_ids(&self) -> Vec<i64> {
        self.results.iter().filter_map(ListEntry::id).collect()
    }

    /// Values of one display field across all results.
    pub fn column(&self, field: &str) -> Vec<Option<String>> {
        let key = field.replace(' ', "_");
        self.results
            .iter()
            .map(|r| r.get_str(&key).or_else(|| r.get_str(field)))
            .collect()
    }

    /// Replace the display fields. Blank names are dropped, duplicates
    /// collapse to the first occurrence.
    pub fn set_display_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for f in fields {
            let f = f.as_ref().trim();
            if !f.is_empty() && !cleaned.iter().any(|c| c.eq_ignore_ascii_case(f)) {
                cleaned.push(f.to_owned());
            }
        }
        if cleaned != self.display_fields {
            self.display_fields = cleaned;
            self.core.touch();
        }
    }

    pub fn add_display_field(&mut self, field: &str) -> bool {
        let field = field.trim();
        if field.is_empty() || self.display_fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            return false;
        }
        self.display_fields.push(field.to_owned());
        self.core.touch();
        true
    }

    pub fn remove_display_field(&mut self, field: &str) -> bool {
        let before = self.display_fields.len();
        self.display_fields
            .retain(|f| !f.eq_ignore_ascii_case(field.trim()));
        let changed = self.display_fields.len() != before;
        if changed {
            self.core.touch();
        }
        changed
    }
}

fn read_results(record: &Value) -> Vec<ListEntry> {
    json::array(record, "computers")
        .iter()
        .filter_map(|c| c.get("computer").unwrap_or(c).as_object().cloned())
        .map(ListEntry::from)
        .collect()
}

impl ApiObject for AdvancedComputerSearch {
    const RSRC_BASE: &'static str = "advancedcomputersearches";
    const RSRC_LIST_KEY: &'static str = "advanced_computer_searches";
    const RSRC_OBJECT_KEY: &'static str = "advanced_computer_search";

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn from_json(record: &Value) -> Result<Self> {
        Ok(Self {
            core: ObjectCore::from_json(record)?,
            view_as: json::opt_str(record, "view_as"),
            criteria: Criteria::from_json(json::at(record, "criteria")),
            display_fields: json::array(record, "display_fields")
                .iter()
                .map(|f| json::string(f.get("display_field").unwrap_or(f), "name"))
                .filter(|f| !f.is_empty())
                .collect(),
            results: read_results(record),
            site: SiteRef::from_json(json::at(record, "site")),
        })
    }
}

impl Writable for AdvancedComputerSearch {
    fn rest_xml(&self) -> XmlElement {
        let fields = XmlElement::new("display_fields")
            .text_child("size", self.display_fields.len())
            .extend(
                self.display_fields
                    .iter()
                    .map(|f| XmlElement::new("display_field").text_child("name", f)),
            );
        XmlElement::new(Self::RSRC_OBJECT_KEY)
            .text_child("name", self.name())
            .opt_child("view_as", self.view_as.as_deref())
            .child(self.criteria.to_xml())
            .child(fields)
            .child(self.site.to_xml())
    }
}

impl Creatable for AdvancedComputerSearch {
    fn new_unsaved(name: &str) -> Self {
        Self {
            core: ObjectCore::new(name),
            view_as: None,
            criteria: Criteria::default(),
            display_fields: Vec::new(),
            results: Vec::new(),
            site: SiteRef::default(),
        }
    }

    fn validate_for_create(&self) -> Result<()> {
        if self.criteria.is_empty() {
            return Err(JssError::MissingData(
                "an advanced search needs at least one criterion".into(),
            ));
        }
        self.criteria.validate()
    }

    fn duplicate(&self, new_name: &str) -> Self {
        let mut copy = self.clone();
        copy.core = ObjectCore::new(new_name);
        copy.results.clear();
        copy
    }
}

impl Updatable for AdvancedComputerSearch {
    fn validate_for_update(&self) -> Result<()> {
        self.criteria.validate()
    }
}

impl Deletable for AdvancedComputerSearch {}

impl Criteriable for AdvancedComputerSearch {
    fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    fn criteria_mut(&mut self) -> &mut Criteria {
        &mut self.criteria
    }
}

impl Sitable for AdvancedComputerSearch {
    fn site(&self) -> &SiteRef {
        &self.site
    }

    fn site_mut(&mut self) -> &mut SiteRef {
        &mut self.site
    }
}

impl Jss {
    /// Re-run a saved search on the server and reload its results.
    ///
    /// Pending local changes are sent first. Returns the number of rows.
    pub async fn requery_search(&self, search: &mut AdvancedComputerSearch) -> Result<usize> {
        if !search.in_jss() {
            return Err(JssError::NoSuchItem(format!(
                "search '{}' is not in the JSS; create it first",
                search.name()
            )));
        }
        search.validate_for_update()?;
        self.api()
            .put_xml(&search.rest_rsrc(), search.rest_xml().to_document())
            .await?;
        let record = self.fetch_record::<AdvancedComputerSearch>(search.id()).await?;
        search.results = read_results(&record);
        search.core.need_to_update = false;
        info!(id = search.id(), rows = search.results.len(), "search requeried");
        Ok(search.results.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mixins::{AndOr, Criterion};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn search() -> AdvancedComputerSearch {
        AdvancedComputerSearch::from_json(&json!({
            "id": 6, "name": "Old macOS",
            "criteria": [
                { "name": "Operating System Version", "priority": 0, "and_or": "and",
                  "search_type": "less than", "value": "14.0" }
            ],
            "display_fields": [{ "name": "Computer Name" }, { "name": "Operating System Version" }],
            "computers": [
                { "id": 1, "name": "Mac-01", "Computer_Name": "Mac-01", "Operating_System_Version": "13.6" },
                { "id": 2, "name": "Mac-02", "Computer_Name": "Mac-02", "Operating_System_Version": "12.7" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn results_and_columns() {
        let s = search();
        assert_eq!(s.result_ids(), vec![1, 2]);
        assert_eq!(
            s.column("Operating System Version"),
            vec![Some("13.6".to_owned()), Some("12.7".to_owned())]
        );
        assert_eq!(s.rest_xml().find_text("display_fields/size"), Some("2"));
        assert!(s.rest_xml().find("computers").is_none());
    }

    #[test]
    fn display_fields_dedupe() {
        let mut s = search();
        s.set_display_fields(["Serial Number", " serial number ", "", "Username"]);
        assert_eq!(s.display_fields(), ["Serial Number", "Username"]);
        assert!(!s.add_display_field("USERNAME"));
        assert!(s.remove_display_field("username"));
        assert!(s.need_to_update());
    }

    #[test]
    fn create_needs_balanced_criteria() {
        let mut s = AdvancedComputerSearch::new_unsaved("Unbalanced");
        assert!(matches!(s.validate_for_create(), Err(JssError::MissingData(_))));
        s.append_criterion(
            Criterion::new(AndOr::And, "Username", "is", "jdoe")
                .unwrap()
                .with_parens(false, true),
        );
        assert!(matches!(s.validate_for_create(), Err(JssError::InvalidData(_))));
    }

    #[test]
    fn duplicate_has_no_results() {
        let copy = search().duplicate("Old macOS 2");
        assert!(copy.results().is_empty());
        assert_eq!(copy.display_fields().len(), 2);
    }
}
