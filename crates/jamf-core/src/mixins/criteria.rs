// ── Criteria ──
//
// Ordered search criteria for smart groups and advanced searches. Each
// criterion compares one inventory field with a value; criteria are
// chained with and/or and may be grouped with parentheses. Priorities
// always equal list positions.

use serde_json::Value;

use jamf_api::XmlElement;

use crate::error::{JssError, Result};
use crate::json;
use crate::object::ApiObject;

/// Comparison operators the server accepts.
pub const SEARCH_TYPES: &[&str] = &[
    "is",
    "is not",
    "like",
    "not like",
    "has",
    "does not have",
    "matches regex",
    "does not match regex",
    "greater than",
    "less than",
    "greater than or equal",
    "less than or equal",
    "more than x days ago",
    "less than x days ago",
    "before (yyyy-mm-dd)",
    "after (yyyy-mm-dd)",
    "member of",
    "not member of",
    "current",
    "not current",
];

/// How a criterion joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AndOr {
    #[default]
    And,
    Or,
}

impl AndOr {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

/// One search criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub name: String,
    pub priority: usize,
    pub and_or: AndOr,
    pub search_type: String,
    pub value: String,
    pub opening_paren: bool,
    pub closing_paren: bool,
}

impl Criterion {
    /// Build a criterion; the search type must be one the server knows.
    pub fn new(
        and_or: AndOr,
        name: impl Into<String>,
        search_type: &str,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(JssError::MissingData("criterion needs a field name".into()));
        }
        let search_type = validate_search_type(search_type)?;
        Ok(Self {
            name,
            priority: 0,
            and_or,
            search_type,
            value: value.into(),
            opening_paren: false,
            closing_paren: false,
        })
    }

    pub fn with_parens(mut self, opening: bool, closing: bool) -> Self {
        self.opening_paren = opening;
        self.closing_paren = closing;
        self
    }

    fn from_json(v: &Value) -> Self {
        Self {
            name: json::string(v, "name"),
            priority: usize::try_from(json::i64_or(v, "priority", 0)).unwrap_or(0),
            and_or: AndOr::parse(&json::string(v, "and_or")).unwrap_or_default(),
            search_type: json::string(v, "search_type"),
            value: json::string(v, "value"),
            opening_paren: json::bool(v, "opening_paren"),
            closing_paren: json::bool(v, "closing_paren"),
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("criterion")
            .text_child("name", &self.name)
            .text_child("priority", self.priority)
            .text_child("and_or", self.and_or.as_str())
            .text_child("search_type", &self.search_type)
            .text_child("value", &self.value)
            .bool_child("opening_paren", self.opening_paren)
            .bool_child("closing_paren", self.closing_paren)
    }
}

fn validate_search_type(search_type: &str) -> Result<String> {
    let wanted = search_type.trim();
    SEARCH_TYPES
        .iter()
        .find(|t| t.eq_ignore_ascii_case(wanted))
        .map(|t| (*t).to_owned())
        .ok_or_else(|| JssError::InvalidData(format!("unknown search type '{search_type}'")))
}

/// An ordered list of criteria.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria {
    criteria: Vec<Criterion>,
}

impl Criteria {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        let mut c = Self { criteria };
        c.renumber();
        c
    }

    /// Read the `criteria` array, ordered by priority.
    pub fn from_json(v: &Value) -> Self {
        let mut criteria: Vec<Criterion> = v
            .as_array()
            .map(|a| a.iter().map(Criterion::from_json).collect())
            .unwrap_or_default();
        criteria.sort_by_key(|c| c.priority);
        Self::new(criteria)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Criterion> {
        self.criteria.get(index)
    }

    pub fn append(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
        self.renumber();
    }

    pub fn prepend(&mut self, criterion: Criterion) {
        self.criteria.insert(0, criterion);
        self.renumber();
    }

    pub fn insert(&mut self, index: usize, criterion: Criterion) -> Result<()> {
        if index > self.criteria.len() {
            return Err(JssError::InvalidData(format!(
                "cannot insert at {index}; there are {} criteria",
                self.criteria.len()
            )));
        }
        self.criteria.insert(index, criterion);
        self.renumber();
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Criterion> {
        if index >= self.criteria.len() {
            return Err(JssError::NoSuchItem(format!("no criterion at position {index}")));
        }
        let removed = self.criteria.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Replace the criterion at `index`.
    pub fn set(&mut self, index: usize, criterion: Criterion) -> Result<()> {
        let slot = self
            .criteria
            .get_mut(index)
            .ok_or_else(|| JssError::NoSuchItem(format!("no criterion at position {index}")))?;
        *slot = criterion;
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, c) in self.criteria.iter_mut().enumerate() {
            c.priority = i;
        }
    }

    /// Parentheses must open before they close and all be closed.
    pub fn validate(&self) -> Result<()> {
        let mut depth: usize = 0;
        for c in &self.criteria {
            if c.opening_paren {
                depth += 1;
            }
            if c.closing_paren {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    JssError::InvalidData(format!(
                        "criterion {} ('{}') closes a parenthesis that was never opened",
                        c.priority, c.name
                    ))
                })?;
            }
        }
        if depth > 0 {
            return Err(JssError::InvalidData(format!(
                "{depth} opening parenthes{} never closed",
                if depth == 1 { "is is" } else { "es are" }
            )));
        }
        Ok(())
    }

    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("criteria")
            .text_child("size", self.criteria.len())
            .extend(self.criteria.iter().map(Criterion::to_xml))
    }
}

/// Objects defined by search criteria.
pub trait Criteriable: ApiObject {
    fn criteria(&self) -> &Criteria;
    fn criteria_mut(&mut self) -> &mut Criteria;

    /// Replace all criteria. The new set must be balanced.
    fn set_criteria(&mut self, criteria: Criteria) -> Result<()> {
        criteria.validate()?;
        *self.criteria_mut() = criteria;
        self.core_mut().touch();
        Ok(())
    }

    fn append_criterion(&mut self, criterion: Criterion) {
        self.criteria_mut().append(criterion);
        self.core_mut().touch();
    }

    fn prepend_criterion(&mut self, criterion: Criterion) {
        self.criteria_mut().prepend(criterion);
        self.core_mut().touch();
    }

    fn insert_criterion(&mut self, index: usize, criterion: Criterion) -> Result<()> {
        self.criteria_mut().insert(index, criterion)?;
        self.core_mut().touch();
        Ok(())
    }

    fn delete_criterion(&mut self, index: usize) -> Result<Criterion> {
        let removed = self.criteria_mut().delete(index)?;
        self.core_mut().touch();
        Ok(removed)
    }

    fn change_criterion(&mut self, index: usize, criterion: Criterion) -> Result<()> {
        self.criteria_mut().set(index, criterion)?;
        self.core_mut().touch();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn crit(name: &str) -> Criterion {
        Criterion::new(AndOr::And, name, "is", "x").unwrap()
    }

    #[test]
    fn unknown_search_type_is_rejected() {
        let err = Criterion::new(AndOr::And, "Computer Name", "sounds like", "x").unwrap_err();
        assert!(matches!(err, JssError::InvalidData(_)));
        let ok = Criterion::new(AndOr::Or, "Computer Name", "Matches Regex", "^lab").unwrap();
        assert_eq!(ok.search_type, "matches regex");
    }

    #[test]
    fn priorities_follow_positions() {
        let mut c = Criteria::default();
        c.append(crit("b"));
        c.prepend(crit("a"));
        c.insert(2, crit("c")).unwrap();
        let names: Vec<_> = c.iter().map(|c| (c.priority, c.name.as_str())).collect();
        assert_eq!(names, vec![(0, "a"), (1, "b"), (2, "c")]);

        c.delete(0).unwrap();
        assert_eq!(c.get(0).unwrap().priority, 0);
        assert_eq!(c.get(0).unwrap().name, "b");
        assert!(c.insert(5, crit("z")).is_err());
        assert!(c.delete(9).is_err());
    }

    #[test]
    fn parsing_sorts_by_priority() {
        let v = json!([
            { "name": "Second", "priority": 1, "and_or": "or", "search_type": "is", "value": "2",
              "opening_paren": false, "closing_paren": false },
            { "name": "First", "priority": 0, "and_or": "and", "search_type": "like", "value": "1",
              "opening_paren": false, "closing_paren": false }
        ]);
        let c = Criteria::from_json(&v);
        assert_eq!(c.get(0).unwrap().name, "First");
        assert_eq!(c.get(1).unwrap().and_or, AndOr::Or);
    }

    #[test]
    fn unbalanced_parentheses_fail_validation() {
        let open = Criteria::new(vec![crit("a").with_parens(true, false), crit("b")]);
        assert!(open.validate().is_err());

        let early = Criteria::new(vec![crit("a").with_parens(false, true), crit("b")]);
        assert!(early.validate().is_err());

        let ok = Criteria::new(vec![crit("a").with_parens(true, false), crit("b").with_parens(false, true)]);
        ok.validate().unwrap();
    }

    #[test]
    fn xml_carries_size_and_fields() {
        let c = Criteria::new(vec![crit("Model")]);
        let xml = c.to_xml();
        assert_eq!(xml.find_text("size"), Some("1"));
        assert_eq!(xml.find_text("criterion/name"), Some("Model"));
        assert_eq!(xml.find_text("criterion/and_or"), Some("and"));
    }
}
