// Server-side wildcard search over a resource's summary records.

use jamf_api::encode_segment;

use crate::connection::Jss;
use crate::error::Result;
use crate::json;
use crate::lookup::ListEntry;
use crate::object::ApiObject;

/// Resources reachable through `RSRC_BASE/match/TERM`.
pub trait Matchable: ApiObject {}

impl Jss {
    /// Summary records matching a term; `*` is a wildcard.
    pub async fn match_records<T: Matchable>(&self, term: &str) -> Result<Vec<ListEntry>> {
        let rsrc = format!("{}/match/{}", T::RSRC_BASE, encode_segment(term));
        let value = self.api().get_json(&rsrc).await?;
        Ok(json::array(&value, T::RSRC_LIST_KEY)
            .iter()
            .filter_map(|v| v.as_object().cloned().map(ListEntry::from))
            .collect())
    }
}
