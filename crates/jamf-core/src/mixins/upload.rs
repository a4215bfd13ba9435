// File uploads (icons, attachments, app bundles) attached to objects.

use std::path::Path;

use tracing::info;

use crate::connection::Jss;
use crate::error::{JssError, Result};
use crate::object::ApiObject;

/// Objects that accept file uploads.
pub trait Uploadable: ApiObject {
    /// Accepted upload types and the `fileuploads/` segment each posts to,
    /// e.g. `("icon", "policies")`.
    const UPLOAD_TYPES: &'static [(&'static str, &'static str)];
}

impl Jss {
    /// Upload a local file to `fileuploads/SEGMENT/id/N`.
    ///
    /// The object must already exist on the server.
    pub async fn upload<T: Uploadable>(&self, obj: &T, upload_type: &str, path: &Path) -> Result<()> {
        let Some((_, segment)) = T::UPLOAD_TYPES
            .iter()
            .find(|(kind, _)| kind.eq_ignore_ascii_case(upload_type))
        else {
            let kinds: Vec<&str> = T::UPLOAD_TYPES.iter().map(|(k, _)| *k).collect();
            return Err(JssError::InvalidData(format!(
                "{} objects accept uploads of type {}, not '{upload_type}'",
                T::RSRC_OBJECT_KEY,
                kinds.join(", ")
            )));
        };
        if !obj.in_jss() {
            return Err(JssError::NoSuchItem(format!(
                "{} '{}' must be created before uploading to it",
                T::RSRC_OBJECT_KEY,
                obj.name()
            )));
        }
        if !tokio::fs::try_exists(path).await? {
            return Err(JssError::NoSuchItem(format!(
                "local file {} does not exist",
                path.display()
            )));
        }

        let rsrc = format!("fileuploads/{segment}/id/{}", obj.id());
        self.api().upload(&rsrc, path).await?;
        info!(
            kind = T::RSRC_OBJECT_KEY,
            id = obj.id(),
            upload_type,
            file = %path.display(),
            "uploaded"
        );
        Ok(())
    }
}
