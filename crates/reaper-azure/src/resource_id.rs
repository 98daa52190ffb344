use crate::{Error, Result};

/// Extract the resource group name from a full resource id.
///
/// A typical id looks like
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/...`; the group name
/// is the fifth path segment.
pub(crate) fn resource_group(resource_id: &str) -> Result<&str> {
    resource_id
        .split('/')
        .nth(4)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| Error::MalformedResourceId(resource_id.to_string()))
}
