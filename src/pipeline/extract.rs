use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::http::ResponseRecord;
use crate::rules::ExtractionRule;
use crate::vars::VariableStore;

/// One extracted value. Serializes as a single-entry `{name: value}` map.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedVar {
    pub name: String,
    pub value: Value,
}

impl Serialize for ExtractedVar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

/// Runs enabled rules in definition order. Rules that find nothing are left
/// out; names are not deduplicated, so later rules overwrite the store.
pub fn extract_variables<R>(
    response: &ResponseRecord,
    rules: &[R],
    store: &VariableStore,
) -> Vec<ExtractedVar>
where
    R: ExtractionRule,
{
    rules
        .iter()
        .filter(|rule| rule.enabled())
        .filter_map(|rule| {
            let value = rule.extract(response, store)?;
            Some(ExtractedVar {
                name: rule.variable().to_owned(),
                value,
            })
        })
        .collect()
}
