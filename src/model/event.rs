use serde::{Deserialize, Serialize};

/// Identifiers linking one execution to its plan, scene, report, and case.
/// Carried into debug traces as-is.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EventContext {
    pub id: String,
    pub team_id: String,
    pub plan_id: String,
    pub report_id: String,
    pub scene_id: String,
    pub parent_id: String,
    pub case_id: String,
    pub next_list: Vec<String>,
}
