use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteMemoryParams {
    #[schemars(
        description = "Exact text (or id) of each memory to delete. Text must match the stored memory exactly."
    )]
    pub targets: Vec<String>,
}
