use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoriesParams {
    #[schemars(description = "Natural language search query")]
    pub query: String,

    #[schemars(description = "Maximum number of memories to return. Defaults to 5.")]
    pub limit: Option<usize>,
}
