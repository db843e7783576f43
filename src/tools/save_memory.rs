use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveMemoryParams {
    #[schemars(
        description = "One or more memories to save, each a self-contained natural language statement about the user or the world"
    )]
    pub memories: Vec<String>,
}
