use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateMemoryParams {
    #[schemars(description = "Exact text of the memory to replace")]
    pub old_memory_text: String,

    #[schemars(description = "New text for the memory")]
    pub new_memory_text: String,
}
