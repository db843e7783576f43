use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteTaskParams {
    #[schemars(
        description = "Id, exact title, or exact stored text of each task to delete"
    )]
    pub targets: Vec<String>,
}
