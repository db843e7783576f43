use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::TaskData;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SaveTasksParams {
    #[schemars(description = "One or more tasks to store")]
    pub tasks: Vec<TaskData>,
}
