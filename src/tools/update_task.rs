use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::memory::types::TaskData;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskParams {
    #[schemars(description = "Id, exact title, or exact stored text of the task to replace")]
    pub old_task_text: String,

    #[schemars(description = "Full replacement task data")]
    pub task: TaskData,
}
