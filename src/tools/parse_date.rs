use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ParseDateParams {
    #[schemars(
        description = "Date to parse: RFC 3339, YYYY-MM-DD, YYYY-MM-DD HH:MM, 'today', 'tomorrow', 'yesterday', or a weekday name. Omit for the current time."
    )]
    pub date_input: Option<String>,
}
