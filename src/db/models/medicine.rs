use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::appointment::not_blank;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct MedicineStock {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMedicine {
    #[validate(custom(function = "not_blank", message = "Medicine name is required"))]
    pub name: String,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
}
