use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CreateEntry {
    pub(super) worker_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct MonthQuery {
    pub(super) month: u32,
    pub(super) year: i32,
}
