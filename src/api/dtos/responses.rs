use serde::Serialize;

use crate::domain::models::slot::Slot;

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<Slot>,
}

#[derive(Serialize)]
pub struct ResolvedWindow {
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: String,
    pub windows: Vec<ResolvedWindow>,
}
