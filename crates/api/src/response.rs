//! Response envelope for dashboard-facing handlers.

use serde::Serialize;

/// `{ "data": T }`.
///
/// Auth token responses and the ingest acknowledgement are sent bare; every
/// other success body is wrapped in this.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
