//! JSON response envelope shared by all handlers.

use axum::Json;
use serde::Serialize;
use serde_json::Value;

pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": data
    }))
}

/// Acknowledgment for dispatched campaign jobs; the result arrives
/// later through the status endpoint.
pub fn queued(job_ids: Vec<String>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "queued",
        "job_ids": job_ids
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_envelope_carries_job_ids() {
        let Json(body) = queued(vec!["job-1".into(), "job-2".into()]);
        assert_eq!(body["status"], "queued");
        assert_eq!(body["job_ids"][1], "job-2");
    }
}
