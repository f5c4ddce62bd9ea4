//! Records returned by the backend.
//!
//! Only the fields the mobile client reads are modelled; anything else in a
//! response is ignored during decoding. Backend timestamps are kept as the
//! strings the server sent, since it does not always include an offset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Room size bucket produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// Closet, bathroom.
    Small,
    /// Bedroom, office.
    Medium,
    /// Living room, garage.
    Large,
    /// Basement, warehouse.
    ExtraLarge,
}

/// How much junk the classifier saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadClass {
    /// A few items.
    Light,
    /// Partially full.
    Moderate,
    /// Mostly full.
    Heavy,
    /// Floor to ceiling.
    Extreme,
}

/// Lifecycle of a job.
///
/// Covers both the backend's workflow statuses and the ones the mobile
/// screens set. Anything else decodes as [`JobStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, no estimate yet. New jobs start here.
    Draft,
    /// Rooms classified and priced.
    Estimated,
    /// Customer accepted the estimate.
    Approved,
    /// Booked, not started.
    Scheduled,
    /// Crew on site.
    InProgress,
    /// Done.
    Completed,
    /// Invoice sent.
    Invoiced,
    /// Payment received.
    Paid,
    /// Called off.
    Cancelled,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Draft => "draft",
            JobStatus::Estimated => "estimated",
            JobStatus::Approved => "approved",
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Invoiced => "invoiced",
            JobStatus::Paid => "paid",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown => "unknown",
        })
    }
}

/// A customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Server id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Server id.
    pub id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Human-facing job number.
    #[serde(default)]
    pub job_number: Option<String>,
    /// Current status.
    pub status: JobStatus,
    /// Address of the property.
    #[serde(default)]
    pub property_address: Option<String>,
    /// Planned date.
    #[serde(default)]
    pub scheduled_date: Option<String>,
    /// Completion date.
    #[serde(default)]
    pub completed_date: Option<String>,
    /// Estimate before classification.
    #[serde(default)]
    pub base_estimate: f64,
    /// Sum of per-room classifier estimates.
    #[serde(default)]
    pub ai_estimate: f64,
    /// Estimate after a human review.
    #[serde(default)]
    pub human_adjusted_estimate: Option<f64>,
    /// Price charged.
    #[serde(default)]
    pub final_price: f64,
    /// Crew notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A room record, including server-computed classification and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Server id.
    pub id: String,
    /// Owning job.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Room label.
    #[serde(default)]
    pub name: Option<String>,
    /// Sequence number within the job.
    #[serde(default)]
    pub room_number: Option<u32>,
    /// Where the backend stored the uploaded photo.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Classifier size guess.
    #[serde(default)]
    pub ai_size_class: Option<SizeClass>,
    /// Classifier workload guess.
    #[serde(default)]
    pub ai_workload_class: Option<WorkloadClass>,
    /// Classifier confidence in `[0, 1]`.
    #[serde(default)]
    pub ai_confidence: Option<f64>,
    /// Size class after human overrides.
    #[serde(default)]
    pub final_size_class: Option<SizeClass>,
    /// Workload class after human overrides.
    #[serde(default)]
    pub final_workload_class: Option<WorkloadClass>,
    /// Price estimate for clearing this room.
    #[serde(default)]
    pub estimated_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn room_decodes_with_extra_fields() {
        let body = json!({
            "id": "R9",
            "job_id": "J1",
            "name": "Garage",
            "room_number": 3,
            "ai_size_class": "extra_large",
            "ai_workload_class": "heavy",
            "ai_confidence": 0.82,
            "ai_features": {"boxes": 14},
            "final_size_class": "extra_large",
            "final_workload_class": "heavy",
            "estimated_cost": 420.0,
            "captured_at": "2024-06-10T08:00:00Z"
        });

        let room: Room = serde_json::from_value(body).unwrap();
        assert_eq!(room.id, "R9");
        assert_eq!(room.ai_size_class, Some(SizeClass::ExtraLarge));
        assert_eq!(room.final_workload_class, Some(WorkloadClass::Heavy));
        assert_eq!(room.estimated_cost, 420.0);
    }

    #[test]
    fn minimal_room_decodes() {
        let room: Room = serde_json::from_value(json!({"id": "R1"})).unwrap();
        assert_eq!(room.estimated_cost, 0.0);
        assert!(room.final_size_class.is_none());
    }

    #[test]
    fn job_decodes_backend_response() {
        let body = json!({
            "id": "5b1f0c2e-8d7a-4c1e-9f42-3a6d2b7e9c10",
            "customer_id": "0f4e6a88-1b2c-4d3e-8f90-a1b2c3d4e5f6",
            "job_number": "JOB-1718006400",
            "status": "draft",
            "property_address": "12 Elm St",
            "scheduled_date": null,
            "completed_date": null,
            "base_estimate": 0.0,
            "ai_estimate": 0.0,
            "human_adjusted_estimate": 0.0,
            "final_price": 0.0,
            "adjustments": [],
            "notes": null,
            "created_at": "2024-06-10T08:00:00",
            "updated_at": "2024-06-10T08:00:00"
        });

        let job: Job = serde_json::from_value(body).unwrap();
        assert_eq!(job.status, JobStatus::Draft);
        assert_eq!(job.job_number.as_deref(), Some("JOB-1718006400"));
        assert_eq!(job.human_adjusted_estimate, Some(0.0));
    }

    #[test]
    fn backend_workflow_statuses_decode() {
        for (wire, status) in [
            ("draft", JobStatus::Draft),
            ("estimated", JobStatus::Estimated),
            ("approved", JobStatus::Approved),
            ("in_progress", JobStatus::InProgress),
            ("completed", JobStatus::Completed),
            ("invoiced", JobStatus::Invoiced),
            ("paid", JobStatus::Paid),
        ] {
            let decoded: JobStatus = serde_json::from_value(json!(wire)).unwrap();
            assert_eq!(decoded, status);
            assert_eq!(status.to_string(), wire);
        }
    }

    #[test]
    fn unrecognised_job_status_decodes_as_unknown() {
        let decoded: JobStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(decoded, JobStatus::Unknown);
    }

    #[test]
    fn job_status_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(JobStatus::InProgress.to_string(), "in_progress");
    }
}
