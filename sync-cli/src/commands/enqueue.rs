//! Queue an operation for later replay.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use cleanout_sync_client::types::{
    EntityType, NewCustomer, NewJob, NewRoom, OperationId, OperationType, Payload,
};
use cleanout_sync_client::{BackendGateway, SyncService};
use std::path::PathBuf;

/// What to queue.
#[derive(Subcommand, Debug)]
pub enum EnqueueCommand {
    /// Queue a room photo upload
    Room {
        /// Job the room belongs to
        #[arg(long)]
        job: String,

        /// Room name, e.g. "Garage"
        #[arg(long)]
        name: String,

        /// Room number within the job
        #[arg(long, default_value = "1")]
        number: u32,

        /// Photo of the room
        #[arg(long)]
        image: PathBuf,
    },

    /// Queue a new job
    Job {
        /// Customer the job is for
        #[arg(long)]
        customer: String,

        /// Property address
        #[arg(long)]
        address: String,

        /// Scheduled time (RFC 3339)
        #[arg(long)]
        scheduled: Option<DateTime<Utc>>,

        /// Crew notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Queue a new customer
    Customer {
        /// Customer name
        #[arg(long)]
        name: String,

        /// Contact email
        #[arg(long)]
        email: Option<String>,

        /// Contact phone
        #[arg(long)]
        phone: Option<String>,

        /// Postal address
        #[arg(long)]
        address: Option<String>,
    },

    /// Queue a delete
    Delete {
        /// customer, job or room
        entity: EntityType,

        /// Server id of the entity
        id: String,
    },
}

/// Run the enqueue command.
pub async fn run<G: BackendGateway>(
    service: &SyncService<G>,
    command: EnqueueCommand,
) -> Result<OperationId> {
    let (operation_type, entity_type, entity_id, payload) = match command {
        EnqueueCommand::Room {
            job,
            name,
            number,
            image,
        } => {
            let image = tokio::fs::canonicalize(&image)
                .await
                .with_context(|| format!("Image not found: {}", image.display()))?;
            let image_uri = image
                .to_str()
                .context("Image path is not valid UTF-8")?
                .to_string();
            (
                OperationType::Create,
                EntityType::Room,
                String::new(),
                Payload::CreateRoom(NewRoom {
                    job_id: job,
                    room_name: name,
                    room_number: number,
                    image_uri,
                }),
            )
        }
        EnqueueCommand::Job {
            customer,
            address,
            scheduled,
            notes,
        } => (
            OperationType::Create,
            EntityType::Job,
            String::new(),
            Payload::CreateJob(NewJob {
                customer_id: customer,
                property_address: address,
                scheduled_date: scheduled,
                notes,
            }),
        ),
        EnqueueCommand::Customer {
            name,
            email,
            phone,
            address,
        } => (
            OperationType::Create,
            EntityType::Customer,
            String::new(),
            Payload::CreateCustomer(NewCustomer {
                name,
                email,
                phone,
                address,
            }),
        ),
        EnqueueCommand::Delete { entity, id } => (
            OperationType::Delete,
            entity,
            id,
            Payload::delete(entity),
        ),
    };

    let id = service
        .add_to_queue(operation_type, entity_type, entity_id, payload)
        .await
        .context("Invalid operation")?;

    println!("Queued {} {} ({})", operation_type, entity_type, id);
    println!("Pending: {}", service.pending_count().await);

    Ok(id)
}
