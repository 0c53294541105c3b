//! Diesel schema for task status tracking.

diesel::table! {
    /// One row per tracked queue message.
    task_records (id) {
        /// Message identifier.
        id -> Uuid,
        /// Lifecycle status.
        #[max_length = 8]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last write timestamp.
        updated_at -> Timestamptz,
        /// Encoded message payload.
        message_data -> Bytea,
        /// Actor that processes the message.
        #[max_length = 300]
        actor_name -> Nullable<Varchar>,
        /// Queue the message was sent through.
        #[max_length = 100]
        queue_name -> Nullable<Varchar>,
    }
}
