//! Diesel schema for board persistence.

diesel::table! {
    /// Board records.
    boards (id) {
        /// Board identifier.
        id -> Uuid,
        /// Board title.
        #[max_length = 255]
        title -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Column records ordered within a board.
    board_columns (id) {
        /// Column identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Column title.
        #[max_length = 255]
        title -> Varchar,
        /// Dense position within the board.
        position -> Int4,
    }
}

diesel::table! {
    /// Task records ordered within a column.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning column.
        column_id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional description.
        description -> Nullable<Text>,
        /// Priority level.
        #[max_length = 16]
        priority -> Varchar,
        /// Dense position within the column.
        position -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(board_columns -> boards (board_id));
diesel::joinable!(tasks -> board_columns (column_id));
diesel::allow_tables_to_appear_in_same_query!(boards, board_columns, tasks);
