//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When the
//! migrations change, regenerate with `diesel print-schema` or update by hand.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Unique, 3 to 30 characters.
        username -> Varchar,
        /// Unique, stored lowercased.
        email -> Varchar,
        /// PHC-format Argon2 hash.
        password_hash -> Varchar,
        /// `user` or `admin`.
        role -> Varchar,
        title -> Nullable<Text>,
        description -> Nullable<Text>,
        location -> Nullable<Text>,
        skills -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges. Both ends cascade on user deletion.
    follows (follower_id, followee_id) {
        follower_id -> Uuid,
        followee_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ideas. `created_by` is not a foreign key; ideas outlive their authors.
    ideas (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        market -> Text,
        target_audience -> Text,
        created_by -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per `(idea_id, user_id)` pair.
    evaluations (id) {
        id -> Uuid,
        idea_id -> Uuid,
        user_id -> Uuid,
        /// 1 to 5 when present.
        score -> Nullable<Int2>,
        comment -> Nullable<Text>,
        liked -> Bool,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, follows, ideas, evaluations);
