// Taskboard schema - project board tables for Diesel ORM

diesel::table! {
    schema_versions (id) {
        id -> Integer,
        version -> Text,
        name -> Text,
        features -> Text,
        introduced_at -> Text,
    }
}

diesel::table! {
    projects (id) {
        id -> Text,
        name -> Text,
        manager -> Nullable<Text>,
        members_count -> Nullable<Integer>,
        sprint_length -> Nullable<Text>,
        #[sql_name = "columns"]
        columns_ -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    tasks (id) {
        id -> Text,
        project_id -> Text,
        title -> Text,
        status -> Text,
        priority -> Text,
        estimate -> Nullable<Text>,
        due_date -> Nullable<Text>,
        description -> Nullable<Text>,
        labels -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    team_members (id) {
        id -> Text,
        project_id -> Text,
        name -> Text,
        role -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    task_assignees (task_id, user_id) {
        task_id -> Text,
        user_id -> Text,
        position -> Integer,
        created_at -> Text,
    }
}

// ============================================================================
// Append-only task history tables
// ============================================================================

diesel::table! {
    task_activity (id) {
        id -> Integer,
        task_id -> Text,
        message -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    task_comments (id) {
        id -> Integer,
        task_id -> Text,
        text -> Text,
        author_id -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    task_bugs (id) {
        id -> Integer,
        task_id -> Text,
        description -> Text,
        reporter_id -> Nullable<Text>,
        created_at -> Text,
    }
}
