diesel::table! {
    projects (id) {
        id -> Integer,
        title -> Text,
        description -> Text,
        image -> Text,
        link -> Text,
        is_video -> Bool,
    }
}

diesel::table! {
    posts (id) {
        id -> Integer,
        title -> Text,
        content -> Text,
        date -> Timestamp,
        image -> Text,
    }
}

diesel::table! {
    reports (id) {
        id -> Integer,
        title -> Text,
        description -> Text,
        pdf_link -> Text,
        year -> Integer,
        spending_details -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    leadership (id) {
        id -> Integer,
        name -> Text,
        position -> Text,
        bio -> Text,
        image -> Text,
    }
}

diesel::table! {
    staff (id) {
        id -> Integer,
        name -> Text,
        role -> Text,
        bio -> Text,
        image -> Text,
    }
}

diesel::table! {
    jobs (id) {
        id -> Integer,
        title -> Text,
        description -> Text,
        location -> Text,
    }
}

diesel::table! {
    contacts (id) {
        id -> Integer,
        name -> Text,
        email -> Text,
        message -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    newsletter_subscribers (id) {
        id -> Integer,
        email -> Text,
        created_at -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    projects,
    posts,
    reports,
    leadership,
    staff,
    jobs,
    contacts,
    newsletter_subscribers,
);

pub const BOOTSTRAP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    image TEXT NOT NULL,
    link TEXT NOT NULL,
    is_video BOOLEAN NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    date TIMESTAMP NOT NULL,
    image TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    pdf_link TEXT NOT NULL,
    year INTEGER NOT NULL,
    spending_details TEXT NOT NULL DEFAULT '[]',
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS leadership (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    position TEXT NOT NULL,
    bio TEXT NOT NULL,
    image TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    bio TEXT NOT NULL,
    image TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    location TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS newsletter_subscribers (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    created_at TIMESTAMP NOT NULL
);
"#;
