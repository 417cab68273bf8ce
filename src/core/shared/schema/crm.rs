diesel::table! {
    companies (id) {
        id -> Int8,
        name -> Varchar,
        address -> Nullable<Text>,
        phone -> Nullable<Varchar>,
        website -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    contacts (id) {
        id -> Int8,
        name -> Varchar,
        email -> Varchar,
        phone -> Nullable<Varchar>,
        company_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    deals (id) {
        id -> Int8,
        name -> Varchar,
        amount -> Numeric,
        stage -> Varchar,
        contact_id -> Int8,
        company_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Int8,
        description -> Text,
        due_date -> Date,
        status -> Varchar,
        related_type -> Varchar,
        related_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(contacts -> companies (company_id));
diesel::joinable!(deals -> contacts (contact_id));
diesel::joinable!(deals -> companies (company_id));

diesel::allow_tables_to_appear_in_same_query!(companies, contacts, deals, tasks,);
