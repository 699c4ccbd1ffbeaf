/// Tables are keyed by SQLite's implicit `rowid`; no column declares a key
/// or a reference, so appointment ids are free to dangle.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS dentists (
        name TEXT,
        specialty TEXT,
        image TEXT
    );

    CREATE TABLE IF NOT EXISTS treatments (
        name TEXT,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS appointments (
        dentistId INTEGER,
        clientId INTEGER,
        treatmentId INTEGER,
        date TEXT,
        time TEXT
    );

    CREATE TABLE IF NOT EXISTS clients (
        name TEXT,
        email TEXT
    );
";

pub const DROP_ALL: &str = "
    DROP TABLE IF EXISTS dentists;
    DROP TABLE IF EXISTS treatments;
    DROP TABLE IF EXISTS appointments;
    DROP TABLE IF EXISTS clients;
";

pub const SEED_TREATMENTS: &[(&str, &str)] = &[
    ("Teeth Cleaning", "Routine cleaning for maintaining oral health"),
    ("Cavity Filling", "Treatment for filling cavities and preventing decay"),
    ("Braces Installation", "Orthodontic treatment for teeth alignment"),
];

// (dentistId, clientId, treatmentId, date, time)
pub const SEED_APPOINTMENTS: &[(i64, i64, i64, &str, &str)] = &[
    (1, 1, 1, "2024-02-15", "10:00 AM"),
    (2, 2, 2, "2024-02-16", "02:30 PM"),
    (3, 3, 3, "2024-02-17", "11:45 AM"),
];

pub const SEED_CLIENTS: &[(&str, &str)] = &[
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
    ("Mike Johnson", "mike@example.com"),
];

pub const SEED_DENTISTS: &[(&str, &str, &str)] = &[
    ("Dr. Smith", "Orthodontist", "dr_smith.jpg"),
    ("Dr. Johnson", "Periodontist", "dr_johnson.jpg"),
];
