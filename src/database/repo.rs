use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use tracing::{debug, info};

use crate::database::error::StoreError;
use crate::database::schema::{
    DROP_ALL, SCHEMA, SEED_APPOINTMENTS, SEED_CLIENTS, SEED_DENTISTS, SEED_TREATMENTS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dentist {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewDentist {
    pub name: String,
    pub specialty: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treatment {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTreatment {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
}

/// A raw appointment row. `treatment_id` is empty for appointments booked
/// from a dentist's page without choosing a treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: i64,
    pub dentist_id: i64,
    pub client_id: i64,
    pub treatment_id: Option<i64>,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub dentist_id: i64,
    pub client_id: i64,
    pub treatment_id: i64,
    pub date: String,
    pub time: String,
}

/// Booking made by patient name against a single dentist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub dentist_id: i64,
    pub patient_name: String,
    pub treatment_id: Option<i64>,
    pub date: String,
    pub time: String,
}

/// One row of the joined schedule listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDetails {
    pub id: i64,
    pub dentist_name: String,
    pub client_name: String,
    pub treatment_name: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub path: PathBuf,
    /// Drop every table and insert the seed rows on open.
    pub reseed: bool,
}

/// The only owner of the SQLite connection.
///
/// Cloning is cheap and every clone shares the same connection. Each
/// operation holds the lock for a single statement (or a single transaction),
/// so concurrent callers interleave at statement granularity.
#[derive(Clone)]
pub struct Gateway {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl Gateway {
    /// Opens the database file and runs the startup protocol. The gateway is
    /// only handed out once initialization has finished.
    pub fn open(options: &StoreOptions) -> Result<Self, StoreError> {
        let conn = Connection::open(&options.path)?;
        info!(path = %options.path.display(), reseed = options.reseed, "Opening store");
        Self::with_connection(conn, options.reseed)
    }

    #[cfg(test)]
    pub fn open_in_memory(reseed: bool) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, reseed)
    }

    fn with_connection(mut conn: Connection, reseed: bool) -> Result<Self, StoreError> {
        initialize(&mut conn, reseed)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Runs `op` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            op(conn).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }

    pub async fn list_dentists(&self) -> Result<Vec<Dentist>, StoreError> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare("SELECT rowid AS id, name, specialty, image FROM dentists")?;
            let rows = stmt.query_map([], dentist_from_row)?;
            rows.collect()
        })
        .await
    }

    pub async fn get_dentist(&self, id: i64) -> Result<Option<Dentist>, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT rowid AS id, name, specialty, image FROM dentists WHERE rowid = ?1",
                params![id],
                dentist_from_row,
            )
            .optional()
        })
        .await
    }

    pub async fn create_dentist(&self, dentist: NewDentist) -> Result<(), StoreError> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO dentists (name, specialty, image) VALUES (?1, ?2, ?3)",
                params![dentist.name, dentist.specialty, dentist.image],
            )?;
            Ok(())
        })
        .await
    }

    /// Overwrites every column of the row. Missing ids touch nothing.
    pub async fn update_dentist(&self, id: i64, dentist: NewDentist) -> Result<(), StoreError> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE dentists SET name = ?1, specialty = ?2, image = ?3 WHERE rowid = ?4",
                params![dentist.name, dentist.specialty, dentist.image, id],
            )?;
            debug!(id, changed, "Updated dentist");
            Ok(())
        })
        .await
    }

    pub async fn delete_dentist(&self, id: i64) -> Result<(), StoreError> {
        self.run(move |conn| {
            let changed = conn.execute("DELETE FROM dentists WHERE rowid = ?1", params![id])?;
            debug!(id, changed, "Deleted dentist");
            Ok(())
        })
        .await
    }

    pub async fn list_treatments(&self) -> Result<Vec<Treatment>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT rowid AS id, name, description FROM treatments")?;
            let rows = stmt.query_map([], |row| {
                Ok(Treatment {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    pub async fn create_treatment(&self, treatment: NewTreatment) -> Result<(), StoreError> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO treatments (name, description) VALUES (?1, ?2)",
                params![treatment.name, treatment.description],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT rowid AS id, name, email FROM clients")?;
            let rows = stmt.query_map([], |row| {
                Ok(Client {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    pub async fn create_client(&self, client: NewClient) -> Result<(), StoreError> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO clients (name, email) VALUES (?1, ?2)",
                params![client.name, client.email],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT rowid AS id, dentistId, clientId, treatmentId, date, time
                 FROM appointments",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Appointment {
                    id: row.get(0)?,
                    dentist_id: row.get(1)?,
                    client_id: row.get(2)?,
                    treatment_id: row.get(3)?,
                    date: row.get(4)?,
                    time: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    /// Referenced ids are stored as given, existing or not.
    pub async fn create_appointment(&self, appointment: NewAppointment) -> Result<(), StoreError> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO appointments (dentistId, clientId, treatmentId, date, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    appointment.dentist_id,
                    appointment.client_id,
                    appointment.treatment_id,
                    appointment.date,
                    appointment.time
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Books an appointment for a patient known only by name. The first
    /// client with that exact name is reused; otherwise one is created with
    /// an empty email. Both writes share one transaction.
    pub async fn schedule_appointment(&self, request: ScheduleRequest) -> Result<(), StoreError> {
        self.run(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT rowid FROM clients WHERE name = ?1 ORDER BY rowid LIMIT 1",
                    params![request.patient_name],
                    |row| row.get(0),
                )
                .optional()?;

            let client_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO clients (name, email) VALUES (?1, '')",
                        params![request.patient_name],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "INSERT INTO appointments (dentistId, clientId, treatmentId, date, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    request.dentist_id,
                    client_id,
                    request.treatment_id,
                    request.date,
                    request.time
                ],
            )?;

            tx.commit()
        })
        .await
    }

    /// Inner join across all four tables: appointments whose dentist, client
    /// or treatment no longer resolves are left out.
    pub async fn list_appointments_with_details(
        &self,
    ) -> Result<Vec<AppointmentDetails>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare(
                "SELECT appointments.rowid AS id,
                        dentists.name AS dentistName,
                        clients.name AS clientName,
                        treatments.name AS treatmentName,
                        appointments.date,
                        appointments.time
                 FROM appointments
                 JOIN dentists ON appointments.dentistId = dentists.rowid
                 JOIN clients ON appointments.clientId = clients.rowid
                 JOIN treatments ON appointments.treatmentId = treatments.rowid
                 ORDER BY appointments.rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(AppointmentDetails {
                    id: row.get(0)?,
                    dentist_name: row.get(1)?,
                    client_name: row.get(2)?,
                    treatment_name: row.get(3)?,
                    date: row.get(4)?,
                    time: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    /// Releases the connection. Later operations fail with
    /// [`StoreError::Closed`]; closing again is a no-op.
    pub async fn close(&self) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let taken = conn.lock().unwrap_or_else(PoisonError::into_inner).take();
            match taken {
                Some(conn) => conn.close().map_err(|(_, e)| StoreError::from(e)),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

fn dentist_from_row(row: &Row<'_>) -> rusqlite::Result<Dentist> {
    Ok(Dentist {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        image: row.get(3)?,
    })
}

/// Creates the tables, or with `reseed` rebuilds them from scratch and loads
/// the seed rows. Insert order fixes the rowids the seed appointments point
/// at: treatments, appointments, clients, then dentists.
fn initialize(conn: &mut Connection, reseed: bool) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    if reseed {
        tx.execute_batch(DROP_ALL)?;
    }
    tx.execute_batch(SCHEMA)?;

    if reseed {
        {
            let mut stmt =
                tx.prepare("INSERT INTO treatments (name, description) VALUES (?1, ?2)")?;
            for (name, description) in SEED_TREATMENTS {
                stmt.execute(params![name, description])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO appointments (dentistId, clientId, treatmentId, date, time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (dentist_id, client_id, treatment_id, date, time) in SEED_APPOINTMENTS {
                stmt.execute(params![dentist_id, client_id, treatment_id, date, time])?;
            }

            let mut stmt = tx.prepare("INSERT INTO clients (name, email) VALUES (?1, ?2)")?;
            for (name, email) in SEED_CLIENTS {
                stmt.execute(params![name, email])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO dentists (name, specialty, image) VALUES (?1, ?2, ?3)")?;
            for (name, specialty, image) in SEED_DENTISTS {
                stmt.execute(params![name, specialty, image])?;
            }
        }
        info!("Store re-seeded");
    }

    tx.commit()
}
