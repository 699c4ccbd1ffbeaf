pub mod error;
pub mod repo;
pub mod schema;

pub use error::StoreError;
pub use repo::{
    Appointment, AppointmentDetails, Client, Dentist, Gateway, NewAppointment, NewClient,
    NewDentist, NewTreatment, ScheduleRequest, StoreOptions, Treatment,
};
