use crate::error::BackendError;
use crate::types::{Appointment, NewAppointment, NewUser, User};

/// Source of storage handles. Handlers open one handle per request and drop
/// it before responding.
pub trait AgendaBackend: Clone + Send + Sync + 'static {
    type Store: AgendaStore + Send;

    fn open(&self) -> Result<Self::Store, BackendError>;
}

/// Operations available on an open storage handle.
///
/// Updates and deletions report whether a row was touched; a missing id is
/// never an error.
#[cfg_attr(test, mockall::automock)]
pub trait AgendaStore {
    fn add_user(&mut self, user: NewUser) -> Result<User, BackendError>;
    fn users(&mut self) -> Result<Vec<User>, BackendError>;
    fn user(&mut self, id: i32) -> Result<Option<User>, BackendError>;
    fn user_by_email(&mut self, email: &str) -> Result<Option<User>, BackendError>;
    fn update_user(&mut self, id: i32, user: NewUser) -> Result<bool, BackendError>;
    /// Appointments owned by the user are kept with their owner unset.
    fn remove_user(&mut self, id: i32) -> Result<bool, BackendError>;

    fn add_appointment(&mut self, appointment: NewAppointment)
        -> Result<Appointment, BackendError>;
    fn appointments(&mut self) -> Result<Vec<Appointment>, BackendError>;
    fn appointment(&mut self, id: i32) -> Result<Option<Appointment>, BackendError>;
    fn update_appointment(
        &mut self,
        id: i32,
        appointment: NewAppointment,
    ) -> Result<bool, BackendError>;
    fn remove_appointment(&mut self, id: i32) -> Result<bool, BackendError>;
}
