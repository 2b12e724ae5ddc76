use crate::backend::{AgendaBackend, AgendaStore};
use crate::error::BackendError;
use crate::types::{Appointment, NewAppointment, NewUser, User};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{debug, error};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    appointments: BTreeMap<i32, Appointment>,
    last_user_id: i32,
    last_appointment_id: i32,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }

    fn check_owner(&self, user_id: i32) -> Result<(), BackendError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            let err = format!("usuario_id {user_id} is not present in usuarios");
            error!("{err}");
            Err(BackendError::ForeignKeyViolation(err))
        }
    }
}

/// In-memory store with the same constraints as the database schema. Used
/// when no database is configured; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    tables: Arc<Mutex<Tables>>,
}

impl LocalStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, BackendError> {
        self.tables
            .lock()
            .map_err(|_| BackendError::Connection("in-memory store lock poisoned".into()))
    }
}

impl AgendaBackend for LocalStore {
    type Store = LocalStore;

    fn open(&self) -> Result<Self::Store, BackendError> {
        Ok(self.clone())
    }
}

impl AgendaStore for LocalStore {
    fn add_user(&mut self, user: NewUser) -> Result<User, BackendError> {
        let mut tables = self.lock()?;
        if tables.email_taken(&user.email, None) {
            let err = format!("email {} is already registered", user.email);
            error!("{err}");
            return Err(BackendError::UniqueViolation(err));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            name: user.name,
            email: user.email,
            password: user.password,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn users(&mut self) -> Result<Vec<User>, BackendError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn user(&mut self, id: i32) -> Result<Option<User>, BackendError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn user_by_email(&mut self, email: &str) -> Result<Option<User>, BackendError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn update_user(&mut self, id: i32, user: NewUser) -> Result<bool, BackendError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&id) {
            debug!(id, "User to update does not exist");
            return Ok(false);
        }
        if tables.email_taken(&user.email, Some(id)) {
            let err = format!("email {} is already registered", user.email);
            error!("{err}");
            return Err(BackendError::UniqueViolation(err));
        }

        if let Some(stored) = tables.users.get_mut(&id) {
            stored.name = user.name;
            stored.email = user.email;
            stored.password = user.password;
        }
        Ok(true)
    }

    fn remove_user(&mut self, id: i32) -> Result<bool, BackendError> {
        let mut tables = self.lock()?;
        if tables.users.remove(&id).is_none() {
            debug!(id, "User to remove does not exist");
            return Ok(false);
        }

        tables
            .appointments
            .values_mut()
            .filter(|appointment| appointment.user_id == Some(id))
            .for_each(|appointment| appointment.user_id = None);
        Ok(true)
    }

    fn add_appointment(
        &mut self,
        appointment: NewAppointment,
    ) -> Result<Appointment, BackendError> {
        let mut tables = self.lock()?;
        tables.check_owner(appointment.user_id)?;

        tables.last_appointment_id += 1;
        let appointment = Appointment {
            id: tables.last_appointment_id,
            title: appointment.title,
            date_time: appointment.date_time,
            user_id: Some(appointment.user_id),
        };
        tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    fn appointments(&mut self) -> Result<Vec<Appointment>, BackendError> {
        Ok(self.lock()?.appointments.values().cloned().collect())
    }

    fn appointment(&mut self, id: i32) -> Result<Option<Appointment>, BackendError> {
        Ok(self.lock()?.appointments.get(&id).cloned())
    }

    fn update_appointment(
        &mut self,
        id: i32,
        appointment: NewAppointment,
    ) -> Result<bool, BackendError> {
        let mut tables = self.lock()?;
        if !tables.appointments.contains_key(&id) {
            debug!(id, "Appointment to update does not exist");
            return Ok(false);
        }
        tables.check_owner(appointment.user_id)?;

        if let Some(stored) = tables.appointments.get_mut(&id) {
            stored.title = appointment.title;
            stored.date_time = appointment.date_time;
            stored.user_id = Some(appointment.user_id);
        }
        Ok(true)
    }

    fn remove_appointment(&mut self, id: i32) -> Result<bool, BackendError> {
        let removed = self.lock()?.appointments.remove(&id).is_some();
        if !removed {
            debug!(id, "Appointment to remove does not exist");
        }
        Ok(removed)
    }
}
