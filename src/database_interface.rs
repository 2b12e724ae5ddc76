use crate::backend::{AgendaBackend, AgendaStore};
use crate::error::{BackendError, StartupError};
use crate::schema::{agendamentos, usuarios};
use crate::types::{Appointment, NewAppointment, NewUser, User};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// PostgreSQL backend. Cloning shares the pool.
#[derive(Clone)]
pub struct DatabaseInterface {
    pool: PgPool,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, BackendError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)?;
        Ok(Self { pool })
    }

    /// Applies pending migrations and returns how many ran.
    pub fn run_migrations(&self) -> Result<usize, StartupError> {
        let mut connection = self.pool.get().map_err(BackendError::from)?;
        let connection: &mut PgConnection = &mut connection;
        let applied = connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| StartupError::Migration(err.to_string()))?;
        Ok(applied.len())
    }
}

impl AgendaBackend for DatabaseInterface {
    type Store = DatabaseStore;

    fn open(&self) -> Result<Self::Store, BackendError> {
        Ok(DatabaseStore {
            connection: self.pool.get()?,
        })
    }
}

/// One pooled connection; returned to the pool on drop.
pub struct DatabaseStore {
    connection: PooledConnection<ConnectionManager<PgConnection>>,
}

impl AgendaStore for DatabaseStore {
    fn add_user(&mut self, user: NewUser) -> Result<User, BackendError> {
        let user = diesel::insert_into(usuarios::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut *self.connection)?;
        Ok(user)
    }

    fn users(&mut self) -> Result<Vec<User>, BackendError> {
        let users = usuarios::table
            .order(usuarios::id)
            .select(User::as_select())
            .load(&mut *self.connection)?;
        Ok(users)
    }

    fn user(&mut self, id: i32) -> Result<Option<User>, BackendError> {
        let user = usuarios::table
            .find(id)
            .select(User::as_select())
            .first(&mut *self.connection)
            .optional()?;
        Ok(user)
    }

    fn user_by_email(&mut self, email: &str) -> Result<Option<User>, BackendError> {
        let user = usuarios::table
            .filter(usuarios::email.eq(email))
            .select(User::as_select())
            .first(&mut *self.connection)
            .optional()?;
        Ok(user)
    }

    fn update_user(&mut self, id: i32, user: NewUser) -> Result<bool, BackendError> {
        let changed = diesel::update(usuarios::table.find(id))
            .set(&user)
            .execute(&mut *self.connection)?;
        Ok(changed > 0)
    }

    fn remove_user(&mut self, id: i32) -> Result<bool, BackendError> {
        // Owned appointments are unset by the ON DELETE SET NULL constraint.
        let removed = diesel::delete(usuarios::table.find(id)).execute(&mut *self.connection)?;
        Ok(removed > 0)
    }

    fn add_appointment(
        &mut self,
        appointment: NewAppointment,
    ) -> Result<Appointment, BackendError> {
        let appointment = diesel::insert_into(agendamentos::table)
            .values(&appointment)
            .returning(Appointment::as_returning())
            .get_result(&mut *self.connection)?;
        Ok(appointment)
    }

    fn appointments(&mut self) -> Result<Vec<Appointment>, BackendError> {
        let appointments = agendamentos::table
            .order(agendamentos::id)
            .select(Appointment::as_select())
            .load(&mut *self.connection)?;
        Ok(appointments)
    }

    fn appointment(&mut self, id: i32) -> Result<Option<Appointment>, BackendError> {
        let appointment = agendamentos::table
            .find(id)
            .select(Appointment::as_select())
            .first(&mut *self.connection)
            .optional()?;
        Ok(appointment)
    }

    fn update_appointment(
        &mut self,
        id: i32,
        appointment: NewAppointment,
    ) -> Result<bool, BackendError> {
        let changed = diesel::update(agendamentos::table.find(id))
            .set(&appointment)
            .execute(&mut *self.connection)?;
        Ok(changed > 0)
    }

    fn remove_appointment(&mut self, id: i32) -> Result<bool, BackendError> {
        let removed =
            diesel::delete(agendamentos::table.find(id)).execute(&mut *self.connection)?;
        Ok(removed > 0)
    }
}
