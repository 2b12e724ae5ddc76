use crate::backend::{AgendaBackend, AgendaStore};
use crate::configuration::Configuration;
use crate::error::AppError;
use crate::session::{Authenticated, CookieSession, SessionKey};
use crate::types::{AppointmentForm, LoginForm, NewAppointment, NewUser};
use crate::views::{
    render, AppointmentsPage, BookingPage, EditAppointmentPage, EditUserPage, HomePage,
    LoginPage, UsersPage, LOGIN_ERROR,
};
use axum::extract::{FromRef, Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState<B> {
    backend: B,
    session_key: SessionKey,
    website_title: Arc<str>,
}

impl<B> FromRef<AppState<B>> for SessionKey {
    fn from_ref(state: &AppState<B>) -> Self {
        state.session_key.clone()
    }
}

pub fn create_app<B: AgendaBackend, C: Configuration>(backend: B, configuration: &C) -> Router {
    let state = AppState {
        backend,
        session_key: SessionKey::new(&configuration.session_secret()),
        website_title: configuration.website_title().into(),
    };

    let users: Router<AppState<B>> = Router::new()
        .route("/", get(home::<B>))
        .route("/cadastrar", post(register_user::<B>))
        .route("/usuarios", get(list_users::<B>))
        .route("/editar/:id", get(edit_user_form::<B>).post(save_user::<B>))
        .route("/deletar/:id", get(delete_user::<B>));

    let auth: Router<AppState<B>> = Router::new()
        .route("/login", get(login_form::<B>).post(login::<B>))
        .route("/logout", get(logout));

    // Every appointment route requires a logged-in session.
    let appointments: Router<AppState<B>> = Router::new()
        .route("/agendar", get(booking_form::<B>).post(book_appointment::<B>))
        .route("/agendamentos", get(list_appointments::<B>))
        .route(
            "/editar_agendamento/:id",
            get(edit_appointment_form::<B>).post(save_appointment::<B>),
        )
        .route("/deletar_agendamento/:id", get(delete_appointment::<B>));

    Router::new()
        .merge(users)
        .merge(auth)
        .merge(appointments)
        .nest_service("/static", ServeDir::new(configuration.static_dir()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_appointment(form: AppointmentForm) -> Result<NewAppointment, AppError> {
    form.into_new_appointment()
        .map_err(|form| AppError::InvalidDateTime {
            input: form.date_time,
        })
}

async fn home<B: AgendaBackend>(State(state): State<AppState<B>>) -> Html<String> {
    render(&state.website_title, &HomePage)
}

async fn register_user<B: AgendaBackend>(
    State(state): State<AppState<B>>,
    Form(user): Form<NewUser>,
) -> Result<Redirect, AppError> {
    let mut store = state.backend.open()?;
    let user = store.add_user(user)?;
    info!(user_id = user.id, "User registered");
    Ok(Redirect::to("/"))
}

async fn list_users<B: AgendaBackend>(
    State(state): State<AppState<B>>,
) -> Result<Html<String>, AppError> {
    let mut store = state.backend.open()?;
    let users = store.users()?;
    Ok(render(&state.website_title, &UsersPage { users }))
}

async fn edit_user_form<B: AgendaBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let mut store = state.backend.open()?;
    let user = store.user(id)?;
    Ok(render(&state.website_title, &EditUserPage { id, user }))
}

async fn save_user<B: AgendaBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
    Form(user): Form<NewUser>,
) -> Result<Redirect, AppError> {
    let mut store = state.backend.open()?;
    if store.update_user(id, user)? {
        info!(user_id = id, "User updated");
    }
    Ok(Redirect::to("/usuarios"))
}

async fn delete_user<B: AgendaBackend>(
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let mut store = state.backend.open()?;
    if store.remove_user(id)? {
        info!(user_id = id, "User deleted");
    }
    Ok(Redirect::to("/usuarios"))
}

async fn login_form<B: AgendaBackend>(State(state): State<AppState<B>>) -> Html<String> {
    render(&state.website_title, &LoginPage::default())
}

async fn login<B: AgendaBackend>(
    State(state): State<AppState<B>>,
    session: CookieSession,
    Form(credentials): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut store = state.backend.open()?;
    match store.user_by_email(&credentials.email)? {
        // TODO: compare against a salted hash once stored passwords are migrated
        Some(user) if user.password == credentials.password => {
            info!(user_id = user.id, "User logged in");
            Ok((session.log_in(&user), Redirect::to("/agendamentos")).into_response())
        }
        _ => {
            warn!("Login failed");
            let page = LoginPage {
                error: Some(LOGIN_ERROR),
            };
            Ok(render(&state.website_title, &page).into_response())
        }
    }
}

async fn logout(session: CookieSession) -> impl IntoResponse {
    if let Some(user_id) = session.user_id() {
        info!(user_id, "User logged out");
    }
    (session.clear(), Redirect::to("/login"))
}

async fn booking_form<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
) -> Result<Html<String>, AppError> {
    let mut store = state.backend.open()?;
    let page = BookingPage {
        users: store.users()?,
        user_name: user.user_name,
    };
    Ok(render(&state.website_title, &page))
}

async fn book_appointment<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
    Form(form): Form<AppointmentForm>,
) -> Result<Redirect, AppError> {
    let appointment = parse_appointment(form)?;
    let mut store = state.backend.open()?;
    let appointment = store.add_appointment(appointment)?;
    info!(
        appointment_id = appointment.id,
        booked_by = user.user_id,
        "Appointment booked"
    );
    Ok(Redirect::to("/agendamentos"))
}

async fn list_appointments<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
) -> Result<Html<String>, AppError> {
    let mut store = state.backend.open()?;
    let page = AppointmentsPage {
        appointments: store.appointments()?,
        users: store.users()?,
        user_name: user.user_name,
    };
    Ok(render(&state.website_title, &page))
}

async fn edit_appointment_form<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let mut store = state.backend.open()?;
    let page = EditAppointmentPage {
        id,
        appointment: store.appointment(id)?,
        users: store.users()?,
        user_name: user.user_name,
    };
    Ok(render(&state.website_title, &page))
}

async fn save_appointment<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
    Form(form): Form<AppointmentForm>,
) -> Result<Redirect, AppError> {
    let appointment = parse_appointment(form)?;
    let mut store = state.backend.open()?;
    if store.update_appointment(id, appointment)? {
        info!(appointment_id = id, edited_by = user.user_id, "Appointment updated");
    }
    Ok(Redirect::to("/agendamentos"))
}

async fn delete_appointment<B: AgendaBackend>(
    user: Authenticated,
    State(state): State<AppState<B>>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let mut store = state.backend.open()?;
    if store.remove_appointment(id)? {
        info!(appointment_id = id, deleted_by = user.user_id, "Appointment deleted");
    }
    Ok(Redirect::to("/agendamentos"))
}
