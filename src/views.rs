//! Server-rendered pages. Every page is a plain struct built by its handler
//! and turned into HTML by [`render`].

use crate::types::{Appointment, User};
use axum::response::Html;

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub const LOGIN_ERROR: &str = "E-mail ou senha incorretos";

pub trait Page {
    fn heading(&self) -> &'static str;
    fn body(&self) -> String;
}

pub fn render<P: Page>(website_title: &str, page: &P) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{heading} | {title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<nav>
<a href="/">Início</a>
<a href="/usuarios">Usuários</a>
<a href="/agendar">Agendar</a>
<a href="/agendamentos">Agendamentos</a>
<a href="/login">Entrar</a>
<a href="/logout">Sair</a>
</nav>
<main>
<h1>{heading}</h1>
{body}</main>
</body>
</html>
"#,
        heading = page.heading(),
        title = escape(website_title),
        body = page.body(),
    ))
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn greeting(user_name: &str) -> String {
    format!("<p class=\"greeting\">Olá, {}!</p>\n", escape(user_name))
}

fn user_options(users: &[User], selected: Option<i32>) -> String {
    users
        .iter()
        .map(|user| {
            let marker = if Some(user.id) == selected {
                " selected"
            } else {
                ""
            };
            format!(
                "<option value=\"{}\"{marker}>{}</option>\n",
                user.id,
                escape(&user.name)
            )
        })
        .collect()
}

pub struct HomePage;

impl Page for HomePage {
    fn heading(&self) -> &'static str {
        "Cadastro"
    }

    fn body(&self) -> String {
        String::from(
            r#"<form method="post" action="/cadastrar">
<label>Nome <input name="nome" required></label>
<label>E-mail <input name="email" type="email" required></label>
<label>Senha <input name="senha" type="password" required></label>
<button type="submit">Cadastrar</button>
</form>
<p>Já tem conta? <a href="/login">Entrar</a></p>
"#,
        )
    }
}

pub struct UsersPage {
    pub users: Vec<User>,
}

impl Page for UsersPage {
    fn heading(&self) -> &'static str {
        "Usuários"
    }

    fn body(&self) -> String {
        if self.users.is_empty() {
            return String::from("<p>Nenhum usuário cadastrado.</p>\n");
        }

        let rows: String = self
            .users
            .iter()
            .map(|user| {
                format!(
                    "<tr><td>{id}</td><td>{name}</td><td>{email}</td>\
                     <td><a href=\"/editar/{id}\">Editar</a> <a href=\"/deletar/{id}\">Excluir</a></td></tr>\n",
                    id = user.id,
                    name = escape(&user.name),
                    email = escape(&user.email),
                )
            })
            .collect();
        format!("<table>\n<tr><th>ID</th><th>Nome</th><th>E-mail</th><th></th></tr>\n{rows}</table>\n")
    }
}

pub struct EditUserPage {
    pub id: i32,
    pub user: Option<User>,
}

impl Page for EditUserPage {
    fn heading(&self) -> &'static str {
        "Editar usuário"
    }

    fn body(&self) -> String {
        let Some(user) = &self.user else {
            return format!("<p>Usuário {} não encontrado.</p>\n", self.id);
        };

        format!(
            r#"<form method="post" action="/editar/{id}">
<label>Nome <input name="nome" value="{name}" required></label>
<label>E-mail <input name="email" type="email" value="{email}" required></label>
<label>Senha <input name="senha" type="password" value="{password}" required></label>
<button type="submit">Salvar</button>
</form>
"#,
            id = user.id,
            name = escape(&user.name),
            email = escape(&user.email),
            password = escape(&user.password),
        )
    }
}

#[derive(Default)]
pub struct LoginPage {
    pub error: Option<&'static str>,
}

impl Page for LoginPage {
    fn heading(&self) -> &'static str {
        "Entrar"
    }

    fn body(&self) -> String {
        let error = self
            .error
            .map(|error| format!("<p class=\"error\">{}</p>\n", escape(error)))
            .unwrap_or_default();

        format!(
            r#"{error}<form method="post" action="/login">
<label>E-mail <input name="email" type="email" required></label>
<label>Senha <input name="senha" type="password" required></label>
<button type="submit">Entrar</button>
</form>
"#
        )
    }
}

pub struct BookingPage {
    pub users: Vec<User>,
    pub user_name: String,
}

impl Page for BookingPage {
    fn heading(&self) -> &'static str {
        "Novo agendamento"
    }

    fn body(&self) -> String {
        format!(
            r#"{greeting}<form method="post" action="/agendar">
<label>Título <input name="titulo" required></label>
<label>Data e hora <input name="data_hora" type="datetime-local" required></label>
<label>Usuário <select name="usuario_id" required>
{options}</select></label>
<button type="submit">Agendar</button>
</form>
"#,
            greeting = greeting(&self.user_name),
            options = user_options(&self.users, None),
        )
    }
}

pub struct AppointmentsPage {
    pub appointments: Vec<Appointment>,
    pub users: Vec<User>,
    pub user_name: String,
}

impl AppointmentsPage {
    fn owner(&self, appointment: &Appointment) -> String {
        appointment
            .user_id
            .and_then(|id| self.users.iter().find(|user| user.id == id))
            .map(|user| escape(&user.name))
            .unwrap_or_else(|| String::from("—"))
    }
}

impl Page for AppointmentsPage {
    fn heading(&self) -> &'static str {
        "Agendamentos"
    }

    fn body(&self) -> String {
        let mut body = greeting(&self.user_name);
        body.push_str("<p><a href=\"/agendar\">Novo agendamento</a></p>\n");
        if self.appointments.is_empty() {
            body.push_str("<p>Nenhum agendamento.</p>\n");
            return body;
        }

        body.push_str("<table>\n<tr><th>ID</th><th>Título</th><th>Data e hora</th><th>Usuário</th><th></th></tr>\n");
        for appointment in &self.appointments {
            body.push_str(&format!(
                "<tr><td>{id}</td><td>{title}</td><td>{date_time}</td><td>{owner}</td>\
                 <td><a href=\"/editar_agendamento/{id}\">Editar</a> \
                 <a href=\"/deletar_agendamento/{id}\">Excluir</a></td></tr>\n",
                id = appointment.id,
                title = escape(&appointment.title),
                date_time = appointment.date_time.format(DISPLAY_FORMAT),
                owner = self.owner(appointment),
            ));
        }
        body.push_str("</table>\n");
        body
    }
}

pub struct EditAppointmentPage {
    pub id: i32,
    pub appointment: Option<Appointment>,
    pub users: Vec<User>,
    pub user_name: String,
}

impl Page for EditAppointmentPage {
    fn heading(&self) -> &'static str {
        "Editar agendamento"
    }

    fn body(&self) -> String {
        let greeting = greeting(&self.user_name);
        let Some(appointment) = &self.appointment else {
            return format!("{greeting}<p>Agendamento {} não encontrado.</p>\n", self.id);
        };

        format!(
            r#"{greeting}<form method="post" action="/editar_agendamento/{id}">
<label>Título <input name="titulo" value="{title}" required></label>
<label>Data e hora <input name="data_hora" type="datetime-local" value="{date_time}" required></label>
<label>Usuário <select name="usuario_id" required>
{options}</select></label>
<button type="submit">Salvar</button>
</form>
"#,
            id = appointment.id,
            title = escape(&appointment.title),
            date_time = appointment.date_time.format(INPUT_FORMAT),
            options = user_options(&self.users, appointment.user_id),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn user(id: i32, name: &str) -> User {
        User {
            id,
            name: name.into(),
            email: format!("user{id}@example.com"),
            password: String::from("segredo"),
        }
    }

    fn appointment(id: i32, title: &str, user_id: Option<i32>) -> Appointment {
        Appointment {
            id,
            title: title.into(),
            date_time: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            user_id,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("Ana Júlia"), "Ana Júlia");
    }

    #[test]
    fn test_layout_wraps_page() {
        let Html(html) = render("Clínica <Sol>", &HomePage);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Cadastro | Clínica &lt;Sol&gt;</title>"));
        assert!(html.contains(r#"action="/cadastrar""#));
    }

    #[test]
    fn test_users_page_escapes_fields() {
        let page = UsersPage {
            users: vec![user(1, "<b>Ana</b>")],
        };
        let body = page.body();
        assert!(body.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(!body.contains("<b>Ana</b>"));
        assert!(body.contains(r#"href="/deletar/1""#));
    }

    #[test]
    fn test_users_page_lists_one_row_per_user() {
        let page = UsersPage {
            users: vec![user(1, "Ana"), user(2, "Bruno")],
        };
        let body = page.body();
        assert_eq!(body.matches("<tr><td>").count(), 2);
        assert!(body.find("<td>Ana</td>").unwrap() < body.find("<td>Bruno</td>").unwrap());
        assert!(body.ends_with("</tr>\n</table>\n"));
        assert_eq!(
            user_options(&[user(1, "Ana"), user(2, "Bruno")], Some(1)),
            "<option value=\"1\" selected>Ana</option>\n<option value=\"2\">Bruno</option>\n"
        );
    }

    #[test]
    fn test_missing_entities_render_notice() {
        let page = EditUserPage { id: 9, user: None };
        assert!(page.body().contains("Usuário 9 não encontrado"));

        let page = EditAppointmentPage {
            id: 4,
            appointment: None,
            users: vec![],
            user_name: String::from("Ana"),
        };
        assert!(page.body().contains("Agendamento 4 não encontrado"));
    }

    #[test]
    fn test_edit_appointment_preselects_owner() {
        let page = EditAppointmentPage {
            id: 1,
            appointment: Some(appointment(1, "Consulta", Some(2))),
            users: vec![user(1, "Ana"), user(2, "Bruno")],
            user_name: String::from("Ana"),
        };
        let body = page.body();
        assert!(body.contains(r#"value="2025-03-14T09:30""#));
        assert!(body.contains(r#"<option value="2" selected>Bruno</option>"#));
        assert!(body.contains(r#"<option value="1">Ana</option>"#));
    }

    #[test]
    fn test_appointments_page_shows_owner() {
        let page = AppointmentsPage {
            appointments: vec![
                appointment(1, "Consulta", Some(1)),
                appointment(2, "Órfão", None),
            ],
            users: vec![user(1, "Ana")],
            user_name: String::from("Ana"),
        };
        let body = page.body();
        assert!(body.contains("Olá, Ana!"));
        assert!(body.contains("<td>Consulta</td><td>14/03/2025 09:30</td><td>Ana</td>"));
        assert!(body.contains("<td>Órfão</td><td>14/03/2025 09:30</td><td>—</td>"));
    }

    #[test]
    fn test_login_page_shows_error() {
        assert!(!LoginPage::default().body().contains("class=\"error\""));
        let page = LoginPage {
            error: Some(LOGIN_ERROR),
        };
        assert!(page.body().contains(LOGIN_ERROR));
    }
}
