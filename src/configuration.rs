use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn website_title(&self) -> String;
    fn session_secret(&self) -> String;
    fn static_dir(&self) -> PathBuf;
    fn port(&self) -> u16;
    fn database_url(&self) -> Option<String>;
}
