use web_time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub secure: bool,
}

pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, options: &CookieOptions);
    fn remove(&self, name: &str, options: &CookieOptions);
}
