#[macro_use]
extern crate rust_i18n;

i18n!("locales");

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod jellyfin;
pub mod logging;
pub mod ownership;
pub mod path_utils;
pub mod sync;

#[cfg(test)]
pub mod test_utils;

pub fn init_locale() {
    rust_i18n::set_locale("en");
}
