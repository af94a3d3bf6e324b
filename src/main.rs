#[macro_use]
extern crate rust_i18n;

i18n!("locales");

use iptv_tools::cli;
use iptv_tools::error::IptvError;
use iptv_tools::init_locale;

fn main() {
    init_locale();

    if let Err(e) = cli::run() {
        let iptv_error = e.downcast_ref::<IptvError>();
        let message = iptv_error
            .map(IptvError::display_localized)
            .unwrap_or_else(|| e.to_string());
        eprintln!("{}", t!("messages.error", error = message));
        std::process::exit(iptv_error.map(IptvError::exit_code).unwrap_or(1));
    }
}
