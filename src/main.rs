use ade_validate::core::tui;

fn main() {
    match ade_validate::run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tui::print_fatal(&e.to_string());
            std::process::exit(1);
        }
    }
}
