//! Binary entry point: initializes logging and hands off to [`mlang::cli::run`].

fn main() {
    env_logger::init();
    let code = mlang::cli::run();
    std::process::exit(code);
}
